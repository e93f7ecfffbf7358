//! IPC message types for serve mode

use serde::{Deserialize, Serialize};

use crate::api::GenerateRequestBody;

/// One request line: the caller identity plus the generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeRequest {
    /// Key for the request governor
    pub identity: String,

    pub request: GenerateRequestBody,
}
