//! Generated artifact returned to the caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, GenerationOptions};

/// Crate version stamped into every artifact
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Provenance of a generated artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub version: String,
    pub request_id: Uuid,
}

/// Sanitized contract source plus metadata
///
/// Only built from sanitizer output, never from raw provider text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub source: String,
    pub category: Category,
    pub requirements: String,
    pub options: GenerationOptions,
    pub metadata: ArtifactMetadata,
}
