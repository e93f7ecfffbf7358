//! Pipeline error types
//!
//! Every failure a caller can observe is one of these variants. Provider-level
//! detail lives in [`crate::llm::LlmError`] and is folded into
//! [`GenerationError::Provider`] once the gateway gives up.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced to the caller of the generation pipeline
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Caller input or sanitized output failed a structural check
    #[error("{0}")]
    Validation(String),

    /// The request governor rejected the caller
    #[error("Too many requests from '{identity}', retry after {}s", whole_secs(retry_after))]
    RateLimited { identity: String, retry_after: Duration },

    /// Every provider attempt failed
    #[error("Provider failed after {attempts} attempt(s): {message}")]
    Provider { attempts: u32, message: String },

    /// The selected provider is not usable with the current configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Machine-readable error category carried in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RateLimit,
    Provider,
    Configuration,
}

impl GenerationError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        GenerationError::Validation(message.into())
    }

    /// Get the envelope kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Validation(_) => ErrorKind::Validation,
            GenerationError::RateLimited { .. } => ErrorKind::RateLimit,
            GenerationError::Provider { .. } => ErrorKind::Provider,
            GenerationError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// HTTP-style status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

/// Seconds rounded up, at least one
fn whole_secs(duration: &Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::RateLimit => 429,
            ErrorKind::Provider => 502,
            ErrorKind::Configuration => 500,
        }
    }
}
