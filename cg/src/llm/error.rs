//! Provider attempt errors

use std::time::Duration;
use thiserror::Error;

/// Why one provider attempt failed
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP 429 with the provider's suggested delay
    #[error("Provider rate limit hit, suggested wait {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Envelope decoded but carried no usable text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Undecodable envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No API key for {provider}: set the {env_var} environment variable")]
    MissingCredential { provider: String, env_var: String },
}

impl LlmError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => is_retryable_status(*status),
            LlmError::MissingCredential { .. } => false,
            LlmError::RateLimited { .. }
            | LlmError::Network(_)
            | LlmError::InvalidResponse(_)
            | LlmError::Timeout(_)
            | LlmError::Json(_) => true,
        }
    }

    /// Delay suggested by the provider, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Statuses worth another attempt: 408, 429, 5xx and Anthropic's 529
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 529) || (500..600).contains(&status)
}
