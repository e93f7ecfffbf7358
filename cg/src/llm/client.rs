//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// One generative-text backend
///
/// `complete` is a single attempt: no retries, no backoff. Retrying lives in
/// [`super::ProviderGateway`] so every backend gets the same policy.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name reported in artifact metadata
    fn name(&self) -> &str;

    /// Model identifier reported in artifact metadata
    fn model(&self) -> &str;

    /// Send one completion request
    ///
    /// Returns an error for transport failures, non-success statuses and
    /// envelopes without usable text.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
