//! LLM provider module for contractgen
//!
//! Backends for the supported providers behind the [`LlmClient`] trait, and
//! the [`ProviderGateway`] that applies the retry policy on top of them.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gateway;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::{LlmError, is_retryable_status};
pub use gateway::{ProviderGateway, RetryPolicy};
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, Sampling, StopReason, TokenUsage};

use crate::config::{ProviderKind, ResolvedLlmConfig};

/// Create an LLM client for the resolved provider
///
/// Adding a backend means adding a [`ProviderKind`] variant and an arm here.
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider {
        ProviderKind::Anthropic => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        ProviderKind::OpenAI => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
    }
}
