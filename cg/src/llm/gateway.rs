//! Provider gateway
//!
//! Wraps one [`LlmClient`] with the retry policy: bounded attempts, a timeout
//! per attempt, and `2^attempt` backoff units between attempts.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{CompletionRequest, LlmClient, LlmError, Sampling, create_client};
use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::prompts::PromptPair;

/// Retry policy for provider calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first
    pub max_attempts: u32,

    /// Attempt `n` is followed by a wait of `2^n` units
    pub backoff_unit: Duration,

    /// Upper bound on a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Build the policy from LLM configuration
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit(),
            attempt_timeout: config.timeout(),
        }
    }

    /// Wait after failed attempt `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Sends composed prompts to the configured backend
pub struct ProviderGateway {
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl ProviderGateway {
    /// Create a gateway over an existing client
    pub fn new(client: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        debug!(provider = %client.name(), ?policy, "ProviderGateway::new: called");
        Self { client, policy }
    }

    /// Create a gateway for the active provider in config
    ///
    /// Fails with a configuration error, before any network traffic, when the
    /// provider's credential is missing.
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        debug!(provider = %config.provider, "ProviderGateway::from_config: called");
        let client = create_client(&config.resolve()).map_err(|e| GenerationError::Configuration(e.to_string()))?;
        Ok(Self::new(client, RetryPolicy::from_config(config)))
    }

    /// Provider name of the wrapped client
    pub fn provider_name(&self) -> &str {
        self.client.name()
    }

    /// Model of the wrapped client
    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate text for a prompt, retrying transient failures
    ///
    /// Returns the full response text or a provider error carrying the last
    /// underlying cause.
    pub async fn generate(&self, prompt: &PromptPair, sampling: &Sampling) -> Result<String, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        debug!(provider = %self.client.name(), %max_attempts, "generate: called");
        let request = CompletionRequest::from_prompt(prompt, sampling);

        let mut last_error: Option<LlmError> = None;
        for attempt in 1..=max_attempts {
            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, self.client.complete(&request)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(attempt, "generate: attempt timed out");
                    Err(LlmError::Timeout(self.policy.attempt_timeout))
                }
            };

            match outcome {
                Ok(response) => {
                    info!(
                        provider = %self.client.name(),
                        attempt,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        stop_reason = ?response.stop_reason,
                        "Provider call succeeded"
                    );
                    return Ok(response.content);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(attempt, error = %e, "generate: non-retryable provider error");
                    return Err(GenerationError::Provider {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    if attempt < max_attempts {
                        let backoff = self.policy.backoff_for(attempt);
                        warn!(
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            suggested = ?e.retry_after(),
                            error = %e,
                            "generate: retrying after transient error"
                        );
                        last_error = Some(e);
                        tokio::time::sleep(backoff).await;
                    } else {
                        warn!(attempt, error = %e, "generate: attempts exhausted");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(GenerationError::Provider {
            attempts: max_attempts,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Max retries exceeded".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use tokio::time::Instant;

    fn prompt() -> PromptPair {
        PromptPair {
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    fn sampling() -> Sampling {
        Sampling {
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_after_backoff() {
        let client = Arc::new(MockLlmClient::new(vec![
            MockLlmClient::unavailable(),
            MockLlmClient::unavailable(),
            MockLlmClient::text("contract Ok {}"),
        ]));
        let gateway = ProviderGateway::new(client.clone(), RetryPolicy::default());

        let start = Instant::now();
        let text = gateway.generate(&prompt(), &sampling()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(text, "contract Ok {}");
        assert_eq!(client.call_count(), 3);
        // 2^1 + 2^2 units
        assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(7), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_exhausts_budget() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let gateway = ProviderGateway::new(client.clone(), RetryPolicy::default());

        let err = gateway.generate(&prompt(), &sampling()).await.unwrap_err();

        assert_eq!(client.call_count(), 3);
        match err {
            GenerationError::Provider { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("No more mock responses"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_attempt_budget() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let policy = RetryPolicy {
            max_attempts: 5,
            ..Default::default()
        };
        let gateway = ProviderGateway::new(client.clone(), policy);

        assert!(gateway.generate(&prompt(), &sampling()).await.is_err());
        assert_eq!(client.call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_immediately() {
        let client = Arc::new(MockLlmClient::new(vec![Err(LlmError::ApiError {
            status: 401,
            message: "invalid api key".to_string(),
        })]));
        let gateway = ProviderGateway::new(client.clone(), RetryPolicy::default());

        let err = gateway.generate(&prompt(), &sampling()).await.unwrap_err();
        assert_eq!(client.call_count(), 1);
        assert!(matches!(err, GenerationError::Provider { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_count_toward_budget() {
        let client = Arc::new(MockLlmClient::new(vec![]).with_delay(Duration::from_secs(60)));
        let gateway = ProviderGateway::new(client.clone(), RetryPolicy::default());

        let start = Instant::now();
        let err = gateway.generate(&prompt(), &sampling()).await.unwrap_err();

        assert_eq!(client.call_count(), 3);
        assert!(err.to_string().contains("Timeout"));
        // Three 30s timeouts plus 2s and 4s of backoff
        assert!(start.elapsed() >= Duration::from_secs(96));
        assert!(start.elapsed() < Duration::from_secs(97));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_envelope_is_retried() {
        let client = Arc::new(MockLlmClient::new(vec![
            Err(LlmError::InvalidResponse("no choices".to_string())),
            MockLlmClient::text("library L {}"),
        ]));
        let gateway = ProviderGateway::new(client.clone(), RetryPolicy::default());

        assert_eq!(gateway.generate(&prompt(), &sampling()).await.unwrap(), "library L {}");
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn test_provider_name_and_model() {
        let gateway = ProviderGateway::new(Arc::new(MockLlmClient::new(vec![])), RetryPolicy::default());
        assert_eq!(gateway.provider_name(), "mock");
        assert_eq!(gateway.model(), "mock-model");
    }
}
