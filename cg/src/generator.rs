//! Generation pipeline
//!
//! governor -> validation -> classifier -> composer -> gateway -> sanitizer

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{GenerateRequestBody, GenerateResponse};
use crate::classifier::Classifier;
use crate::config::{Config, LimitsConfig};
use crate::domain::{Artifact, ArtifactMetadata, GENERATOR_VERSION};
use crate::error::GenerationError;
use crate::governor::RequestGovernor;
use crate::llm::{ProviderGateway, Sampling};
use crate::prompts::{PromptComposer, PromptLoader};
use crate::sanitizer::Sanitizer;

/// Turns contract requirements into sanitized Solidity artifacts
pub struct ContractGenerator {
    governor: Arc<RequestGovernor>,
    classifier: Classifier,
    composer: PromptComposer,
    gateway: ProviderGateway,
    sanitizer: Sanitizer,
    limits: LimitsConfig,
    sampling: Sampling,
}

impl ContractGenerator {
    /// Build the pipeline for the configured provider
    ///
    /// Fails with a configuration error when the provider credential is
    /// missing or a prompt override cannot be compiled.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        debug!(provider = %config.llm.provider, "ContractGenerator::from_config: called");
        let gateway = ProviderGateway::from_config(&config.llm)?;
        Self::new(gateway, config)
    }

    /// Build the pipeline around an existing gateway
    pub fn new(gateway: ProviderGateway, config: &Config) -> Result<Self, GenerationError> {
        debug!(provider = %gateway.provider_name(), "ContractGenerator::new: called");
        let loader = PromptLoader::new(config.prompts.dir.as_deref())
            .map_err(|e| GenerationError::Configuration(format!("{:#}", e)))?;

        Ok(Self {
            governor: Arc::new(RequestGovernor::from_config(&config.governor)),
            classifier: Classifier::default(),
            composer: PromptComposer::new(loader),
            gateway,
            sanitizer: Sanitizer::default(),
            limits: config.limits.clone(),
            sampling: Sampling {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            },
        })
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_governor(mut self, governor: Arc<RequestGovernor>) -> Self {
        self.governor = governor;
        self
    }

    /// Shared governor, for the periodic sweeper in serve mode
    pub fn governor(&self) -> &Arc<RequestGovernor> {
        &self.governor
    }

    pub fn gateway(&self) -> &ProviderGateway {
        &self.gateway
    }

    /// Run one request through the pipeline on behalf of `identity`
    pub async fn generate(&self, identity: &str, body: GenerateRequestBody) -> Result<Artifact, GenerationError> {
        let request_id = Uuid::now_v7();
        debug!(%identity, %request_id, "generate: called");

        if !self.governor.admit(identity).await {
            let retry_after = self.governor.retry_after(identity).await;
            warn!(%identity, %request_id, "Request rejected by governor");
            return Err(GenerationError::RateLimited {
                identity: identity.to_string(),
                retry_after,
            });
        }

        let request = body.into_request(&self.limits)?;
        let category = match request.category() {
            Some(category) => {
                debug!(%category, "generate: explicit category");
                category
            }
            None => self.classifier.classify(request.requirements()),
        };
        info!(%request_id, %category, "Generating contract");

        let prompt = self
            .composer
            .compose(request.requirements(), category, request.options());
        let raw = self.gateway.generate(&prompt, &self.sampling).await?;
        let source = self.sanitizer.sanitize(&raw)?;

        info!(%request_id, %category, source_len = source.len(), "Contract generated");
        Ok(Artifact {
            source,
            category,
            requirements: request.requirements().to_string(),
            options: request.options().clone(),
            metadata: ArtifactMetadata {
                generated_at: Utc::now(),
                provider: self.gateway.provider_name().to_string(),
                model: self.gateway.model().to_string(),
                version: GENERATOR_VERSION.to_string(),
                request_id,
            },
        })
    }

    /// Run one request and wrap the outcome in the response envelope
    pub async fn handle(&self, identity: &str, body: GenerateRequestBody) -> GenerateResponse {
        let result = self.generate(identity, body).await;
        if let Err(e) = &result {
            debug!(%identity, kind = ?e.kind(), error = %e, "handle: request failed");
        }
        GenerateResponse::from(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, GenerationOptions};
    use crate::error::ErrorKind;
    use crate::llm::RetryPolicy;
    use crate::llm::client::mock::MockLlmClient;
    use crate::sanitizer::{DEFAULT_LICENSE, DEFAULT_PRAGMA};

    const TOKEN_SOURCE: &str = "Here is your token:
```solidity
contract FooCoin {
    string public name = \"FooCoin\";
}
```";

    fn generator(client: Arc<MockLlmClient>) -> ContractGenerator {
        let gateway = ProviderGateway::new(client, RetryPolicy::default());
        ContractGenerator::new(gateway, &Config::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fungible_token_end_to_end() {
        let client = Arc::new(MockLlmClient::new(vec![MockLlmClient::text(TOKEN_SOURCE)]));
        let generator = generator(client.clone());

        let body = GenerateRequestBody::new("Create a utility token with 1,000,000 supply called FooCoin (FOO)");
        let artifact = generator.generate("alice", body).await.unwrap();

        assert_eq!(artifact.category, Category::Erc20);
        assert!(artifact.source.starts_with(&format!("{}\n{}", DEFAULT_LICENSE, DEFAULT_PRAGMA)));
        assert!(artifact.source.contains("contract FooCoin"));
        assert!(!artifact.source.contains("```"));
        assert!(!artifact.source.contains("Here is"));
        assert_eq!(artifact.metadata.provider, "mock");
        assert_eq!(artifact.metadata.version, GENERATOR_VERSION);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_requirements_never_reach_provider() {
        let client = Arc::new(MockLlmClient::new(vec![MockLlmClient::text(TOKEN_SOURCE)]));
        let generator = generator(client.clone());

        let err = generator
            .generate("alice", GenerateRequestBody::new("token"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eleventh_request_is_rate_limited() {
        let responses = (0..10).map(|_| MockLlmClient::text(TOKEN_SOURCE)).collect();
        let client = Arc::new(MockLlmClient::new(responses));
        let generator = generator(client.clone());

        for _ in 0..10 {
            generator
                .generate("10.0.0.1", GenerateRequestBody::new("A utility token for the arcade"))
                .await
                .unwrap();
        }
        let err = generator
            .generate("10.0.0.1", GenerateRequestBody::new("A utility token for the arcade"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.status_code(), 429);
        assert_eq!(client.call_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_requests_count_before_validation() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let mut config = Config::default();
        config.governor.max_requests = 1;
        let gateway = ProviderGateway::new(client.clone(), RetryPolicy::default());
        let generator = ContractGenerator::new(gateway, &config).unwrap();

        let first = generator.generate("bob", GenerateRequestBody::new("")).await.unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Validation);

        let second = generator.generate("bob", GenerateRequestBody::new("")).await.unwrap_err();
        assert_eq!(second.kind(), ErrorKind::RateLimit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_category_overrides_classifier() {
        let client = Arc::new(MockLlmClient::new(vec![MockLlmClient::text("contract Dao {}")]));
        let generator = generator(client);

        let body = GenerateRequestBody {
            category: Some("dao".to_string()),
            options: Some(GenerationOptions {
                name: Some("Council".to_string()),
                ..Default::default()
            }),
            ..GenerateRequestBody::new("An ERC20 token with holder voting")
        };
        let artifact = generator.generate("alice", body).await.unwrap();

        assert_eq!(artifact.category, Category::Dao);
        assert_eq!(artifact.options.name.as_deref(), Some("Council"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prose_only_response_is_validation_error() {
        let client = Arc::new(MockLlmClient::new(vec![MockLlmClient::text(
            "I cannot help with that request.",
        )]));
        let generator = generator(client.clone());

        let err = generator
            .generate("alice", GenerateRequestBody::new("A vault that pays staking yield"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        // Sanitizer failures are not retried
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_exhaustion_envelope() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let generator = generator(client.clone());

        let response = generator
            .handle("alice", GenerateRequestBody::new("A vault that pays staking yield"))
            .await;

        assert!(!response.success);
        assert_eq!(response.status_code(), 502);
        assert_eq!(response.error.unwrap().kind, ErrorKind::Provider);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_classifier() {
        let client = Arc::new(MockLlmClient::new(vec![MockLlmClient::text("contract Registry {}")]));
        let generator =
            generator(client).with_classifier(Classifier::new().with_keywords(Category::Dao, ["council"]));

        let artifact = generator
            .generate("alice", GenerateRequestBody::new("A council registry for members"))
            .await
            .unwrap();
        assert_eq!(artifact.category, Category::Dao);
    }
}
