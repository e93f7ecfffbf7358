//! Request and response envelopes
//!
//! JSON shapes exchanged with callers of `cg generate`, `cg serve` and the
//! library's [`ContractGenerator::handle`](crate::ContractGenerator::handle).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LimitsConfig;
use crate::domain::{Artifact, ArtifactMetadata, Category, GenerationOptions, GenerationRequest};
use crate::error::{ErrorKind, GenerationError};

/// Inbound generation request as sent on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequestBody {
    #[serde(default)]
    pub requirements: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

impl GenerateRequestBody {
    pub fn new(requirements: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            ..Default::default()
        }
    }

    /// Validate into a [`GenerationRequest`]
    ///
    /// An explicit category must name a supported category or alias.
    pub fn into_request(self, limits: &LimitsConfig) -> Result<GenerationRequest, GenerationError> {
        debug!(category = ?self.category, "into_request: called");
        let category = match self.category.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(id.parse::<Category>().map_err(GenerationError::Validation)?),
            _ => None,
        };
        GenerationRequest::new(self.requirements, category, self.options.unwrap_or_default(), limits)
    }
}

/// Payload of a successful response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateData {
    /// Sanitized contract source
    pub artifact: String,
    pub category: Category,
    pub metadata: ArtifactMetadata,
}

/// Payload of a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub kind: ErrorKind,
}

/// Response envelope: `data` on success, `error` on failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<GenerateData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl GenerateResponse {
    pub fn success(artifact: Artifact) -> Self {
        Self {
            success: true,
            data: Some(GenerateData {
                artifact: artifact.source,
                category: artifact.category,
                metadata: artifact.metadata,
            }),
            error: None,
        }
    }

    pub fn failure(error: &GenerationError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                message: error.to_string(),
                kind: error.kind(),
            }),
        }
    }

    /// Status code: 200 on success, the error kind's code otherwise
    pub fn status_code(&self) -> u16 {
        match &self.error {
            Some(error) => error.kind.status_code(),
            None => 200,
        }
    }
}

impl From<Result<Artifact, GenerationError>> for GenerateResponse {
    fn from(result: Result<Artifact, GenerationError>) -> Self {
        match result {
            Ok(artifact) => Self::success(artifact),
            Err(e) => Self::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GENERATOR_VERSION;
    use chrono::Utc;
    use uuid::Uuid;

    fn artifact() -> Artifact {
        Artifact {
            source: "contract A {}".to_string(),
            category: Category::Erc20,
            requirements: "A simple token".to_string(),
            options: GenerationOptions::default(),
            metadata: ArtifactMetadata {
                generated_at: Utc::now(),
                provider: "anthropic".to_string(),
                model: "claude".to_string(),
                version: GENERATOR_VERSION.to_string(),
                request_id: Uuid::now_v7(),
            },
        }
    }

    #[test]
    fn test_request_body_parses_camel_case() {
        let json = r#"{
            "requirements": "A token called Foo",
            "category": "erc20",
            "options": {"name": "Foo", "initialSupply": "100", "features": ["burnable"]}
        }"#;
        let body: GenerateRequestBody = serde_json::from_str(json).unwrap();
        let options = body.options.clone().unwrap();
        assert_eq!(options.initial_supply.as_deref(), Some("100"));
        assert_eq!(options.features, vec!["burnable".to_string()]);

        let request = body.into_request(&LimitsConfig::default()).unwrap();
        assert_eq!(request.category(), Some(Category::Erc20));
    }

    #[test]
    fn test_missing_requirements_is_validation_error() {
        let body: GenerateRequestBody = serde_json::from_str("{}").unwrap();
        let err = body.into_request(&LimitsConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Requirements are required");
    }

    #[test]
    fn test_unknown_category_is_validation_error() {
        let body = GenerateRequestBody {
            category: Some("lottery".to_string()),
            ..GenerateRequestBody::new("A lottery with weekly draws")
        };
        let err = body.into_request(&LimitsConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("lottery"));
    }

    #[test]
    fn test_blank_category_means_auto() {
        let body = GenerateRequestBody {
            category: Some("  ".to_string()),
            ..GenerateRequestBody::new("A lottery with weekly draws")
        };
        assert_eq!(body.into_request(&LimitsConfig::default()).unwrap().category(), None);
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = GenerateResponse::success(artifact());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["artifact"], "contract A {}");
        assert_eq!(json["data"]["category"], "erc20");
        assert_eq!(json["data"]["metadata"]["provider"], "anthropic");
        assert!(json["data"]["metadata"]["generatedAt"].is_string());
        assert!(json["data"]["metadata"]["requestId"].is_string());
        assert!(json.get("error").is_none());
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let err = GenerationError::Provider {
            attempts: 3,
            message: "HTTP 503".to_string(),
        };
        let response = GenerateResponse::from(Err(err));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "provider");
        assert!(json["error"]["message"].as_str().unwrap().contains("HTTP 503"));
        assert!(json.get("data").is_none());
        assert_eq!(response.status_code(), 502);
    }

    #[test]
    fn test_envelope_deserializes() {
        let response = GenerateResponse::success(artifact());
        let json = serde_json::to_string(&response).unwrap();
        let parsed: GenerateResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }
}
