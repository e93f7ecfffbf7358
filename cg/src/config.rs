//! contractgen configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::llm::LlmError;

/// Main contractgen configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Per-caller admission control
    pub governor: GovernorConfig,

    /// Input bounds
    pub limits: LimitsConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .contractgen.yml
        let local_config = PathBuf::from(".contractgen.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/contractgen/contractgen.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("contractgen").join("contractgen.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only `log-level`, for setting up logging before the full load
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Supported generative-text backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    OpenAI,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Active provider
    pub provider: ProviderKind,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-attempt timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Attempts per request, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; attempt `n` waits `2^n` units
    #[serde(rename = "backoff-unit-ms")]
    pub backoff_unit_ms: u64,

    /// Anthropic Messages API settings
    pub anthropic: ProviderConfig,

    /// OpenAI Chat Completions API settings
    pub openai: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            max_tokens: 4000,
            temperature: 0.3,
            timeout_ms: 30_000,
            max_attempts: 3,
            backoff_unit_ms: 1000,
            anthropic: ProviderConfig {
                model: "claude-sonnet-4-20250514".to_string(),
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
                base_url: "https://api.anthropic.com".to_string(),
            },
            openai: ProviderConfig {
                model: "gpt-4o".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: "https://api.openai.com".to_string(),
            },
        }
    }
}

impl LlmConfig {
    /// Pick the settings block for the active provider
    pub fn resolve(&self) -> ResolvedLlmConfig {
        debug!(provider = %self.provider, "LlmConfig::resolve: called");
        let defaults = Self::default();
        let (block, fallback) = match self.provider {
            ProviderKind::Anthropic => (&self.anthropic, &defaults.anthropic),
            ProviderKind::OpenAI => (&self.openai, &defaults.openai),
        };

        ResolvedLlmConfig {
            provider: self.provider,
            model: or_default(&block.model, &fallback.model),
            api_key_env: or_default(&block.api_key_env, &fallback.api_key_env),
            base_url: or_default(&block.base_url, &fallback.base_url)
                .trim_end_matches('/')
                .to_string(),
            timeout_ms: self.timeout_ms,
        }
    }

    /// Per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff unit as a Duration
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

/// Blank settings fall back to the provider's built-in value
fn or_default(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.trim().to_string()
    }
}

/// Settings for one provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Flattened settings for the active provider
#[derive(Debug, Clone)]
pub struct ResolvedLlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        debug!(api_key_env = %self.api_key_env, "ResolvedLlmConfig::get_api_key: called");
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => {
                debug!("ResolvedLlmConfig::get_api_key: not set");
                Err(LlmError::MissingCredential {
                    provider: self.provider.to_string(),
                    env_var: self.api_key_env.clone(),
                })
            }
        }
    }
}

/// Per-caller sliding window admission limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Admissions allowed per identity per window
    #[serde(rename = "max-requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(rename = "window-secs")]
    pub window_secs: u64,

    /// How often `serve` drops idle identities, in seconds
    #[serde(rename = "sweep-interval-secs")]
    pub sweep_interval_secs: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 15 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl GovernorConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Bounds on caller input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Minimum requirements length in characters, after trimming
    #[serde(rename = "min-requirements-chars")]
    pub min_requirements_chars: usize,

    /// Maximum requirements length in characters
    #[serde(rename = "max-requirements-chars")]
    pub max_requirements_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_requirements_chars: 10,
            max_requirements_chars: 5000,
        }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory holding `{name}.pmt` overrides of the embedded templates
    pub dir: Option<PathBuf>,
}
