//! Validated generation request

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Category;
use crate::config::LimitsConfig;
use crate::error::GenerationError;

/// Optional structured hints supplied alongside the requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Accepts a JSON string or number
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "supply_from_string_or_number")]
    pub initial_supply: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SupplyValue {
    Text(String),
    Number(serde_json::Number),
}

fn supply_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<SupplyValue>::deserialize(deserializer)?.map(|value| match value {
        SupplyValue::Text(text) => text,
        SupplyValue::Number(number) => number.to_string(),
    }))
}

impl GenerationOptions {
    /// `KEY: value` pairs for every present option, in a fixed order
    ///
    /// Blank values are treated as absent.
    pub fn prompt_lines(&self) -> Vec<String> {
        debug!("GenerationOptions::prompt_lines: called");
        let mut lines = Vec::new();

        if let Some(name) = present(&self.name) {
            lines.push(format!("NAME: {}", name));
        }
        if let Some(symbol) = present(&self.symbol) {
            lines.push(format!("SYMBOL: {}", symbol));
        }
        if let Some(supply) = present(&self.initial_supply) {
            lines.push(format!("INITIAL_SUPPLY: {}", supply));
        }

        let features: Vec<&str> = self
            .features
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();
        if !features.is_empty() {
            lines.push(format!("FEATURES: {}", features.join(", ")));
        }

        lines
    }

    /// True when no option carries a value
    pub fn is_empty(&self) -> bool {
        self.prompt_lines().is_empty()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A generation request that has passed input validation
///
/// Only constructible through [`GenerationRequest::new`], so holding one means
/// the requirements are within bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    requirements: String,
    category: Option<Category>,
    options: GenerationOptions,
}

impl GenerationRequest {
    /// Validate and build a request
    pub fn new(
        requirements: impl Into<String>,
        category: Option<Category>,
        options: GenerationOptions,
        limits: &LimitsConfig,
    ) -> Result<Self, GenerationError> {
        let requirements = requirements.into().trim().to_string();
        let len = requirements.chars().count();
        debug!(%len, ?category, "GenerationRequest::new: called");

        if requirements.is_empty() {
            debug!("GenerationRequest::new: empty requirements");
            return Err(GenerationError::validation("Requirements are required"));
        }
        if len < limits.min_requirements_chars {
            debug!(%len, "GenerationRequest::new: requirements too short");
            return Err(GenerationError::validation(format!(
                "Requirements must be at least {} characters",
                limits.min_requirements_chars
            )));
        }
        if len > limits.max_requirements_chars {
            debug!(%len, "GenerationRequest::new: requirements too long");
            return Err(GenerationError::validation(format!(
                "Requirements must be at most {} characters",
                limits.max_requirements_chars
            )));
        }

        Ok(Self {
            requirements,
            category,
            options,
        })
    }

    /// The trimmed requirements text
    pub fn requirements(&self) -> &str {
        &self.requirements
    }

    /// Explicit category override, if the caller supplied one
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}
