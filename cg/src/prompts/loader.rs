//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults. All templates are read and compiled up front so that
//! rendering never touches the filesystem.

use std::path::Path;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::embedded;

/// Compiled prompt templates
pub struct PromptLoader {
    /// Handlebars template engine with every template registered
    hbs: Handlebars<'static>,
}

impl PromptLoader {
    /// Create a loader, preferring `{name}.pmt` files in `override_dir`
    pub fn new(override_dir: Option<&Path>) -> Result<Self> {
        debug!(?override_dir, "PromptLoader::new: called");
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);

        for name in embedded::TEMPLATE_NAMES {
            let source = Self::load_template(name, override_dir)?;
            hbs.register_template_string(name, source)
                .map_err(|e| eyre!("Failed to compile prompt template {}: {}", name, e))?;
        }

        Ok(Self { hbs })
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Result<Self> {
        debug!("PromptLoader::embedded_only: called");
        Self::new(None)
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{override_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(name: &str, override_dir: Option<&Path>) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(dir) = override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                info!("Using prompt override {}", path.display());
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: no override");
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a registered template
    ///
    /// Templates are compiled at construction, so failure here means a data
    /// problem; the raw embedded text is returned instead of an error.
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> String {
        debug!(%template_name, "PromptLoader::render: called");
        match self.hbs.render(template_name, context) {
            Ok(text) => text,
            Err(e) => {
                warn!(%template_name, error = %e, "Failed to render prompt template, using raw text");
                embedded::get_embedded(template_name).unwrap_or_default().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_only_renders() {
        let loader = PromptLoader::embedded_only().unwrap();
        let text = loader.render("category-dao", &serde_json::json!({"category_name": "DAO Governance"}));
        assert!(text.starts_with("Contract type: DAO Governance"));
    }

    #[test]
    fn test_no_html_escaping() {
        let loader = PromptLoader::embedded_only().unwrap();
        let text = loader.render(
            "user",
            &serde_json::json!({"requirements": "balance >= 1 && owner != 0", "options_block": ""}),
        );
        assert!(text.contains("balance >= 1 && owner != 0"));
    }

    #[test]
    fn test_override_dir_takes_precedence() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("category-generic.pmt"), "Custom block for {{category_name}}").unwrap();

        let loader = PromptLoader::new(Some(temp.path())).unwrap();
        let text = loader.render("category-generic", &serde_json::json!({"category_name": "X"}));
        assert_eq!(text, "Custom block for X");

        // Other templates still come from the embedded set
        let system = loader.render("system", &serde_json::json!({}));
        assert!(system.contains("Solidity"));
    }

    #[test]
    fn test_malformed_override_fails_at_construction() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("user.pmt"), "{{#if requirements}}unclosed").unwrap();

        assert!(PromptLoader::new(Some(temp.path())).is_err());
    }
}
