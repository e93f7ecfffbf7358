//! Prompt composition
//!
//! Turns requirements, a category and options into the system/user prompt
//! pair sent to the provider.

use serde::Serialize;
use tracing::debug;

use super::PromptLoader;
use crate::domain::{Category, GenerationOptions};

/// System and user instructions for one provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Context for category instruction blocks
#[derive(Debug, Serialize)]
struct CategoryContext<'a> {
    category_id: &'a str,
    category_name: &'a str,
}

/// Context for the user instruction
#[derive(Debug, Serialize)]
struct UserContext<'a> {
    requirements: &'a str,
    options_block: String,
}

/// Builds prompt pairs from compiled templates
pub struct PromptComposer {
    loader: PromptLoader,
}

impl PromptComposer {
    pub fn new(loader: PromptLoader) -> Self {
        debug!("PromptComposer::new: called");
        Self { loader }
    }

    /// Composer over the embedded templates only
    pub fn embedded() -> eyre::Result<Self> {
        debug!("PromptComposer::embedded: called");
        Ok(Self::new(PromptLoader::embedded_only()?))
    }

    /// Compose the prompt pair for a request
    ///
    /// Deterministic for equal inputs; no I/O happens here.
    pub fn compose(&self, requirements: &str, category: Category, options: &GenerationOptions) -> PromptPair {
        debug!(%category, "compose: called");

        let baseline = self.loader.render("system", &serde_json::json!({}));
        let block = self.loader.render(
            category.template_name(),
            &CategoryContext {
                category_id: category.id(),
                category_name: category.name(),
            },
        );
        let system = format!("{}\n\n{}", baseline.trim(), block.trim());

        let lines = options.prompt_lines();
        let options_block = if lines.is_empty() {
            String::new()
        } else {
            format!("\n\n{}", lines.join("\n"))
        };
        let user = self
            .loader
            .render(
                "user",
                &UserContext {
                    requirements: requirements.trim(),
                    options_block,
                },
            )
            .trim()
            .to_string();

        debug!(system_len = system.len(), user_len = user.len(), "compose: done");
        PromptPair { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> PromptComposer {
        PromptComposer::embedded().unwrap()
    }

    fn token_options() -> GenerationOptions {
        GenerationOptions {
            name: Some("MyToken".to_string()),
            symbol: Some("MTK".to_string()),
            initial_supply: Some("1000000".to_string()),
            features: vec!["mintable".to_string(), "burnable".to_string()],
        }
    }

    #[test]
    fn test_compose_is_pure() {
        let composer = composer();
        let a = composer.compose("A simple token with a fixed supply", Category::Erc20, &token_options());
        let b = composer.compose("A simple token with a fixed supply", Category::Erc20, &token_options());
        assert_eq!(a, b);
    }

    #[test]
    fn test_system_has_baseline_then_category_block() {
        let pair = composer().compose("A governance contract", Category::Dao, &GenerationOptions::default());

        let baseline_at = pair.system.find("Output format:").unwrap();
        let block_at = pair.system.find("Contract type: DAO Governance").unwrap();
        assert!(baseline_at < block_at);
        assert!(pair.system.contains("\n\nContract type: DAO Governance"));
    }

    #[test]
    fn test_user_lists_present_options_in_order() {
        let pair = composer().compose("A simple token", Category::Erc20, &token_options());

        let expected = "A simple token\n\nNAME: MyToken\nSYMBOL: MTK\nINITIAL_SUPPLY: 1000000\nFEATURES: mintable, burnable";
        assert!(pair.user.starts_with(expected), "user prompt was {:?}", pair.user);
        assert!(pair.user.ends_with("Code only, no explanation."));
    }

    #[test]
    fn test_user_without_options() {
        let pair = composer().compose("  A vault for staking  ", Category::DeFi, &GenerationOptions::default());

        assert!(pair.user.starts_with("A vault for staking\n\nReturn only"));
        assert!(!pair.user.contains("NAME:"));
        assert!(!pair.user.contains("FEATURES:"));
    }

    #[test]
    fn test_partial_options() {
        let options = GenerationOptions {
            symbol: Some("ART".to_string()),
            ..Default::default()
        };
        let pair = composer().compose("An NFT collection", Category::Erc721, &options);

        assert!(pair.user.contains("\n\nSYMBOL: ART\n\n"));
        assert!(!pair.user.contains("NAME:"));
    }

    #[test]
    fn test_every_category_composes() {
        let composer = composer();
        for category in Category::ALL {
            let pair = composer.compose("Some requirements text", category, &GenerationOptions::default());
            assert!(pair.system.contains(category.name()), "{} block missing", category);
        }
    }
}
