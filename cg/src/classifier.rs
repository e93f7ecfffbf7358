//! Category classification
//!
//! Maps free-text requirements to a [`Category`] by lowercase substring
//! matching against per-category keyword lists, checked in declaration order.

use tracing::debug;

use crate::domain::Category;

/// Ordered keyword table
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(Category, Vec<String>)>,
}

impl Default for Classifier {
    fn default() -> Self {
        let rules = Category::ALL
            .iter()
            .map(|category| {
                let keywords = category.keywords().iter().map(|k| k.to_string()).collect();
                (*category, keywords)
            })
            .collect();
        Self { rules }
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keywords to a category; declaration order is unchanged
    pub fn with_keywords<I, S>(mut self, category: Category, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        debug!(%category, "Classifier::with_keywords: called");
        if let Some((_, list)) = self.rules.iter_mut().find(|(c, _)| *c == category) {
            list.extend(
                keywords
                    .into_iter()
                    .map(|k| k.as_ref().trim().to_lowercase())
                    .filter(|k| !k.is_empty()),
            );
        }
        self
    }

    /// Keywords currently registered for a category
    pub fn keywords(&self, category: Category) -> &[String] {
        self.rules
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }

    /// First category with a keyword contained in the requirements, else generic
    pub fn classify(&self, requirements: &str) -> Category {
        let text = requirements.to_lowercase();
        for (category, keywords) in &self.rules {
            if let Some(keyword) = keywords.iter().find(|k| text.contains(k.as_str())) {
                debug!(%category, %keyword, "classify: matched");
                return *category;
            }
        }
        debug!("classify: no keyword matched, using generic");
        Category::Generic
    }
}

/// Classify with the default keyword table
pub fn classify(requirements: &str) -> Category {
    Classifier::default().classify(requirements)
}
