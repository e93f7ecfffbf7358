//! Prompt templates and composition
//!
//! Templates are Handlebars `.pmt` files embedded at compile time, with
//! optional per-file overrides from a configured directory.

mod composer;
pub mod embedded;
mod loader;

pub use composer::{PromptComposer, PromptPair};
pub use loader::PromptLoader;
