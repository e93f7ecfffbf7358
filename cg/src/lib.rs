//! contractgen - plain-language requirements to Solidity contracts
//!
//! A request passes through a fixed pipeline: the request governor admits or
//! rejects the caller, the classifier picks a contract category, the prompt
//! composer builds the instructions, the provider gateway calls the model with
//! retries, and the sanitizer turns the raw text into a checked source body.
//!
//! # Modules
//!
//! - [`classifier`] - Keyword-based category classification
//! - [`prompts`] - Embedded prompt templates and composition
//! - [`llm`] - Provider backends and the retrying gateway
//! - [`sanitizer`] - Narration stripping and structural checks
//! - [`governor`] - Per-caller sliding-window admission control
//! - [`generator`] - The pipeline tying the components together
//! - [`api`] - Request and response envelopes
//! - [`ipc`] - Unix socket server and client for serve mode
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod governor;
pub mod ipc;
pub mod llm;
pub mod prompts;
pub mod sanitizer;

pub use api::{GenerateRequestBody, GenerateResponse};
pub use classifier::{Classifier, classify};
pub use config::Config;
pub use domain::{Artifact, Category, GenerationOptions, GenerationRequest};
pub use error::{ErrorKind, GenerationError};
pub use generator::ContractGenerator;
pub use governor::RequestGovernor;
pub use llm::{LlmClient, LlmError, ProviderGateway, RetryPolicy};
pub use prompts::{PromptComposer, PromptPair};
pub use sanitizer::{Sanitizer, SanitizerRules, sanitize};
