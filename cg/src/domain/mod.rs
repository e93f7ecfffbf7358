//! Domain types for contractgen
//!
//! Categories, validated requests and the artifacts produced from them.

mod artifact;
mod category;
mod request;

pub use artifact::{Artifact, ArtifactMetadata, GENERATOR_VERSION};
pub use category::Category;
pub use request::{GenerationOptions, GenerationRequest};
