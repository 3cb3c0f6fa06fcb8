//! Error types for projgen-build.

use projgen_common::TargetId;
use thiserror::Error;

/// Result type for projgen-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while loading generator inputs.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Failed to read an input file.
    #[error("Failed to read input file: {0}")]
    ReadInput(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failed to parse the JSON build graph.
    #[error("Failed to parse build graph JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// Configuration validation error.
    #[error("Config validation error: {0}")]
    Validation(String),

    /// A target id is referenced but not defined.
    #[error("Target not found: {id} (referenced by {context})")]
    TargetNotFound { id: TargetId, context: &'static str },
}
