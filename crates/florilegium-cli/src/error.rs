//! Error types for the CLI application.

use florilegium_curator::CuratorError;
use florilegium_extractor::ExtractorError;
use florilegium_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Candidate store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Extraction run error
    #[error("Extraction failed: {0}")]
    Extractor(#[from] ExtractorError),

    /// Curation run error
    #[error("Curation failed: {0}")]
    Curator(#[from] CuratorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The run finished but left work undone
    #[error("Partial success: {0}")]
    Partial(String),
}

impl CliError {
    /// Process exit code: 2 for partial success, 3 for configuration
    /// problems, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Partial(_) => 2,
            CliError::Config(_) | CliError::Toml(_) => 3,
            CliError::Extractor(e) if e.is_config() => 3,
            CliError::Curator(e) if e.is_config() => 3,
            _ => 1,
        }
    }
}
