//! Error types for the Curator

use florilegium_domain::CapabilityError;
use thiserror::Error;

/// Errors that stop a curation run
#[derive(Error, Debug)]
pub enum CuratorError {
    /// Invalid batching or run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Candidate store error; fatal for the run
    #[error("Store error: {0}")]
    Persistence(String),

    /// A capability failed in a way no retry can fix
    #[error("{phase} failed: {source}")]
    Capability {
        /// "grouping" or "judgment"
        phase: &'static str,
        /// Underlying failure
        source: CapabilityError,
    },

    /// Generator output could not be interpreted
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for CuratorError {
    fn from(e: serde_json::Error) -> Self {
        CuratorError::InvalidFormat(e.to_string())
    }
}

impl CuratorError {
    /// True for errors caused by configuration rather than by the run
    pub fn is_config(&self) -> bool {
        matches!(self, CuratorError::Config(_))
    }
}
