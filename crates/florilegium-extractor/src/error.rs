//! Error types for the Extractor

use florilegium_domain::CapabilityError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid chunking or run configuration; reported before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// Candidate store error; fatal for the run
    #[error("Store error: {0}")]
    Persistence(String),

    /// The capability failed in a way no retry can fix
    #[error("Chunk {sequence_index}: {source}")]
    Capability {
        /// Chunk being processed when the failure occurred
        sequence_index: usize,
        /// Underlying failure
        source: CapabilityError,
    },

    /// Retries for a chunk were exhausted and the run was configured to abort
    #[error("Chunk {sequence_index} failed after retries: {reason}")]
    ChunkFailed {
        /// Chunk that failed
        sequence_index: usize,
        /// Last error seen
        reason: String,
    },

    /// Generator output could not be interpreted
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidFormat(e.to_string())
    }
}

impl ExtractorError {
    /// True for errors caused by configuration rather than by the run
    pub fn is_config(&self) -> bool {
        matches!(self, ExtractorError::Config(_))
    }
}
