//! Extraction run report

use serde::Serialize;

/// A chunk whose extraction failed after all retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    /// Document-wide index of the chunk
    pub sequence_index: usize,
    /// Section the chunk belongs to
    pub section_id: String,
    /// Last error reported by the capability
    pub reason: String,
}

/// Outcome of one extraction run over a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Document identifier the checkpoint is keyed on
    pub document: String,

    /// Chunks in the document
    pub chunks_total: usize,

    /// Chunks skipped because an earlier run committed them
    pub chunks_resumed: usize,

    /// Chunks whose candidates were committed in this run
    pub chunks_processed: usize,

    /// New candidates written
    pub candidates_created: usize,

    /// Payloads that matched an existing candidate
    pub duplicates_absorbed: usize,

    /// Payloads dropped for an empty quote
    pub payloads_rejected: usize,

    /// Chunks that failed after retries
    pub failed_chunks: Vec<ChunkFailure>,

    /// True when the run finished cleanly and the checkpoint was removed
    pub checkpoint_cleared: bool,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

impl ExtractionReport {
    pub(crate) fn new(document: &str, chunks_total: usize) -> Self {
        Self {
            document: document.to_string(),
            chunks_total,
            ..Default::default()
        }
    }

    /// True when no chunk failed
    pub fn is_complete(&self) -> bool {
        self.failed_chunks.is_empty()
    }

    /// Sequence indices of failed chunks
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed_chunks.iter().map(|f| f.sequence_index).collect()
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} chunks ({} resumed, {} processed, {} failed): {} created, {} duplicates, {} rejected",
            self.chunks_total,
            self.chunks_resumed,
            self.chunks_processed,
            self.failed_chunks.len(),
            self.candidates_created,
            self.duplicates_absorbed,
            self.payloads_rejected
        )
    }
}
