//! Resume marker for a document's extraction run

/// Last chunk of a document whose candidates are durably committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Document path or identifier
    pub source_path: String,
    /// `sequence_index` of the last committed chunk
    pub last_processed_chunk_index: usize,
    /// When the checkpoint was last written (unix seconds)
    pub updated_at: u64,
}

impl Checkpoint {
    /// Whether a chunk was already committed by an earlier run
    pub fn covers(&self, sequence_index: usize) -> bool {
        sequence_index <= self.last_processed_chunk_index
    }
}
