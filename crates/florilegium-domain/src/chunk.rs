//! Chunk module - bounded windows of section text

/// One section of a document as produced by a [`crate::traits::DocumentReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Chapter title or section id
    pub id: String,
    /// Raw section text; may contain markup leftovers and irregular whitespace
    pub text: String,
}

impl Section {
    /// Create a section
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A window of section text sized for one generator call
///
/// Transient: produced by the chunker and consumed by the extraction run.
/// Identity is `(source_id, sequence_index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Section the window was cut from
    pub source_id: String,
    /// Position in the document-wide chunk sequence
    pub sequence_index: usize,
    /// Window text
    pub text: String,
    /// Heuristic page number, non-decreasing across a document
    pub estimated_page: usize,
    /// Start offset in the section, in characters
    pub start: usize,
    /// End offset (exclusive) in the section, in characters
    pub end: usize,
    /// Leading characters repeated from the previous window
    pub overlap: usize,
}

impl Chunk {
    /// Length of the window in characters
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }

    /// The part of the window not shared with the previous one
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte, _)) => &self.text[byte..],
            None => "",
        }
    }
}
