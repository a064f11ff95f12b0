//! Overlapping character windows over document sections
//!
//! All sizes and offsets are in Unicode scalar values (`char`), never bytes,
//! so a window never splits a multi-byte character.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use florilegium_domain::{Chunk, Section};

/// Splits section text into bounded, overlapping chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunker {
    max_chunk_size: usize,
    overlap_size: usize,
    chars_per_page: usize,
    boundary_tolerance: usize,
}

impl TextChunker {
    /// Create a chunker that cuts at the hard limit only
    pub fn new(
        max_chunk_size: usize,
        overlap_size: usize,
        chars_per_page: usize,
    ) -> Result<Self, ExtractorError> {
        Self::with_boundary_tolerance(max_chunk_size, overlap_size, chars_per_page, 0)
    }

    /// Create a chunker that may end a chunk up to `boundary_tolerance`
    /// characters early to land just after whitespace
    pub fn with_boundary_tolerance(
        max_chunk_size: usize,
        overlap_size: usize,
        chars_per_page: usize,
        boundary_tolerance: usize,
    ) -> Result<Self, ExtractorError> {
        if max_chunk_size == 0 {
            return Err(ExtractorError::Config(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap_size >= max_chunk_size {
            return Err(ExtractorError::Config(format!(
                "overlap_size ({}) must be smaller than max_chunk_size ({})",
                overlap_size, max_chunk_size
            )));
        }
        if chars_per_page == 0 {
            return Err(ExtractorError::Config(
                "chars_per_estimated_page must be greater than 0".to_string(),
            ));
        }
        if boundary_tolerance > max_chunk_size {
            return Err(ExtractorError::Config(format!(
                "boundary_tolerance ({}) cannot exceed max_chunk_size ({})",
                boundary_tolerance, max_chunk_size
            )));
        }
        Ok(Self {
            max_chunk_size,
            overlap_size,
            chars_per_page,
            boundary_tolerance,
        })
    }

    /// Build a chunker from the extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::with_boundary_tolerance(
            config.max_chunk_size,
            config.effective_overlap(),
            config.chars_per_estimated_page,
            config.boundary_tolerance,
        )
    }

    /// Chunk a single section. Sequence indices and page estimates start
    /// from the beginning of the document.
    pub fn chunk(&self, section_id: &str, text: &str) -> Vec<Chunk> {
        let mut cursor = DocumentCursor::default();
        self.chunk_into(section_id, text, &mut cursor)
    }

    /// Chunk every section of a document in order.
    ///
    /// `sequence_index` is document-wide and the page estimate keeps counting
    /// across section boundaries.
    pub fn chunk_document(&self, sections: &[Section]) -> Vec<Chunk> {
        let mut cursor = DocumentCursor::default();
        let mut chunks = Vec::new();
        for section in sections {
            chunks.extend(self.chunk_into(&section.id, &section.text, &mut cursor));
        }
        chunks
    }

    fn chunk_into(&self, section_id: &str, text: &str, cursor: &mut DocumentCursor) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        self.windows(&chars)
            .into_iter()
            .map(|(start, end, overlap)| {
                let chunk = Chunk {
                    source_id: section_id.to_string(),
                    sequence_index: cursor.next_index,
                    text: chars[start..end].iter().collect(),
                    estimated_page: cursor.emitted_chars / self.chars_per_page + 1,
                    start,
                    end,
                    overlap,
                };
                cursor.next_index += 1;
                cursor.emitted_chars += end - start;
                chunk
            })
            .collect()
    }

    /// `(start, end, overlap)` char ranges covering `chars`
    fn windows(&self, chars: &[char]) -> Vec<(usize, usize, usize)> {
        let len = chars.len();
        if len == 0 {
            return Vec::new();
        }
        if len <= self.max_chunk_size {
            return vec![(0, len, 0)];
        }

        let mut windows = Vec::new();
        let mut start = 0;
        let mut overlap = 0;
        loop {
            let hard_end = (start + self.max_chunk_size).min(len);
            let end = if hard_end == len {
                len
            } else {
                self.boundary(chars, start, hard_end)
            };
            windows.push((start, end, overlap));
            if end == len {
                break;
            }
            // end > start + overlap_size, so the cursor always advances
            start = end - self.overlap_size;
            overlap = self.overlap_size;
        }
        windows
    }

    /// Position just after the last whitespace in the tolerance window before
    /// `hard_end`, or `hard_end` itself
    fn boundary(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let floor = hard_end
            .saturating_sub(self.boundary_tolerance)
            .max(start + self.overlap_size + 1);
        (floor..=hard_end)
            .rev()
            .find(|&end| chars[end - 1].is_whitespace())
            .unwrap_or(hard_end)
    }
}

#[derive(Debug, Default)]
struct DocumentCursor {
    next_index: usize,
    emitted_chars: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rebuild(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.fresh_text()).collect()
    }

    #[test]
    fn test_long_text_windows_and_pages() {
        let chunker = TextChunker::new(1000, 100, 2000).unwrap();
        let text = "x".repeat(2500);
        let chunks = chunker.chunk("Chapter 1", &text);

        let ranges: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(0, 1000), (900, 1900), (1800, 2500)]);

        let pages: Vec<_> = chunks.iter().map(|c| c.estimated_page).collect();
        assert_eq!(pages, vec![1, 1, 2]);

        let overlaps: Vec<_> = chunks.iter().map(|c| c.overlap).collect();
        assert_eq!(overlaps, vec![0, 100, 100]);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = TextChunker::new(100, 10, 2000).unwrap();
        let chunks = chunker.chunk("s", "Short text here.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Short text here.");
        assert_eq!(chunks[0].overlap, 0);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TextChunker::new(100, 10, 2000).unwrap();
        assert!(chunker.chunk("s", "").is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TextChunker::new(0, 0, 2000).unwrap_err().is_config());
        assert!(TextChunker::new(100, 100, 2000).unwrap_err().is_config());
        assert!(TextChunker::new(100, 10, 0).unwrap_err().is_config());
        assert!(TextChunker::with_boundary_tolerance(100, 10, 2000, 101).is_err());
    }

    #[test]
    fn test_boundary_prefers_whitespace() {
        let chunker = TextChunker::with_boundary_tolerance(20, 0, 2000, 8).unwrap();
        let text = "The patient man is rich in understanding";
        let chunks = chunker.chunk("s", text);

        assert_eq!(chunks[0].text, "The patient man is ");
        assert!(chunks.iter().all(|c| c.char_len() <= 20));
        assert_eq!(rebuild(&chunks), text);
    }

    #[test]
    fn test_boundary_falls_back_to_hard_limit() {
        let chunker = TextChunker::with_boundary_tolerance(10, 2, 2000, 3).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.chunk("s", text);
        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].start, 8);
    }

    #[test]
    fn test_multibyte_characters_are_counted_as_chars() {
        let chunker = TextChunker::new(4, 1, 2000).unwrap();
        let text = "قال علي";
        let chunks = chunker.chunk("s", text);
        assert!(chunks.iter().all(|c| c.char_len() <= 4));
        assert_eq!(rebuild(&chunks), text);
    }

    #[test]
    fn test_document_indices_and_pages_continue_across_sections() {
        let chunker = TextChunker::new(10, 0, 15).unwrap();
        let sections = vec![
            Section::new("One", "a".repeat(10)),
            Section::new("Two", "b".repeat(10)),
        ];
        let chunks = chunker.chunk_document(&sections);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].sequence_index, 0);
        assert_eq!(chunks[1].sequence_index, 1);
        assert_eq!(chunks[1].source_id, "Two");
        assert_eq!(chunks[0].estimated_page, 1);
        assert_eq!(chunks[1].estimated_page, 1);
        assert_eq!(chunks[1].start, 0);
    }

    proptest! {
        #[test]
        fn prop_chunks_rebuild_source(
            text in "[a-z \\n\u{0600}-\u{0620}]{0,400}",
            max in 2usize..60,
            overlap_pct in 0usize..90,
            tolerance_pct in 0usize..100,
        ) {
            let overlap = max * overlap_pct / 100;
            let tolerance = max * tolerance_pct / 100;
            let chunker = TextChunker::with_boundary_tolerance(max, overlap, 50, tolerance).unwrap();
            let chunks = chunker.chunk("s", &text);

            prop_assert_eq!(rebuild(&chunks), text.clone());
            for chunk in &chunks {
                prop_assert!(chunk.char_len() <= max);
                prop_assert!(chunk.char_len() > chunk.overlap);
            }
            for pair in chunks.windows(2) {
                prop_assert!(pair[0].estimated_page <= pair[1].estimated_page);
                prop_assert_eq!(pair[0].sequence_index + 1, pair[1].sequence_index);
            }
        }
    }
}
