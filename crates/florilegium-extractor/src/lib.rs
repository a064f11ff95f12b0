//! Florilegium Extractor
//!
//! Turns a document into PENDING candidate quotes.
//!
//! # Overview
//!
//! A document arrives as ordered sections. The chunker cuts them into
//! overlapping windows; each window is handed to an extraction capability,
//! and every quote it returns is stored once, keyed on its source identifier
//! and text. A per-document checkpoint makes runs resumable.
//!
//! # Architecture
//!
//! ```text
//! Sections → TextChunker → ExtractCapability → CandidateStore
//!                                 ↑                  ↓
//!                            RetryPolicy         Checkpoint
//! ```
//!
//! # Key Features
//!
//! - **Character-based chunking** with overlap and whitespace-aware boundaries
//! - **Idempotent persistence**: re-running a document never duplicates quotes
//! - **Resumable runs**: the checkpoint only names fully committed chunks
//! - **Bounded retries** with exponential backoff and a per-call timeout
//! - **Failure policy**: skip failed chunks or abort the run
//!
//! # Example Usage
//!
//! ```no_run
//! use florilegium_domain::Section;
//! use florilegium_extractor::{Extractor, ExtractorConfig, LlmExtractCapability};
//! use florilegium_llm::MockProvider;
//! use florilegium_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let capability = LlmExtractCapability::new(MockProvider::new("[]"));
//! let store = SqliteStore::new(":memory:")?;
//! let extractor = Extractor::new(capability, store, ExtractorConfig::default())?;
//!
//! let sections = vec![Section::new("Chapter 1", "He said: \"Patience is light.\"")];
//! let report = extractor.run("book.txt", &sections).await?;
//!
//! println!("Created: {} candidates", report.candidates_created);
//! println!("Failed chunks: {:?}", report.failed_indices());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod capability;
mod chunking;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use capability::LlmExtractCapability;
pub use chunking::TextChunker;
pub use config::{ExtractorConfig, FailurePolicy};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use parser::parse_extraction_response;
pub use prompt::PromptBuilder;
pub use types::{ChunkFailure, ExtractionReport};
