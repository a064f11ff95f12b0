//! Florilegium Curator
//!
//! Decides the fate of PENDING candidates.
//!
//! A run first offers the pending candidates, in document order and in
//! overlapping batches, to a grouping capability. Candidates that end up in
//! a group of at least `min_group_size` members are APPROVED together with
//! their group in one transaction. Every candidate still PENDING is then
//! judged on its own: approve, decline or uncertain, where uncertain counts
//! as approve.
//!
//! APPROVED and DECLINED are terminal. The store only ever moves a candidate
//! out of PENDING, so rerunning the curator is safe.
//!
//! # Example Usage
//!
//! ```no_run
//! use florilegium_curator::{Curator, CuratorConfig, LlmGroupCapability, LlmJudgeCapability};
//! use florilegium_llm::OllamaProvider;
//! use florilegium_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProvider::default_endpoint("llama3");
//! let curator = Curator::new(
//!     LlmGroupCapability::new(provider.clone()),
//!     LlmJudgeCapability::new(provider),
//!     SqliteStore::new("florilegium.db")?,
//!     CuratorConfig::default(),
//! )?;
//!
//! let report = curator.run().await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod capability;
mod config;
mod curator;
mod error;
mod parser;
mod prompt;
mod report;


pub use capability::{LlmGroupCapability, LlmJudgeCapability};
pub use config::CuratorConfig;
pub use curator::Curator;
pub use error::CuratorError;
pub use parser::{parse_group_response, parse_verdict, ParsedGroup};
pub use report::{CandidateFailure, CurationReport};
