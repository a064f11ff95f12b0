//! Florilegium Domain Layer
//!
//! Core model for the quote extraction and curation pipeline. This crate has
//! no I/O and only two small dependencies (uuid for identifiers, serde for the
//! data shapes that cross crate boundaries). It defines the entities and the
//! trait seams that every other crate depends upon.
//!
//! ## Key Concepts
//!
//! - **Chunk**: a bounded, overlap-extended window of section text
//! - **Candidate**: a provisional quote extracted by the generator
//! - **Approval**: the PENDING → APPROVED/DECLINED lifecycle of a candidate
//! - **Group**: a cluster of candidates that belong together
//! - **Checkpoint**: the last committed chunk of a document, for resuming
//!
//! ## Architecture
//!
//! - Pure data and state-transition rules only
//! - Storage, generator and document reading are traits ([`traits`], [`capability`])
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod approval;
pub mod candidate;
pub mod capability;
pub mod checkpoint;
pub mod chunk;
pub mod group;
pub mod ids;
pub mod traits;

// Re-exports for convenience
pub use approval::{Approval, ApprovalStatus, DecisionPath};
pub use candidate::{AdditionalInfo, Candidate, CandidatePayload, NewCandidate};
pub use capability::{
    CapabilityError, ExtractCapability, GroupCapability, JudgeCapability, Judgment, ProposedGroup,
    Verdict,
};
pub use checkpoint::Checkpoint;
pub use chunk::{Chunk, Section};
pub use group::{Group, Membership};
pub use ids::{CandidateId, GroupId, RunId};
pub use traits::{InsertOutcome, StatusCounts};

/// Current time in seconds since the Unix epoch.
///
/// Falls back to 0 if the system clock is set before 1970.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
