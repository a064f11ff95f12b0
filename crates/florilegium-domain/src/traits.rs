//! Trait definitions for external interactions
//!
//! These traits define the boundaries between pipeline logic and
//! infrastructure. Implementations live in other crates.

use crate::{
    Approval, ApprovalStatus, Candidate, CandidateId, Checkpoint, DecisionPath, Group, GroupId,
    Membership, NewCandidate, RunId, Section,
};
use std::path::Path;

/// Result of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new candidate and its PENDING approval were written
    Created(CandidateId),
    /// `(source_identifier, quote_text)` already existed; nothing was written
    Duplicate,
}

impl InsertOutcome {
    /// True for [`InsertOutcome::Created`]
    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}

/// Candidate counts per approval status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Awaiting curation
    pub pending: usize,
    /// Approved
    pub approved: usize,
    /// Declined
    pub declined: usize,
}

impl StatusCounts {
    /// Sum of all statuses
    pub fn total(&self) -> usize {
        self.pending + self.approved + self.declined
    }
}

/// Persistence contract for candidates, approvals, groups and checkpoints
///
/// The store is the only component that mutates persistent entities and it
/// owns the uniqueness guarantee on `(source_identifier, quote_text)`.
/// Implemented by the infrastructure layer (florilegium-store).
pub trait CandidateStore {
    /// Error type for store operations
    type Error;

    /// Insert a candidate and its PENDING approval in one transaction, unless
    /// the `(source_identifier, quote_text)` pair is already stored.
    fn insert_candidate_if_absent(
        &mut self,
        candidate: NewCandidate,
    ) -> Result<InsertOutcome, Self::Error>;

    /// All PENDING candidates in creation order
    fn get_pending(&self) -> Result<Vec<Candidate>, Self::Error>;

    /// Move a PENDING approval to `status`. Returns `false` (and writes
    /// nothing) when the approval is already terminal.
    fn set_approval(
        &mut self,
        candidate_id: CandidateId,
        status: ApprovalStatus,
        via: DecisionPath,
        note: Option<&str>,
    ) -> Result<bool, Self::Error>;

    /// Get or create the group labelled `label` within `run_id`
    fn create_group(&mut self, run_id: RunId, label: &str) -> Result<GroupId, Self::Error>;

    /// Link a candidate to a group. Returns `false` if the link existed.
    fn add_membership(&mut self, membership: Membership) -> Result<bool, Self::Error>;

    /// In one transaction: link every member that is still PENDING and not
    /// yet grouped to the group labelled `label`, and approve it via grouping.
    /// Returns the group id and the members actually promoted. The group row
    /// is created only when at least one member is promoted.
    fn commit_group(
        &mut self,
        run_id: RunId,
        label: &str,
        members: &[CandidateId],
    ) -> Result<(GroupId, Vec<CandidateId>), Self::Error>;

    /// Record `last_processed_chunk_index` for a document
    fn save_checkpoint(
        &mut self,
        source_path: &str,
        last_processed_chunk_index: usize,
    ) -> Result<(), Self::Error>;

    /// Checkpoint for a document, if any
    fn load_checkpoint(&self, source_path: &str) -> Result<Option<Checkpoint>, Self::Error>;

    /// Delete a document's checkpoint. Returns `true` if one existed.
    fn clear_checkpoint(&mut self, source_path: &str) -> Result<bool, Self::Error>;

    /// Get a candidate by id
    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, Self::Error>;

    /// Get a candidate's approval row
    fn get_approval(&self, id: CandidateId) -> Result<Option<Approval>, Self::Error>;

    /// Number of stored candidates
    fn count_candidates(&self) -> Result<usize, Self::Error>;

    /// Candidate counts by status
    fn status_counts(&self) -> Result<StatusCounts, Self::Error>;

    /// Number of candidates without an approval row
    fn approvals_missing(&self) -> Result<usize, Self::Error>;

    /// Groups created by a curation run
    fn groups_for_run(&self, run_id: RunId) -> Result<Vec<Group>, Self::Error>;

    /// Memberships of a group
    fn memberships_for_group(&self, group_id: GroupId) -> Result<Vec<Membership>, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (florilegium-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate a completion constrained to JSON output (if supported)
    fn generate_json(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Turns a packaged document into `(section_id, raw_text)` pairs in order
pub trait DocumentReader {
    /// Error type for reading documents
    type Error;

    /// Read all sections of the document at `path`
    fn read_sections(&self, path: &Path) -> Result<Vec<Section>, Self::Error>;
}
