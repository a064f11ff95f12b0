//! Groups of candidates that belong together

use crate::{CandidateId, GroupId, RunId};

/// A cluster of candidates created during a curation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Surrogate key
    pub id: GroupId,
    /// Shared label proposed by the grouping capability
    pub label: String,
    /// Curation run that created the group
    pub run_id: RunId,
    /// Creation time (unix seconds)
    pub created_at: u64,
}

/// Link between a candidate and a group
///
/// Modelled as many-to-many; the curation workflow places a candidate in at
/// most one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Membership {
    /// Member candidate
    pub candidate_id: CandidateId,
    /// Group it belongs to
    pub group_id: GroupId,
}
