//! Approval lifecycle of a candidate
//!
//! PENDING is the only initial state. APPROVED and DECLINED are terminal:
//!
//! ```text
//! PENDING --(grouped)----------> APPROVED
//! PENDING --(judged positive)--> APPROVED
//! PENDING --(judged negative)--> DECLINED
//! ```

use crate::CandidateId;
use std::fmt;

/// Approval status of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalStatus {
    /// Awaiting a curation decision
    Pending,
    /// Accepted into the permanent collection
    Approved,
    /// Rejected
    Declined,
}

impl ApprovalStatus {
    /// Storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Declined => "DECLINED",
        }
    }

    /// Parse the storage form (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(ApprovalStatus::Pending),
            "APPROVED" => Some(ApprovalStatus::Approved),
            "DECLINED" => Some(ApprovalStatus::Declined),
            _ => None,
        }
    }

    /// True for APPROVED and DECLINED
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }

    /// Whether `self -> to` is an allowed transition
    pub fn can_transition_to(&self, to: ApprovalStatus) -> bool {
        matches!(
            (self, to),
            (ApprovalStatus::Pending, ApprovalStatus::Approved)
                | (ApprovalStatus::Pending, ApprovalStatus::Declined)
        )
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which curation phase made a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionPath {
    /// Approved because the candidate was placed into a group
    Grouping,
    /// Decided individually by the judgment capability
    Judgment,
}

impl DecisionPath {
    /// Storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionPath::Grouping => "grouping",
            DecisionPath::Judgment => "judgment",
        }
    }

    /// Parse the storage form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grouping" => Some(DecisionPath::Grouping),
            "judgment" => Some(DecisionPath::Judgment),
            _ => None,
        }
    }
}

/// Approval row, one per candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Approval {
    /// Candidate this approval belongs to
    pub candidate_id: CandidateId,
    /// Current status
    pub status: ApprovalStatus,
    /// When the status left PENDING (unix seconds)
    pub decided_at: Option<u64>,
    /// Which phase decided
    pub decided_via: Option<DecisionPath>,
    /// Rationale given by the judgment capability, if any
    pub note: Option<String>,
}
