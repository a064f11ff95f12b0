//! Generator capabilities injected into the orchestrators
//!
//! Each capability is a blocking call from the orchestrator's point of view.
//! Implementations classify their failures so the caller knows whether a
//! retry can help. Closures implement the traits directly, which keeps test
//! doubles short.

use crate::{ApprovalStatus, Candidate, CandidateId, CandidatePayload};
use std::fmt;

/// Failure of a capability call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// Timeout, network failure, malformed-but-retryable output
    Transient(String),
    /// Misconfiguration or refusal that a retry cannot fix
    Terminal(String),
}

impl CapabilityError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CapabilityError::Transient(_))
    }
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityError::Transient(msg) => write!(f, "transient capability error: {}", msg),
            CapabilityError::Terminal(msg) => write!(f, "terminal capability error: {}", msg),
        }
    }
}

impl std::error::Error for CapabilityError {}

/// Extracts quote payloads from one chunk of text
pub trait ExtractCapability {
    /// Return zero or more payloads found in `chunk_text`
    fn extract(&self, chunk_text: &str) -> Result<Vec<CandidatePayload>, CapabilityError>;
}

impl<F> ExtractCapability for F
where
    F: Fn(&str) -> Result<Vec<CandidatePayload>, CapabilityError>,
{
    fn extract(&self, chunk_text: &str) -> Result<Vec<CandidatePayload>, CapabilityError> {
        self(chunk_text)
    }
}

/// A cluster proposed by the grouping capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedGroup {
    /// Shared label
    pub label: String,
    /// Members, drawn from the candidates passed in
    pub members: Vec<CandidateId>,
}

impl ProposedGroup {
    /// Create a proposal
    pub fn new(label: impl Into<String>, members: Vec<CandidateId>) -> Self {
        Self {
            label: label.into(),
            members,
        }
    }
}

/// Partitions a subset of candidates into labelled groups
pub trait GroupCapability {
    /// Propose groups over `candidates`. Candidates left out stay ungrouped.
    fn group(&self, candidates: &[Candidate]) -> Result<Vec<ProposedGroup>, CapabilityError>;
}

impl<F> GroupCapability for F
where
    F: Fn(&[Candidate]) -> Result<Vec<ProposedGroup>, CapabilityError>,
{
    fn group(&self, candidates: &[Candidate]) -> Result<Vec<ProposedGroup>, CapabilityError> {
        self(candidates)
    }
}

/// Outcome of an individual judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the candidate
    Approve,
    /// Reject the candidate
    Decline,
    /// The capability could not decide
    Uncertain,
}

/// Verdict plus optional free-text rationale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    /// Decision
    pub verdict: Verdict,
    /// Why, if the capability said so
    pub rationale: Option<String>,
}

impl Judgment {
    /// Approve without rationale
    pub fn approve() -> Self {
        Self {
            verdict: Verdict::Approve,
            rationale: None,
        }
    }

    /// Decline with a rationale
    pub fn decline(rationale: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Decline,
            rationale: Some(rationale.into()),
        }
    }

    /// Undecided
    pub fn uncertain() -> Self {
        Self {
            verdict: Verdict::Uncertain,
            rationale: None,
        }
    }

    /// Terminal status this judgment maps to. Uncertain resolves to approval;
    /// PENDING is never a valid outcome of judgment.
    pub fn resolved_status(&self) -> ApprovalStatus {
        match self.verdict {
            Verdict::Approve | Verdict::Uncertain => ApprovalStatus::Approved,
            Verdict::Decline => ApprovalStatus::Declined,
        }
    }
}

/// Decides a single candidate
pub trait JudgeCapability {
    /// Approve or decline `candidate`
    fn judge(&self, candidate: &Candidate) -> Result<Judgment, CapabilityError>;
}

impl<F> JudgeCapability for F
where
    F: Fn(&Candidate) -> Result<Judgment, CapabilityError>,
{
    fn judge(&self, candidate: &Candidate) -> Result<Judgment, CapabilityError> {
        self(candidate)
    }
}
