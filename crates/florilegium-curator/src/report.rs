//! Curation run report

use serde::Serialize;

/// A candidate left PENDING because judging it kept failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
    /// Candidate id
    pub candidate_id: String,
    /// Where the candidate was found
    pub source_identifier: String,
    /// Last error reported by the capability
    pub reason: String,
}

/// Outcome of one curation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurationReport {
    /// Run identifier; group labels are unique within it
    pub run_id: String,

    /// PENDING candidates at the start of the run
    pub candidates_considered: usize,

    /// Groups that received at least one member
    pub groups_created: usize,

    /// Grouping batches whose calls failed after retries
    pub grouping_batches_failed: usize,

    /// Candidates approved by joining a group
    pub approved_via_grouping: usize,

    /// Candidates approved by the judge
    pub approved_via_judgment: usize,

    /// Of `approved_via_judgment`, verdicts that were uncertain
    pub uncertain_resolved: usize,

    /// Candidates declined by the judge
    pub declined: usize,

    /// Candidates still PENDING after the run
    pub left_pending: Vec<CandidateFailure>,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

impl CurationReport {
    pub(crate) fn new(run_id: String) -> Self {
        Self {
            run_id,
            ..Default::default()
        }
    }

    /// True when every considered candidate reached a terminal status
    pub fn is_complete(&self) -> bool {
        self.left_pending.is_empty()
    }

    /// Total candidates moved out of PENDING
    pub fn decided(&self) -> usize {
        self.approved_via_grouping + self.approved_via_judgment + self.declined
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} considered: {} approved via {} groups, {} approved by judgment ({} uncertain), {} declined, {} left pending",
            self.candidates_considered,
            self.approved_via_grouping,
            self.groups_created,
            self.approved_via_judgment,
            self.uncertain_resolved,
            self.declined,
            self.left_pending.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = CurationReport::new("run".to_string());
        report.approved_via_grouping = 2;
        report.approved_via_judgment = 3;
        report.declined = 1;
        assert_eq!(report.decided(), 6);
        assert!(report.is_complete());

        report.left_pending.push(CandidateFailure {
            candidate_id: "1".to_string(),
            source_identifier: "Chapter 1 | p.1".to_string(),
            reason: "timeout".to_string(),
        });
        assert!(!report.is_complete());
        assert!(report.summary().contains("1 left pending"));
    }
}
