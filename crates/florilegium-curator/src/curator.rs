//! Two-phase curation of PENDING candidates

use crate::config::CuratorConfig;
use crate::error::CuratorError;
use crate::report::{CandidateFailure, CurationReport};
use florilegium_domain::traits::CandidateStore;
use florilegium_domain::{
    ApprovalStatus, Candidate, CandidateId, CapabilityError, DecisionPath, GroupCapability,
    GroupId, JudgeCapability, Judgment, ProposedGroup, RunId, Verdict,
};
use florilegium_llm::RetryPolicy;
use std::collections::HashSet;
use std::fmt::Display;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Moves PENDING candidates to a terminal status.
///
/// Phase A offers the pending candidates to the grouping capability in
/// overlapping batches; every member of a committed group is APPROVED.
/// Phase B asks the judge about each candidate still PENDING. Only PENDING
/// candidates are ever touched, so a run can be repeated safely.
pub struct Curator<G, J, S>
where
    G: GroupCapability,
    J: JudgeCapability,
    S: CandidateStore,
{
    grouper: Arc<G>,
    judge: Arc<J>,
    store: Arc<Mutex<S>>,
    retry: RetryPolicy,
    config: CuratorConfig,
}

impl<G, J, S> Curator<G, J, S>
where
    G: GroupCapability + Send + Sync + 'static,
    J: JudgeCapability + Send + Sync + 'static,
    S: CandidateStore,
    S::Error: Display,
{
    /// Create a new Curator owning `store`
    pub fn new(grouper: G, judge: J, store: S, config: CuratorConfig) -> Result<Self, CuratorError> {
        Self::with_shared_store(grouper, judge, Arc::new(Mutex::new(store)), config)
    }

    /// Create a Curator over a store shared with other components
    pub fn with_shared_store(
        grouper: G,
        judge: J,
        store: Arc<Mutex<S>>,
        config: CuratorConfig,
    ) -> Result<Self, CuratorError> {
        config.validate().map_err(CuratorError::Config)?;
        Ok(Self {
            grouper: Arc::new(grouper),
            judge: Arc::new(judge),
            store,
            retry: RetryPolicy::from(&config.retry),
            config,
        })
    }

    /// Replace the retry policy derived from the configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The shared store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Curate under a fresh run id
    pub async fn run(&self) -> Result<CurationReport, CuratorError> {
        self.run_with_id(RunId::new()).await
    }

    /// Curate under `run_id`. Group labels are unique within a run.
    pub async fn run_with_id(&self, run_id: RunId) -> Result<CurationReport, CuratorError> {
        let started = Instant::now();
        let mut report = CurationReport::new(run_id.to_string());

        let pending = self.with_store(|store| store.get_pending())?;
        report.candidates_considered = pending.len();
        info!(run_id = %run_id, pending = pending.len(), "Starting curation");

        self.group_phase(run_id, &pending, &mut report).await?;

        let remaining = self.with_store(|store| store.get_pending())?;
        self.judge_phase(&remaining, &mut report).await?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(run_id = %run_id, "Curation complete: {}", report.summary());
        Ok(report)
    }

    async fn group_phase(
        &self,
        run_id: RunId,
        pending: &[Candidate],
        report: &mut CurationReport,
    ) -> Result<(), CuratorError> {
        let mut placed: HashSet<CandidateId> = HashSet::new();
        let mut groups: HashSet<GroupId> = HashSet::new();

        for range in batch_ranges(pending.len(), self.config.group_batch_size, self.config.batch_step()) {
            let batch = &pending[range.clone()];
            let open = batch.iter().filter(|c| !placed.contains(&c.id)).count();
            if open < self.config.min_group_size {
                continue;
            }

            debug!(start = range.start, end = range.end, "Grouping batch");
            let proposals = match self.propose_groups(batch).await {
                Ok(proposals) => proposals,
                Err(CapabilityError::Terminal(reason)) => {
                    error!(error = %reason, "Grouping failed with a non-retryable error");
                    return Err(CuratorError::Capability {
                        phase: "grouping",
                        source: CapabilityError::Terminal(reason),
                    });
                }
                Err(CapabilityError::Transient(reason)) => {
                    // Its candidates fall through to judgment
                    warn!(start = range.start, end = range.end, error = %reason, "Grouping batch failed after retries");
                    report.grouping_batches_failed += 1;
                    continue;
                }
            };

            for proposal in proposals {
                let members = self.admissible_members(&proposal, batch, &placed);
                if members.len() < self.config.min_group_size {
                    debug!(label = %proposal.label, members = members.len(), "Group too small, skipped");
                    continue;
                }

                let (group_id, promoted) =
                    self.with_store(|store| store.commit_group(run_id, &proposal.label, &members))?;
                if promoted.is_empty() {
                    continue;
                }
                info!(label = %proposal.label, members = promoted.len(), "Group committed");
                groups.insert(group_id);
                report.approved_via_grouping += promoted.len();
                placed.extend(promoted);
            }
        }

        report.groups_created = groups.len();
        Ok(())
    }

    /// Members of `proposal` that are in `batch`, not yet placed, listed once
    fn admissible_members(
        &self,
        proposal: &ProposedGroup,
        batch: &[Candidate],
        placed: &HashSet<CandidateId>,
    ) -> Vec<CandidateId> {
        let mut seen = HashSet::new();
        proposal
            .members
            .iter()
            .copied()
            .filter(|id| batch.iter().any(|c| c.id == *id))
            .filter(|id| !placed.contains(id))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    async fn judge_phase(
        &self,
        remaining: &[Candidate],
        report: &mut CurationReport,
    ) -> Result<(), CuratorError> {
        for candidate in remaining {
            let judgment = match self.judge_candidate(candidate).await {
                Ok(judgment) => judgment,
                Err(CapabilityError::Terminal(reason)) => {
                    error!(candidate = %candidate.id, error = %reason, "Judgment failed with a non-retryable error");
                    return Err(CuratorError::Capability {
                        phase: "judgment",
                        source: CapabilityError::Terminal(reason),
                    });
                }
                Err(CapabilityError::Transient(reason)) => {
                    warn!(candidate = %candidate.id, error = %reason, "Judgment failed after retries, left pending");
                    report.left_pending.push(CandidateFailure {
                        candidate_id: candidate.id.to_string(),
                        source_identifier: candidate.source_identifier.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let status = judgment.resolved_status();
            let applied = self.with_store(|store| {
                store.set_approval(
                    candidate.id,
                    status,
                    DecisionPath::Judgment,
                    judgment.rationale.as_deref(),
                )
            })?;
            if !applied {
                debug!(candidate = %candidate.id, "Already decided, verdict ignored");
                continue;
            }

            match status {
                ApprovalStatus::Declined => report.declined += 1,
                _ => {
                    report.approved_via_judgment += 1;
                    if judgment.verdict == Verdict::Uncertain {
                        report.uncertain_resolved += 1;
                    }
                }
            }
        }
        Ok(())
    }

    async fn propose_groups(&self, batch: &[Candidate]) -> Result<Vec<ProposedGroup>, CapabilityError> {
        self.retry
            .retry("group batch", || {
                let grouper = Arc::clone(&self.grouper);
                let batch = batch.to_vec();
                self.call_blocking("grouping", move || grouper.group(&batch))
            })
            .await
    }

    async fn judge_candidate(&self, candidate: &Candidate) -> Result<Judgment, CapabilityError> {
        let operation = format!("judge candidate {}", candidate.id);
        self.retry
            .retry(&operation, || {
                let judge = Arc::clone(&self.judge);
                let candidate = candidate.clone();
                self.call_blocking("judgment", move || judge.judge(&candidate))
            })
            .await
    }

    /// One capability call on the blocking pool. A timeout is transient.
    async fn call_blocking<T, F>(&self, what: &'static str, f: F) -> Result<T, CapabilityError>
    where
        F: FnOnce() -> Result<T, CapabilityError> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::task::spawn_blocking(f);
        let joined = match self.config.call_timeout() {
            Some(limit) => timeout(limit, task).await.map_err(|_| {
                CapabilityError::Transient(format!("{} timed out after {:?}", what, limit))
            })?,
            None => task.await,
        };
        joined.map_err(|e| CapabilityError::Terminal(format!("{} task failed: {}", what, e)))?
    }

    /// Run `f` with the store locked. The lock is never held across an await.
    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut S) -> Result<T, S::Error>,
    ) -> Result<T, CuratorError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| CuratorError::Persistence(format!("Store lock poisoned: {}", e)))?;
        f(&mut store).map_err(|e| CuratorError::Persistence(e.to_string()))
    }
}

/// Windows of `size` over `len` items, each starting `step` after the last.
/// The final window ends at `len`.
pub(crate) fn batch_ranges(len: usize, size: usize, step: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + size).min(len);
        ranges.push(start..end);
        if end == len {
            break;
        }
        start += step.max(1);
    }
    ranges
}
