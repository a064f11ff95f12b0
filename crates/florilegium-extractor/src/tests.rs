//! Behaviour tests for the Extractor with hand-written capability doubles

#[cfg(test)]
mod tests {
    use crate::{Extractor, ExtractorConfig, ExtractorError, FailurePolicy};
    use florilegium_domain::traits::{CandidateStore, InsertOutcome, StatusCounts};
    use florilegium_domain::{
        Approval, ApprovalStatus, Candidate, CandidateId, CandidatePayload, CapabilityError,
        Checkpoint, DecisionPath, Group, GroupId, Membership, NewCandidate, RunId, Section,
    };
    use florilegium_llm::RetryPolicy;
    use florilegium_store::{SqliteStore, StoreError};
    use std::sync::{Arc, Mutex};

    const DOC: &str = "sayings.txt";

    type Reply = Result<Vec<CandidatePayload>, CapabilityError>;

    /// Records every chunk it sees; replies through `script`
    #[derive(Clone)]
    struct Scripted {
        calls: Arc<Mutex<Vec<String>>>,
        script: Arc<dyn Fn(&str, usize) -> Reply + Send + Sync>,
    }

    impl Scripted {
        /// `script` gets the chunk text and how often that text was seen before
        fn new(script: impl Fn(&str, usize) -> Reply + Send + Sync + 'static) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                script: Arc::new(script),
            }
        }

        /// Every chunk yields one quote equal to its text
        fn echo() -> Self {
            Self::new(|text, _| Ok(vec![CandidatePayload::quote(text)]))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl florilegium_domain::ExtractCapability for Scripted {
        fn extract(&self, chunk_text: &str) -> Reply {
            let seen = {
                let mut calls = self.calls.lock().unwrap();
                let seen = calls.iter().filter(|c| c.as_str() == chunk_text).count();
                calls.push(chunk_text.to_string());
                seen
            };
            (self.script)(chunk_text, seen)
        }
    }

    /// Three sections of ten identical letters: chunks "aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc"
    fn sections() -> Vec<Section> {
        vec![
            Section::new("One", "a".repeat(10)),
            Section::new("Two", "b".repeat(10)),
            Section::new("Three", "c".repeat(10)),
        ]
    }

    fn config(policy: FailurePolicy) -> ExtractorConfig {
        ExtractorConfig {
            max_chunk_size: 10,
            overlap_size: Some(0),
            boundary_tolerance: 0,
            on_chunk_failure: policy,
            ..Default::default()
        }
    }

    fn extractor(
        capability: Scripted,
        store: Arc<Mutex<SqliteStore>>,
        policy: FailurePolicy,
    ) -> Extractor<Scripted, SqliteStore> {
        Extractor::with_shared_store(capability, store, config(policy))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(3, 1, 1))
    }

    fn shared_store() -> Arc<Mutex<SqliteStore>> {
        Arc::new(Mutex::new(SqliteStore::in_memory().unwrap()))
    }

    fn fails_on_b(text: &str, _seen: usize) -> Reply {
        if text.starts_with('b') {
            Err(CapabilityError::Transient("connection reset".into()))
        } else {
            Ok(vec![CandidatePayload::quote(text)])
        }
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let store = shared_store();
        let extractor = extractor(Scripted::echo(), store.clone(), FailurePolicy::Skip);

        let report = extractor.run(DOC, &sections()).await.unwrap();

        assert_eq!(report.chunks_total, 3);
        assert_eq!(report.chunks_processed, 3);
        assert_eq!(report.candidates_created, 3);
        assert!(report.is_complete());
        assert!(report.checkpoint_cleared);
        assert!(!extractor.has_unfinished_work(DOC).unwrap());

        let store = store.lock().unwrap();
        assert_eq!(store.status_counts().unwrap().pending, 3);
        assert_eq!(store.approvals_missing().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let store = shared_store();
        let extractor = extractor(Scripted::echo(), store.clone(), FailurePolicy::Skip);

        extractor.run(DOC, &sections()).await.unwrap();
        let second = extractor.run(DOC, &sections()).await.unwrap();

        assert_eq!(second.candidates_created, 0);
        assert_eq!(second.duplicates_absorbed, 3);
        assert_eq!(store.lock().unwrap().count_candidates().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_resume_skips_committed_chunks() {
        let store = shared_store();
        store.lock().unwrap().save_checkpoint(DOC, 0).unwrap();

        let capability = Scripted::echo();
        let extractor = extractor(capability.clone(), store, FailurePolicy::Skip);
        let report = extractor.run(DOC, &sections()).await.unwrap();

        assert_eq!(report.chunks_resumed, 1);
        assert_eq!(report.chunks_processed, 2);
        assert_eq!(capability.calls(), vec!["b".repeat(10), "c".repeat(10)]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let capability = Scripted::new(|text, seen| {
            if text.starts_with('b') && seen < 2 {
                Err(CapabilityError::Transient("timeout".into()))
            } else {
                Ok(vec![CandidatePayload::quote(text)])
            }
        });
        let extractor = extractor(capability.clone(), shared_store(), FailurePolicy::Skip);

        let report = extractor.run(DOC, &sections()).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.candidates_created, 3);
        assert_eq!(capability.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_skipped_failure_freezes_checkpoint() {
        let store = shared_store();
        let failing = extractor(Scripted::new(fails_on_b), store.clone(), FailurePolicy::Skip);

        let report = failing.run(DOC, &sections()).await.unwrap();

        assert_eq!(report.failed_indices(), vec![1]);
        assert_eq!(report.candidates_created, 2);
        assert!(!report.checkpoint_cleared);
        let checkpoint = failing.checkpoint(DOC).unwrap().unwrap();
        assert_eq!(checkpoint.last_processed_chunk_index, 0);

        // The next run picks up at the failed chunk; chunk 2 is already stored
        let capability = Scripted::echo();
        let healthy = extractor(capability.clone(), store.clone(), FailurePolicy::Skip);
        let report = healthy.run(DOC, &sections()).await.unwrap();

        assert_eq!(capability.calls(), vec!["b".repeat(10), "c".repeat(10)]);
        assert_eq!(report.candidates_created, 1);
        assert_eq!(report.duplicates_absorbed, 1);
        assert!(report.checkpoint_cleared);
        assert_eq!(store.lock().unwrap().count_candidates().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_abort_policy_stops_at_failed_chunk() {
        let capability = Scripted::new(fails_on_b);
        let extractor = extractor(capability.clone(), shared_store(), FailurePolicy::Abort);

        let result = extractor.run(DOC, &sections()).await;

        assert!(matches!(
            result,
            Err(ExtractorError::ChunkFailed { sequence_index: 1, .. })
        ));
        assert!(!capability.calls().contains(&"c".repeat(10)));
        let checkpoint = extractor.checkpoint(DOC).unwrap().unwrap();
        assert_eq!(checkpoint.last_processed_chunk_index, 0);
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let capability = Scripted::new(|text, _| {
            if text.starts_with('b') {
                Err(CapabilityError::Terminal("model not found".into()))
            } else {
                Ok(vec![])
            }
        });
        let extractor = extractor(capability.clone(), shared_store(), FailurePolicy::Skip);

        let result = extractor.run(DOC, &sections()).await;

        assert!(matches!(
            result,
            Err(ExtractorError::Capability { sequence_index: 1, .. })
        ));
        let b_calls = capability
            .calls()
            .iter()
            .filter(|c| c.starts_with('b'))
            .count();
        assert_eq!(b_calls, 1);
        assert!(extractor.has_unfinished_work(DOC).unwrap());
    }

    #[tokio::test]
    async fn test_timeout_counts_as_transient_failure() {
        let capability = Scripted::new(|text, _| {
            if text.starts_with('a') {
                std::thread::sleep(std::time::Duration::from_millis(1_500));
            }
            Ok(vec![CandidatePayload::quote(text)])
        });
        let config = ExtractorConfig {
            call_timeout_secs: 1,
            ..config(FailurePolicy::Skip)
        };
        let extractor = Extractor::with_shared_store(capability, shared_store(), config)
            .unwrap()
            .with_retry_policy(RetryPolicy::none());

        let report = extractor.run(DOC, &sections()).await.unwrap();

        assert_eq!(report.failed_indices(), vec![0]);
        assert!(report.failed_chunks[0].reason.contains("timed out"));
        assert_eq!(report.candidates_created, 2);
        // Nothing was committed before the failure, so no checkpoint exists
        assert!(!extractor.has_unfinished_work(DOC).unwrap());
    }

    #[tokio::test]
    async fn test_empty_quotes_are_rejected_and_counted() {
        let capability = Scripted::new(|text, _| {
            Ok(vec![
                CandidatePayload::quote(""),
                CandidatePayload::quote("   "),
                CandidatePayload::quote(text),
            ])
        });
        let extractor = extractor(capability, shared_store(), FailurePolicy::Skip);

        let report = extractor.run(DOC, &sections()).await.unwrap();

        assert_eq!(report.payloads_rejected, 6);
        assert_eq!(report.candidates_created, 3);
    }

    #[tokio::test]
    async fn test_clear_checkpoint_restarts_document() {
        let store = shared_store();
        store.lock().unwrap().save_checkpoint(DOC, 2).unwrap();

        let capability = Scripted::echo();
        let extractor = extractor(capability.clone(), store, FailurePolicy::Skip);
        assert!(extractor.has_unfinished_work(DOC).unwrap());
        assert!(extractor.clear_checkpoint(DOC).unwrap());
        assert!(!extractor.clear_checkpoint(DOC).unwrap());

        let report = extractor.run(DOC, &sections()).await.unwrap();
        assert_eq!(report.chunks_resumed, 0);
        assert_eq!(capability.calls().len(), 3);
    }

    /// SQLite store whose candidate inserts fail for quotes starting with `fail_prefix`
    struct FailingInserts {
        inner: SqliteStore,
        fail_prefix: char,
    }

    impl CandidateStore for FailingInserts {
        type Error = StoreError;

        fn insert_candidate_if_absent(
            &mut self,
            candidate: NewCandidate,
        ) -> Result<InsertOutcome, StoreError> {
            if candidate.quote_text.starts_with(self.fail_prefix) {
                return Err(StoreError::InvalidData("disk full".into()));
            }
            self.inner.insert_candidate_if_absent(candidate)
        }

        fn get_pending(&self) -> Result<Vec<Candidate>, StoreError> {
            self.inner.get_pending()
        }

        fn set_approval(
            &mut self,
            candidate_id: CandidateId,
            status: ApprovalStatus,
            via: DecisionPath,
            note: Option<&str>,
        ) -> Result<bool, StoreError> {
            self.inner.set_approval(candidate_id, status, via, note)
        }

        fn create_group(&mut self, run_id: RunId, label: &str) -> Result<GroupId, StoreError> {
            self.inner.create_group(run_id, label)
        }

        fn add_membership(&mut self, membership: Membership) -> Result<bool, StoreError> {
            self.inner.add_membership(membership)
        }

        fn commit_group(
            &mut self,
            run_id: RunId,
            label: &str,
            members: &[CandidateId],
        ) -> Result<(GroupId, Vec<CandidateId>), StoreError> {
            self.inner.commit_group(run_id, label, members)
        }

        fn save_checkpoint(&mut self, source_path: &str, index: usize) -> Result<(), StoreError> {
            self.inner.save_checkpoint(source_path, index)
        }

        fn load_checkpoint(&self, source_path: &str) -> Result<Option<Checkpoint>, StoreError> {
            self.inner.load_checkpoint(source_path)
        }

        fn clear_checkpoint(&mut self, source_path: &str) -> Result<bool, StoreError> {
            self.inner.clear_checkpoint(source_path)
        }

        fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
            self.inner.get_candidate(id)
        }

        fn get_approval(&self, id: CandidateId) -> Result<Option<Approval>, StoreError> {
            self.inner.get_approval(id)
        }

        fn count_candidates(&self) -> Result<usize, StoreError> {
            self.inner.count_candidates()
        }

        fn status_counts(&self) -> Result<StatusCounts, StoreError> {
            self.inner.status_counts()
        }

        fn approvals_missing(&self) -> Result<usize, StoreError> {
            self.inner.approvals_missing()
        }

        fn groups_for_run(&self, run_id: RunId) -> Result<Vec<Group>, StoreError> {
            self.inner.groups_for_run(run_id)
        }

        fn memberships_for_group(&self, group_id: GroupId) -> Result<Vec<Membership>, StoreError> {
            self.inner.memberships_for_group(group_id)
        }
    }

    #[tokio::test]
    async fn test_store_failure_aborts_without_advancing_checkpoint() {
        let store = FailingInserts {
            inner: SqliteStore::in_memory().unwrap(),
            fail_prefix: 'b',
        };
        let extractor = Extractor::new(Scripted::echo(), store, config(FailurePolicy::Skip))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(3, 1, 1));

        let result = extractor.run(DOC, &sections()).await;

        assert!(matches!(result, Err(ExtractorError::Persistence(_))));
        let checkpoint = extractor.checkpoint(DOC).unwrap().unwrap();
        assert_eq!(checkpoint.last_processed_chunk_index, 0);
        assert_eq!(extractor.store().lock().unwrap().count_candidates().unwrap(), 1);
    }
}
