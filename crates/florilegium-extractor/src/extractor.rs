//! Resumable, idempotent extraction over a document's chunks

use crate::chunking::TextChunker;
use crate::config::{ExtractorConfig, FailurePolicy};
use crate::error::ExtractorError;
use crate::types::{ChunkFailure, ExtractionReport};
use florilegium_domain::candidate::source_identifier;
use florilegium_domain::traits::{CandidateStore, InsertOutcome};
use florilegium_domain::{
    CandidatePayload, CapabilityError, Checkpoint, Chunk, ExtractCapability, NewCandidate, Section,
};
use florilegium_llm::RetryPolicy;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Drives the extraction capability over a document's chunks and commits
/// the resulting candidates
///
/// The checkpoint for a document only ever names a chunk whose candidates
/// are already committed, so an interrupted run can be restarted at any
/// point without losing or duplicating work.
pub struct Extractor<C, S>
where
    C: ExtractCapability,
    S: CandidateStore,
{
    capability: Arc<C>,
    store: Arc<Mutex<S>>,
    chunker: TextChunker,
    retry: RetryPolicy,
    config: ExtractorConfig,
}

impl<C, S> Extractor<C, S>
where
    C: ExtractCapability + Send + Sync + 'static,
    S: CandidateStore,
    S::Error: Display,
{
    /// Create a new Extractor owning `store`
    pub fn new(capability: C, store: S, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::with_shared_store(capability, Arc::new(Mutex::new(store)), config)
    }

    /// Create an Extractor over a store shared with other components
    pub fn with_shared_store(
        capability: C,
        store: Arc<Mutex<S>>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            capability: Arc::new(capability),
            store,
            chunker: TextChunker::from_config(&config)?,
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

    /// Chunker built from the configuration
    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Chunk `sections` and run extraction over them
    pub async fn run(
        &self,
        document: &str,
        sections: &[Section],
    ) -> Result<ExtractionReport, ExtractorError> {
        let chunks = self.chunker.chunk_document(sections);
        self.run_chunks(document, &chunks).await
    }

    /// Run extraction over an already chunked document
    ///
    /// Chunks covered by the document's checkpoint are skipped. Every other
    /// chunk is extracted (with retries), its payloads are committed, and
    /// only then is the checkpoint advanced. After the first failed chunk the
    /// checkpoint stays where it is, so the next run starts again at that
    /// chunk. A clean run removes the checkpoint.
    pub async fn run_chunks(
        &self,
        document: &str,
        chunks: &[Chunk],
    ) -> Result<ExtractionReport, ExtractorError> {
        let started = Instant::now();
        let checkpoint = self.with_store(|store| store.load_checkpoint(document))?;
        let mut report = ExtractionReport::new(document, chunks.len());

        info!(
            document,
            chunks = chunks.len(),
            resume_after = ?checkpoint.as_ref().map(|c| c.last_processed_chunk_index),
            "Starting extraction"
        );

        let mut checkpoint_frozen = false;
        for chunk in chunks {
            if checkpoint.as_ref().is_some_and(|c| c.covers(chunk.sequence_index)) {
                report.chunks_resumed += 1;
                continue;
            }

            debug!(
                document,
                sequence_index = chunk.sequence_index,
                section = %chunk.source_id,
                page = chunk.estimated_page,
                "Processing chunk"
            );

            match self.extract_chunk(chunk).await {
                Ok(payloads) => {
                    self.commit_chunk(document, chunk, payloads, !checkpoint_frozen, &mut report)?;
                    report.chunks_processed += 1;
                }
                Err(CapabilityError::Terminal(reason)) => {
                    error!(
                        document,
                        sequence_index = chunk.sequence_index,
                        error = %reason,
                        "Extraction failed with a non-retryable error"
                    );
                    return Err(ExtractorError::Capability {
                        sequence_index: chunk.sequence_index,
                        source: CapabilityError::Terminal(reason),
                    });
                }
                Err(CapabilityError::Transient(reason)) => {
                    warn!(
                        document,
                        sequence_index = chunk.sequence_index,
                        error = %reason,
                        "Chunk failed after retries"
                    );
                    if self.config.on_chunk_failure == FailurePolicy::Abort {
                        return Err(ExtractorError::ChunkFailed {
                            sequence_index: chunk.sequence_index,
                            reason,
                        });
                    }
                    report.failed_chunks.push(ChunkFailure {
                        sequence_index: chunk.sequence_index,
                        section_id: chunk.source_id.clone(),
                        reason,
                    });
                    checkpoint_frozen = true;
                }
            }
        }

        if report.is_complete() {
            self.with_store(|store| store.clear_checkpoint(document))?;
            report.checkpoint_cleared = true;
        }
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(document, "Extraction complete: {}", report.summary());
        Ok(report)
    }

    /// True if a checkpoint says an earlier run did not finish
    pub fn has_unfinished_work(&self, document: &str) -> Result<bool, ExtractorError> {
        Ok(self.checkpoint(document)?.is_some())
    }

    /// Current checkpoint of `document`
    pub fn checkpoint(&self, document: &str) -> Result<Option<Checkpoint>, ExtractorError> {
        self.with_store(|store| store.load_checkpoint(document))
    }

    /// Forget the checkpoint of `document`, so the next run starts over.
    /// Returns `true` if there was one.
    pub fn clear_checkpoint(&self, document: &str) -> Result<bool, ExtractorError> {
        let cleared = self.with_store(|store| store.clear_checkpoint(document))?;
        if cleared {
            info!(document, "Checkpoint cleared");
        }
        Ok(cleared)
    }

    /// Persist a chunk's payloads, then advance the checkpoint
    fn commit_chunk(
        &self,
        document: &str,
        chunk: &Chunk,
        payloads: Vec<CandidatePayload>,
        advance_checkpoint: bool,
        report: &mut ExtractionReport,
    ) -> Result<(), ExtractorError> {
        let source = source_identifier(&chunk.source_id, chunk.estimated_page);

        self.with_store(|store| {
            for payload in payloads {
                if let Err(reason) = payload.validate() {
                    debug!(sequence_index = chunk.sequence_index, %reason, "Payload rejected");
                    report.payloads_rejected += 1;
                    continue;
                }
                let candidate = NewCandidate::from_payload(payload, source.clone());
                match store.insert_candidate_if_absent(candidate)? {
                    InsertOutcome::Created(_) => report.candidates_created += 1,
                    InsertOutcome::Duplicate => report.duplicates_absorbed += 1,
                }
            }
            if advance_checkpoint {
                store.save_checkpoint(document, chunk.sequence_index)?;
            }
            Ok(())
        })
    }

    /// Call the capability for one chunk under the retry policy
    async fn extract_chunk(&self, chunk: &Chunk) -> Result<Vec<CandidatePayload>, CapabilityError> {
        let operation = format!("extract chunk {}", chunk.sequence_index);
        self.retry
            .retry(&operation, || self.call_capability(chunk.text.clone()))
            .await
    }

    /// One capability call on the blocking pool. A timeout is transient.
    async fn call_capability(&self, text: String) -> Result<Vec<CandidatePayload>, CapabilityError> {
        let capability = Arc::clone(&self.capability);
        let task = tokio::task::spawn_blocking(move || capability.extract(&text));

        let joined = match self.config.call_timeout() {
            Some(limit) => timeout(limit, task).await.map_err(|_| {
                CapabilityError::Transient(format!("extraction timed out after {:?}", limit))
            })?,
            None => task.await,
        };
        joined.map_err(|e| CapabilityError::Terminal(format!("extraction task failed: {}", e)))?
    }

    /// Run `f` with the store locked. The lock is never held across an await.
    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut S) -> Result<T, S::Error>,
    ) -> Result<T, ExtractorError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| ExtractorError::Persistence(format!("Store lock poisoned: {}", e)))?;
        f(&mut store).map_err(|e| ExtractorError::Persistence(e.to_string()))
    }
}
