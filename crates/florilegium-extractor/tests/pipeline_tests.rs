//! End-to-end extraction with the LLM-backed capability and a SQLite file

use florilegium_domain::traits::CandidateStore;
use florilegium_domain::Section;
use florilegium_extractor::{
    Extractor, ExtractorConfig, ExtractorError, FailurePolicy, LlmExtractCapability,
};
use florilegium_llm::{MockProvider, RetryPolicy};
use florilegium_store::SqliteStore;

const DOC: &str = "wisdom.txt";

fn sections() -> Vec<Section> {
    vec![
        Section::new("Chapter 1", "The sage spoke of PATIENCE at the well."),
        Section::new("Chapter 2", "Later he spoke of KNOWLEDGE in the market."),
    ]
}

fn provider() -> MockProvider {
    let mut provider = MockProvider::new("[]");
    provider.add_response(
        "PATIENCE",
        r#"```json
[{"quote_text": "Patience is the key to relief.", "speaker": "The sage", "topic": "Patience"}]
```"#,
    );
    provider.add_response(
        "KNOWLEDGE",
        r#"{"quote_text": "Knowledge is a treasure.", "speaker": "The sage",
            "additional_info": "{\"quote_translation\": \"al-ilm kanz\"}"}"#,
    );
    provider
}

fn config(policy: FailurePolicy) -> ExtractorConfig {
    ExtractorConfig {
        max_chunk_size: 200,
        on_chunk_failure: policy,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_llm_extraction_persists_candidates() {
    let extractor = Extractor::new(
        LlmExtractCapability::new(provider()),
        SqliteStore::in_memory().unwrap(),
        config(FailurePolicy::Skip),
    )
    .unwrap();

    let report = extractor.run(DOC, &sections()).await.unwrap();
    assert_eq!(report.candidates_created, 2);
    assert!(report.is_complete());

    let store = extractor.store();
    let store = store.lock().unwrap();
    let pending = store.get_pending().unwrap();
    assert_eq!(pending[0].quote_text, "Patience is the key to relief.");
    assert_eq!(pending[0].source_identifier, "Chapter 1 | p.1");
    assert_eq!(pending[1].source_identifier, "Chapter 2 | p.1");
    assert_eq!(
        pending[1].additional_info.quote_translation.as_deref(),
        Some("al-ilm kanz")
    );
}

#[tokio::test]
async fn test_resume_after_interrupted_run() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("florilegium.db");

    // First run: the second chunk keeps failing and the run aborts
    {
        let mut provider = MockProvider::new("[]");
        provider.add_error("KNOWLEDGE");
        provider.add_response(
            "PATIENCE",
            r#"[{"quote_text": "Patience is the key to relief."}]"#,
        );

        let extractor = Extractor::new(
            LlmExtractCapability::new(provider),
            SqliteStore::new(&db).unwrap(),
            config(FailurePolicy::Abort),
        )
        .unwrap()
        .with_retry_policy(RetryPolicy::new(2, 1, 1));

        let result = extractor.run(DOC, &sections()).await;
        assert!(matches!(
            result,
            Err(ExtractorError::ChunkFailed { sequence_index: 1, .. })
        ));
    }

    // Second run on the reopened database resumes at chunk 1
    let provider = provider();
    let extractor = Extractor::new(
        LlmExtractCapability::new(provider.clone()),
        SqliteStore::new(&db).unwrap(),
        config(FailurePolicy::Abort),
    )
    .unwrap();
    assert!(extractor.has_unfinished_work(DOC).unwrap());

    let report = extractor.run(DOC, &sections()).await.unwrap();
    assert_eq!(report.chunks_resumed, 1);
    assert_eq!(report.candidates_created, 1);
    assert_eq!(provider.call_count(), 1);
    assert!(!extractor.has_unfinished_work(DOC).unwrap());

    let store = extractor.store();
    assert_eq!(store.lock().unwrap().count_candidates().unwrap(), 2);
}

#[tokio::test]
async fn test_missing_model_aborts_run() {
    let provider = MockProvider::new("[]");
    provider.queue_unavailable();
    let extractor = Extractor::new(
        LlmExtractCapability::new(provider.clone()),
        SqliteStore::in_memory().unwrap(),
        config(FailurePolicy::Skip),
    )
    .unwrap();

    let result = extractor.run(DOC, &sections()).await;
    assert!(matches!(
        result,
        Err(ExtractorError::Capability { sequence_index: 0, .. })
    ));
    assert_eq!(provider.call_count(), 1);
}
