use super::{ScriptedGenerator, harness, idea_set_json, sample_document};
use crate::core::coordinator::IDEAS_PER_BATCH;
use crate::core::coordinator::ideas::{extract_json_block, parse_idea_batch};
use crate::core::coordinator::types::WorkflowStatus;

#[test]
fn json_block_extraction_handles_fences_and_raw_json() {
    assert_eq!(
        extract_json_block("```json\n{\"ideas\": []}\n```"),
        Some("{\"ideas\": []}")
    );
    assert_eq!(extract_json_block("{\"ideas\": []}"), Some("{\"ideas\": []}"));
    assert_eq!(extract_json_block("no json here"), None);
}

#[test]
fn batch_validation_rejects_wrong_counts_and_missing_fields() {
    let doc = sample_document();
    assert!(parse_idea_batch(&idea_set_json(IDEAS_PER_BATCH), &doc).is_ok());
    assert!(parse_idea_batch(&idea_set_json(11), &doc).is_err());
    assert!(parse_idea_batch(&idea_set_json(13), &doc).is_err());

    let mut broken: serde_json::Value =
        serde_json::from_str(&idea_set_json(IDEAS_PER_BATCH)).unwrap();
    broken["ideas"][4]["justification"] = serde_json::Value::String(String::new());
    assert!(parse_idea_batch(&broken.to_string(), &doc).is_err());
}

#[tokio::test]
async fn cooperative_provider_yields_twelve_ideas_across_three_categories() {
    let h = harness(ScriptedGenerator::new(vec![Ok(idea_set_json(
        IDEAS_PER_BATCH,
    ))]))
    .await;
    let conv = h.store.create_conversation(Some("ideas")).await.unwrap();
    let doc = sample_document();

    let outcome = h
        .coordinator
        .generate_ideas_from_document(&conv.id, &doc)
        .await
        .unwrap();
    assert_eq!(outcome.status, WorkflowStatus::IdeasGenerated);
    assert_eq!(outcome.ideas.len(), IDEAS_PER_BATCH);
    assert_eq!(outcome.source_title, doc.title);

    let state = h.store.read_state(&conv.id).await.unwrap();
    assert_eq!(state.status, Some(WorkflowStatus::IdeasGenerated));
    assert!(state.awaiting_selection);
    assert!(!state.waiting_for_user);
    let batch = state.ideas.expect("idea batch persisted");
    assert_eq!(batch.ideas.len(), IDEAS_PER_BATCH);
    assert_eq!(batch.source_excerpt, doc.content);

    // The log gets a short summary; the payload rides in message metadata.
    let messages = h.store.read_messages(&conv.id, 50, None).await.unwrap();
    let summary = messages.last().unwrap();
    assert_eq!(summary.role, "assistant");
    assert_eq!(summary.agent_role.as_deref(), Some("Strategist"));
    assert!(summary.content.contains("12 content ideas"));
    assert!(!summary.content.contains("pillar_category"));
    let metadata = summary.metadata.as_ref().expect("summary metadata");
    assert_eq!(
        metadata["ideas"]["ideas"].as_array().map(Vec::len),
        Some(IDEAS_PER_BATCH)
    );
}

#[tokio::test]
async fn malformed_batch_is_a_hard_failure_with_no_ideas_persisted() {
    let h = harness(ScriptedGenerator::new(vec![Ok(idea_set_json(11))])).await;
    let conv = h.store.create_conversation(Some("ideas")).await.unwrap();

    let err = h
        .coordinator
        .generate_ideas_from_document(&conv.id, &sample_document())
        .await
        .unwrap_err();
    assert!(!err.is_actionable(), "malformed output is a stage fault");

    let state = h.store.read_state(&conv.id).await.unwrap();
    assert!(state.ideas.is_none(), "no partial idea state may be written");
    assert!(!state.awaiting_selection);
    assert_eq!(state.status, Some(WorkflowStatus::Error));
    assert!(state.error_message.is_some());
    assert!(state.error_time.is_some());
}

#[tokio::test]
async fn missing_strategist_prompt_is_a_configuration_error() {
    let h = harness(ScriptedGenerator::new(vec![])).await;
    // Demote the seeded strategist prompt by promoting nothing-like roles is
    // not possible through the registry, so open a fresh store without seeds.
    let tmp = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(
        crate::core::store::WorkflowStore::open(tmp.path()).await.unwrap(),
    );
    let coordinator = crate::core::coordinator::Coordinator::new(
        store.clone(),
        h.generator.clone(),
        None,
        super::test_config(),
    );
    let conv = store.create_conversation(Some("ideas")).await.unwrap();

    let err = coordinator
        .generate_ideas_from_document(&conv.id, &sample_document())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        crate::core::coordinator::WorkflowError::Configuration(_)
    ));
    assert_eq!(h.generator.calls(), 0);
}
