use super::{ScriptedGenerator, harness, long_draft};
use crate::core::coordinator::is_satisfaction_response;
use crate::core::coordinator::types::{ContinueOutcome, StatePatch, WorkflowStatus};

#[test]
fn satisfaction_keywords_match_case_insensitively_anywhere() {
    assert!(is_satisfaction_response("perfect"));
    assert!(is_satisfaction_response("Thanks!"));
    assert!(is_satisfaction_response("I APPROVE this one"));
    assert!(is_satisfaction_response("that works for me"));
    assert!(!is_satisfaction_response("make it longer"));
    assert!(!is_satisfaction_response("add a stronger hook"));
}

#[tokio::test]
async fn continue_without_waiting_returns_error_value_and_touches_nothing() {
    let h = harness(ScriptedGenerator::new(vec![])).await;
    let conv = h.store.create_conversation(Some("t")).await.unwrap();

    let outcome = h
        .coordinator
        .continue_after_user_input(&conv.id, "make it better")
        .await
        .unwrap();
    assert!(matches!(outcome, ContinueOutcome::NotWaiting { .. }));

    // No provider call, no message append, no state mutation.
    assert_eq!(h.generator.calls(), 0);
    let messages = h.store.read_messages(&conv.id, 50, None).await.unwrap();
    assert!(messages.is_empty());
    let state = h.store.read_state(&conv.id).await.unwrap();
    assert_eq!(state.status, None);
    assert!(!state.waiting_for_user);
}

#[tokio::test]
async fn continue_on_missing_conversation_is_a_precondition_error() {
    let h = harness(ScriptedGenerator::new(vec![])).await;
    let err = h
        .coordinator
        .continue_after_user_input("no-such-conversation", "hello")
        .await
        .unwrap_err();
    assert!(err.is_actionable());
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn satisfied_reviewer_completes_the_conversation() {
    let h = harness(ScriptedGenerator::new(vec![])).await;
    let conv = h.store.create_conversation(Some("t")).await.unwrap();
    h.store
        .merge_state(
            &conv.id,
            &StatePatch {
                status: Some(WorkflowStatus::WaitingForApproval),
                waiting_for_user: Some(true),
                format_complete: Some(true),
                current_draft: Some(long_draft("D1")),
                final_output: Some(long_draft("F1")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = h
        .coordinator
        .continue_after_user_input(&conv.id, "perfect, thanks")
        .await
        .unwrap();
    assert!(matches!(outcome, ContinueOutcome::Completed { .. }));
    assert_eq!(h.generator.calls(), 0);

    let state = h.store.read_state(&conv.id).await.unwrap();
    assert_eq!(state.status, Some(WorkflowStatus::Completed));
    assert!(!state.waiting_for_user);
    assert!(state.user_satisfied);
    assert!(h.coordinator.is_complete(&conv.id).await.unwrap());
}

#[tokio::test]
async fn revision_request_reruns_formatting_and_stays_waiting() {
    let h = harness(ScriptedGenerator::new(vec![Ok(long_draft("F2"))])).await;
    let conv = h.store.create_conversation(Some("t")).await.unwrap();
    h.store
        .merge_state(
            &conv.id,
            &StatePatch {
                status: Some(WorkflowStatus::WaitingForApproval),
                waiting_for_user: Some(true),
                current_draft: Some(long_draft("D1")),
                final_output: Some(long_draft("F1")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = h
        .coordinator
        .continue_after_user_input(&conv.id, "make it more technical")
        .await
        .unwrap();
    let ContinueOutcome::WaitingForApproval { final_output } = outcome else {
        panic!("expected revision to stay in the approval loop");
    };
    assert_eq!(final_output, long_draft("F2"));
    assert_eq!(h.generator.calls(), 1);

    let state = h.store.read_state(&conv.id).await.unwrap();
    assert_eq!(state.status, Some(WorkflowStatus::WaitingForApproval));
    assert!(state.waiting_for_user);
    assert_eq!(state.final_output.as_deref(), Some(long_draft("F2").as_str()));
    // The original writer draft is kept as the revision base.
    assert_eq!(state.current_draft.as_deref(), Some(long_draft("D1").as_str()));
}
