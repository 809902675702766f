use crate::core::coordinator::can_transition;
use crate::core::coordinator::types::WorkflowStatus;

#[test]
fn draft_lifecycle_happy_path_is_allowed() {
    let path = [
        (WorkflowStatus::InProgress, WorkflowStatus::WaitingForApproval),
        (WorkflowStatus::WaitingForApproval, WorkflowStatus::Completed),
    ];
    for (from, to) in path {
        assert!(
            can_transition(from, to),
            "expected transition {:?} -> {:?} to be allowed",
            from,
            to
        );
    }
}

#[test]
fn ideation_path_joins_the_approval_loop() {
    assert!(can_transition(
        WorkflowStatus::InProgress,
        WorkflowStatus::IdeasGenerated
    ));
    assert!(can_transition(
        WorkflowStatus::IdeasGenerated,
        WorkflowStatus::InProgress
    ));
    assert!(can_transition(
        WorkflowStatus::InProgress,
        WorkflowStatus::WaitingForApproval
    ));
}

#[test]
fn revision_loop_stays_in_waiting() {
    assert!(can_transition(
        WorkflowStatus::WaitingForApproval,
        WorkflowStatus::WaitingForApproval
    ));
}

#[test]
fn completed_conversations_do_not_reenter_approval() {
    assert!(!can_transition(
        WorkflowStatus::Completed,
        WorkflowStatus::WaitingForApproval
    ));
    assert!(!can_transition(
        WorkflowStatus::Completed,
        WorkflowStatus::IdeasGenerated
    ));
}

#[test]
fn error_is_reachable_from_active_states() {
    let active = [
        WorkflowStatus::InProgress,
        WorkflowStatus::IdeasGenerated,
        WorkflowStatus::WaitingForApproval,
    ];
    for from in active {
        assert!(
            can_transition(from, WorkflowStatus::Error),
            "expected error from {:?}",
            from
        );
    }
}

#[test]
fn resubmission_restarts_failed_and_finished_conversations() {
    assert!(can_transition(
        WorkflowStatus::Error,
        WorkflowStatus::InProgress
    ));
    assert!(can_transition(
        WorkflowStatus::Completed,
        WorkflowStatus::InProgress
    ));
}

#[test]
fn status_labels_round_trip() {
    let all = [
        WorkflowStatus::InProgress,
        WorkflowStatus::IdeasGenerated,
        WorkflowStatus::WaitingForApproval,
        WorkflowStatus::Completed,
        WorkflowStatus::Error,
    ];
    for status in all {
        assert_eq!(WorkflowStatus::from_status(status.as_str()), Some(status));
    }
    assert_eq!(WorkflowStatus::from_status("bogus"), None);
}
