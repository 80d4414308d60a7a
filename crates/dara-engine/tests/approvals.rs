// crates/dara-engine/tests/approvals.rs
// ============================================================================
// Module: Approval Gate Tests
// Description: Gated secretary flow, rejection path, and decision validation.
// ============================================================================
//! ## Overview
//! Drives the seeded secretary workflow through its gates: suspension with a
//! fingerprint-matched pending approval, resume-and-advance on approval,
//! terminal rejection, and strict decision validation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use dara_core::ApprovalId;
use dara_core::ApprovalStatus;
use dara_core::RunId;
use dara_core::RunStatus;
use dara_core::RunView;
use dara_core::WorkflowId;
use dara_core::fingerprint;
use dara_engine::EngineError;
use serde_json::json;

use crate::common::HarnessOptions;
use crate::common::harness;

/// Returns the single pending approval of a run view.
fn pending_approval(view: &RunView) -> &dara_core::ApprovalRecord {
    let pending: Vec<_> = view
        .approvals
        .iter()
        .filter(|approval| approval.status == ApprovalStatus::Pending)
        .collect();
    assert_eq!(pending.len(), 1, "expected exactly one pending approval");
    pending[0]
}

#[test]
fn secretary_flow_passes_both_gates_to_completion() {
    let h = harness(HarnessOptions::default());
    let workflow_id = WorkflowId::new("secretary-default");

    // Step 0 drafts, step 1 suspends on the explicit gate.
    let view = h.engine.create_run(&workflow_id, json!({"recipient": "test"})).unwrap();
    assert_eq!(view.status, RunStatus::WaitingApproval);
    assert_eq!(view.current_step, 1);
    let gate = pending_approval(&view).clone();
    assert_eq!(gate.action_type, "approve_email_send");
    assert_eq!(h.engine.list_artifacts(&view.id).unwrap().len(), 1);

    // The pending row's fingerprint matches the suspended step.
    let workflows = h.engine.list_workflows().unwrap();
    let secretary = workflows.iter().find(|wf| wf.id == workflow_id).unwrap();
    assert_eq!(gate.payload_hash, fingerprint(&secretary.schema.steps[1]).unwrap());

    // Approving the gate re-enters at the gate index, passes it without an
    // artifact, and suspends on the first write tool.
    let view = h.engine.approve(&view.id, &gate.id, "approved", Some("operator")).unwrap();
    assert_eq!(view.status, RunStatus::WaitingApproval);
    assert_eq!(view.current_step, 2);
    assert_eq!(h.engine.list_artifacts(&view.id).unwrap().len(), 1);
    let email_gate = pending_approval(&view).clone();
    assert_eq!(email_gate.action_type, "send_email");
    assert_eq!(email_gate.payload_hash, fingerprint(&secretary.schema.steps[2]).unwrap());

    // Approving the email tool executes it and suspends on the calendar tool.
    let view =
        h.engine.approve(&view.id, &email_gate.id, "approved", Some("operator")).unwrap();
    assert_eq!(view.status, RunStatus::WaitingApproval);
    assert_eq!(view.current_step, 3);
    assert_eq!(h.invoker.recorded(), vec!["send_email".to_string()]);
    let calendar_gate = pending_approval(&view).clone();
    assert_eq!(calendar_gate.action_type, "create_calendar_event");

    // Final approval completes the run.
    let view =
        h.engine.approve(&view.id, &calendar_gate.id, "approved", Some("operator")).unwrap();
    assert_eq!(view.status, RunStatus::Completed);
    assert_eq!(view.current_step, 4);
    assert_eq!(
        h.invoker.recorded(),
        vec!["send_email".to_string(), "create_calendar_event".to_string()]
    );
    assert!(h.engine.list_artifacts(&view.id).unwrap().len() >= 3);

    // Exactly one completion notification, stamped with the active preset.
    assert_eq!(h.notifier.recorded(), vec![(view.id.to_string(), "quality".to_string())]);
}

#[test]
fn rejection_ends_the_run_without_tool_calls() {
    let h = harness(HarnessOptions::default());
    let view = h
        .engine
        .create_run(&WorkflowId::new("secretary-default"), json!({"recipient": "test"}))
        .unwrap();
    let gate = pending_approval(&view).clone();

    let view = h.engine.approve(&view.id, &gate.id, "rejected", Some("operator")).unwrap();
    assert_eq!(view.status, RunStatus::Rejected);
    assert_eq!(view.current_step, 1);
    assert_eq!(view.approvals.len(), 1);
    assert_eq!(view.approvals[0].status, ApprovalStatus::Rejected);
    assert_eq!(view.approvals[0].decided_by.as_deref(), Some("operator"));
    assert!(h.invoker.recorded().is_empty());
    assert!(h.notifier.recorded().is_empty());

    // Terminal runs accept no further decisions.
    let err = h.engine.approve(&view.id, &gate.id, "approved", Some("operator")).err().unwrap();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn malformed_decisions_are_validation_errors() {
    let h = harness(HarnessOptions::default());
    let view = h
        .engine
        .create_run(&WorkflowId::new("secretary-default"), json!({}))
        .unwrap();
    let gate = pending_approval(&view).clone();

    for decision in ["maybe", "APPROVED", ""] {
        let err =
            h.engine.approve(&view.id, &gate.id, decision, Some("operator")).err().unwrap();
        assert!(matches!(err, EngineError::Validation(_)), "decision: {decision}");
    }

    // decided_by is required and must be non-empty.
    let err = h.engine.approve(&view.id, &gate.id, "approved", None).err().unwrap();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = h.engine.approve(&view.id, &gate.id, "approved", Some("")).err().unwrap();
    assert!(matches!(err, EngineError::Validation(_)));

    // The run is still suspended after the rejected attempts.
    let view = h.engine.get_run(&view.id).unwrap();
    assert_eq!(view.status, RunStatus::WaitingApproval);
}

#[test]
fn unknown_run_and_approval_are_not_found() {
    let h = harness(HarnessOptions::default());
    let err = h
        .engine
        .approve(&RunId::new("missing"), &ApprovalId::new("x"), "approved", Some("operator"))
        .err()
        .unwrap();
    assert!(matches!(err, EngineError::NotFound(_)));

    let view = h
        .engine
        .create_run(&WorkflowId::new("secretary-default"), json!({}))
        .unwrap();
    let err = h
        .engine
        .approve(&view.id, &ApprovalId::new("missing"), "approved", Some("operator"))
        .err()
        .unwrap();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn unknown_workflow_is_not_found() {
    let h = harness(HarnessOptions::default());
    let err = h.engine.create_run(&WorkflowId::new("missing"), json!({})).err().unwrap();
    assert!(matches!(err, EngineError::NotFound(_)));
}
