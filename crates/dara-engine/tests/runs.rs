// crates/dara-engine/tests/runs.rs
// ============================================================================
// Module: Run Interpreter Tests
// Description: Ungated execution, redaction at rest, and failure handling.
// ============================================================================
//! ## Overview
//! Drives ungated workflows end to end: the shell smoke test produces JSON
//! artifacts, vault secrets never reach artifact files, tool outages fail
//! the run, and notifier outages never do.

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

use dara_core::RunStatus;
use dara_core::StepSpec;
use dara_core::Timestamp;
use dara_core::WorkflowId;
use dara_core::WorkflowRecord;
use dara_core::WorkflowSchema;
use serde_json::Value;
use serde_json::json;

use crate::common::Harness;
use crate::common::HarnessOptions;
use crate::common::harness;

/// Seeds a one-step workflow into the harness store and returns its id.
fn seed_workflow(h: &Harness, id: &str, steps: Vec<StepSpec>) -> WorkflowId {
    let workflow_id = WorkflowId::new(id);
    h.store
        .seed_workflow(&WorkflowRecord {
            id: workflow_id.clone(),
            name: id.to_string(),
            schema: WorkflowSchema {
                name: id.to_string(),
                steps,
            },
            created_at: Timestamp::now(),
        })
        .unwrap();
    workflow_id
}

#[test]
fn smoke_workflow_completes_with_json_shell_artifacts() {
    let h = harness(HarnessOptions::default());
    let view = h.engine.create_run(&WorkflowId::new("agent0-smoke"), json!({})).unwrap();
    assert_eq!(view.status, RunStatus::Completed);
    assert_eq!(view.current_step, 3);
    assert!(view.approvals.is_empty());

    let artifacts = h.engine.list_artifacts(&view.id).unwrap();
    assert_eq!(artifacts.len(), 3);
    for artifact in &artifacts {
        let text = std::fs::read_to_string(&artifact.path).unwrap();
        let result: Value = serde_json::from_str(&text).unwrap();
        assert!(result.get("status").is_some(), "missing status in {text}");
        assert!(result.get("output").is_some(), "missing output in {text}");
        assert!(result.get("command").is_some(), "missing command in {text}");
    }

    // No shell step touched the connector.
    assert!(h.invoker.recorded().is_empty());
    assert_eq!(h.notifier.recorded().len(), 1);
}

#[test]
fn http_steps_write_their_stub_artifact() {
    let h = harness(HarnessOptions::default());
    let workflow_id = seed_workflow(&h, "http-only", vec![StepSpec::HttpStep {
        artifact: None,
    }]);
    let view = h.engine.create_run(&workflow_id, json!({})).unwrap();
    assert_eq!(view.status, RunStatus::Completed);

    let artifacts = h.engine.list_artifacts(&view.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].path.ends_with("http_response.txt"));
    let text = std::fs::read_to_string(&artifacts[0].path).unwrap();
    assert_eq!(text, "HTTP step executed");
}

#[test]
fn vault_secrets_never_reach_artifact_files() {
    let h = harness(HarnessOptions {
        master_key: Some("redaction-test-key"),
        ..HarnessOptions::default()
    });
    h.vault.as_ref().unwrap().store("connector", "token", "s3cr3t-value").unwrap();

    let workflow_id = seed_workflow(&h, "leak-test", vec![StepSpec::AgentStep {
        name: "draft".to_string(),
        artifact: None,
    }]);
    let view =
        h.engine.create_run(&workflow_id, json!({"leak": "s3cr3t-value"})).unwrap();
    assert_eq!(view.status, RunStatus::Completed);

    let artifacts = h.engine.list_artifacts(&view.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    let text = std::fs::read_to_string(&artifacts[0].path).unwrap();
    assert!(text.contains("***"), "mask missing from artifact: {text}");
    assert!(!text.contains("s3cr3t-value"), "secret leaked into artifact: {text}");

    // The smoke workflow's artifacts are clean as well.
    let view = h.engine.create_run(&WorkflowId::new("agent0-smoke"), json!({})).unwrap();
    for artifact in h.engine.list_artifacts(&view.id).unwrap() {
        let text = std::fs::read_to_string(&artifact.path).unwrap();
        assert!(!text.contains("s3cr3t-value"));
    }
}

#[test]
fn tool_outage_fails_the_run_at_the_failing_step() {
    let h = harness(HarnessOptions {
        invoker_fails: true,
        ..HarnessOptions::default()
    });
    let workflow_id = seed_workflow(&h, "crm-sync", vec![StepSpec::ToolStep {
        tool_name: "crm_update".to_string(),
        write: false,
        artifact: None,
        command: None,
    }]);

    let view = h.engine.create_run(&workflow_id, json!({"record": 7})).unwrap();
    assert_eq!(view.status, RunStatus::Failed);
    assert_eq!(view.current_step, 0);
    assert!(h.engine.list_artifacts(&view.id).unwrap().is_empty());
    assert!(h.notifier.recorded().is_empty());
}

#[test]
fn notifier_outage_does_not_fail_the_run() {
    let h = harness(HarnessOptions {
        notifier_fails: true,
        ..HarnessOptions::default()
    });
    let view = h.engine.create_run(&WorkflowId::new("agent0-smoke"), json!({})).unwrap();
    assert_eq!(view.status, RunStatus::Completed);
    assert_eq!(h.notifier.recorded().len(), 1);
}

#[test]
fn agent_drafts_embed_workflow_name_and_canonical_input() {
    let h = harness(HarnessOptions::default());
    let view = h
        .engine
        .create_run(&WorkflowId::new("secretary-default"), json!({"b": 2, "a": 1}))
        .unwrap();
    let artifacts = h.engine.list_artifacts(&view.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].path.ends_with("draft_email.txt"));
    let text = std::fs::read_to_string(&artifacts[0].path).unwrap();
    assert!(text.starts_with("Draft for workflow Draft Email + Schedule Follow-up."));
    // Canonical JSON sorts keys regardless of input order.
    assert!(text.contains("{\"a\":1,\"b\":2}"), "unexpected draft body: {text}");
}
