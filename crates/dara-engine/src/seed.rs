// crates/dara-engine/src/seed.rs
// ============================================================================
// Module: Seed Workflows
// Description: Workflows seeded idempotently at engine startup.
// Purpose: Ship the default secretary and smoke workflows with every deploy.
// Dependencies: dara-core
// ============================================================================

//! ## Overview
//! Two workflows exist in every deployment: the gated secretary flow (draft,
//! gate, two write tools) and an ungated shell smoke test. Seeding uses
//! insert-or-ignore semantics, so operator-visible ids stay stable and
//! existing rows are never rewritten.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dara_core::StepSpec;
use dara_core::Timestamp;
use dara_core::WorkflowId;
use dara_core::WorkflowRecord;
use dara_core::WorkflowSchema;

// ============================================================================
// SECTION: Seed Definitions
// ============================================================================

/// Identifier of the default secretary workflow.
pub const SECRETARY_WORKFLOW_ID: &str = "secretary-default";
/// Identifier of the smoke-test workflow.
pub const SMOKE_WORKFLOW_ID: &str = "agent0-smoke";

/// Returns the workflows seeded at startup.
#[must_use]
pub fn default_workflows() -> Vec<WorkflowRecord> {
    let created_at = Timestamp::now();
    vec![
        WorkflowRecord {
            id: WorkflowId::new(SECRETARY_WORKFLOW_ID),
            name: "Draft Email + Schedule Follow-up".to_string(),
            schema: WorkflowSchema {
                name: "Draft Email + Schedule Follow-up".to_string(),
                steps: vec![
                    StepSpec::AgentStep {
                        name: "draft_email".to_string(),
                        artifact: Some("draft_email.txt".to_string()),
                    },
                    StepSpec::ApprovalGate {
                        action_type: "approve_email_send".to_string(),
                    },
                    StepSpec::ToolStep {
                        tool_name: "send_email".to_string(),
                        write: true,
                        artifact: Some("email_payload.json".to_string()),
                        command: None,
                    },
                    StepSpec::ToolStep {
                        tool_name: "create_calendar_event".to_string(),
                        write: true,
                        artifact: Some("calendar_payload.json".to_string()),
                        command: None,
                    },
                ],
            },
            created_at: created_at.clone(),
        },
        WorkflowRecord {
            id: WorkflowId::new(SMOKE_WORKFLOW_ID),
            name: "Agent 0 Smoke Test".to_string(),
            schema: WorkflowSchema {
                name: "Agent 0 Smoke Test".to_string(),
                steps: vec![
                    StepSpec::ToolStep {
                        tool_name: "shell_command".to_string(),
                        write: false,
                        artifact: Some("node_version.txt".to_string()),
                        command: Some("node -v".to_string()),
                    },
                    StepSpec::ToolStep {
                        tool_name: "shell_command".to_string(),
                        write: false,
                        artifact: Some("python_version.txt".to_string()),
                        command: Some("python --version".to_string()),
                    },
                    StepSpec::ToolStep {
                        tool_name: "shell_command".to_string(),
                        write: false,
                        artifact: Some("smoke.txt".to_string()),
                        command: Some("echo 'smoke ok' > smoke.txt".to_string()),
                    },
                ],
            },
            created_at,
        },
    ]
}
