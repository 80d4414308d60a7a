// crates/dara-core/src/workflow.rs
// ============================================================================
// Module: Dara Workflow Model
// Description: Workflow schemas and the tagged step variants they contain.
// Purpose: Represent immutable, ordered step lists with stable wire forms.
// Dependencies: crate::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A workflow is a named, immutable, ordered list of steps. Steps are a
//! tagged serde enum so unknown step kinds are rejected when a schema is
//! loaded, not when a run reaches the offending step. Each artifact-producing
//! step carries an optional filename with a per-kind default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::WorkflowId;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Step Variants
// ============================================================================

/// Default artifact filename for agent drafting steps.
const DEFAULT_AGENT_ARTIFACT: &str = "draft.txt";
/// Default artifact filename for tool invocation steps.
const DEFAULT_TOOL_ARTIFACT: &str = "tool_output.json";
/// Default artifact filename for HTTP steps.
const DEFAULT_HTTP_ARTIFACT: &str = "http_response.txt";

/// Default action type for approval gates without an explicit one.
fn default_gate_action_type() -> String {
    "approval".to_string()
}

/// One step of a workflow schema.
///
/// # Invariants
/// - The `type` tag is stable on the wire; unknown tags fail deserialization.
/// - A `tool_step` with `write = true` requires an approved gate before it
///   executes; the gate is keyed by the step's canonical fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    /// Produces a textual draft from the run input.
    AgentStep {
        /// Step name, recorded for operators.
        name: String,
        /// Artifact filename override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
    },
    /// Suspends the run pending a human decision.
    ApprovalGate {
        /// Action type shown to the approver.
        #[serde(default = "default_gate_action_type")]
        action_type: String,
    },
    /// Invokes an external tool or the local shell.
    ToolStep {
        /// Tool name; `shell_command` selects local shell execution.
        tool_name: String,
        /// Whether the tool has side effects and must be gated.
        #[serde(default)]
        write: bool,
        /// Artifact filename override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
        /// Shell command string, used only by `shell_command`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    /// Placeholder for outbound HTTP; produces a textual artifact.
    HttpStep {
        /// Artifact filename override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
    },
}

impl StepSpec {
    /// Returns the artifact filename for this step, if it produces one.
    ///
    /// Approval gates never produce artifacts; every other kind falls back
    /// to its per-kind default filename.
    #[must_use]
    pub fn artifact_filename(&self) -> Option<&str> {
        match self {
            Self::AgentStep { artifact, .. } => {
                Some(artifact.as_deref().unwrap_or(DEFAULT_AGENT_ARTIFACT))
            }
            Self::ApprovalGate { .. } => None,
            Self::ToolStep { artifact, .. } => {
                Some(artifact.as_deref().unwrap_or(DEFAULT_TOOL_ARTIFACT))
            }
            Self::HttpStep { artifact } => {
                Some(artifact.as_deref().unwrap_or(DEFAULT_HTTP_ARTIFACT))
            }
        }
    }
}

// ============================================================================
// SECTION: Workflow Schema
// ============================================================================

/// Ordered step list with a display name.
///
/// # Invariants
/// - Immutable after creation; fingerprints of contained steps are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSchema {
    /// Human-readable workflow name.
    pub name: String,
    /// Ordered steps executed by the interpreter.
    pub steps: Vec<StepSpec>,
}

/// Stored workflow row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// Workflow identifier.
    pub id: WorkflowId,
    /// Human-readable workflow name.
    pub name: String,
    /// Parsed step schema.
    pub schema: WorkflowSchema,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
