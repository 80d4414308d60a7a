// crates/dara-core/src/run.rs
// ============================================================================
// Module: Dara Run Model
// Description: Run, approval, and artifact records with status state machines.
// Purpose: Capture the mutable run lifecycle persisted by the store.
// Dependencies: crate::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! A run is one execution of a workflow with a specific input. Its status
//! forms a small state machine: `running` advances step by step, suspends in
//! `waiting_approval` at gates, and ends in one of the terminal states
//! `completed`, `rejected`, or `failed`. Approvals and artifacts are
//! append-only rows scoped to a run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::ApprovalId;
use crate::identifiers::ArtifactId;
use crate::identifiers::RunId;
use crate::identifiers::WorkflowId;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Run Status
// ============================================================================

/// Run lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and storage.
/// - No transition exits a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is actively advancing through steps.
    Running,
    /// Run is suspended pending a human decision.
    WaitingApproval,
    /// Run finished all steps successfully.
    Completed,
    /// Run ended because an approval was rejected.
    Rejected,
    /// Run ended because a step failed.
    Failed,
}

impl RunStatus {
    /// Returns the stored string form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::WaitingApproval => "waiting_approval",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Parses the stored string form of a status.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(Self::Running),
            "waiting_approval" => Some(Self::WaitingApproval),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Failed)
    }
}

// ============================================================================
// SECTION: Run Record
// ============================================================================

/// Stored run row.
///
/// # Invariants
/// - `current_step <= workflow.schema.steps.len()`.
/// - `status == Completed` implies `current_step == workflow.schema.steps.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run identifier.
    pub id: RunId,
    /// Workflow this run executes.
    pub workflow_id: WorkflowId,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Index of the next step to execute (or the gate index while suspended).
    pub current_step: usize,
    /// Structured run input supplied at creation.
    pub input: Value,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last mutation timestamp.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Approvals
// ============================================================================

/// Approval row status.
///
/// # Invariants
/// - Variants are stable for serialization and storage.
/// - At most one `pending` row exists per `(run_id, payload_hash)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a human decision.
    Pending,
    /// Decision granted.
    Approved,
    /// Decision denied.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the stored string form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses the stored string form of a status.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Decision applied to a pending approval.
///
/// Only these two values are accepted at the API boundary; anything else is
/// a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Grant the gated action.
    Approved,
    /// Deny the gated action and end the run.
    Rejected,
}

impl ApprovalDecision {
    /// Parses a wire decision string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the approval status a decision resolves to.
    #[must_use]
    pub const fn status(self) -> ApprovalStatus {
        match self {
            Self::Approved => ApprovalStatus::Approved,
            Self::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// Stored approval row.
///
/// # Invariants
/// - `payload_hash` is the canonical fingerprint of the gated step.
/// - `decided_by`/`decided_at` are set together when the row leaves `pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Approval identifier.
    pub id: ApprovalId,
    /// Run this approval belongs to.
    pub run_id: RunId,
    /// Action type shown to the approver.
    pub action_type: String,
    /// Fingerprint of the gated step.
    pub payload_hash: String,
    /// Current approval status.
    pub status: ApprovalStatus,
    /// Identity supplied with the decision.
    pub decided_by: Option<String>,
    /// Decision timestamp.
    pub decided_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Kind of a stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// UTF-8 text file.
    Text,
}

impl ArtifactKind {
    /// Returns the stored string form of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
        }
    }

    /// Parses the stored string form of a kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Stored artifact row.
///
/// # Invariants
/// - `path` is absolute and lives under the run's artifact directory.
/// - File content was redacted before it reached disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Artifact identifier.
    pub id: ArtifactId,
    /// Run this artifact belongs to.
    pub run_id: RunId,
    /// Absolute filesystem path of the written file.
    pub path: String,
    /// Artifact kind.
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Run View
// ============================================================================

/// Run state returned to API clients, with its approvals embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunView {
    /// Run identifier.
    pub id: RunId,
    /// Workflow this run executes.
    pub workflow_id: WorkflowId,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Index of the next step to execute (or the gate index while suspended).
    pub current_step: usize,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last mutation timestamp.
    pub updated_at: Timestamp,
    /// Approvals recorded for the run, in insertion order.
    pub approvals: Vec<ApprovalRecord>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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

    use super::ApprovalDecision;
    use super::ApprovalStatus;
    use super::RunStatus;

    #[test]
    fn run_status_round_trips_through_strings() {
        for status in [
            RunStatus::Running,
            RunStatus::WaitingApproval,
            RunStatus::Completed,
            RunStatus::Rejected,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("paused"), None);
    }

    #[test]
    fn terminal_states_are_marked() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Rejected.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::WaitingApproval.is_terminal());
    }

    #[test]
    fn decisions_accept_only_the_two_wire_values() {
        assert_eq!(ApprovalDecision::parse("approved"), Some(ApprovalDecision::Approved));
        assert_eq!(ApprovalDecision::parse("rejected"), Some(ApprovalDecision::Rejected));
        assert_eq!(ApprovalDecision::parse("maybe"), None);
        assert_eq!(ApprovalDecision::parse("APPROVED"), None);
    }

    #[test]
    fn decision_maps_to_status() {
        assert_eq!(ApprovalDecision::Approved.status(), ApprovalStatus::Approved);
        assert_eq!(ApprovalDecision::Rejected.status(), ApprovalStatus::Rejected);
    }
}
