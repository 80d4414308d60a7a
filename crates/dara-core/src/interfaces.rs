// crates/dara-core/src/interfaces.rs
// ============================================================================
// Module: Dara Interfaces
// Description: Backend-agnostic seams for tool invocation and notification.
// Purpose: Let the engine reach external systems through substitutable traits.
// Dependencies: crate::identifiers, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The engine composes the store, vault, connector client, notifier, and
//! preset registry as explicit constructor dependencies. The two seams that
//! cross the network — tool invocation and completion notification — are
//! traits, so tests substitute fakes without touching any HTTP machinery.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::identifiers::RunId;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Persistence-layer errors.
///
/// # Invariants
/// - Messages avoid embedding secret material or full row payloads.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Stored data failed to parse or serialize.
    #[error("store serialization error: {0}")]
    Serialization(String),
    /// Stored data violates a structural expectation.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Tool Invocation
// ============================================================================

/// Tool invocation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The client is not configured or was disabled by the URL safety gate.
    #[error("tool client configuration error: {0}")]
    Configuration(String),
    /// The tool service returned an error or was unreachable.
    #[error("tool invocation failed: {0}")]
    External(String),
}

/// Outbound tool invocation seam.
pub trait ToolInvoker: Send + Sync {
    /// Invokes a named tool with structured arguments on behalf of a run.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the client is disabled or the call fails.
    fn invoke(&self, tool_name: &str, args: &Value, run_id: &RunId) -> Result<Value, ToolError>;
}

// ============================================================================
// SECTION: Completion Notification
// ============================================================================

/// Notification delivery errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Reading run state for the payload failed.
    #[error("notification store read failed: {0}")]
    Store(String),
    /// Payload serialization failed.
    #[error("notification payload serialization failed: {0}")]
    Serialization(String),
    /// The webhook endpoint was unreachable.
    #[error("webhook delivery failed: {0}")]
    Delivery(String),
    /// The webhook endpoint returned a non-success status.
    #[error("webhook returned status {code}")]
    Status {
        /// HTTP status code returned by the endpoint.
        code: u16,
    },
}

/// Completion notification seam.
///
/// Implementations fire at most once per run and only on terminal success;
/// the engine treats every error as non-fatal.
pub trait RunNotifier: Send + Sync {
    /// Emits the completion notification for a run.
    ///
    /// `model_preset` is the active preset name stamped into the payload.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when assembly or delivery fails.
    fn notify_completion(&self, run_id: &RunId, model_preset: &str) -> Result<(), NotifyError>;
}
