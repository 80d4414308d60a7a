// crates/dara-core/src/records.rs
// ============================================================================
// Module: Dara Auxiliary Records
// Description: Connector, secret-header, and model-preset records.
// Purpose: Wire and storage forms for the non-run tables.
// Dependencies: crate::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Records that live next to the run tables: cached connector registrations,
//! secret headers (metadata only, never plaintext or ciphertext), and the
//! model-preset catalog used to stamp completion notifications.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::ConnectorId;
use crate::identifiers::SecretId;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Connectors
// ============================================================================

/// Cached record of a successful connector registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    /// Connector identifier (service-assigned when available).
    pub id: ConnectorId,
    /// Connector name.
    pub name: String,
    /// Connector status reported by the tool service.
    pub status: String,
    /// Raw service response for operators.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Secret Headers
// ============================================================================

/// Secret metadata returned by vault listings.
///
/// # Invariants
/// - Never carries plaintext or ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretHeader {
    /// Secret identifier.
    pub id: SecretId,
    /// Free-form grouping scope.
    pub scope: String,
    /// Secret name within its scope.
    pub name: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Model Presets
// ============================================================================

/// Named model preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Preset name (for example `quality`).
    pub name: String,
    /// Model identifier the preset resolves to.
    pub model: String,
}

/// Active-preset selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetState {
    /// Name of the active preset.
    pub active: String,
    /// Timestamp of the state read or mutation.
    pub updated_at: Timestamp,
}
