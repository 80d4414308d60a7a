// crates/dara-engine/src/error.rs
// ============================================================================
// Module: Engine Errors
// Description: Error taxonomy for engine operations.
// Purpose: Let the HTTP boundary map failures onto status codes.
// Dependencies: dara-core, thiserror
// ============================================================================

//! ## Overview
//! Engine failures collapse into four categories the route layer can map
//! mechanically: missing records, invalid client input, upstream service
//! failures, and everything internal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dara_core::HashError;
use dara_core::StoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Engine error taxonomy.
///
/// # Invariants
/// - Variants are stable; the HTTP boundary maps them to 404/400/502/500.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced workflow, run, or approval does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Client-supplied input failed validation.
    #[error("{0}")]
    Validation(String),
    /// An upstream service failed.
    #[error("{0}")]
    External(String),
    /// Persistence, serialization, or filesystem failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<HashError> for EngineError {
    fn from(error: HashError) -> Self {
        Self::Internal(error.to_string())
    }
}
