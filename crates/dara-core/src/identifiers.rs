// crates/dara-core/src/identifiers.rs
// ============================================================================
// Module: Dara Identifiers
// Description: Canonical opaque identifiers for control-plane records.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the control
//! plane. Identifiers are opaque strings on the wire; freshly allocated ones
//! are 128-bit random values encoded as 32 lowercase hex characters. Seeded
//! records (the default workflows) use operator-chosen names instead, so no
//! format validation is applied at construction boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Generation
// ============================================================================

/// Returns a fresh opaque identifier: 128 random bits as lowercase hex.
fn random_hex_id() -> String {
    let value: u128 = rand::random();
    format!("{value:032x}")
}

/// Declares a string-backed identifier newtype with the shared surface.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing wire value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Allocates a fresh random 128-bit identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(random_hex_id())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_id! {
    /// Workflow identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; seeded workflows use operator-chosen names.
    WorkflowId
}

string_id! {
    /// Run identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; allocated ids are 32 lowercase hex characters.
    RunId
}

string_id! {
    /// Approval identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; allocated ids are 32 lowercase hex characters.
    ApprovalId
}

string_id! {
    /// Artifact identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; allocated ids are 32 lowercase hex characters.
    ArtifactId
}

string_id! {
    /// Connector identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; the tool service may supply its own ids.
    ConnectorId
}

string_id! {
    /// Secret identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; allocated ids are 32 lowercase hex characters.
    SecretId
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

    use super::RunId;

    #[test]
    fn generated_ids_are_32_hex_chars() {
        let id = RunId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = RunId::new("secretary-default");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"secretary-default\"");
    }
}
