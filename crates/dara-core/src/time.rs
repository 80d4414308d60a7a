// crates/dara-core/src/time.rs
// ============================================================================
// Module: Dara Time Model
// Description: Canonical timestamp representation for control-plane records.
// Purpose: Provide ISO-8601 UTC strings with a single construction point.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every persisted record carries ISO-8601 (RFC 3339) UTC timestamps. The
//! wire form is a plain string so rows round-trip byte-identically through
//! the store; ordering within a run follows step order, not string parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// ISO-8601 UTC timestamp string.
///
/// # Invariants
/// - Values produced by [`Timestamp::now`] are RFC 3339 in UTC.
/// - Stored values are opaque; no re-parsing or normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Captures the current wall-clock time in UTC.
    #[must_use]
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        let text = now
            .format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        Self(text)
    }

    /// Wraps an existing stored timestamp string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the timestamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
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

    use super::Timestamp;

    #[test]
    fn now_is_rfc3339_utc() {
        let stamp = Timestamp::now();
        assert!(stamp.as_str().ends_with('Z'), "expected UTC designator: {}", stamp.as_str());
        assert!(stamp.as_str().contains('T'));
    }

    #[test]
    fn wrapped_values_round_trip() {
        let stamp = Timestamp::new("2026-01-01T00:00:00Z");
        assert_eq!(stamp.as_str(), "2026-01-01T00:00:00Z");
    }
}
