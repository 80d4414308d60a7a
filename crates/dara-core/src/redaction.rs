// crates/dara-core/src/redaction.rs
// ============================================================================
// Module: Dara Secret Redaction
// Description: Pattern- and value-based masking of text before egress.
// Purpose: Keep secret material out of artifacts and other outbound text.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Redaction is the process-global barrier between secrets-at-rest and
//! files-on-disk: every artifact passes through [`redact`] before it is
//! written. Masking happens in two phases, pattern matches first and literal
//! vault values second, so a recognizable credential header is always masked
//! even when the embedded value is not in the live secret set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Replacement marker for masked secret material.
const MASK: &str = "***";

/// Case-insensitive header/URL patterns whose second capture is the secret.
const SECRET_PATTERN_SOURCES: [&str; 4] = [
    r"(?i)(Authorization: Bearer )([^\s]+)",
    r"(?i)(api_key=)([^&\s]+)",
    r"(?i)(token=)([^&\s]+)",
    r"(?i)(x-api-key: )([^\s]+)",
];

/// Compiled secret patterns, built once per process.
static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SECRET_PATTERN_SOURCES
        .iter()
        .filter_map(|source| Regex::new(source).ok())
        .collect()
});

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Masks credential patterns and literal secret values in `text`.
///
/// Patterns are applied before literal values; empty secret values are
/// ignored. The function is idempotent: redacting already-redacted text
/// changes nothing.
#[must_use]
pub fn redact(text: &str, secret_values: &[String]) -> String {
    let mut redacted = text.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern.replace_all(&redacted, "${1}***").into_owned();
    }
    for secret in secret_values {
        if !secret.is_empty() {
            redacted = redacted.replace(secret.as_str(), MASK);
        }
    }
    redacted
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

    use super::SECRET_PATTERNS;
    use super::redact;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(SECRET_PATTERNS.len(), 4);
    }

    #[test]
    fn masks_bearer_header() {
        let text = "Authorization: Bearer abc123\nbody";
        assert_eq!(redact(text, &[]), "Authorization: Bearer ***\nbody");
    }

    #[test]
    fn masks_query_parameters_up_to_ampersand() {
        let text = "GET /x?api_key=sek&token=tok&next=1";
        assert_eq!(redact(text, &[]), "GET /x?api_key=***&token=***&next=1");
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let text = "X-API-KEY: topsecret";
        assert_eq!(redact(text, &[]), "X-API-KEY: ***");
    }

    #[test]
    fn masks_literal_values_after_patterns() {
        let text = "payload with s3cr3t-value inside";
        let secrets = vec!["s3cr3t-value".to_string()];
        assert_eq!(redact(text, &secrets), "payload with *** inside");
    }

    #[test]
    fn empty_secret_values_are_ignored() {
        let text = "untouched";
        let secrets = vec![String::new()];
        assert_eq!(redact(text, &secrets), "untouched");
    }
}
