// crates/dara-engine/src/shell.rs
// ============================================================================
// Module: Shell Execution
// Description: Local shell execution for `shell_command` tool steps.
// Purpose: Run operator-authored command strings with captured output.
// Dependencies: serde_json, std::process
// ============================================================================

//! ## Overview
//! `shell_command` tool steps run their command string through the host
//! shell with stdout and stderr captured and stdin closed. Full shell
//! interpretation is safe only because workflow schemas are authored by
//! operators, not end users; user-authored schemas would require argv-array
//! execution instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::Command;
use std::process::Stdio;

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs a command string through `sh -c`, capturing combined output.
///
/// An empty command returns `{"status": "skipped"}` without executing
/// anything. The result always carries `status`, `output`, and (when a
/// command ran) `command` fields.
#[must_use]
pub fn run_shell_command(command: &str) -> Value {
    if command.is_empty() {
        return json!({"status": "skipped", "output": "no command provided"});
    }
    match Command::new("sh").arg("-c").arg(command).stdin(Stdio::null()).output() {
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            json!({
                "status": if output.status.success() { "ok" } else { "error" },
                "output": combined.trim(),
                "command": command,
            })
        }
        Err(err) => json!({
            "status": "error",
            "output": err.to_string(),
            "command": command,
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
