// crates/dara-engine/tests/common/mod.rs
// ============================================================================
// Module: Engine Test Harness
// Description: Shared fixture with recording fakes for the engine seams.
// ============================================================================
//! ## Overview
//! Builds an engine over a real store and temp artifact directory, with
//! recording fakes substituted at the tool-invocation and notification
//! seams.

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
    dead_code,
    reason = "Test-only fixture; not every test uses every helper."
)]

use std::sync::Arc;
use std::sync::Mutex;

use dara_core::NotifyError;
use dara_core::RunId;
use dara_core::RunNotifier;
use dara_core::ToolError;
use dara_core::ToolInvoker;
use dara_engine::WorkflowEngine;
use dara_presets::PresetRegistry;
use dara_store_sqlite::SqliteStore;
use dara_vault::SecretsVault;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

/// Preset defaults used by every harness.
const PRESET_DEFAULTS: [(&str, &str); 4] = [
    ("quality", "glm-quality"),
    ("main", "glm-main"),
    ("fast", "glm-fast"),
    ("long", "glm-long"),
];

/// Tool invoker fake that records calls and optionally fails.
pub struct RecordingInvoker {
    /// Tool names in invocation order.
    pub calls: Mutex<Vec<String>>,
    /// Whether every invocation fails with an external error.
    pub fail: bool,
}

impl RecordingInvoker {
    /// Builds an invoker with the given failure mode.
    pub fn new(fail: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail,
        }
    }

    /// Returns the recorded tool names.
    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolInvoker for RecordingInvoker {
    fn invoke(&self, tool_name: &str, args: &Value, run_id: &RunId) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(tool_name.to_string());
        if self.fail {
            return Err(ToolError::External("simulated tool outage".to_string()));
        }
        Ok(json!({
            "ok": true,
            "tool": tool_name,
            "args": args,
            "run_id": run_id.as_str(),
        }))
    }
}

/// Notifier fake that records completions and optionally fails.
pub struct RecordingNotifier {
    /// `(run_id, model_preset)` pairs in notification order.
    pub notified: Mutex<Vec<(String, String)>>,
    /// Whether every notification fails with a delivery error.
    pub fail: bool,
}

impl RecordingNotifier {
    /// Builds a notifier with the given failure mode.
    pub fn new(fail: bool) -> Self {
        Self {
            notified: Mutex::new(Vec::new()),
            fail,
        }
    }

    /// Returns the recorded notifications.
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.notified.lock().unwrap().clone()
    }
}

impl RunNotifier for RecordingNotifier {
    fn notify_completion(&self, run_id: &RunId, model_preset: &str) -> Result<(), NotifyError> {
        self.notified.lock().unwrap().push((run_id.to_string(), model_preset.to_string()));
        if self.fail {
            return Err(NotifyError::Delivery("simulated webhook outage".to_string()));
        }
        Ok(())
    }
}

/// Assembled engine fixture.
pub struct Harness {
    /// Engine under test.
    pub engine: WorkflowEngine,
    /// Store shared with the engine.
    pub store: SqliteStore,
    /// Vault shared with the engine, when a master key was supplied.
    pub vault: Option<SecretsVault>,
    /// Recording tool invoker.
    pub invoker: Arc<RecordingInvoker>,
    /// Recording notifier.
    pub notifier: Arc<RecordingNotifier>,
    /// Artifact root; dropped with the harness.
    pub artifacts: TempDir,
}

/// Harness construction options.
#[derive(Default)]
pub struct HarnessOptions {
    /// Master key for the vault, when secrets are needed.
    pub master_key: Option<&'static str>,
    /// Whether tool invocations fail.
    pub invoker_fails: bool,
    /// Whether notifications fail.
    pub notifier_fails: bool,
}

/// Builds a harness with the given options.
pub fn harness(options: HarnessOptions) -> Harness {
    let artifacts = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let vault = options
        .master_key
        .map(|key| SecretsVault::new(key, store.clone()).unwrap());
    let presets = PresetRegistry::new(store.clone(), &PRESET_DEFAULTS, "quality").unwrap();
    let invoker = Arc::new(RecordingInvoker::new(options.invoker_fails));
    let notifier = Arc::new(RecordingNotifier::new(options.notifier_fails));
    let engine = WorkflowEngine::new(
        store.clone(),
        vault.clone(),
        Arc::clone(&invoker) as Arc<dyn ToolInvoker>,
        Arc::clone(&notifier) as Arc<dyn RunNotifier>,
        presets,
        artifacts.path().to_path_buf(),
    )
    .unwrap();
    Harness {
        engine,
        store,
        vault,
        invoker,
        notifier,
        artifacts,
    }
}
