// crates/dara-engine/src/engine.rs
// ============================================================================
// Module: Workflow Engine
// Description: Run state machine, step interpreter, and artifact writer.
// Purpose: Advance runs with at-most-once approvals and redacted artifacts.
// Dependencies: dara-core, dara-presets, dara-store-sqlite, dara-vault,
// serde_json
// ============================================================================

//! ## Overview
//! The engine drives a run synchronously from the caller's perspective:
//! `create_run` and `approve` return only after the interpreter has either
//! finished the run or suspended it at a gate. Gates are satisfied by
//! fingerprint, not by approval id: before executing a gated step the engine
//! asks whether *any* approved row exists for `(run_id, payload_hash)`, so
//! re-execution after approval never double-prompts.
//!
//! Crash semantics: every interpreter transition commits before the next
//! step runs, so a restart resumes from the recorded `current_step`. A crash
//! after a tool invocation but before the step advance re-invokes the tool
//! on resume; only write-gated tools consult the gate, and their approval
//! was already consumed. This hazard is accepted, not papered over.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use dara_core::ApprovalDecision;
use dara_core::ApprovalId;
use dara_core::ApprovalRecord;
use dara_core::ApprovalStatus;
use dara_core::ArtifactKind;
use dara_core::ArtifactRecord;
use dara_core::RunId;
use dara_core::RunNotifier;
use dara_core::RunRecord;
use dara_core::RunStatus;
use dara_core::RunView;
use dara_core::StepSpec;
use dara_core::Timestamp;
use dara_core::ToolInvoker;
use dara_core::WorkflowId;
use dara_core::WorkflowRecord;
use dara_core::canonical_json_string;
use dara_core::fingerprint;
use dara_core::identifiers::ArtifactId;
use dara_core::redact;
use dara_presets::PresetRegistry;
use dara_store_sqlite::SqliteStore;
use dara_vault::SecretsVault;
use serde_json::Value;
use serde_json::json;

use crate::error::EngineError;
use crate::seed;
use crate::shell;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tool name routed to local shell execution instead of the connector.
const SHELL_TOOL: &str = "shell_command";
/// Fixed artifact content for HTTP placeholder steps.
const HTTP_STEP_CONTENT: &str = "HTTP step executed";

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Workflow engine composing the store, vault, connector, notifier, and
/// preset registry.
///
/// # Invariants
/// - A completed run has `current_step` equal to its workflow's step count.
/// - A run in `waiting_approval` has a pending approval whose fingerprint
///   matches the step at `current_step`.
/// - Artifacts pass through redaction before reaching disk.
pub struct WorkflowEngine {
    /// Transactional persistence for every table.
    store: SqliteStore,
    /// Optional vault; absent when no master key is deployed.
    vault: Option<SecretsVault>,
    /// Outbound tool invocation seam.
    invoker: Arc<dyn ToolInvoker>,
    /// Completion notification seam.
    notifier: Arc<dyn RunNotifier>,
    /// Preset registry read when stamping notifications.
    presets: PresetRegistry,
    /// Root directory for run artifacts.
    artifacts_dir: PathBuf,
}

impl WorkflowEngine {
    /// Builds the engine and seeds the default workflows idempotently.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when seeding fails.
    pub fn new(
        store: SqliteStore,
        vault: Option<SecretsVault>,
        invoker: Arc<dyn ToolInvoker>,
        notifier: Arc<dyn RunNotifier>,
        presets: PresetRegistry,
        artifacts_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let engine = Self {
            store,
            vault,
            invoker,
            notifier,
            presets,
            artifacts_dir,
        };
        for workflow in seed::default_workflows() {
            engine.store.seed_workflow(&workflow)?;
        }
        Ok(engine)
    }

    /// Lists every workflow.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store read fails.
    pub fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, EngineError> {
        Ok(self.store.list_workflows()?)
    }

    /// Creates a run and drives it to completion or its first suspension.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown workflows.
    pub fn create_run(
        &self,
        workflow_id: &WorkflowId,
        input: Value,
    ) -> Result<RunView, EngineError> {
        if self.store.get_workflow(workflow_id)?.is_none() {
            return Err(EngineError::NotFound(format!("workflow not found: {workflow_id}")));
        }
        let now = Timestamp::now();
        let run = RunRecord {
            id: RunId::generate(),
            workflow_id: workflow_id.clone(),
            status: RunStatus::Running,
            current_step: 0,
            input,
            created_at: now.clone(),
            updated_at: now,
        };
        self.store.insert_run(&run)?;
        self.execute_run(&run.id)?;
        self.run_view(&run.id)
    }

    /// Returns a run with its approvals embedded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown runs.
    pub fn get_run(&self, run_id: &RunId) -> Result<RunView, EngineError> {
        self.run_view(run_id)
    }

    /// Lists a run's artifacts in write order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store read fails.
    pub fn list_artifacts(&self, run_id: &RunId) -> Result<Vec<ArtifactRecord>, EngineError> {
        Ok(self.store.list_artifacts(run_id)?)
    }

    /// Applies a decision to one approval row and resumes or ends the run.
    ///
    /// The named row is updated by id so clients can target a specific
    /// approval, but gate satisfaction itself is checked by fingerprint when
    /// the interpreter re-enters. Terminal runs reject further decisions.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for malformed decisions or a
    /// missing `decided_by`, and [`EngineError::NotFound`] for unknown runs
    /// or approvals.
    pub fn approve(
        &self,
        run_id: &RunId,
        approval_id: &ApprovalId,
        decision: &str,
        decided_by: Option<&str>,
    ) -> Result<RunView, EngineError> {
        let decision = ApprovalDecision::parse(decision).ok_or_else(|| {
            EngineError::Validation(format!(
                "invalid decision `{decision}` (approved|rejected)"
            ))
        })?;
        let decided_by = decided_by
            .filter(|value| !value.is_empty())
            .ok_or_else(|| EngineError::Validation("decided_by is required".to_string()))?;
        let run = self
            .store
            .get_run(run_id)?
            .ok_or_else(|| EngineError::NotFound(format!("run not found: {run_id}")))?;
        if run.status.is_terminal() {
            return Err(EngineError::Validation(format!(
                "run is already {}",
                run.status.as_str()
            )));
        }

        let now = Timestamp::now();
        let updated = self.store.update_approval_decision(
            approval_id,
            run_id,
            decision.status(),
            decided_by,
            &now,
        )?;
        if !updated {
            return Err(EngineError::NotFound(format!("approval not found: {approval_id}")));
        }

        match decision {
            ApprovalDecision::Approved => {
                // Resume at the gate's own index; the satisfied gate check
                // will pass and the interpreter advances past it.
                self.store.update_run_progress(
                    run_id,
                    RunStatus::Running,
                    run.current_step,
                    &now,
                )?;
                self.execute_run(run_id)?;
            }
            ApprovalDecision::Rejected => {
                self.store.update_run_progress(
                    run_id,
                    RunStatus::Rejected,
                    run.current_step,
                    &now,
                )?;
            }
        }
        self.run_view(run_id)
    }

    // ------------------------------------------------------------------
    // Interpreter
    // ------------------------------------------------------------------

    /// Advances a run from its recorded step until completion, suspension,
    /// or failure.
    fn execute_run(&self, run_id: &RunId) -> Result<(), EngineError> {
        let Some(run) = self.store.get_run(run_id)? else {
            return Err(EngineError::NotFound(format!("run not found: {run_id}")));
        };
        if !matches!(run.status, RunStatus::Running | RunStatus::WaitingApproval) {
            return Ok(());
        }
        let workflow = self.store.get_workflow(&run.workflow_id)?.ok_or_else(|| {
            EngineError::NotFound(format!("workflow not found: {}", run.workflow_id))
        })?;
        let steps = &workflow.schema.steps;

        let mut index = run.current_step;
        while index < steps.len() {
            let step = &steps[index];
            match step {
                StepSpec::AgentStep { .. } => {
                    let content = format!(
                        "Draft for workflow {}.\nInput: {}",
                        workflow.name,
                        canonical_json_string(&run.input)?
                    );
                    self.write_artifact(run_id, step, &content)?;
                }
                StepSpec::ApprovalGate { action_type } => {
                    let payload_hash = fingerprint(step)?;
                    if !self.store.has_approved(run_id, &payload_hash)? {
                        self.suspend(run_id, index, action_type, &payload_hash)?;
                        return Ok(());
                    }
                    // Satisfied gates pass through without producing an
                    // artifact.
                }
                StepSpec::ToolStep {
                    tool_name,
                    write,
                    command,
                    ..
                } => {
                    let payload_hash = fingerprint(step)?;
                    if *write && !self.store.has_approved(run_id, &payload_hash)? {
                        self.suspend(run_id, index, tool_name, &payload_hash)?;
                        return Ok(());
                    }
                    let result = if tool_name == SHELL_TOOL {
                        shell::run_shell_command(command.as_deref().unwrap_or(""))
                    } else {
                        let args = json!({"input": run.input.clone()});
                        match self.invoker.invoke(tool_name, &args, run_id) {
                            Ok(result) => result,
                            Err(err) => {
                                tracing::warn!(
                                    run_id = %run_id,
                                    tool = %tool_name,
                                    error = %err,
                                    "tool invocation failed; failing run"
                                );
                                self.store.update_run_progress(
                                    run_id,
                                    RunStatus::Failed,
                                    index,
                                    &Timestamp::now(),
                                )?;
                                return Ok(());
                            }
                        }
                    };
                    self.write_artifact(run_id, step, &canonical_json_string(&result)?)?;
                }
                StepSpec::HttpStep { .. } => {
                    self.write_artifact(run_id, step, HTTP_STEP_CONTENT)?;
                }
            }
            index += 1;
            self.store.update_run_progress(
                run_id,
                RunStatus::Running,
                index,
                &Timestamp::now(),
            )?;
        }

        self.store.update_run_progress(
            run_id,
            RunStatus::Completed,
            steps.len(),
            &Timestamp::now(),
        )?;
        self.notify_best_effort(run_id);
        Ok(())
    }

    /// Suspends a run at a gate, reusing any existing pending row for the
    /// same fingerprint so at most one is pending at a time.
    fn suspend(
        &self,
        run_id: &RunId,
        index: usize,
        action_type: &str,
        payload_hash: &str,
    ) -> Result<(), EngineError> {
        if !self.store.has_pending(run_id, payload_hash)? {
            self.store.insert_approval(&ApprovalRecord {
                id: ApprovalId::generate(),
                run_id: run_id.clone(),
                action_type: action_type.to_string(),
                payload_hash: payload_hash.to_string(),
                status: ApprovalStatus::Pending,
                decided_by: None,
                decided_at: None,
            })?;
        }
        self.store.update_run_progress(
            run_id,
            RunStatus::WaitingApproval,
            index,
            &Timestamp::now(),
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    /// Writes a step's artifact through redaction and records its row.
    ///
    /// Filenames come from the operator-authored schema and are trusted the
    /// same way shell commands are.
    fn write_artifact(
        &self,
        run_id: &RunId,
        step: &StepSpec,
        content: &str,
    ) -> Result<(), EngineError> {
        let Some(filename) = step.artifact_filename() else {
            return Ok(());
        };
        let dir = self.artifacts_dir.join("runs").join(run_id.as_str());
        std::fs::create_dir_all(&dir)
            .map_err(|err| EngineError::Internal(format!("create artifact dir: {err}")))?;

        let secrets = match self.vault.as_ref() {
            Some(vault) => vault
                .plaintexts()
                .map_err(|err| EngineError::Internal(format!("vault read: {err}")))?,
            None => Vec::new(),
        };
        let redacted = redact(content, &secrets);

        let path = dir.join(filename);
        std::fs::write(&path, redacted.as_bytes())
            .map_err(|err| EngineError::Internal(format!("write artifact: {err}")))?;
        let absolute = path.canonicalize().unwrap_or(path);

        self.store.insert_artifact(&ArtifactRecord {
            id: ArtifactId::generate(),
            run_id: run_id.clone(),
            path: absolute.display().to_string(),
            kind: ArtifactKind::Text,
            created_at: Timestamp::now(),
        })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------

    /// Emits the completion notification, swallowing every failure.
    fn notify_best_effort(&self, run_id: &RunId) {
        let preset = match self.presets.list() {
            Ok((_, state)) => state.active,
            Err(err) => {
                tracing::warn!(error = %err, "preset lookup failed; stamping fallback");
                "quality".to_string()
            }
        };
        if let Err(err) = self.notifier.notify_completion(run_id, &preset) {
            tracing::warn!(run_id = %run_id, error = %err, "webhook notification failed");
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Assembles the client-facing run view.
    fn run_view(&self, run_id: &RunId) -> Result<RunView, EngineError> {
        let run = self
            .store
            .get_run(run_id)?
            .ok_or_else(|| EngineError::NotFound(format!("run not found: {run_id}")))?;
        let approvals = self.store.list_approvals(run_id)?;
        Ok(RunView {
            id: run.id,
            workflow_id: run.workflow_id,
            status: run.status,
            current_step: run.current_step,
            created_at: run.created_at,
            updated_at: run.updated_at,
            approvals,
        })
    }
}
