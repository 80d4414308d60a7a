// crates/dara-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Control-Plane Store
// Description: Transactional persistence for all control-plane tables.
// Purpose: Serialize writers and keep run read-modify-write cycles atomic.
// Dependencies: dara-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! One `SQLite` database file holds every table named by the data model:
//! workflows, runs, approvals, artifacts, connectors, secrets, and the model
//! preset catalog. The schema is additive and idempotent (`CREATE TABLE IF
//! NOT EXISTS`); existing schemas are never migrated. A single process-wide
//! mutex guards the connection, which serializes writers — the engine's
//! correctness depends on read-modify-write atomicity of a run row. Reads
//! outside a transaction are permitted for list/get operations; every write
//! goes through [`SqliteStore::tx`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use dara_core::ApprovalId;
use dara_core::ApprovalRecord;
use dara_core::ApprovalStatus;
use dara_core::ArtifactKind;
use dara_core::ArtifactRecord;
use dara_core::ConnectorRecord;
use dara_core::ModelPreset;
use dara_core::RunId;
use dara_core::RunRecord;
use dara_core::RunStatus;
use dara_core::SecretHeader;
use dara_core::SecretId;
use dara_core::StoreError;
use dara_core::Timestamp;
use dara_core::WorkflowId;
use dara_core::WorkflowRecord;
use dara_core::WorkflowSchema;
use dara_core::identifiers::ArtifactId;
use dara_core::identifiers::ConnectorId;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Busy timeout applied to the shared connection (ms).
const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Idempotent schema statements, executed on every open.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS workflows (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        schema TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS runs (
        id TEXT PRIMARY KEY,
        workflow_id TEXT NOT NULL,
        status TEXT NOT NULL,
        current_step INTEGER NOT NULL,
        input TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS approvals (
        id TEXT PRIMARY KEY,
        run_id TEXT NOT NULL,
        action_type TEXT NOT NULL,
        payload_hash TEXT NOT NULL,
        status TEXT NOT NULL,
        decided_by TEXT,
        decided_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS artifacts (
        id TEXT PRIMARY KEY,
        run_id TEXT NOT NULL,
        path TEXT NOT NULL,
        type TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS connectors (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        metadata TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS secrets (
        id TEXT PRIMARY KEY,
        scope TEXT NOT NULL,
        name TEXT NOT NULL,
        value TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS model_presets (
        name TEXT PRIMARY KEY,
        model TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS model_preset_state (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        active_preset TEXT NOT NULL
    )",
];

// ============================================================================
// SECTION: Error Helpers
// ============================================================================

/// Maps a `rusqlite` error into the shared store error type.
fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Db(err.to_string())
}

/// Parses a stored step index into `usize`.
fn parse_step_index(raw: i64) -> Result<usize, StoreError> {
    usize::try_from(raw)
        .map_err(|_| StoreError::Invalid(format!("negative current_step: {raw}")))
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed control-plane store.
///
/// # Invariants
/// - All access is serialized through one mutex-guarded connection.
/// - Writes occur only inside [`SqliteStore::tx`] units of work.
/// - Nested `tx` calls are not supported (they would deadlock on the mutex).
#[derive(Clone)]
pub struct SqliteStore {
    /// Shared connection guarded by a process-wide mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| StoreError::Db(format!("create data dir: {err}")))?;
        }
        let connection = Connection::open(path).map_err(db_err)?;
        Self::from_connection(connection)
    }

    /// Opens an in-memory database, used by tests and local experiments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(db_err)?;
        Self::from_connection(connection)
    }

    /// Applies pragmas and the idempotent schema to a fresh connection.
    fn from_connection(connection: Connection) -> Result<Self, StoreError> {
        connection
            .busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(db_err)?;
        for statement in SCHEMA {
            connection.execute(statement, []).map_err(db_err)?;
        }
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Db("store mutex poisoned".to_string()))
    }

    /// Runs `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or [`StoreError::Db`] when the
    /// transaction cannot be opened or committed.
    pub fn tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_err)?;
        let value = f(&tx)?;
        tx.commit().map_err(db_err)?;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Workflows
    // ------------------------------------------------------------------

    /// Seeds a workflow row, leaving any existing row untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the insert fails.
    pub fn seed_workflow(&self, record: &WorkflowRecord) -> Result<(), StoreError> {
        let schema = serde_json::to_string(&record.schema)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        self.tx(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO workflows (id, name, schema, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.as_str(),
                    record.name,
                    schema,
                    record.created_at.as_str()
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Fetches one workflow by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or the stored schema does
    /// not parse.
    pub fn get_workflow(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT id, name, schema, created_at FROM workflows WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    let id: String = row.get(0)?;
                    let name: String = row.get(1)?;
                    let schema: String = row.get(2)?;
                    let created_at: String = row.get(3)?;
                    Ok((id, name, schema, created_at))
                },
            )
            .optional()
            .map_err(db_err)?;
        row.map(|(id, name, schema, created_at)| {
            let schema: WorkflowSchema = serde_json::from_str(&schema)
                .map_err(|err| StoreError::Serialization(err.to_string()))?;
            Ok(WorkflowRecord {
                id: WorkflowId::new(id),
                name,
                schema,
                created_at: Timestamp::new(created_at),
            })
        })
        .transpose()
    }

    /// Lists every workflow.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or a stored schema does
    /// not parse.
    pub fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare("SELECT id, name, schema, created_at FROM workflows ORDER BY rowid")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let name: String = row.get(1)?;
                let schema: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((id, name, schema, created_at))
            })
            .map_err(db_err)?;
        let mut results = Vec::new();
        for row in rows {
            let (id, name, schema, created_at) = row.map_err(db_err)?;
            let schema: WorkflowSchema = serde_json::from_str(&schema)
                .map_err(|err| StoreError::Serialization(err.to_string()))?;
            results.push(WorkflowRecord {
                id: WorkflowId::new(id),
                name,
                schema,
                created_at: Timestamp::new(created_at),
            });
        }
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------

    /// Inserts a freshly created run row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the insert fails.
    pub fn insert_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        let input = serde_json::to_string(&run.input)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let current_step = i64::try_from(run.current_step)
            .map_err(|_| StoreError::Invalid("current_step exceeds i64".to_string()))?;
        self.tx(|tx| {
            tx.execute(
                "INSERT INTO runs (id, workflow_id, status, current_step, input, created_at, \
                 updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    run.id.as_str(),
                    run.workflow_id.as_str(),
                    run.status.as_str(),
                    current_step,
                    input,
                    run.created_at.as_str(),
                    run.updated_at.as_str()
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Fetches one run by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or stored fields do not
    /// parse.
    pub fn get_run(&self, id: &RunId) -> Result<Option<RunRecord>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT id, workflow_id, status, current_step, input, created_at, updated_at \
                 FROM runs WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    let id: String = row.get(0)?;
                    let workflow_id: String = row.get(1)?;
                    let status: String = row.get(2)?;
                    let current_step: i64 = row.get(3)?;
                    let input: Option<String> = row.get(4)?;
                    let created_at: String = row.get(5)?;
                    let updated_at: String = row.get(6)?;
                    Ok((id, workflow_id, status, current_step, input, created_at, updated_at))
                },
            )
            .optional()
            .map_err(db_err)?;
        row.map(|(id, workflow_id, status, current_step, input, created_at, updated_at)| {
            let status = RunStatus::parse(&status)
                .ok_or_else(|| StoreError::Invalid(format!("unknown run status: {status}")))?;
            let input = match input {
                Some(text) => serde_json::from_str(&text)
                    .map_err(|err| StoreError::Serialization(err.to_string()))?,
                None => serde_json::Value::Null,
            };
            Ok(RunRecord {
                id: RunId::new(id),
                workflow_id: WorkflowId::new(workflow_id),
                status,
                current_step: parse_step_index(current_step)?,
                input,
                created_at: Timestamp::new(created_at),
                updated_at: Timestamp::new(updated_at),
            })
        })
        .transpose()
    }

    /// Updates a run's status and step cursor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    pub fn update_run_progress(
        &self,
        id: &RunId,
        status: RunStatus,
        current_step: usize,
        updated_at: &Timestamp,
    ) -> Result<(), StoreError> {
        let current_step = i64::try_from(current_step)
            .map_err(|_| StoreError::Invalid("current_step exceeds i64".to_string()))?;
        self.tx(|tx| {
            tx.execute(
                "UPDATE runs SET status = ?1, current_step = ?2, updated_at = ?3 WHERE id = ?4",
                params![status.as_str(), current_step, updated_at.as_str(), id.as_str()],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Approvals
    // ------------------------------------------------------------------

    /// Inserts a pending approval row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn insert_approval(&self, approval: &ApprovalRecord) -> Result<(), StoreError> {
        self.tx(|tx| {
            tx.execute(
                "INSERT INTO approvals (id, run_id, action_type, payload_hash, status, \
                 decided_by, decided_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    approval.id.as_str(),
                    approval.run_id.as_str(),
                    approval.action_type,
                    approval.payload_hash,
                    approval.status.as_str(),
                    approval.decided_by,
                    approval.decided_at.as_ref().map(Timestamp::as_str)
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Applies a decision to one approval row of a run.
    ///
    /// Returns `false` when no row matched the `(approval_id, run_id)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    pub fn update_approval_decision(
        &self,
        id: &ApprovalId,
        run_id: &RunId,
        status: ApprovalStatus,
        decided_by: &str,
        decided_at: &Timestamp,
    ) -> Result<bool, StoreError> {
        self.tx(|tx| {
            let changed = tx
                .execute(
                    "UPDATE approvals SET status = ?1, decided_by = ?2, decided_at = ?3 \
                     WHERE id = ?4 AND run_id = ?5",
                    params![
                        status.as_str(),
                        decided_by,
                        decided_at.as_str(),
                        id.as_str(),
                        run_id.as_str()
                    ],
                )
                .map_err(db_err)?;
            Ok(changed > 0)
        })
    }

    /// Lists a run's approvals in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or stored fields do not
    /// parse.
    pub fn list_approvals(&self, run_id: &RunId) -> Result<Vec<ApprovalRecord>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT id, run_id, action_type, payload_hash, status, decided_by, decided_at \
                 FROM approvals WHERE run_id = ?1 ORDER BY rowid",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![run_id.as_str()], |row| {
                let id: String = row.get(0)?;
                let run_id: String = row.get(1)?;
                let action_type: String = row.get(2)?;
                let payload_hash: String = row.get(3)?;
                let status: String = row.get(4)?;
                let decided_by: Option<String> = row.get(5)?;
                let decided_at: Option<String> = row.get(6)?;
                Ok((id, run_id, action_type, payload_hash, status, decided_by, decided_at))
            })
            .map_err(db_err)?;
        let mut results = Vec::new();
        for row in rows {
            let (id, run_id, action_type, payload_hash, status, decided_by, decided_at) =
                row.map_err(db_err)?;
            let status = ApprovalStatus::parse(&status).ok_or_else(|| {
                StoreError::Invalid(format!("unknown approval status: {status}"))
            })?;
            results.push(ApprovalRecord {
                id: ApprovalId::new(id),
                run_id: RunId::new(run_id),
                action_type,
                payload_hash,
                status,
                decided_by,
                decided_at: decided_at.map(Timestamp::new),
            });
        }
        Ok(results)
    }

    /// Returns whether any approved row exists for `(run_id, payload_hash)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn has_approved(&self, run_id: &RunId, payload_hash: &str) -> Result<bool, StoreError> {
        self.approval_exists(run_id, payload_hash, ApprovalStatus::Approved)
    }

    /// Returns whether a pending row exists for `(run_id, payload_hash)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn has_pending(&self, run_id: &RunId, payload_hash: &str) -> Result<bool, StoreError> {
        self.approval_exists(run_id, payload_hash, ApprovalStatus::Pending)
    }

    /// Shared existence predicate for approval rows by fingerprint.
    fn approval_exists(
        &self,
        run_id: &RunId,
        payload_hash: &str,
        status: ApprovalStatus,
    ) -> Result<bool, StoreError> {
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM approvals WHERE run_id = ?1 AND payload_hash = ?2 \
                 AND status = ?3)",
                params![run_id.as_str(), payload_hash, status.as_str()],
                |row| row.get::<_, bool>(0),
            )
            .map_err(db_err)
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    /// Inserts an artifact row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn insert_artifact(&self, artifact: &ArtifactRecord) -> Result<(), StoreError> {
        self.tx(|tx| {
            tx.execute(
                "INSERT INTO artifacts (id, run_id, path, type, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    artifact.id.as_str(),
                    artifact.run_id.as_str(),
                    artifact.path,
                    artifact.kind.as_str(),
                    artifact.created_at.as_str()
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Lists a run's artifacts in write order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or stored fields do not
    /// parse.
    pub fn list_artifacts(&self, run_id: &RunId) -> Result<Vec<ArtifactRecord>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT id, run_id, path, type, created_at FROM artifacts WHERE run_id = ?1 \
                 ORDER BY rowid",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![run_id.as_str()], |row| {
                let id: String = row.get(0)?;
                let run_id: String = row.get(1)?;
                let path: String = row.get(2)?;
                let kind: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok((id, run_id, path, kind, created_at))
            })
            .map_err(db_err)?;
        let mut results = Vec::new();
        for row in rows {
            let (id, run_id, path, kind, created_at) = row.map_err(db_err)?;
            let kind = ArtifactKind::parse(&kind)
                .ok_or_else(|| StoreError::Invalid(format!("unknown artifact type: {kind}")))?;
            results.push(ArtifactRecord {
                id: ArtifactId::new(id),
                run_id: RunId::new(run_id),
                path,
                kind,
                created_at: Timestamp::new(created_at),
            });
        }
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Connectors
    // ------------------------------------------------------------------

    /// Inserts or replaces a connector registration record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn upsert_connector(&self, connector: &ConnectorRecord) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&connector.metadata)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        self.tx(|tx| {
            tx.execute(
                "INSERT OR REPLACE INTO connectors (id, name, status, metadata, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    connector.id.as_str(),
                    connector.name,
                    connector.status,
                    metadata,
                    connector.created_at.as_str()
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Lists cached connector registrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or stored metadata does
    /// not parse.
    pub fn list_connectors(&self) -> Result<Vec<ConnectorRecord>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT id, name, status, metadata, created_at FROM connectors ORDER BY rowid",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let name: String = row.get(1)?;
                let status: String = row.get(2)?;
                let metadata: Option<String> = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok((id, name, status, metadata, created_at))
            })
            .map_err(db_err)?;
        let mut results = Vec::new();
        for row in rows {
            let (id, name, status, metadata, created_at) = row.map_err(db_err)?;
            let metadata = match metadata {
                Some(text) => serde_json::from_str(&text)
                    .map_err(|err| StoreError::Serialization(err.to_string()))?,
                None => serde_json::Value::Null,
            };
            results.push(ConnectorRecord {
                id: ConnectorId::new(id),
                name,
                status,
                metadata,
                created_at: Timestamp::new(created_at),
            });
        }
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Secrets
    // ------------------------------------------------------------------

    /// Inserts a secret row with its ciphertext value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn insert_secret(
        &self,
        header: &SecretHeader,
        ciphertext: &str,
    ) -> Result<(), StoreError> {
        self.tx(|tx| {
            tx.execute(
                "INSERT INTO secrets (id, scope, name, value, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    header.id.as_str(),
                    header.scope,
                    header.name,
                    ciphertext,
                    header.created_at.as_str()
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Lists secret headers, optionally filtered by scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_secret_headers(
        &self,
        scope: Option<&str>,
    ) -> Result<Vec<SecretHeader>, StoreError> {
        let guard = self.lock()?;
        let (sql, filter) = match scope {
            Some(scope) => (
                "SELECT id, scope, name, created_at FROM secrets WHERE scope = ?1 ORDER BY rowid",
                Some(scope),
            ),
            None => ("SELECT id, scope, name, created_at FROM secrets ORDER BY rowid", None),
        };
        let mut stmt = guard.prepare(sql).map_err(db_err)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            let id: String = row.get(0)?;
            let scope: String = row.get(1)?;
            let name: String = row.get(2)?;
            let created_at: String = row.get(3)?;
            Ok((id, scope, name, created_at))
        };
        let rows = match filter {
            Some(scope) => stmt.query_map(params![scope], map_row).map_err(db_err)?,
            None => stmt.query_map([], map_row).map_err(db_err)?,
        };
        let mut results = Vec::new();
        for row in rows {
            let (id, scope, name, created_at) = row.map_err(db_err)?;
            results.push(SecretHeader {
                id: SecretId::new(id),
                scope,
                name,
                created_at: Timestamp::new(created_at),
            });
        }
        Ok(results)
    }

    /// Fetches one secret's ciphertext by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn get_secret_ciphertext(&self, id: &SecretId) -> Result<Option<String>, StoreError> {
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT value FROM secrets WHERE id = ?1",
                params![id.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(db_err)
    }

    /// Lists every stored ciphertext, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_secret_ciphertexts(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.lock()?;
        let mut stmt =
            guard.prepare("SELECT value FROM secrets ORDER BY rowid").map_err(db_err)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(db_err)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(db_err)?);
        }
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Model presets
    // ------------------------------------------------------------------

    /// Seeds one preset row, leaving any existing row untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn seed_preset(&self, name: &str, model: &str) -> Result<(), StoreError> {
        self.tx(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO model_presets (name, model) VALUES (?1, ?2)",
                params![name, model],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Seeds the single active-preset state row if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn seed_preset_state(&self, active: &str) -> Result<(), StoreError> {
        self.tx(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO model_preset_state (id, active_preset) VALUES (1, ?1)",
                params![active],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Lists the preset catalog in seed order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_presets(&self) -> Result<Vec<ModelPreset>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare("SELECT name, model FROM model_presets ORDER BY rowid")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let model: String = row.get(1)?;
                Ok(ModelPreset { name, model })
            })
            .map_err(db_err)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(db_err)?);
        }
        Ok(results)
    }

    /// Returns the active preset name, if the state row exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn get_active_preset(&self) -> Result<Option<String>, StoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT active_preset FROM model_preset_state WHERE id = 1", [], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(db_err)
    }

    /// Points the active-preset state at `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    pub fn set_active_preset(&self, name: &str) -> Result<(), StoreError> {
        self.tx(|tx| {
            tx.execute(
                "UPDATE model_preset_state SET active_preset = ?1 WHERE id = 1",
                params![name],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }
}
