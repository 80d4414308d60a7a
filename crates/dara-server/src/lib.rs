// crates/dara-server/src/lib.rs
// ============================================================================
// Module: Dara HTTP Server
// Description: axum routes mapping the engine onto the HTTP API.
// Purpose: Validate requests and translate error variants to status codes.
// Dependencies: axum, dara-config, dara-connectors, dara-core, dara-engine,
// dara-notify, dara-presets, dara-store-sqlite, dara-vault, tokio
// ============================================================================

//! ## Overview
//! Thin route handlers over the workflow engine, vault, preset registry, and
//! connector client. Handlers validate shape, dispatch the synchronous
//! engine onto the blocking pool, and map the engine's error taxonomy onto
//! integer status codes: not-found 404, validation 400, external 502,
//! internal 500.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use dara_config::ControlPlaneConfig;
use dara_connectors::ConnectorClient;
use dara_connectors::ConnectorError;
use dara_core::ApprovalId;
use dara_core::ArtifactRecord;
use dara_core::ConnectorRecord;
use dara_core::ModelPreset;
use dara_core::PresetState;
use dara_core::RunId;
use dara_core::RunNotifier;
use dara_core::RunView;
use dara_core::SecretHeader;
use dara_core::ToolInvoker;
use dara_core::WorkflowId;
use dara_core::WorkflowRecord;
use dara_engine::EngineError;
use dara_engine::WorkflowEngine;
use dara_notify::WorkflowNotifier;
use dara_presets::PresetError;
use dara_presets::PresetRegistry;
use dara_store_sqlite::SqliteStore;
use dara_vault::SecretsVault;
use dara_vault::VaultError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Startup failures for the server binary.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Environment configuration was invalid.
    #[error(transparent)]
    Config(#[from] dara_config::ConfigError),
    /// A component could not be constructed.
    #[error("component init failed: {0}")]
    Init(String),
    /// Binding or serving the listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response carrying the mapped status code.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status for the response.
    pub status: StatusCode,
    /// Human-readable error detail.
    pub message: String,
}

impl ApiError {
    /// Builds an internal-error response.
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Builds a bad-request response.
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::External(_) => StatusCode::BAD_GATEWAY,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(error: VaultError) -> Self {
        match &error {
            VaultError::Store(_) => Self::internal(error.to_string()),
            VaultError::Configuration(_) | VaultError::NotFound | VaultError::Crypto(_) => {
                Self::bad_request(error.to_string())
            }
        }
    }
}

impl From<PresetError> for ApiError {
    fn from(error: PresetError) -> Self {
        match &error {
            PresetError::Unknown(_) => Self::bad_request(error.to_string()),
            PresetError::Store(_) => Self::internal(error.to_string()),
        }
    }
}

impl From<ConnectorError> for ApiError {
    fn from(error: ConnectorError) -> Self {
        match &error {
            ConnectorError::Configuration(_) => Self::bad_request(error.to_string()),
            ConnectorError::External(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: error.to_string(),
            },
            ConnectorError::Store(_) => Self::internal(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Workflow engine.
    pub engine: Arc<WorkflowEngine>,
    /// Secrets vault; absent when no master key is deployed.
    pub vault: Option<SecretsVault>,
    /// Model preset registry.
    pub presets: PresetRegistry,
    /// Connector client.
    pub connectors: Arc<ConnectorClient>,
}

/// Builds all components from deployment configuration.
///
/// # Errors
///
/// Returns [`ServerError`] when a component cannot be constructed.
pub fn build_state(config: &ControlPlaneConfig) -> Result<AppState, ServerError> {
    let store = SqliteStore::open(&config.db_path())
        .map_err(|err| ServerError::Init(err.to_string()))?;
    let vault = match config.master_key.as_deref() {
        Some(master_key) => Some(
            SecretsVault::new(master_key, store.clone())
                .map_err(|err| ServerError::Init(err.to_string()))?,
        ),
        None => {
            tracing::warn!("MASTER_KEY unset; vault endpoints disabled");
            None
        }
    };
    let preset_pairs = config.presets.pairs();
    let presets = PresetRegistry::new(store.clone(), &preset_pairs, &config.presets.default_active)
        .map_err(|err| ServerError::Init(err.to_string()))?;
    let connectors = Arc::new(
        ConnectorClient::new(&config.connector, store.clone())
            .map_err(|err| ServerError::Init(err.to_string()))?,
    );
    let notifier = Arc::new(
        WorkflowNotifier::new(config.webhook.clone(), config.tts.clone(), store.clone())
            .map_err(|err| ServerError::Init(err.to_string()))?,
    );
    let engine = Arc::new(
        WorkflowEngine::new(
            store,
            vault.clone(),
            Arc::clone(&connectors) as Arc<dyn ToolInvoker>,
            notifier as Arc<dyn RunNotifier>,
            presets.clone(),
            config.artifacts_dir.clone(),
        )
        .map_err(|err| ServerError::Init(err.to_string()))?,
    );
    Ok(AppState {
        engine,
        vault,
        presets,
        connectors,
    })
}

/// Builds the full API router over the shared state.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/run", post(run_workflow))
        .route("/api/workflows/run/{run_id}", get(get_run))
        .route("/api/workflows/run/{run_id}/artifacts", get(list_artifacts))
        .route("/api/workflows/run/{run_id}/approve", post(approve_run))
        .route("/api/vault/secrets", post(store_secret).get(list_secrets))
        .route("/api/models/presets", get(list_presets))
        .route("/api/models/presets/active", post(set_active_preset))
        .route("/api/connectors", get(list_connectors))
        .route("/api/connectors/connect", post(connect_connector))
        .route("/api/connectors/status", get(connectors_status))
        .with_state(state)
}

/// Runs a blocking closure on the blocking pool and flattens the join.
async fn dispatch<T, E>(f: impl FnOnce() -> Result<T, E> + Send + 'static) -> Result<T, ApiError>
where
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ApiError::internal(format!("blocking task failed: {err}")))?
        .map_err(Into::into)
}

// ============================================================================
// SECTION: Request And Response Types
// ============================================================================

/// Returns the default empty-object input payload.
fn empty_object() -> Value {
    json!({})
}

/// Body of `POST /api/workflows/run`.
#[derive(Debug, Deserialize)]
struct RunRequest {
    /// Workflow to execute.
    workflow_id: String,
    /// Structured run input.
    #[serde(default = "empty_object")]
    input: Value,
}

/// Response of `POST /api/workflows/run`.
#[derive(Debug, Serialize)]
struct RunCreated {
    /// Identifier of the created run.
    run_id: RunId,
}

/// Body of `POST /api/workflows/run/{run_id}/approve`.
#[derive(Debug, Deserialize)]
struct ApprovalRequest {
    /// Approval row to decide.
    approval_id: String,
    /// Decision value, `approved` or `rejected`.
    decision: String,
    /// Identity of the decider.
    decided_by: Option<String>,
}

/// Body of `POST /api/vault/secrets`.
#[derive(Debug, Deserialize)]
struct SecretRequest {
    /// Free-form grouping scope.
    scope: String,
    /// Secret name within its scope.
    name: String,
    /// Plaintext value to encrypt.
    value: String,
}

/// Query of `GET /api/vault/secrets`.
#[derive(Debug, Deserialize)]
struct ScopeQuery {
    /// Optional scope filter.
    scope: Option<String>,
}

/// Response of `GET /api/models/presets`.
#[derive(Debug, Serialize)]
struct PresetListResponse {
    /// Catalog entries.
    presets: Vec<ModelPreset>,
    /// Active-selection state.
    state: PresetState,
}

/// Body of `POST /api/models/presets/active`.
#[derive(Debug, Deserialize)]
struct PresetActivateRequest {
    /// Preset name to activate.
    preset: String,
}

/// Body of `POST /api/connectors/connect`.
#[derive(Debug, Deserialize)]
struct ConnectorConnectRequest {
    /// Connector name to register.
    name: String,
    /// Registration payload forwarded to the tool service.
    #[serde(default = "empty_object")]
    payload: Value,
}

// ============================================================================
// SECTION: Workflow Routes
// ============================================================================

/// `GET /api/workflows` — lists every workflow.
async fn list_workflows(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkflowRecord>>, ApiError> {
    let workflows = dispatch(move || state.engine.list_workflows()).await?;
    Ok(Json(workflows))
}

/// `POST /api/workflows/run` — creates and drives a run.
async fn run_workflow(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunCreated>, ApiError> {
    let view = dispatch(move || {
        state.engine.create_run(&WorkflowId::new(request.workflow_id), request.input)
    })
    .await?;
    Ok(Json(RunCreated {
        run_id: view.id,
    }))
}

/// `GET /api/workflows/run/{run_id}` — returns a run with approvals.
async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunView>, ApiError> {
    let view = dispatch(move || state.engine.get_run(&RunId::new(run_id))).await?;
    Ok(Json(view))
}

/// `GET /api/workflows/run/{run_id}/artifacts` — lists a run's artifacts.
async fn list_artifacts(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<Vec<ArtifactRecord>>, ApiError> {
    let artifacts = dispatch(move || state.engine.list_artifacts(&RunId::new(run_id))).await?;
    Ok(Json(artifacts))
}

/// `POST /api/workflows/run/{run_id}/approve` — decides a pending approval.
async fn approve_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<RunView>, ApiError> {
    let view = dispatch(move || {
        state.engine.approve(
            &RunId::new(run_id),
            &ApprovalId::new(request.approval_id),
            &request.decision,
            request.decided_by.as_deref(),
        )
    })
    .await?;
    Ok(Json(view))
}

// ============================================================================
// SECTION: Vault Routes
// ============================================================================

/// Returns the vault, or the 400 used when no master key is deployed.
fn require_vault(state: &AppState) -> Result<SecretsVault, ApiError> {
    state
        .vault
        .clone()
        .ok_or_else(|| ApiError::bad_request("MASTER_KEY is required for secrets vault"))
}

/// `POST /api/vault/secrets` — encrypts and stores a secret.
async fn store_secret(
    State(state): State<AppState>,
    Json(request): Json<SecretRequest>,
) -> Result<Json<SecretHeader>, ApiError> {
    let vault = require_vault(&state)?;
    let header =
        dispatch(move || vault.store(&request.scope, &request.name, &request.value)).await?;
    Ok(Json(header))
}

/// `GET /api/vault/secrets` — lists secret headers.
async fn list_secrets(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Vec<SecretHeader>>, ApiError> {
    let vault = require_vault(&state)?;
    let headers = dispatch(move || vault.list(query.scope.as_deref())).await?;
    Ok(Json(headers))
}

// ============================================================================
// SECTION: Preset Routes
// ============================================================================

/// `GET /api/models/presets` — lists the catalog and active state.
async fn list_presets(
    State(state): State<AppState>,
) -> Result<Json<PresetListResponse>, ApiError> {
    let (presets, preset_state) = dispatch(move || state.presets.list()).await?;
    Ok(Json(PresetListResponse {
        presets,
        state: preset_state,
    }))
}

/// `POST /api/models/presets/active` — switches the active preset.
async fn set_active_preset(
    State(state): State<AppState>,
    Json(request): Json<PresetActivateRequest>,
) -> Result<Json<PresetState>, ApiError> {
    let preset_state = dispatch(move || state.presets.set_active(&request.preset)).await?;
    Ok(Json(preset_state))
}

// ============================================================================
// SECTION: Connector Routes
// ============================================================================

/// `GET /api/connectors` — lists connectors from the tool service.
async fn list_connectors(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConnectorRecord>>, ApiError> {
    let records = dispatch(move || state.connectors.list()).await?;
    Ok(Json(records))
}

/// `POST /api/connectors/connect` — registers a connector.
async fn connect_connector(
    State(state): State<AppState>,
    Json(request): Json<ConnectorConnectRequest>,
) -> Result<Json<ConnectorRecord>, ApiError> {
    let record =
        dispatch(move || state.connectors.connect(&request.name, &request.payload)).await?;
    Ok(Json(record))
}

/// `GET /api/connectors/status` — lists cached connector registrations.
async fn connectors_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConnectorRecord>>, ApiError> {
    let records = dispatch(move || state.connectors.status()).await?;
    Ok(Json(records))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
