// crates/dara-connectors/src/client.rs
// ============================================================================
// Module: Connector Client
// Description: Outbound HTTP to the tool-invocation service.
// Purpose: List, register, and invoke connectors with fail-closed URL checks.
// Dependencies: dara-config, dara-core, dara-store-sqlite, reqwest, url
// ============================================================================

//! ## Overview
//! The connector client speaks to one configured tool-invocation service
//! with a bearer token. Its base URL is validated at construction: schemes
//! other than http/https, loopback hosts, and private or link-local IPv4
//! prefixes disable the client entirely. A disabled client reports an empty
//! connector list and fails invocations with a configuration error, so a
//! misconfigured deployment degrades loudly instead of probing the wrong
//! network.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use dara_config::ConnectorSettings;
use dara_core::ConnectorRecord;
use dara_core::RunId;
use dara_core::StoreError;
use dara_core::Timestamp;
use dara_core::ToolError;
use dara_core::ToolInvoker;
use dara_core::identifiers::ConnectorId;
use dara_store_sqlite::SqliteStore;
use reqwest::blocking::Client;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timeout for connector listings.
const LIST_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for connector registration.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
/// Timeout for tool invocations.
const INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Hostnames treated as loopback regardless of resolution.
const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];
/// IPv4 prefixes treated as private or link-local.
const PRIVATE_PREFIXES: [&str; 4] = ["10.", "172.16.", "192.168.", "169.254."];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Connector client errors.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The client is unset or was disabled by the URL safety gate.
    #[error("connector client not configured: {0}")]
    Configuration(String),
    /// The tool service returned an error or was unreachable.
    #[error("connector request failed: {0}")]
    External(String),
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: URL Safety Gate
// ============================================================================

/// Validates a configured base URL, returning it with trailing slashes
/// trimmed.
fn checked_base_url(raw: &str) -> Result<String, String> {
    let parsed = Url::parse(raw).map_err(|err| format!("unparseable url: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme: {other}")),
    }
    let Some(host) = parsed.host_str() else {
        return Err("missing host".to_string());
    };
    let host = host.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase();
    if LOOPBACK_HOSTS.contains(&host.as_str()) {
        return Err("loopback host is not allowed".to_string());
    }
    if PRIVATE_PREFIXES.iter().any(|prefix| host.starts_with(prefix)) {
        return Err("private or link-local host is not allowed".to_string());
    }
    Ok(raw.trim_end_matches('/').to_string())
}

// ============================================================================
// SECTION: Response Mapping
// ============================================================================

/// Maps one listing entry from the tool service into a connector record.
fn record_from_listing(item: Value) -> ConnectorRecord {
    let id = item
        .get("id")
        .and_then(Value::as_str)
        .map_or_else(ConnectorId::generate, ConnectorId::new);
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let status = item
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("available")
        .to_string();
    let created_at = item
        .get("created_at")
        .and_then(Value::as_str)
        .map_or_else(Timestamp::now, Timestamp::new);
    ConnectorRecord {
        id,
        name,
        status,
        metadata: item,
        created_at,
    }
}

/// Builds the cached record for a successful registration response.
fn record_from_connect(name: &str, data: Value) -> ConnectorRecord {
    let id = data
        .get("id")
        .and_then(Value::as_str)
        .map_or_else(ConnectorId::generate, ConnectorId::new);
    let status = data
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("connected")
        .to_string();
    ConnectorRecord {
        id,
        name: name.to_string(),
        status,
        metadata: data,
        created_at: Timestamp::now(),
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Outbound client for the tool-invocation service.
///
/// # Invariants
/// - `base_url` is `None` exactly when the client is disabled; every network
///   path checks it first.
/// - Successful registrations are cached in the store.
pub struct ConnectorClient {
    /// Validated base URL, or `None` when disabled.
    base_url: Option<String>,
    /// Bearer token for the tool service.
    api_key: Option<String>,
    /// Shared blocking HTTP client; per-request timeouts apply.
    client: Client,
    /// Store used to cache registrations.
    store: SqliteStore,
}

impl ConnectorClient {
    /// Builds a client from deployment settings.
    ///
    /// An unset or unsafe base URL yields a disabled client rather than an
    /// error; the rejection reason is logged once here.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the HTTP client cannot be created.
    pub fn new(settings: &ConnectorSettings, store: SqliteStore) -> Result<Self, ConnectorError> {
        let base_url = match settings.base_url.as_deref() {
            None => None,
            Some(raw) => match checked_base_url(raw) {
                Ok(url) => Some(url),
                Err(reason) => {
                    tracing::warn!(%reason, "disabling connector client: unsafe base url");
                    None
                }
            },
        };
        let client = Client::builder()
            .build()
            .map_err(|err| ConnectorError::Configuration(err.to_string()))?;
        Ok(Self {
            base_url,
            api_key: settings.api_key.clone(),
            client,
            store,
        })
    }

    /// Returns whether the client will perform network calls.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Lists connectors from the tool service.
    ///
    /// A disabled client reports an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::External`] when the request fails.
    pub fn list(&self) -> Result<Vec<ConnectorRecord>, ConnectorError> {
        let Some(base_url) = self.base_url.as_deref() else {
            return Ok(Vec::new());
        };
        let mut request = self.client.get(format!("{base_url}/connectors")).timeout(LIST_TIMEOUT);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|err| ConnectorError::External(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ConnectorError::External(format!(
                "connector list returned status {}",
                response.status().as_u16()
            )));
        }
        let items: Vec<Value> =
            response.json().map_err(|err| ConnectorError::External(err.to_string()))?;
        Ok(items.into_iter().map(record_from_listing).collect())
    }

    /// Registers a connector and caches the resulting record.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Configuration`] when disabled and
    /// [`ConnectorError::External`] when the request fails.
    pub fn connect(&self, name: &str, payload: &Value) -> Result<ConnectorRecord, ConnectorError> {
        let Some(base_url) = self.base_url.as_deref() else {
            return Err(ConnectorError::Configuration("MCP_RUBE_URL not configured".to_string()));
        };
        let mut request = self
            .client
            .post(format!("{base_url}/connectors/connect"))
            .timeout(CONNECT_TIMEOUT)
            .json(&json!({"name": name, "payload": payload}));
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|err| ConnectorError::External(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ConnectorError::External(format!(
                "connector connect returned status {}",
                response.status().as_u16()
            )));
        }
        let data: Value =
            response.json().map_err(|err| ConnectorError::External(err.to_string()))?;
        let record = record_from_connect(name, data);
        self.store.upsert_connector(&record)?;
        Ok(record)
    }

    /// Returns cached connector registrations from the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Store`] when the read fails.
    pub fn status(&self) -> Result<Vec<ConnectorRecord>, ConnectorError> {
        Ok(self.store.list_connectors()?)
    }
}

impl ToolInvoker for ConnectorClient {
    fn invoke(&self, tool_name: &str, args: &Value, run_id: &RunId) -> Result<Value, ToolError> {
        let Some(base_url) = self.base_url.as_deref() else {
            return Err(ToolError::Configuration("MCP_RUBE_URL not configured".to_string()));
        };
        let mut request = self
            .client
            .post(format!("{base_url}/tools/invoke"))
            .timeout(INVOKE_TIMEOUT)
            .json(&json!({"tool_name": tool_name, "args": args, "run_id": run_id}));
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|err| ToolError::External(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ToolError::External(format!(
                "tool invoke returned status {}",
                response.status().as_u16()
            )));
        }
        response.json().map_err(|err| ToolError::External(err.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
