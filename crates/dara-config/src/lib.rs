// crates/dara-config/src/lib.rs
// ============================================================================
// Module: Dara Configuration
// Description: Environment-driven configuration for the control plane.
// Purpose: Read deployment settings into typed, validated structures.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The control plane is configured entirely through environment variables.
//! [`ControlPlaneConfig::from_env`] reads the process environment;
//! [`ControlPlaneConfig::from_lookup`] takes an explicit lookup function so
//! tests can supply settings without mutating global process state. Unknown
//! values for enumerated settings fail loading rather than defaulting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Filename of the embedded database inside the data directory.
pub const DB_FILENAME: &str = "dara_control_plane.db";
/// Default data directory.
const DEFAULT_DATA_DIR: &str = "/data";
/// Default artifacts directory.
const DEFAULT_ARTIFACTS_DIR: &str = "/data/artifacts";
/// Default listen address for the HTTP API.
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value outside its accepted set.
    #[error("invalid value for {var}: {message}")]
    InvalidValue {
        /// Offending variable name.
        var: &'static str,
        /// Human-readable detail.
        message: String,
    },
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Outbound connector client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// Base URL of the tool-invocation service (`MCP_RUBE_URL`).
    pub base_url: Option<String>,
    /// Bearer token for the tool-invocation service (`MCP_RUBE_API_KEY`).
    pub api_key: Option<String>,
}

/// Completion webhook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Webhook endpoint (`WEBHOOK_URL`); unset disables notification.
    pub url: Option<String>,
    /// HMAC signing secret (`WEBHOOK_SECRET`); unset disables signing.
    pub secret: Option<String>,
    /// Whether completion notifications fire at all (`NOTIFY_ON_COMPLETE`).
    pub notify_on_complete: bool,
}

/// Text-to-speech provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    /// Audio enrichment disabled.
    None,
    /// ElevenLabs text-to-speech API.
    Elevenlabs,
    /// OpenAI audio speech API.
    Openai,
}

impl TtsProvider {
    /// Parses the wire form of a provider name.
    fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "elevenlabs" => Some(Self::Elevenlabs),
            "openai" => Some(Self::Openai),
            _ => None,
        }
    }
}

/// Text-to-speech enrichment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsSettings {
    /// Provider selection (`TTS_PROVIDER`, default `none`).
    pub provider: TtsProvider,
    /// Provider voice identifier (`TTS_VOICE`).
    pub voice: String,
    /// Provider API key (`TTS_API_KEY`); unset disables synthesis.
    pub api_key: Option<String>,
}

/// Model preset defaults seeded into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSettings {
    /// Model for the `quality` preset (`MODEL_PRESET_QUALITY`).
    pub quality: String,
    /// Model for the `main` preset (`MODEL_PRESET_MAIN`).
    pub main: String,
    /// Model for the `fast` preset (`MODEL_PRESET_FAST`).
    pub fast: String,
    /// Model for the `long` preset (`MODEL_PRESET_LONG`).
    pub long: String,
    /// Default active preset name (`DEFAULT_MODEL_PRESET`).
    pub default_active: String,
}

impl PresetSettings {
    /// Returns the seeded `(name, model)` pairs in catalog order.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("quality", self.quality.as_str()),
            ("main", self.main.as_str()),
            ("fast", self.fast.as_str()),
            ("long", self.long.as_str()),
        ]
    }
}

// ============================================================================
// SECTION: Top-Level Configuration
// ============================================================================

/// Complete control-plane configuration.
///
/// # Invariants
/// - `data_dir` and `artifacts_dir` are used as-is; directories are created
///   on first use by their owners.
/// - `master_key`, when present, is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    /// Directory holding the embedded database (`DATA_DIR`).
    pub data_dir: PathBuf,
    /// Root directory for run artifacts (`ARTIFACTS_DIR`).
    pub artifacts_dir: PathBuf,
    /// Vault master key (`MASTER_KEY`); unset disables the vault.
    pub master_key: Option<String>,
    /// HTTP listen address (`LISTEN_ADDR`).
    pub listen_addr: String,
    /// Connector client settings.
    pub connector: ConnectorSettings,
    /// Webhook settings.
    pub webhook: WebhookSettings,
    /// Text-to-speech settings.
    pub tts: TtsSettings,
    /// Model preset defaults.
    pub presets: PresetSettings,
}

impl ControlPlaneConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an enumerated variable holds an unknown
    /// value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Loads configuration through an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an enumerated variable holds an unknown
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider_raw = lookup("TTS_PROVIDER").unwrap_or_else(|| "none".to_string());
        let provider = TtsProvider::parse(&provider_raw).ok_or(ConfigError::InvalidValue {
            var: "TTS_PROVIDER",
            message: format!("unknown provider `{provider_raw}` (none|elevenlabs|openai)"),
        })?;
        let master_key = lookup("MASTER_KEY").filter(|key| !key.is_empty());
        Ok(Self {
            data_dir: PathBuf::from(
                lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            artifacts_dir: PathBuf::from(
                lookup("ARTIFACTS_DIR").unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.to_string()),
            ),
            master_key,
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            connector: ConnectorSettings {
                base_url: lookup("MCP_RUBE_URL").filter(|url| !url.is_empty()),
                api_key: lookup("MCP_RUBE_API_KEY").filter(|key| !key.is_empty()),
            },
            webhook: WebhookSettings {
                url: lookup("WEBHOOK_URL").filter(|url| !url.is_empty()),
                secret: lookup("WEBHOOK_SECRET").filter(|secret| !secret.is_empty()),
                notify_on_complete: lookup("NOTIFY_ON_COMPLETE")
                    .is_none_or(|value| value == "true"),
            },
            tts: TtsSettings {
                provider,
                voice: lookup("TTS_VOICE").unwrap_or_default(),
                api_key: lookup("TTS_API_KEY").filter(|key| !key.is_empty()),
            },
            presets: PresetSettings {
                quality: lookup("MODEL_PRESET_QUALITY")
                    .unwrap_or_else(|| "glm-quality".to_string()),
                main: lookup("MODEL_PRESET_MAIN").unwrap_or_else(|| "glm-main".to_string()),
                fast: lookup("MODEL_PRESET_FAST").unwrap_or_else(|| "glm-fast".to_string()),
                long: lookup("MODEL_PRESET_LONG").unwrap_or_else(|| "glm-long".to_string()),
                default_active: lookup("DEFAULT_MODEL_PRESET")
                    .unwrap_or_else(|| "quality".to_string()),
            },
        })
    }

    /// Returns the full path of the embedded database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
