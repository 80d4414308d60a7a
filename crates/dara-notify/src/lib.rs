// crates/dara-notify/src/lib.rs
// ============================================================================
// Module: Dara Workflow Notifier
// Description: Signed completion webhook with optional audio enrichment.
// Purpose: Tell the outside world, exactly once, that a run finished.
// Dependencies: base64, dara-config, dara-core, dara-store-sqlite, hmac,
// reqwest, sha2
// ============================================================================

//! ## Overview
//! When a run reaches terminal success the engine asks the notifier to emit
//! one webhook POST. The payload carries the run's status, its artifact
//! listing, the active model preset, and optionally synthesized audio of the
//! summary line. When a webhook secret is configured the serialized body is
//! signed with HMAC-SHA256 and the hex digest travels in the
//! `X-Dara-Signature` header. Delivery and synthesis failures are the
//! caller's problem to ignore: the run is already completed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dara_config::TtsProvider;
use dara_config::TtsSettings;
use dara_config::WebhookSettings;
use dara_core::NotifyError;
use dara_core::RunId;
use dara_core::RunNotifier;
use dara_core::Timestamp;
use dara_core::hex_encode;
use dara_store_sqlite::SqliteStore;
use hmac::Hmac;
use hmac::Mac;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::json;
use sha2::Sha256;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Signature header attached to signed webhook deliveries.
const SIGNATURE_HEADER: &str = "X-Dara-Signature";
/// Timeout for webhook deliveries.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for text-to-speech synthesis calls.
const TTS_TIMEOUT: Duration = Duration::from_secs(30);
/// ElevenLabs synthesis endpoint.
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
/// OpenAI speech endpoint.
const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
/// Model used for OpenAI speech synthesis.
const OPENAI_SPEECH_MODEL: &str = "gpt-4o-mini-tts";

// ============================================================================
// SECTION: Payload
// ============================================================================

/// Artifact entry embedded in the completion payload.
#[derive(Debug, Serialize)]
struct ArtifactSummary {
    /// Absolute path of the artifact file.
    path: String,
    /// Artifact kind.
    #[serde(rename = "type")]
    kind: String,
    /// Creation timestamp.
    created_at: String,
}

/// Completion webhook payload.
#[derive(Debug, Serialize)]
struct CompletionPayload {
    /// Run identifier.
    run_id: String,
    /// Terminal run status.
    status: String,
    /// Human-readable summary line.
    summary: String,
    /// Artifacts written by the run.
    artifacts: Vec<ArtifactSummary>,
    /// Active model preset name at completion time.
    model_preset: String,
    /// Token usage placeholder, not yet metered.
    tokens_used: u64,
    /// Completion timestamp.
    finished_at: String,
    /// Base64 audio of the summary, when synthesis succeeded.
    tts_audio: Option<String>,
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Computes the hex HMAC-SHA256 signature of a webhook body.
///
/// HMAC accepts keys of any length, so construction cannot fail for real
/// inputs; the guard keeps the function total anyway.
#[must_use]
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let Ok(mut mac) = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    hex_encode(&mac.finalize().into_bytes())
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Completion webhook emitter.
///
/// # Invariants
/// - No network traffic happens when the webhook URL is unset or the
///   notify-on-complete flag is off.
/// - The signature is computed over the exact serialized body bytes.
pub struct WorkflowNotifier {
    /// Webhook endpoint and signing settings.
    webhook: WebhookSettings,
    /// Text-to-speech enrichment settings.
    tts: TtsSettings,
    /// Store used to assemble the payload.
    store: SqliteStore,
    /// Shared blocking HTTP client; per-request timeouts apply.
    client: Client,
}

impl WorkflowNotifier {
    /// Builds a notifier from deployment settings.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Delivery`] when the HTTP client cannot be
    /// created.
    pub fn new(
        webhook: WebhookSettings,
        tts: TtsSettings,
        store: SqliteStore,
    ) -> Result<Self, NotifyError> {
        let client =
            Client::builder().build().map_err(|err| NotifyError::Delivery(err.to_string()))?;
        Ok(Self {
            webhook,
            tts,
            store,
            client,
        })
    }

    /// Synthesizes the summary line into base64 audio, best effort.
    fn synthesize(&self, message: &str) -> Option<String> {
        let Some(api_key) = self.tts.api_key.as_deref() else {
            return None;
        };
        let request = match self.tts.provider {
            TtsProvider::None => return None,
            TtsProvider::Elevenlabs => self
                .client
                .post(ELEVENLABS_URL)
                .timeout(TTS_TIMEOUT)
                .header("xi-api-key", api_key)
                .json(&json!({"text": message, "voice": self.tts.voice})),
            TtsProvider::Openai => self
                .client
                .post(OPENAI_SPEECH_URL)
                .timeout(TTS_TIMEOUT)
                .bearer_auth(api_key)
                .json(&json!({
                    "model": OPENAI_SPEECH_MODEL,
                    "voice": self.tts.voice,
                    "input": message
                })),
        };
        let audio = request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::bytes);
        match audio {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(err) => {
                tracing::warn!(error = %err, "tts synthesis failed; sending without audio");
                None
            }
        }
    }
}

impl RunNotifier for WorkflowNotifier {
    fn notify_completion(&self, run_id: &RunId, model_preset: &str) -> Result<(), NotifyError> {
        if !self.webhook.notify_on_complete {
            return Ok(());
        }
        let Some(url) = self.webhook.url.as_deref() else {
            return Ok(());
        };

        let run = self
            .store
            .get_run(run_id)
            .map_err(|err| NotifyError::Store(err.to_string()))?
            .ok_or_else(|| NotifyError::Store(format!("run not found: {run_id}")))?;
        let artifacts = self
            .store
            .list_artifacts(run_id)
            .map_err(|err| NotifyError::Store(err.to_string()))?
            .into_iter()
            .map(|artifact| ArtifactSummary {
                path: artifact.path,
                kind: artifact.kind.as_str().to_string(),
                created_at: artifact.created_at.as_str().to_string(),
            })
            .collect();

        let summary = format!("Run {run_id} completed");
        let payload = CompletionPayload {
            run_id: run_id.to_string(),
            status: run.status.as_str().to_string(),
            summary: summary.clone(),
            artifacts,
            model_preset: model_preset.to_string(),
            tokens_used: 0,
            finished_at: Timestamp::now().as_str().to_string(),
            tts_audio: self.synthesize(&summary),
        };
        let body = serde_json::to_string(&payload)
            .map_err(|err| NotifyError::Serialization(err.to_string()))?;

        let mut request = self
            .client
            .post(url)
            .timeout(WEBHOOK_TIMEOUT)
            .header("Content-Type", "application/json");
        if let Some(secret) = self.webhook.secret.as_deref() {
            request = request.header(SIGNATURE_HEADER, sign_body(secret, body.as_bytes()));
        }
        let response =
            request.body(body).send().map_err(|err| NotifyError::Delivery(err.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::Status {
                code: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
