// crates/dara-vault/src/lib.rs
// ============================================================================
// Module: Dara Secrets Vault
// Description: Authenticated symmetric encryption for secret values.
// Purpose: Keep plaintext secrets out of the store while feeding redaction.
// Dependencies: aes-gcm, base64, dara-core, dara-store-sqlite, sha2
// ============================================================================

//! ## Overview
//! The vault encrypts secret values with AES-256-GCM before they reach the
//! store and decrypts them on demand. The encryption key is derived
//! deterministically as `SHA-256(master_key)` (its base64url form is the
//! deployment's key fingerprint), so every process with the same master key
//! reads the same rows. Ciphertexts are authenticated: tampering fails
//! decryption rather than yielding garbage. Plaintext is never persisted and
//! never leaves this crate except through [`SecretsVault::decrypt`] and
//! [`SecretsVault::plaintexts`], the latter existing solely to feed the
//! artifact redactor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::OsRng;
use aes_gcm::aead::rand_core::RngCore;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use dara_core::SecretHeader;
use dara_core::SecretId;
use dara_core::StoreError;
use dara_core::Timestamp;
use dara_store_sqlite::SqliteStore;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// AES-GCM nonce size in bytes.
const NONCE_SIZE: usize = 12;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Vault errors.
///
/// # Invariants
/// - Messages never embed plaintext or ciphertext material.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault cannot be constructed with the given deployment settings.
    #[error("vault configuration error: {0}")]
    Configuration(String),
    /// No secret exists with the requested id.
    #[error("secret not found")]
    NotFound,
    /// Encryption, decoding, or authentication failed.
    #[error("vault crypto error: {0}")]
    Crypto(String),
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Vault
// ============================================================================

/// AES-256-GCM secrets vault over the control-plane store.
///
/// # Invariants
/// - The cipher key is exactly `SHA-256(master_key)`.
/// - Stored values are `base64url(nonce || ciphertext || tag)`.
#[derive(Clone)]
pub struct SecretsVault {
    /// Cipher constructed from the derived key.
    cipher: Aes256Gcm,
    /// Backing store for secret rows.
    store: SqliteStore,
}

impl SecretsVault {
    /// Builds a vault from the deployment master key.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] when the master key is empty.
    pub fn new(master_key: &str, store: SqliteStore) -> Result<Self, VaultError> {
        if master_key.is_empty() {
            return Err(VaultError::Configuration(
                "MASTER_KEY is required for secrets vault".to_string(),
            ));
        }
        let key = derive_key(master_key);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|err| VaultError::Crypto(err.to_string()))?;
        Ok(Self {
            cipher,
            store,
        })
    }

    /// Encrypts and stores a secret value; returns its header.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] when encryption or the insert fails.
    pub fn store(&self, scope: &str, name: &str, value: &str) -> Result<SecretHeader, VaultError> {
        let ciphertext = self.encrypt(value)?;
        let header = SecretHeader {
            id: SecretId::generate(),
            scope: scope.to_string(),
            name: name.to_string(),
            created_at: Timestamp::now(),
        };
        self.store.insert_secret(&header, &ciphertext)?;
        Ok(header)
    }

    /// Lists secret headers, optionally filtered by scope.
    ///
    /// Neither plaintext nor ciphertext is returned.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] when the store read fails.
    pub fn list(&self, scope: Option<&str>) -> Result<Vec<SecretHeader>, VaultError> {
        Ok(self.store.list_secret_headers(scope)?)
    }

    /// Decrypts one secret by id.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] for unknown ids and
    /// [`VaultError::Crypto`] when authentication fails.
    pub fn decrypt(&self, id: &SecretId) -> Result<String, VaultError> {
        let ciphertext = self.store.get_secret_ciphertext(id)?.ok_or(VaultError::NotFound)?;
        self.decrypt_value(&ciphertext)
    }

    /// Returns every decryptable plaintext, skipping corrupt rows.
    ///
    /// A single row that fails authentication must not block a run, so
    /// failures are logged and skipped rather than propagated.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] only when the store read itself fails.
    pub fn plaintexts(&self) -> Result<Vec<String>, VaultError> {
        let mut values = Vec::new();
        for ciphertext in self.store.list_secret_ciphertexts()? {
            match self.decrypt_value(&ciphertext) {
                Ok(plaintext) => values.push(plaintext),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecryptable secret row");
                }
            }
        }
        Ok(values)
    }

    /// Encrypts a plaintext into the stored token form.
    fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| VaultError::Crypto("encryption failed".to_string()))?;
        let mut token = Vec::with_capacity(NONCE_SIZE + sealed.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&sealed);
        Ok(URL_SAFE.encode(token))
    }

    /// Decrypts a stored token, verifying the authentication tag.
    fn decrypt_value(&self, token: &str) -> Result<String, VaultError> {
        let bytes = URL_SAFE
            .decode(token)
            .map_err(|_| VaultError::Crypto("ciphertext is not valid base64".to_string()))?;
        if bytes.len() <= NONCE_SIZE {
            return Err(VaultError::Crypto("ciphertext too short".to_string()));
        }
        let (nonce, sealed) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| VaultError::Crypto("authentication failed".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|_| VaultError::Crypto("plaintext is not valid UTF-8".to_string()))
    }
}

/// Derives the 256-bit cipher key from the deployment master key.
fn derive_key(master_key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(master_key.as_bytes());
    hasher.finalize().into()
}
