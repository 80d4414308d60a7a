// crates/dara-vault/tests/vault.rs
// ============================================================================
// Module: Secrets Vault Tests
// Description: Round-trip, tamper rejection, and corrupt-row tolerance.
// ============================================================================
//! ## Overview
//! Verifies the vault contract: encrypt/decrypt round-trips, listings that
//! never leak values, authenticated rejection of tampered ciphertexts, and
//! plaintext iteration that skips corrupt rows instead of aborting.

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

use dara_core::SecretId;
use dara_core::StoreError;
use dara_store_sqlite::SqliteStore;
use dara_vault::SecretsVault;
use dara_vault::VaultError;

/// Builds a vault over a fresh in-memory store.
fn vault() -> (SecretsVault, SqliteStore) {
    let store = SqliteStore::in_memory().unwrap();
    let vault = SecretsVault::new("unit-test-master-key", store.clone()).unwrap();
    (vault, store)
}

#[test]
fn empty_master_key_is_rejected() {
    let store = SqliteStore::in_memory().unwrap();
    let err = SecretsVault::new("", store).err().unwrap();
    assert!(matches!(err, VaultError::Configuration(_)));
}

#[test]
fn store_then_decrypt_round_trips() {
    let (vault, _store) = vault();
    let header = vault.store("connector", "token", "s3cr3t-value").unwrap();
    assert_eq!(header.scope, "connector");
    assert_eq!(header.name, "token");
    assert_eq!(vault.decrypt(&header.id).unwrap(), "s3cr3t-value");
}

#[test]
fn round_trips_arbitrary_utf8() {
    let (vault, _store) = vault();
    let value = "pässwörd \u{1f511} with spaces & symbols";
    let header = vault.store("misc", "utf8", value).unwrap();
    assert_eq!(vault.decrypt(&header.id).unwrap(), value);
}

#[test]
fn listing_exposes_headers_only() {
    let (vault, store) = vault();
    vault.store("connector", "token", "plaintext-value").unwrap();
    let headers = vault.list(Some("connector")).unwrap();
    assert_eq!(headers.len(), 1);

    // The stored row must not contain the plaintext either.
    let ciphertexts = store.list_secret_ciphertexts().unwrap();
    assert_eq!(ciphertexts.len(), 1);
    assert!(!ciphertexts[0].contains("plaintext-value"));
}

#[test]
fn unknown_id_is_not_found() {
    let (vault, _store) = vault();
    let err = vault.decrypt(&SecretId::new("missing")).err().unwrap();
    assert!(matches!(err, VaultError::NotFound));
}

#[test]
fn tampered_ciphertext_fails_authentication() {
    let (vault, store) = vault();
    let header = vault.store("connector", "token", "s3cr3t-value").unwrap();

    store
        .tx(|tx| {
            tx.execute(
                "UPDATE secrets SET value = 'bm90LXJlYWwtY2lwaGVydGV4dA==' WHERE id = ?1",
                [header.id.as_str()],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
            Ok(())
        })
        .unwrap();

    let err = vault.decrypt(&header.id).err().unwrap();
    assert!(matches!(err, VaultError::Crypto(_)));
}

#[test]
fn plaintext_iteration_skips_corrupt_rows() {
    let (vault, store) = vault();
    vault.store("a", "one", "value-one").unwrap();
    let corrupted = vault.store("a", "two", "value-two").unwrap();
    vault.store("a", "three", "value-three").unwrap();

    store
        .tx(|tx| {
            tx.execute(
                "UPDATE secrets SET value = 'garbage!!' WHERE id = ?1",
                [corrupted.id.as_str()],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
            Ok(())
        })
        .unwrap();

    let mut plaintexts = vault.plaintexts().unwrap();
    plaintexts.sort();
    assert_eq!(plaintexts, vec!["value-one".to_string(), "value-three".to_string()]);
}

#[test]
fn same_master_key_reads_rows_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dara_control_plane.db");
    let header = {
        let store = SqliteStore::open(&path).unwrap();
        let vault = SecretsVault::new("shared-key", store).unwrap();
        vault.store("connector", "token", "durable-value").unwrap()
    };
    let store = SqliteStore::open(&path).unwrap();
    let vault = SecretsVault::new("shared-key", store).unwrap();
    assert_eq!(vault.decrypt(&header.id).unwrap(), "durable-value");
}
