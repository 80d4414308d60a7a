// crates/dara-presets/src/lib.rs
// ============================================================================
// Module: Dara Preset Registry
// Description: Named model presets with one active selection.
// Purpose: Stamp completion notifications with the operator's model choice.
// Dependencies: dara-core, dara-store-sqlite, thiserror
// ============================================================================

//! ## Overview
//! The preset registry maps preset names to model identifiers and tracks a
//! single active selection. It is seeded idempotently from configured
//! defaults at startup, read on every completion notification, and written
//! only when an operator switches the active preset. All writes serialize
//! through the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dara_core::ModelPreset;
use dara_core::PresetState;
use dara_core::StoreError;
use dara_core::Timestamp;
use dara_store_sqlite::SqliteStore;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Preset name used when the stored active selection is missing.
const FALLBACK_PRESET: &str = "quality";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Preset registry errors.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The requested preset name is not in the catalog.
    #[error("unknown preset: {0}")]
    Unknown(String),
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Store-backed preset registry.
///
/// # Invariants
/// - Seeding never overwrites an existing catalog row or active selection.
/// - `set_active` only accepts names present in the catalog.
#[derive(Clone)]
pub struct PresetRegistry {
    /// Backing store for catalog and state rows.
    store: SqliteStore,
}

impl PresetRegistry {
    /// Builds the registry and seeds defaults idempotently.
    ///
    /// `defaults` are `(name, model)` pairs; `default_active` names the
    /// preset selected when no state row exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError`] when seeding fails.
    pub fn new(
        store: SqliteStore,
        defaults: &[(&str, &str)],
        default_active: &str,
    ) -> Result<Self, PresetError> {
        for (name, model) in defaults {
            store.seed_preset(name, model)?;
        }
        store.seed_preset_state(default_active)?;
        Ok(Self {
            store,
        })
    }

    /// Lists the catalog and the active-selection state.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError`] when the store read fails.
    pub fn list(&self) -> Result<(Vec<ModelPreset>, PresetState), PresetError> {
        let presets = self.store.list_presets()?;
        let active = self
            .store
            .get_active_preset()?
            .unwrap_or_else(|| FALLBACK_PRESET.to_string());
        Ok((presets, PresetState {
            active,
            updated_at: Timestamp::now(),
        }))
    }

    /// Switches the active preset.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Unknown`] when the name is not in the catalog.
    pub fn set_active(&self, name: &str) -> Result<PresetState, PresetError> {
        let known = self.store.list_presets()?.iter().any(|preset| preset.name == name);
        if !known {
            return Err(PresetError::Unknown(name.to_string()));
        }
        self.store.set_active_preset(name)?;
        Ok(PresetState {
            active: name.to_string(),
            updated_at: Timestamp::now(),
        })
    }

    /// Returns the model identifier the active preset resolves to.
    ///
    /// Falls back to the `quality` preset's model when the active selection
    /// has no catalog row.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError`] when the store read fails.
    pub fn active_model(&self) -> Result<String, PresetError> {
        let (presets, state) = self.list()?;
        let resolve = |name: &str| {
            presets
                .iter()
                .find(|preset| preset.name == name)
                .map(|preset| preset.model.clone())
        };
        Ok(resolve(&state.active)
            .or_else(|| resolve(FALLBACK_PRESET))
            .unwrap_or_else(|| "glm-quality".to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
