//! Typed record store with corruption tolerance.
//!
//! `load` never raises: a missing key, a parse failure, or a shape mismatch
//! between the stored value and the supplied fallback all return the
//! fallback with a diagnostic. `save` reports failures and swallows them;
//! the in-memory state keeps reflecting the attempted change for the rest
//! of the session.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use upkeep_core::lenient;

use crate::medium::StorageMedium;

/// Generic typed persistence over a [`StorageMedium`].
///
/// Cheap to clone; clones share the underlying medium.
#[derive(Clone)]
pub struct RecordStore {
    medium: Arc<dyn StorageMedium>,
}

impl RecordStore {
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self { medium }
    }

    /// The underlying medium, shared with any clones of this store.
    pub fn medium(&self) -> Arc<dyn StorageMedium> {
        Arc::clone(&self.medium)
    }

    /// Load the value stored under `key`, or `fallback` when the key is
    /// missing, unparseable, or shaped differently than `fallback`.
    pub fn load<T>(&self, key: &str, fallback: T) -> T
    where
        T: DeserializeOwned + Serialize,
    {
        let Some(raw) = self.medium.get(key) else {
            return fallback;
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(storage_key = key, error = %e, "unparseable stored value, using fallback");
                return fallback;
            }
        };

        let expected = match serde_json::to_value(&fallback) {
            Ok(value) => value,
            Err(e) => {
                warn!(storage_key = key, error = %e, "fallback not serializable, using fallback");
                return fallback;
            }
        };

        if !lenient::shape_matches(&parsed, &expected) {
            warn!(
                storage_key = key,
                expected = lenient::json_kind(&expected),
                found = lenient::json_kind(&parsed),
                "stored value shape mismatch, using fallback"
            );
            return fallback;
        }

        match serde_json::from_value(parsed) {
            Ok(value) => value,
            Err(e) => {
                warn!(storage_key = key, error = %e, "stored value failed to decode, using fallback");
                fallback
            }
        }
    }

    /// Serialize `value` and write it under `key`. Write failures (quota
    /// included) are reported, never propagated.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!(storage_key = key, error = %e, "failed to serialize value, nothing written");
                return;
            }
        };

        if let Err(e) = self.medium.set(key, &raw) {
            error!(
                storage_key = key,
                payload_len = raw.len(),
                error = %e,
                "storage write failed; in-memory state retained, a reload may lose this change"
            );
        }
    }
}
