//! Storage-medium abstraction: a synchronous string-keyed get/set surface.
//!
//! The medium has no transactions and no expiry, and its capacity is
//! finite. Running out of room is a reportable failure, not a fatal one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;
use upkeep_core::{Error, Result};

/// Synchronous string-keyed storage surface.
///
/// Allows abstracting over browser-style local storage, an in-memory map,
/// or a directory of files.
pub trait StorageMedium: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`. Fails with [`Error::StorageFull`] when
    /// the medium is out of capacity.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Missing keys are a no-op.
    fn remove(&self, key: &str);
}

/// In-memory storage medium with an optional byte quota.
#[derive(Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
    capacity_bytes: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap total stored bytes (keys plus values), simulating a quota.
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    fn used_bytes(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(capacity) = self.capacity_bytes {
            let existing = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let projected = Self::used_bytes(&entries) - existing + key.len() + value.len();
            if projected > capacity {
                return Err(Error::StorageFull(format!(
                    "{} bytes needed, {} available",
                    projected, capacity
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// File-backed storage medium: one file per key under a base directory.
pub struct FileMedium {
    base_path: PathBuf,
}

impl FileMedium {
    /// Create a medium rooted at `base_path`, creating the directory if
    /// needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Replace path-hostile characters so any key maps to a flat filename.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl StorageMedium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(storage_key = key, error = %e, "storage read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);

        // Atomic write: temp file + rename
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, value).map_err(map_write_error)?;
        std::fs::rename(&temp_path, &path).map_err(map_write_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.key_path(key));
    }
}

fn map_write_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::StorageFull {
        Error::StorageFull(e.to_string())
    } else {
        Error::Io(e)
    }
}
