//! Blob store for locally-held label images.
//!
//! Records reference their image through an opaque URL; the store owns the
//! bytes behind it. Discard paths must release the URL so unreferenced
//! images do not accumulate for the life of the session.

use std::collections::HashMap;
use std::sync::Mutex;

use upkeep_core::Result;
use uuid::Uuid;

/// Storage for image blobs addressed by opaque URL.
pub trait BlobStore: Send + Sync {
    /// Store raw bytes and return the URL that now references them.
    fn store(&self, data: &[u8], mime_type: &str) -> Result<String>;

    /// Release the bytes behind `url`. Unknown URLs are a no-op.
    fn release(&self, url: &str);

    /// Whether `url` still references live bytes.
    fn contains(&self, url: &str) -> bool;
}

/// In-memory blob store issuing `blob:<uuid>` URLs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live blobs, for leak assertions in tests.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, data: &[u8], mime_type: &str) -> Result<String> {
        let url = format!("blob:{}", Uuid::new_v4());
        self.blobs
            .lock()
            .unwrap()
            .insert(url.clone(), (data.to_vec(), mime_type.to_string()));
        Ok(url)
    }

    fn release(&self, url: &str) {
        self.blobs.lock().unwrap().remove(url);
    }

    fn contains(&self, url: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_release() {
        let blobs = MemoryBlobStore::new();
        let url = blobs.store(b"bytes", "image/jpeg").unwrap();

        assert!(url.starts_with("blob:"));
        assert!(blobs.contains(&url));
        assert_eq!(blobs.len(), 1);

        blobs.release(&url);
        assert!(!blobs.contains(&url));
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_release_unknown_url_is_noop() {
        let blobs = MemoryBlobStore::new();
        blobs.release("blob:does-not-exist");
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_urls_are_unique() {
        let blobs = MemoryBlobStore::new();
        let a = blobs.store(b"a", "image/png").unwrap();
        let b = blobs.store(b"a", "image/png").unwrap();
        assert_ne!(a, b);
    }
}
