//! Process-local store for downloaded media.
//!
//! Finished videos are fetched once from the provider and kept here under a
//! local `blob:` URL, so the presentation layer can preview and save them
//! without re-authenticating. Entries live until they are revoked.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const BLOB_SCHEME: &str = "blob:promo-studio/";

/// Local handle to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct Blob {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    entries: Mutex<HashMap<BlobUrl, Blob>>,
}

/// Cloneable handle; all clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    inner: Arc<Inner>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` and returns a fresh URL for them.
    pub fn create(&self, bytes: Vec<u8>, mime_type: impl Into<String>) -> BlobUrl {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = BlobUrl(format!("{}{}", BLOB_SCHEME, id));
        let blob = Blob {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        };
        self.entries().insert(url.clone(), blob);
        url
    }

    pub fn get(&self, url: &BlobUrl) -> Option<Blob> {
        self.entries().get(url).cloned()
    }

    /// Releases the blob. Returns `false` if it was already gone.
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        self.entries().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<BlobUrl, Blob>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_revoke() {
        let store = BlobStore::new();
        let url = store.create(vec![1, 2, 3], "video/mp4");
        assert!(url.as_str().starts_with("blob:promo-studio/"));

        let blob = store.get(&url).unwrap();
        assert_eq!(&*blob.bytes, &[1, 2, 3]);
        assert_eq!(blob.mime_type, "video/mp4");

        assert!(store.revoke(&url));
        assert!(!store.revoke(&url));
        assert!(store.get(&url).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn urls_are_unique_and_shared_between_clones() {
        let store = BlobStore::new();
        let other = store.clone();
        let a = store.create(vec![0], "video/mp4");
        let b = other.create(vec![1], "video/mp4");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
