//! Memoisation of extraction results.
//!
//! Keys are the SHA-256 digest of the document kind tag followed by the raw
//! bytes, so re-uploading the same file skips OCR or PDF parsing. The map is
//! an LRU with a fixed capacity; only successful extractions are stored.
//! The lock guards map access only and is never held across an `.await`.

use crate::error::ExtractionError;
use crate::extract::{DocumentKind, TextExtractor};
use async_trait::async_trait;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

type CacheKey = [u8; 32];

/// Content-hash key for a document.
pub fn cache_key(bytes: &[u8], kind: DocumentKind) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update([kind.tag()]);
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Wraps a [`TextExtractor`] with an LRU cache of its results.
pub struct CachedExtractor<E> {
    inner: E,
    cache: Mutex<LruCache<CacheKey, String>>,
}

impl<E> CachedExtractor<E> {
    pub fn new(inner: E, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, String>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<E: TextExtractor> TextExtractor for CachedExtractor<E> {
    async fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
        let key = cache_key(bytes, kind);

        let hit = self.lock().get(&key).cloned();
        if let Some(text) = hit {
            debug!("Extraction cache hit ({} bytes, {:?})", bytes.len(), kind);
            return Ok(text);
        }

        let text = self.inner.extract(bytes, kind).await?;
        self.lock().put(key, text.clone());
        Ok(text)
    }
}
