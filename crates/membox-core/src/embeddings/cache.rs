//! LRU cache in front of an embedder.
//!
//! Keyed on the exact text handed to the model.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use super::{Embedder, Embedding, EmbeddingError};

/// Default number of cached encodings
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Embedder wrapper that memoizes successful encodings
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<LruCache<String, Embedding>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    /// Wrap an embedder with the default capacity
    pub fn new(inner: E) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// Wrap an embedder with a custom capacity (0 is bumped to 1)
    pub fn with_capacity(inner: E, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached encodings
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access the wrapped embedder
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(text) {
                return Ok(hit.clone());
            }
        }

        // Failures are not cached
        let embedding = self.inner.embed(text)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
