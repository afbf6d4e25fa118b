//! Document cache with single-flight loading
//!
//! Documents are keyed by canonical URL (fragment stripped). Concurrent
//! requests for a key that is still loading join the in-flight load instead
//! of issuing another fetch, and share its outcome whether it succeeds or
//! fails. Loaded entries live as long as the cache: there is no eviction and
//! no expiry.
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::trace;
use url::Url;

/// A decoded document, shared between every consumer that loaded it.
/// Never mutated; consumers clone before changing anything.
pub type Document = Arc<Value>;

/// Result of one load, as seen by every caller that joined it
type Outcome = std::result::Result<Document, Error>;
type Slot = Arc<OnceCell<Outcome>>;

/// URL with its fragment removed
pub fn canonical_url(url: &Url) -> String {
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    canonical.into()
}

/// Cache statistics for monitoring and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Documents fully loaded and stored
    pub entries: usize,
    /// Lookups served from a stored or in-flight document
    pub hits: u64,
    /// Lookups that started a load
    pub misses: u64,
}

impl CacheStats {
    /// Share of lookups that did not trigger a load, as a percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Shared document cache
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: Mutex<HashMap<String, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Slot {
        self.entries().entry(key.to_string()).or_default().clone()
    }

    /// Drop a failed slot so the next lookup starts a fresh load
    fn forget_failed(&self, key: &str, slot: &Slot) {
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            entries.remove(key);
        }
    }

    /// Return the document stored under `key`, running `load` only if no
    /// other caller has stored or is currently loading it.
    ///
    /// Callers that joined a load which fails receive a copy of its error
    /// without issuing a fetch of their own; the caller that ran the load
    /// gets the original. The failed slot is then dropped, so a later lookup
    /// tries again.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> Result<Document>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let slot = self.slot(key);

        let mut ran_load = false;
        let mut failure = None;
        let (ran, failed) = (&mut ran_load, &mut failure);
        let outcome = slot
            .get_or_init(|| {
                let pending = load();
                async move {
                    *ran = true;
                    match pending.await {
                        Ok(value) => Ok(Arc::new(value)),
                        Err(error) => {
                            let shared = error.detached();
                            *failed = Some(error);
                            Err(shared)
                        }
                    }
                }
            })
            .await;

        if ran_load {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Document cache miss, loaded");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Document cache hit");
        }

        match outcome {
            Ok(document) => Ok(document.clone()),
            Err(shared) => {
                self.forget_failed(key, &slot);
                Err(failure.unwrap_or_else(|| shared.detached()))
            }
        }
    }

    /// Store an already decoded document. Returns false if the key was
    /// already loaded, in which case the existing document is kept.
    pub fn insert(&self, key: &str, document: Value) -> bool {
        self.slot(key).set(Ok(Arc::new(document))).is_ok()
    }

    /// Get a stored document without loading
    pub fn get(&self, key: &str) -> Option<Document> {
        self.entries()
            .get(key)
            .and_then(|slot| match slot.get() {
                Some(Ok(document)) => Some(document.clone()),
                _ => None,
            })
    }

    /// Check whether a document is stored under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries()
            .get(key)
            .is_some_and(|slot| matches!(slot.get(), Some(Ok(_))))
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|slot| matches!(slot.get(), Some(Ok(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored document and reset the counters
    pub fn clear(&self) {
        self.entries().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
