//! Per-patient retrieval cache.
//!
//! Maps a patient to the topic its index was built for and the populated
//! index itself. Bounded by least-recently-used eviction.

use crate::types::PatientId;
use crate::vector_index::SharedIndex;
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// A populated index and the topic it was built from.
#[derive(Clone)]
pub struct CacheEntry {
    pub topic: String,
    pub index: SharedIndex,
    pub ingested_at: DateTime<Utc>,
    pub chunk_count: usize,
}

impl CacheEntry {
    pub fn new(topic: impl Into<String>, index: SharedIndex, chunk_count: usize) -> Self {
        Self {
            topic: topic.into(),
            index,
            ingested_at: Utc::now(),
            chunk_count,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("topic", &self.topic)
            .field("ingested_at", &self.ingested_at)
            .field("chunk_count", &self.chunk_count)
            .finish_non_exhaustive()
    }
}

/// Thread-safe LRU map from patient to [`CacheEntry`].
pub struct RetrievalCache {
    entries: Mutex<LruCache<PatientId, CacheEntry>>,
}

impl RetrievalCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, LruCache<PatientId, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `id` has an entry. Does not touch recency.
    pub fn has(&self, id: PatientId) -> bool {
        self.entries().contains(&id)
    }

    /// Store `entry` unless one already exists; the first record wins.
    ///
    /// Returns whether the entry was stored.
    pub fn record(&self, id: PatientId, entry: CacheEntry) -> bool {
        let mut entries = self.entries();
        if entries.contains(&id) {
            tracing::debug!(patient_id = %id, "Cache entry already recorded");
            return false;
        }

        if let Some((evicted, old)) = entries.push(id, entry) {
            tracing::info!(
                evicted_patient = %evicted,
                topic = %old.topic,
                "Evicted least recently used cache entry"
            );
        }
        true
    }

    /// Topic recorded for `id`. Does not touch recency.
    pub fn topic_of(&self, id: PatientId) -> Option<String> {
        self.entries().peek(&id).map(|entry| entry.topic.clone())
    }

    /// Entry for `id`, marking it most recently used.
    pub fn lookup(&self, id: PatientId) -> Option<CacheEntry> {
        self.entries().get(&id).cloned()
    }

    /// Drop the entry for `id`; returns whether one existed.
    pub fn evict(&self, id: PatientId) -> bool {
        self.entries().pop(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }
}
