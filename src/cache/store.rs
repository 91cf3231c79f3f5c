// Cache store for reading and writing query results.
// Entries are replaced wholesale; readers keep the snapshot they were handed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::github::SearchResult;

use super::key::QueryKey;

/// Read/write access to cached query results.
pub trait CacheStore {
    /// Last result written under `key`, if any.
    fn read(&self, key: &QueryKey) -> Option<Arc<SearchResult>>;

    /// Replace the result under `key`.
    fn write(&mut self, key: QueryKey, value: Arc<SearchResult>);
}

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: Arc<T>,
    /// When the data was written.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    /// Create a new cached data entry.
    pub fn new(data: Arc<T>) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    /// Time since the entry was written.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Process-local cache, torn down with the session that owns it.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<QueryKey, CachedData<SearchResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `key` including its write timestamp.
    pub fn entry(&self, key: &QueryKey) -> Option<&CachedData<SearchResult>> {
        self.entries.get(key)
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn evict(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, key: &QueryKey) -> Option<Arc<SearchResult>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry.data))
    }

    fn write(&mut self, key: QueryKey, value: Arc<SearchResult>) {
        tracing::debug!(%key, edges = value.edges.len(), "cache write");
        self.entries.insert(key, CachedData::new(value));
    }
}
