//! Conditional-GET response cache.
//!
//! Chromium mapping: net/http/http_cache.h (validators only, in memory)
//!
//! Holds, per [`RequestKey`], the validators (`ETag`, `Last-Modified`) and the
//! decoded body of the last successful response. There is no freshness model:
//! every request is revalidated, and an entry only changes when a newer
//! 200-204 response overwrites it.
//!
//! Each key lives in one `DashMap` shard, so reads and writes of a key are
//! serialized. When two exchanges refresh the same key concurrently the last
//! writer wins.

use crate::http::cachekey::RequestKey;
use dashmap::DashMap;

/// Validators and body stored for one request key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// Raw `Last-Modified` value of the stored response.
    pub last_modified: Option<String>,
    /// Raw `ETag` value of the stored response.
    pub etag: Option<String>,
    /// Decoded body of the stored response.
    pub stored_body: Option<String>,
}

impl CacheEntry {
    /// An entry can only be revalidated once there is a body to fall back on.
    pub fn can_revalidate(&self) -> bool {
        self.stored_body.is_some()
    }

    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

/// In-memory map from request key to the last stored entry.
///
/// Shared by every exchange of one client; dies with it.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<RequestKey, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry. The entry is cloned so no shard lock outlives the call.
    pub fn get(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Store an entry, replacing any previous one wholesale.
    pub fn put(&self, key: RequestKey, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove an entry from the cache.
    pub fn remove(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    /// Clear all cached entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
