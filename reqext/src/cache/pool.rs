//! The cache pool: one entry per canonical key.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::Shared;
use reqext_core::{BoxAdapterFuture, ParamsSnapshot, RequestKey};

/// Response handle shared between every caller served by one cache entry.
///
/// All clones resolve to the same result; if the underlying call fails,
/// every waiter observes the same error.
pub type SharedResponse = Shared<BoxAdapterFuture>;

/// A cached response together with the parameters it was fetched with.
#[derive(Clone)]
pub struct CacheEntry {
    key: RequestKey,
    params: ParamsSnapshot,
    expire_at: DateTime<Utc>,
    response: SharedResponse,
    ttl: Duration,
}

impl CacheEntry {
    /// Creates an entry expiring `ttl` after `now`.
    pub fn new(
        key: RequestKey,
        params: ParamsSnapshot,
        response: SharedResponse,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let expire_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key,
            params,
            expire_at,
            response,
            ttl,
        }
    }

    /// Canonical key of the entry.
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Parameter snapshot captured when the request was dispatched.
    pub fn params(&self) -> &ParamsSnapshot {
        &self.params
    }

    /// Absolute instant after which the entry is stale.
    pub fn expire_at(&self) -> DateTime<Utc> {
        self.expire_at
    }

    /// Configured time-to-live the expiry was computed from.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The shared response handle.
    pub fn response(&self) -> &SharedResponse {
        &self.response
    }

    /// `true` while `now` is strictly before the expiry instant.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expire_at
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("params", &self.params)
            .field("expire_at", &self.expire_at)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Key → entry map backing one cacheable extension.
///
/// Clones share storage. Stale entries are never swept; they stay in the
/// pool, treated as misses, until overwritten or deleted.
#[derive(Clone, Default)]
pub struct CachePool {
    entries: Arc<DashMap<RequestKey, CacheEntry>>,
}

impl CachePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the entry stored under `key`.
    pub fn get(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Inspect the entry under `key` without cloning it.
    pub fn with_entry<R>(&self, key: &RequestKey, f: impl FnOnce(&CacheEntry) -> R) -> Option<R> {
        self.entries.get(key).map(|entry| f(entry.value()))
    }

    /// Store `entry`, replacing any entry with the same key.
    ///
    /// Returns the replaced entry.
    pub fn insert(&self, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(entry.key.clone(), entry)
    }

    /// Delete the entry under `key`.
    pub fn remove(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    /// `true` if an entry, fresh or stale, is stored under `key`.
    pub fn contains_key(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delete every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl fmt::Debug for CachePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePool")
            .field("len", &self.entries.len())
            .finish()
    }
}
