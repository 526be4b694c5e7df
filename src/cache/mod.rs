//! Process-wide TTL cache shared by every module.
//!
//! Keys are chosen by callers and namespaced by module and parameters
//! (`"<module>:<project>"`); the cache enforces no schema. Values are opaque
//! (`Arc<dyn Any>`) and read back with a typed accessor.
//!
//! Expiry is lazy: an entry past its deadline is treated as absent and dropped
//! when it is next read. There is no background sweeper, no size bound and no
//! LRU policy, so keys that are written once and never read again stay
//! resident for the life of the process.
//! [`TtlCache::len`] exposes the current footprint.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

/// Opaque cached payload.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
struct Entry {
    value: CacheValue,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Key/value store with per-entry expiry, safe to share across tasks.
#[derive(Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").field("entries", &self.len()).finish()
    }
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a raw entry. Expired entries are removed and reported as absent.
    pub fn get_value(&self, key: &str) -> Option<CacheValue> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(Arc::clone(&entry.value)),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent set may have refreshed it.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                tracing::debug!(key, "cache entry expired");
                None
            }
            Some(entry) => Some(Arc::clone(&entry.value)),
            None => None,
        }
    }

    /// Typed lookup. A value stored under a different type reads as absent.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self.get_value(key)?;
        match value.downcast_ref::<T>() {
            Some(typed) => Some(typed.clone()),
            None => {
                tracing::debug!(key, "cache entry has an unexpected type");
                None
            }
        }
    }

    /// Store `value` under `key` until `ttl` has elapsed, overwriting any
    /// previous entry.
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        self.set_value(key, Arc::new(value), ttl);
    }

    pub fn set_value(&self, key: impl Into<String>, value: CacheValue, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Remove an entry. Returns whether a (possibly expired) entry existed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Remove every entry whose key starts with `prefix`; returns the count.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Number of resident entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the conventional `"<module>:<param>"` key.
pub fn cache_key(module: &str, param: &str) -> String {
    format!("{}:{}", module, param)
}
