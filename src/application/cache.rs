//! Time-bounded memoization of expensive full-scan computations.
//!
//! One `QueryCache` lives for the life of the process. Entries expire after
//! a fixed time-to-live; editing collaborators call [`QueryCache::invalidate`]
//! or [`QueryCache::upsert_into`] so readers see a write before the window
//! runs out.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::warn;

use crate::application::error::AppError;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

const SOURCE: &str = "application::cache";

/// The closed set of memoized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Home,
    Episodes,
    Games,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Home => "home",
            CacheKey::Episodes => "episodes",
            CacheKey::Games => "games",
        }
    }
}

struct CacheEntry {
    stored_at: Instant,
    value: Arc<dyn Any + Send + Sync>,
}

/// Process-wide query cache with per-key TTL expiry.
pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the memoized value under `key`, computing and storing it on a
    /// miss or after expiry.
    ///
    /// No lock is held while `compute` runs; concurrent misses on the same
    /// key may both compute, and the later store wins. A failed compute
    /// leaves the cache unmodified and propagates the error.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<Arc<T>, AppError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(value) = self.peek::<T>(key) {
            counter!("gamecast_cache_hit_total", "key" => key.as_str()).increment(1);
            return Ok(value);
        }
        counter!("gamecast_cache_miss_total", "key" => key.as_str()).increment(1);

        let value = Arc::new(compute().await?);
        let mut entries = rw_write(&self.entries, SOURCE, "get_or_compute.store");
        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// A fresh entry under `key`, if one exists and has the requested type.
    pub fn peek<T: Send + Sync + 'static>(&self, key: CacheKey) -> Option<Arc<T>> {
        let entries = rw_read(&self.entries, SOURCE, "peek");
        let entry = entries.get(&key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        entry.value.clone().downcast::<T>().ok()
    }

    pub fn invalidate(&self, key: CacheKey) {
        rw_write(&self.entries, SOURCE, "invalidate").remove(&key);
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.entries, SOURCE, "invalidate_all").clear();
    }

    /// Replace-or-append `item` in the collection cached under `key` and
    /// re-sort it, skipping the full recomputation a write would otherwise
    /// force.
    ///
    /// Absent or expired entries are left for the next read to recompute.
    /// The entry's timestamp is unchanged; it still expires on the schedule
    /// of its last full compute.
    pub fn upsert_into<T, I, S>(&self, key: CacheKey, item: T, id: I, sort: S)
    where
        T: Clone + Send + Sync + 'static,
        I: Fn(&T) -> &str,
        S: Fn(&T, &T) -> Ordering,
    {
        let mut entries = rw_write(&self.entries, SOURCE, "upsert_into");
        let Some(entry) = entries.get_mut(&key) else {
            return;
        };
        if entry.stored_at.elapsed() >= self.ttl {
            entries.remove(&key);
            return;
        }
        let Some(existing) = entry.value.downcast_ref::<Vec<T>>() else {
            return;
        };

        let mut updated = existing.clone();
        match updated.iter().position(|candidate| id(candidate) == id(&item)) {
            Some(index) => updated[index] = item,
            None => updated.push(item),
        }
        updated.sort_by(&sort);
        entry.value = Arc::new(updated);
    }

    #[cfg(test)]
    fn backdate(&self, key: CacheKey, by: Duration) {
        let mut entries = rw_write(&self.entries, SOURCE, "backdate");
        if let Some(entry) = entries.get_mut(&key) {
            entry.stored_at = entry
                .stored_at
                .checked_sub(by)
                .expect("backdated instant in range");
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        }
    }
}

fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        }
    }
}
