//! Time-bounded memoization for worksheet reads and computed reports.
//!
//! Entries older than the TTL are treated as missing and pruned on the next write. Only successful
//! values are ever stored. Locks are held for map operations only, never across an `.await`, so
//! two concurrent misses for the same key may both fetch; the later write wins.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use sheets_api::source::TableSource;
use sheets_api::table::Table;
use tracing::{debug, instrument};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Entry<V> {
    stored_at: Instant,
    value: V,
}

#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries()
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries = self.entries();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        entries.insert(
            key,
            Entry {
                stored_at: now,
                value,
            },
        );
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries, expired ones included until the next `put` prunes them.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fresh cached value, or runs `fetch` and caches its result if it succeeds.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.put(key, value.clone());
        Ok(value)
    }
}

/// A [`TableSource`] whose reads are memoized per worksheet.
#[derive(Debug)]
pub struct CachedSource<S, C = SystemClock> {
    source: S,
    tables: TtlCache<String, Arc<Table>, C>,
}

impl<S: TableSource, C: Clock> CachedSource<S, C> {
    pub fn with_clock(source: S, ttl: Duration, clock: C) -> Self {
        Self {
            source,
            tables: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    #[instrument(skip(self))]
    pub async fn read(&self, worksheet: &str) -> Result<Arc<Table>> {
        self.tables
            .get_or_try_insert_with(worksheet.to_owned(), || async {
                debug!("cache miss, fetching worksheet");
                Ok(Arc::new(self.source.read_table(worksheet).await?))
            })
            .await
    }

    pub fn clear(&self) {
        self.tables.clear();
    }
}
