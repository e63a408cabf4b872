//! Versioned TTL cache with single-flight recompute.
//!
//! An entry is served only while both hold:
//!   - its `schema_version` equals the cache's current version
//!   - `now - computed_at <= ttl`
//! Anything else is a miss and the entry is evicted on sight.
//!
//! Concurrent misses for one key share a single computation: the first
//! caller leads, later callers block on the leader's outcome. Entries are
//! published as whole `Arc`s, so readers never see a partial write.
//!
//! Lock order is `inflight` then `entries`/`retired`, never the reverse.

use crate::{
    clock::Clock,
    error::{RetentionError, RetentionResult},
    types::PartitionKey,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry<V> {
    pub partition:      PartitionKey,
    pub payload:        V,
    pub computed_at:    DateTime<Utc>,
    pub schema_version: u32,
    /// Unique per recompute; ties log lines to the computation that served them.
    pub computation_id: String,
}

enum Lookup<V> {
    Fresh(Arc<CacheEntry<V>>),
    Missing,
}

struct Flight<V> {
    outcome: Mutex<Option<RetentionResult<Arc<CacheEntry<V>>>>>,
    done:    Condvar,
}

impl<V> Flight<V> {
    fn new() -> Self {
        Self { outcome: Mutex::new(None), done: Condvar::new() }
    }

    fn publish(&self, outcome: RetentionResult<Arc<CacheEntry<V>>>) {
        *lock(&self.outcome) = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> RetentionResult<Arc<CacheEntry<V>>> {
        let mut guard = lock(&self.outcome);
        loop {
            if let Some(outcome) = guard.as_ref() {
                return outcome.clone();
            }
            guard = self.done.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Publishes `ComputationAborted` to waiters if the leader unwinds
/// before finishing, so nobody blocks forever.
struct FlightGuard<'a, V> {
    cache:    &'a TtlCache<V>,
    key:      PartitionKey,
    flight:   Arc<Flight<V>>,
    finished: bool,
}

impl<V> FlightGuard<'_, V> {
    fn finish(&mut self, outcome: RetentionResult<Arc<CacheEntry<V>>>) {
        lock(&self.cache.inflight).remove(&self.key);
        self.flight.publish(outcome);
        self.finished = true;
    }
}

impl<V> Drop for FlightGuard<'_, V> {
    fn drop(&mut self) {
        if !self.finished {
            log::error!("cache: leader for partition {} unwound mid-computation", self.key);
            self.finish(Err(RetentionError::ComputationAborted { partition: self.key }));
        }
    }
}

pub struct TtlCache<V> {
    ttl:            Duration,
    schema_version: u32,
    clock:          Arc<dyn Clock>,
    serve_stale:    bool,
    entries:        RwLock<HashMap<PartitionKey, Arc<CacheEntry<V>>>>,
    /// Most recent TTL-expired entry per key, kept only as an error fallback.
    retired:        Mutex<HashMap<PartitionKey, Arc<CacheEntry<V>>>>,
    inflight:       Mutex<HashMap<PartitionKey, Arc<Flight<V>>>>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration, schema_version: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            schema_version,
            clock,
            serve_stale: false,
            entries:  RwLock::new(HashMap::new()),
            retired:  Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// When a recompute fails, serve the last expired entry instead of the error.
    pub fn with_stale_fallback(mut self, enabled: bool) -> Self {
        self.serve_stale = enabled;
        self
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The fresh entry for `key`, evicting it first if it has expired
    /// or was written under another schema version.
    pub fn get(&self, key: PartitionKey) -> Option<Arc<CacheEntry<V>>> {
        match self.lookup(key) {
            Lookup::Fresh(entry) => Some(entry),
            Lookup::Missing => None,
        }
    }

    /// Stamp `payload` with the current time and schema version and
    /// replace whatever was stored under `key`.
    pub fn set(&self, key: PartitionKey, payload: V) -> Arc<CacheEntry<V>> {
        self.insert(CacheEntry {
            partition: key,
            payload,
            computed_at: self.clock.now(),
            schema_version: self.schema_version,
            computation_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Store a pre-built entry as-is, keeping its own timestamp and version.
    pub fn insert(&self, entry: CacheEntry<V>) -> Arc<CacheEntry<V>> {
        let key = entry.partition;
        let entry = Arc::new(entry);
        write(&self.entries).insert(key, Arc::clone(&entry));
        lock(&self.retired).remove(&key);
        entry
    }

    pub fn invalidate(&self, key: PartitionKey) -> bool {
        lock(&self.retired).remove(&key);
        let removed = write(&self.entries).remove(&key).is_some();
        if removed {
            log::info!("cache: partition {key} invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        write(&self.entries).clear();
        lock(&self.retired).clear();
    }

    /// Number of stored entries, fresh or not yet evicted.
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a computation currently running.
    pub fn in_flight(&self) -> usize {
        lock(&self.inflight).len()
    }

    /// Serve `key` from cache, or run `compute` exactly once across all
    /// concurrent callers and publish its result.
    ///
    /// Failures are shared with every waiter and leave the cache untouched.
    pub fn get_or_compute<F>(&self, key: PartitionKey, compute: F) -> RetentionResult<Arc<CacheEntry<V>>>
    where
        F: FnOnce() -> RetentionResult<V>,
    {
        if let Lookup::Fresh(entry) = self.lookup(key) {
            log::debug!("cache: HIT partition {key} ({})", entry.computation_id);
            return Ok(entry);
        }

        let (flight, leader) = {
            let mut inflight = lock(&self.inflight);
            // A leader may have published between the lookup above and now.
            if let Some(entry) = self.get(key) {
                return Ok(entry);
            }
            match inflight.get(&key) {
                Some(flight) => (Arc::clone(flight), false),
                None => {
                    let flight = Arc::new(Flight::new());
                    inflight.insert(key, Arc::clone(&flight));
                    (flight, true)
                }
            }
        };

        if !leader {
            log::debug!("cache: partition {key} joining in-flight computation");
            return flight.wait();
        }

        log::info!("cache: MISS partition {key}, recomputing");
        let mut guard = FlightGuard { cache: self, key, flight, finished: false };

        let outcome = match compute() {
            Ok(payload) => Ok(self.set(key, payload)),
            Err(e) => self.fallback(key, e),
        };

        guard.finish(outcome.clone());
        outcome
    }

    fn fallback(&self, key: PartitionKey, error: RetentionError) -> RetentionResult<Arc<CacheEntry<V>>> {
        if self.serve_stale {
            if let Some(stale) = lock(&self.retired).get(&key).cloned() {
                log::warn!(
                    "cache: recompute for partition {key} failed ({error}); serving stale entry from {}",
                    stale.computed_at,
                );
                return Ok(stale);
            }
        }
        Err(error)
    }

    fn lookup(&self, key: PartitionKey) -> Lookup<V> {
        let entry = match read(&self.entries).get(&key) {
            Some(entry) => Arc::clone(entry),
            None => return Lookup::Missing,
        };

        if entry.schema_version != self.schema_version {
            log::info!(
                "cache: partition {key} invalidated (schema v{} -> v{})",
                entry.schema_version, self.schema_version,
            );
            self.evict(key, &entry);
            return Lookup::Missing;
        }

        let age = self.clock.now() - entry.computed_at;
        if age > self.ttl {
            log::debug!("cache: partition {key} expired ({}s old)", age.num_seconds());
            self.evict(key, &entry);
            lock(&self.retired).insert(key, entry);
            return Lookup::Missing;
        }

        Lookup::Fresh(entry)
    }

    /// Remove `entry` only if it is still the one stored; a concurrent
    /// `set` may already have replaced it.
    fn evict(&self, key: PartitionKey, entry: &Arc<CacheEntry<V>>) {
        let mut entries = write(&self.entries);
        if entries.get(&key).is_some_and(|current| Arc::ptr_eq(current, entry)) {
            entries.remove(&key);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}
