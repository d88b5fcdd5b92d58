//! Cache Store Module
//!
//! Main cache engine: a concurrent map with lazy expiration and miss coalescing.

use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, trace};

use crate::cache::entry::{CacheEntry, Slot, SlotState};
use crate::cache::{
    CacheCounters, CacheStats, CleanupSchedule, Expirable, DEFAULT_CLEANUP_PERIOD,
};
use crate::config::CacheConfig;
use crate::error::Result;

// == Expiring Cache ==
/// Thread-safe map from string keys to values that may expire.
///
/// Expired values are never removed by a background task. Every read first
/// checks whether a sweep is due (at most once per cleanup period) and then
/// serves the request.
///
/// # Stale reads
/// [`get`](Self::get) returns whatever is currently mapped, even a value
/// whose [`Expirable::is_expired`] already reports `true`. Only
/// [`get_with`](Self::get_with) / [`try_get_with`](Self::try_get_with) and the
/// periodic sweep filter out expired values. Call `get_with` when stale data
/// must never be observed.
///
/// # Miss coalescing
/// When several callers miss on the same key at once, exactly one runs its
/// supplier. The others block until it returns and then receive the value
/// it installed. Suppliers for different keys run independently, and
/// `get` never waits for a supplier in flight.
pub struct ExpiringCache<T> {
    /// Key to per-key slot
    slots: DashMap<String, Arc<Slot<T>>>,
    /// Next sweep deadline
    schedule: CleanupSchedule,
    /// Source of entry generations
    next_generation: AtomicU64,
    /// Activity counters
    counters: CacheCounters,
}

impl<T> ExpiringCache<T> {
    // == Constructors ==
    /// Creates an empty cache sweeping at most every [`DEFAULT_CLEANUP_PERIOD`].
    pub fn new() -> Self {
        Self::with_cleanup_period(DEFAULT_CLEANUP_PERIOD)
    }

    /// Creates an empty cache sweeping at most once per `period`.
    pub fn with_cleanup_period(period: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            schedule: CleanupSchedule::new(period),
            next_generation: AtomicU64::new(0),
            counters: CacheCounters::default(),
        }
    }

    /// Creates an empty cache from a validated configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "Creating cache with cleanup period of {} seconds",
            config.cleanup_period.as_secs()
        );
        Ok(Self::with_cleanup_period(config.cleanup_period))
    }

    // == Evict ==
    /// Removes the entry for `key`, if any.
    ///
    /// Waits for a supplier already running for `key` to finish, so a load
    /// and an eviction of the same key never overlap.
    pub fn evict(&self, key: &str) {
        if self.remove_slot(key) {
            self.counters.record_evictions(1);
        }
    }

    // == Invalidate ==
    /// Removes every entry.
    ///
    /// Evicts key by key, so like [`evict`](Self::evict) it waits for
    /// suppliers in flight. Must not be called from inside a supplier.
    pub fn invalidate(&self) {
        let keys: Vec<String> = self.slots.iter().map(|item| item.key().clone()).collect();
        let removed = keys.iter().filter(|key| self.remove_slot(key)).count();
        self.counters.record_evictions(removed);
        debug!("Cache invalidated, {} entries dropped", removed);
    }

    // == Length ==
    /// Returns the number of keys currently holding a value.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_vacant()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cleanup_period(&self) -> Duration {
        self.schedule.period()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }

    /// Unmaps the slot for `key` under its load lock.
    ///
    /// Returns `true` if the removed slot held a value.
    fn remove_slot(&self, key: &str) -> bool {
        let Some(slot) = self.slots.get(key).map(|slot| Arc::clone(slot.value())) else {
            return false;
        };
        let _load = slot.lock_load();
        let removed = self
            .slots
            .remove_if(key, |_, current| Arc::ptr_eq(current, &slot))
            .is_some();
        removed && !slot.is_vacant()
    }

    fn is_mapped(&self, key: &str, slot: &Arc<Slot<T>>) -> bool {
        self.slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }
}

impl<T: Expirable + Clone> ExpiringCache<T> {
    // == Get ==
    /// Returns the value mapped to `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<T> {
        self.clean_up();

        let value = self.slots.get(key).and_then(|slot| slot.stored());
        if value.is_some() {
            self.counters.record_hit();
        } else {
            self.counters.record_miss();
        }
        value
    }

    // == Get With ==
    /// Returns the unexpired value for `key`, computing it with `supplier`
    /// when absent or expired.
    ///
    /// A panic in `supplier` unwinds through this call and installs nothing.
    pub fn get_with<F>(&self, key: &str, supplier: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self.try_get_with(key, || Ok::<T, Infallible>(supplier())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    // == Try Get With ==
    /// Fallible form of [`get_with`](Self::get_with).
    ///
    /// An error from `supplier` is returned as is and nothing is installed,
    /// so the next call for `key` runs a supplier again.
    ///
    /// `supplier` must not call back into this cache for the same `key`,
    /// nor call `evict`/`invalidate`: it runs under that key's load lock.
    pub fn try_get_with<F, E>(&self, key: &str, supplier: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.clean_up();

        if let Some(value) = self.slots.get(key).and_then(|slot| slot.fresh_value()) {
            self.counters.record_hit();
            return Ok(value);
        }
        trace!(key, "Cache miss");
        self.counters.record_miss();

        loop {
            let slot = self.slot_for(key);
            let _load = slot.lock_load();

            // Evicted while we waited, start over on the slot mapped now
            if !self.is_mapped(key, &slot) {
                continue;
            }

            // Another caller may have loaded the value while we waited
            if let Some(value) = slot.fresh_value() {
                self.counters.record_coalesced();
                return Ok(value);
            }

            return match supplier() {
                Ok(value) => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    slot.install(CacheEntry {
                        value: value.clone(),
                        generation,
                    });
                    self.counters.record_load();
                    Ok(value)
                }
                Err(err) => {
                    self.counters.record_load_failure();
                    debug!(key, "Cache load failed, nothing installed");
                    Err(err)
                }
            };
        }
    }

    // == Cleanup Expired ==
    /// Sweeps expired entries now, regardless of the schedule.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        self.schedule.reschedule();
        self.sweep()
    }

    /// Runs a sweep if the cleanup deadline has passed and no other caller
    /// claimed it first.
    fn clean_up(&self) {
        if self.schedule.try_claim() {
            self.sweep();
        }
    }

    fn sweep(&self) -> usize {
        // Collect first: removing while iterating would deadlock on the shard lock
        let candidates: Vec<(String, SlotState)> = self
            .slots
            .iter()
            .filter_map(|item| match item.value().state() {
                SlotState::Fresh => None,
                state => Some((item.key().clone(), state)),
            })
            .collect();

        let mut removed = 0;
        for (key, observed) in candidates {
            // Remove only if nothing changed since observed and no loader holds the slot
            let dropped = self.slots.remove_if(&key, |_, slot| {
                Arc::strong_count(slot) == 1 && slot.state() == observed
            });
            if dropped.is_some() && matches!(observed, SlotState::Expired(_)) {
                removed += 1;
            }
        }

        self.counters.record_sweep(removed);
        if removed > 0 {
            info!("Cache cleanup: removed {} expired entries", removed);
        } else {
            debug!("Cache cleanup: no expired entries found");
        }
        removed
    }

    /// Returns the slot for `key`, creating an empty one if needed.
    fn slot_for(&self, key: &str) -> Arc<Slot<T>> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(
            self.slots
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Slot::vacant()))
                .value(),
        )
    }
}

impl<T> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ExpiringCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("keys", &self.slots.len())
            .field("schedule", &self.schedule)
            .finish()
    }
}
