//! Cache Entry Module
//!
//! Defines the per-key slot holding a cached value and its load lock.

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::cache::Expirable;

// == Cache Entry ==
/// A stored value with the generation it was installed under.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// Unique per installation, lets the sweep tell replacements apart
    pub generation: u64,
}

// == Slot State ==
/// What a sweep observed in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    /// Holds a value that may still be served
    Fresh,
    /// Holds an expired value installed under the given generation
    Expired(u64),
    /// Holds nothing (load failed or never completed)
    Vacant,
}

// == Slot ==
/// Per-key storage.
///
/// `current` is only held for the time it takes to read or swap the entry;
/// `load` is held for the whole duration of a supplier call so that callers
/// missing on the same key queue up behind a single computation.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    current: RwLock<Option<CacheEntry<T>>>,
    load: Mutex<()>,
}

impl<T> Slot<T> {
    // == Constructor ==
    pub fn vacant() -> Self {
        Self {
            current: RwLock::new(None),
            load: Mutex::new(()),
        }
    }

    /// Acquires the per-key load lock.
    pub fn lock_load(&self) -> MutexGuard<'_, ()> {
        self.load.lock()
    }

    /// Replaces the stored entry.
    pub fn install(&self, entry: CacheEntry<T>) {
        *self.current.write() = Some(entry);
    }

    pub fn is_vacant(&self) -> bool {
        self.current.read().is_none()
    }
}

impl<T: Expirable + Clone> Slot<T> {
    /// Returns the stored value whether or not it has expired.
    pub fn stored(&self) -> Option<T> {
        self.current.read().as_ref().map(|entry| entry.value.clone())
    }

    /// Returns the stored value only if it has not expired.
    pub fn fresh_value(&self) -> Option<T> {
        self.current
            .read()
            .as_ref()
            .filter(|entry| !entry.value.is_expired())
            .map(|entry| entry.value.clone())
    }

    pub fn state(&self) -> SlotState {
        match self.current.read().as_ref() {
            None => SlotState::Vacant,
            Some(entry) if entry.value.is_expired() => SlotState::Expired(entry.generation),
            Some(_) => SlotState::Fresh,
        }
    }
}
