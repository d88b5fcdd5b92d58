//! Cache Module
//!
//! Provides a concurrent in-memory cache with lazy expiration and miss coalescing.

mod cleanup;
mod entry;
mod expirable;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use expirable::{Expirable, Permanent, Timed};
pub use stats::CacheStats;
pub use store::ExpiringCache;

pub(crate) use cleanup::CleanupSchedule;
pub(crate) use stats::CacheCounters;

// == Public Constants ==
/// Default interval between two sweeps of expired entries
pub const DEFAULT_CLEANUP_PERIOD: Duration = Duration::from_secs(10 * 60);
