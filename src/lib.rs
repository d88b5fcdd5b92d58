//! Expiring Cache - a lazily-expiring concurrent in-memory cache
//!
//! Values may know their own expiration, reads trigger throttled cleanup of
//! stale entries, and concurrent misses on the same key share one computation.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, Expirable, ExpiringCache, Permanent, Timed};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
