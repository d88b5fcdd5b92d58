//! Expirable Module
//!
//! Defines the expiration capability of cached values and two ready-made carriers.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

// == Expirable ==
/// A value that can tell whether it is still valid.
///
/// Types that never go stale return `false`; those values are never swept and
/// are served until they are evicted explicitly.
///
/// `is_expired` is called while the cache sweeps and on every
/// `get_with` hit, so it must be cheap, side-effect free, and must not panic.
pub trait Expirable {
    /// Returns `true` once the value must no longer be served.
    fn is_expired(&self) -> bool;
}

macro_rules! never_expires {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Expirable for $ty {
                fn is_expired(&self) -> bool {
                    false
                }
            }
        )*
    };
}

never_expires!(
    String, &'static str, bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128,
    isize,
);

impl<U> Expirable for Vec<U> {
    fn is_expired(&self) -> bool {
        false
    }
}

impl<U: Expirable + ?Sized> Expirable for Box<U> {
    fn is_expired(&self) -> bool {
        (**self).is_expired()
    }
}

impl<U: Expirable + ?Sized> Expirable for Arc<U> {
    fn is_expired(&self) -> bool {
        (**self).is_expired()
    }
}

// == Permanent ==
/// Adapter that makes any value never expire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permanent<V>(pub V);

impl<V> Permanent<V> {
    /// Unwraps the adapted value.
    pub fn into_inner(self) -> V {
        self.0
    }
}

impl<V> Deref for Permanent<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.0
    }
}

impl<V> Expirable for Permanent<V> {
    fn is_expired(&self) -> bool {
        false
    }
}

// == Timed ==
/// A value paired with the instant after which it is stale.
///
/// Typical use is memoizing something issued with a lifetime, such as a
/// signed URL or an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timed<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Timed<V> {
    // == Constructors ==
    /// Wraps `value` so that it expires `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Wraps `value` so that it expires at a wall-clock deadline.
    ///
    /// A deadline in the past yields a value that is already expired.
    pub fn until(value: V, deadline: DateTime<Utc>) -> Self {
        let ttl = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        Self::new(value, ttl)
    }

    // == Accessors ==
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_inner(self) -> V {
        self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns the time left before expiry, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

impl<V> Expirable for Timed<V> {
    /// Expired as soon as the current time reaches the deadline.
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
