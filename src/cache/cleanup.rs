//! Cleanup Schedule
//!
//! Throttles sweeps of expired entries to one per period, decided without locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

// == Cleanup Schedule ==
/// Holds the next cleanup deadline as milliseconds since creation.
///
/// Readers compare the current time against the deadline; the one racer that
/// manages to swap the deadline forward owns the sweep.
#[derive(Debug)]
pub(crate) struct CleanupSchedule {
    origin: Instant,
    period: Duration,
    next_deadline_ms: AtomicU64,
}

impl CleanupSchedule {
    // == Constructor ==
    /// Creates a schedule whose first sweep is due one period from now.
    pub fn new(period: Duration) -> Self {
        Self {
            origin: Instant::now(),
            period,
            next_deadline_ms: AtomicU64::new(duration_ms(period)),
        }
    }

    // == Try Claim ==
    /// Returns `true` if the deadline has passed and the caller won the right
    /// to sweep. The deadline is advanced to `now + period` on success.
    pub fn try_claim(&self) -> bool {
        let now = self.elapsed_ms();
        let deadline = self.next_deadline_ms.load(Ordering::Acquire);
        if now < deadline {
            return false;
        }

        let next = now.saturating_add(duration_ms(self.period));
        self.next_deadline_ms
            .compare_exchange(deadline, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Pushes the deadline one period past now, for sweeps forced by hand.
    pub fn reschedule(&self) {
        let next = self.elapsed_ms().saturating_add(duration_ms(self.period));
        self.next_deadline_ms.store(next, Ordering::Release);
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn elapsed_ms(&self) -> u64 {
        duration_ms(self.origin.elapsed())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
