//! Wall-clock time and the whole-second tick source.
//!
//! Everything above the farm rules reads time through the [`Clock`] trait
//! so tests can drive it by hand. Timestamps are epoch milliseconds, the
//! same unit the persisted document uses for `lastUpdated`.
//!
//! # Design Principles
//!
//! - All tick accounting uses checked arithmetic (no silent overflow).
//! - [`TickSource`] only ever reports whole intervals. A fractional
//!   remainder carries over to the next poll.
//! - Long gaps (a suspended laptop, a stalled runtime) are not replayed
//!   tick by tick. They are dropped here and recovered by offline
//!   reconciliation on the next load.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid tick configuration (e.g. a zero interval).
    #[error("invalid tick configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Source of the current time in epoch milliseconds.
pub trait Clock: Debug + Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// A clock frozen at `start_ms`.
    pub const fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Move forward by `delta_ms`, saturating at the representable limit.
    pub fn advance(&self, delta_ms: i64) {
        let current = self.now_ms.load(Ordering::SeqCst);
        self.now_ms
            .store(current.saturating_add(delta_ms), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Converts wall-clock progress into a count of whole ticks.
///
/// Each [`poll`](TickSource::poll) reports how many full intervals have
/// passed since the last one it accounted for, capped at `max_catch_up`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSource {
    /// Length of one tick in milliseconds.
    interval_ms: i64,
    /// Most ticks a single poll may report.
    max_catch_up: u32,
    /// Timestamp up to which ticks have been reported.
    accounted_ms: i64,
    /// Ticks reported since creation.
    total: u64,
}

impl TickSource {
    /// Start counting from `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `interval_ms` is zero or
    /// does not fit a signed millisecond count, or `max_catch_up` is zero.
    pub fn new(interval_ms: u64, max_catch_up: u32, now_ms: i64) -> Result<Self, ClockError> {
        let interval_ms = i64::try_from(interval_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| ClockError::InvalidConfig {
                reason: format!("tick interval must be between 1 and {} ms", i64::MAX),
            })?;
        if max_catch_up == 0 {
            return Err(ClockError::InvalidConfig {
                reason: String::from("max_catch_up_ticks must be at least 1"),
            });
        }
        Ok(Self {
            interval_ms,
            max_catch_up,
            accounted_ms: now_ms,
            total: 0,
        })
    }

    /// Whole ticks due at `now_ms`.
    ///
    /// A clock that moved backwards restarts the count from `now_ms`.
    /// Ticks beyond `max_catch_up` are dropped and the fractional remainder
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the running total would
    /// overflow.
    pub fn poll(&mut self, now_ms: i64) -> Result<u32, ClockError> {
        let elapsed = now_ms.saturating_sub(self.accounted_ms);
        if elapsed < 0 {
            tracing::debug!(elapsed_ms = elapsed, "clock moved backwards, resetting tick source");
            self.accounted_ms = now_ms;
            return Ok(0);
        }

        let whole = elapsed.checked_div(self.interval_ms).unwrap_or(0);
        let leftover = elapsed.checked_rem(self.interval_ms).unwrap_or(0);
        let due = u32::try_from(whole).unwrap_or(u32::MAX);

        let ticks = if due > self.max_catch_up {
            tracing::debug!(
                due,
                max_catch_up = self.max_catch_up,
                "dropping ticks for a stalled gap"
            );
            self.accounted_ms = now_ms.saturating_sub(leftover);
            self.max_catch_up
        } else {
            let consumed = whole.saturating_mul(self.interval_ms);
            self.accounted_ms = self.accounted_ms.saturating_add(consumed);
            due
        };

        self.total = self
            .total
            .checked_add(u64::from(ticks))
            .ok_or(ClockError::TickOverflow)?;
        Ok(ticks)
    }

    /// Ticks reported since creation.
    pub const fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn poll_reports_whole_intervals_and_carries_remainder() {
        let mut source = TickSource::new(1_000, 5, 0).unwrap();
        assert_eq!(source.poll(999).unwrap(), 0);
        assert_eq!(source.poll(1_500).unwrap(), 1);
        assert_eq!(source.poll(2_000).unwrap(), 1);
        assert_eq!(source.poll(4_100).unwrap(), 2);
        assert_eq!(source.total(), 4);
    }

    #[test]
    fn stalled_gap_is_capped() {
        let mut source = TickSource::new(1_000, 3, 0).unwrap();
        assert_eq!(source.poll(60_250).unwrap(), 3);
        // The remainder survives; the dropped ticks do not come back.
        assert_eq!(source.poll(60_999).unwrap(), 0);
        assert_eq!(source.poll(61_000).unwrap(), 1);
    }

    #[test]
    fn backwards_clock_resets() {
        let mut source = TickSource::new(1_000, 5, 10_000).unwrap();
        assert_eq!(source.poll(5_000).unwrap(), 0);
        assert_eq!(source.poll(6_000).unwrap(), 1);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            TickSource::new(0, 5, 0),
            Err(ClockError::InvalidConfig { .. })
        ));
        assert!(TickSource::new(1_000, 0, 0).is_err());
    }
}
