//! The save scheduler.
//!
//! Decides when the session writes its document. The scheduler owns no
//! timers and performs no I/O: callers pass the current time in, act on the
//! returned [`SaveDecision`], and report flush results back. That keeps every
//! rule testable with plain timestamps.
//!
//! # Triggers
//!
//! | Trigger | Flushes now when | Otherwise |
//! |---------|------------------|-----------|
//! | [`SaveTrigger::Immediate`] | always | n/a |
//! | [`SaveTrigger::Batch`] | pending changes reach `change_threshold` | arm the batch timer |
//! | [`SaveTrigger::Smart`] | pending changes reach `change_threshold`, or `time_threshold_ms` passed since the last save | arm the batch timer |
//!
//! An armed batch timer is never pushed back by later changes. Automatic
//! triggers are held back for `load_cooldown_ms` after load. At most one
//! flush is in flight; changes arriving meanwhile are carried by exactly one
//! follow-up flush.

use crate::config::SaveConfig;

/// How urgently a change should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Persist right away and wait for the result.
    Immediate,
    /// Persist after the batch delay, or sooner once enough changes pile up.
    Batch,
    /// Like `Batch`, but also flushes when the last save is old enough.
    Smart,
}

/// What the caller should do after reporting a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    /// Start a flush now.
    FlushNow,
    /// A batch timer was armed by this change.
    Scheduled {
        /// When the timer fires.
        due_at_ms: i64,
    },
    /// A batch timer was already armed and is left as is.
    AlreadyScheduled {
        /// When the timer fires.
        due_at_ms: i64,
    },
    /// Still inside the post-load cooldown; the change is counted only.
    Deferred,
    /// A flush is in flight; a follow-up will carry this change.
    Queued,
}

/// Proof that a flush was started, handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushTicket {
    /// Pending changes the flush covers.
    covered: u32,
    /// When the flush started.
    started_at_ms: i64,
}

impl FlushTicket {
    /// Pending changes the flush covers.
    pub const fn covered(&self) -> u32 {
        self.covered
    }
}

/// Result of a completed flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The write landed.
    Saved {
        /// Changes arrived while the flush was in flight and need another.
        follow_up: bool,
    },
    /// The write failed; every pending change is kept.
    Failed,
}

/// Running flush statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Flushes started.
    pub attempts: u64,
    /// Flushes that landed.
    pub successes: u64,
    /// Flushes that failed.
    pub failures: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// When the most recent flush started.
    pub last_attempt_ms: Option<i64>,
    /// When the most recent successful flush finished.
    pub last_success_ms: Option<i64>,
}

/// The save scheduler state machine.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    batch_delay_ms: i64,
    change_threshold: u32,
    time_threshold_ms: i64,
    /// Automatic flushes are held back before this instant.
    cooldown_until_ms: i64,
    /// Changes not yet covered by a successful flush.
    pending: u32,
    /// Last successful save, or the load time before the first one.
    last_save_ms: i64,
    /// Armed batch timer.
    batch_due_ms: Option<i64>,
    /// Changes covered by the flush in flight.
    in_flight: Option<u32>,
    stats: FlushStats,
}

fn to_ms(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl SaveScheduler {
    /// A scheduler for a session loaded at `loaded_at_ms`.
    pub fn new(config: &SaveConfig, loaded_at_ms: i64) -> Self {
        Self {
            batch_delay_ms: to_ms(config.batch_delay_ms),
            change_threshold: config.change_threshold.max(1),
            time_threshold_ms: to_ms(config.time_threshold_ms),
            cooldown_until_ms: loaded_at_ms.saturating_add(to_ms(config.load_cooldown_ms)),
            pending: 0,
            last_save_ms: loaded_at_ms,
            batch_due_ms: None,
            in_flight: None,
            stats: FlushStats::default(),
        }
    }

    /// Record one change and decide what to do about it.
    pub fn on_change(&mut self, trigger: SaveTrigger, now_ms: i64) -> SaveDecision {
        self.pending = self.pending.saturating_add(1);

        if trigger == SaveTrigger::Immediate {
            return SaveDecision::FlushNow;
        }
        if self.in_flight.is_some() {
            return SaveDecision::Queued;
        }
        if self.in_cooldown(now_ms) {
            return SaveDecision::Deferred;
        }

        if self.pending >= self.change_threshold {
            return SaveDecision::FlushNow;
        }
        if trigger == SaveTrigger::Smart
            && now_ms.saturating_sub(self.last_save_ms) >= self.time_threshold_ms
        {
            return SaveDecision::FlushNow;
        }

        match self.batch_due_ms {
            Some(due_at_ms) => SaveDecision::AlreadyScheduled { due_at_ms },
            None => {
                let due_at_ms = now_ms.saturating_add(self.batch_delay_ms);
                self.batch_due_ms = Some(due_at_ms);
                SaveDecision::Scheduled { due_at_ms }
            }
        }
    }

    /// Advance time. Returns `true` when a flush should start now.
    ///
    /// Once the cooldown is over, changes counted during it arm the batch
    /// timer (or flush straight away if they already reach the threshold).
    pub fn tick(&mut self, now_ms: i64) -> bool {
        if self.in_flight.is_some() || self.pending == 0 || self.in_cooldown(now_ms) {
            return false;
        }
        if self.pending >= self.change_threshold {
            return true;
        }
        match self.batch_due_ms {
            Some(due) => now_ms >= due,
            None => {
                self.batch_due_ms = Some(now_ms.saturating_add(self.batch_delay_ms));
                false
            }
        }
    }

    /// Start a flush covering every pending change.
    ///
    /// Returns `None` if a flush is already in flight.
    pub fn begin_flush(&mut self, now_ms: i64) -> Option<FlushTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        self.in_flight = Some(self.pending);
        self.stats.attempts = self.stats.attempts.saturating_add(1);
        self.stats.last_attempt_ms = Some(now_ms);
        Some(FlushTicket {
            covered: self.pending,
            started_at_ms: now_ms,
        })
    }

    /// Report how a flush ended.
    pub fn finish_flush(
        &mut self,
        ticket: FlushTicket,
        result: Result<(), String>,
        now_ms: i64,
    ) -> FlushOutcome {
        self.in_flight = None;
        self.batch_due_ms = None;

        match result {
            Ok(()) => {
                self.pending = self.pending.saturating_sub(ticket.covered);
                self.last_save_ms = now_ms;
                self.stats.successes = self.stats.successes.saturating_add(1);
                self.stats.last_success_ms = Some(now_ms);
                tracing::debug!(
                    covered = ticket.covered,
                    still_pending = self.pending,
                    took_ms = now_ms.saturating_sub(ticket.started_at_ms),
                    "flush saved"
                );
                FlushOutcome::Saved {
                    follow_up: self.pending > 0,
                }
            }
            Err(message) => {
                self.stats.failures = self.stats.failures.saturating_add(1);
                tracing::debug!(pending = self.pending, error = %message, "flush failed, keeping changes");
                self.stats.last_error = Some(message);
                FlushOutcome::Failed
            }
        }
    }

    /// Disarm the batch timer.
    pub const fn cancel(&mut self) {
        self.batch_due_ms = None;
    }

    /// Changes not yet covered by a successful flush.
    pub const fn pending(&self) -> u32 {
        self.pending
    }

    /// Whether a flush is in flight.
    pub const fn is_flushing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// When the armed batch timer fires, if one is armed.
    pub const fn batch_due_ms(&self) -> Option<i64> {
        self.batch_due_ms
    }

    /// Time of the last successful save (the load time before the first).
    pub const fn last_save_ms(&self) -> i64 {
        self.last_save_ms
    }

    /// Running flush statistics.
    pub const fn stats(&self) -> &FlushStats {
        &self.stats
    }

    const fn in_cooldown(&self, now_ms: i64) -> bool {
        now_ms < self.cooldown_until_ms
    }
}
