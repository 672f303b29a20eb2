//! Cooperative interval timer.
//!
//! Every periodic decision in the firmware (network health check, sensor
//! sampling, telemetry dispatch, WiFi retry backoff) is driven by an
//! [`IntervalTimer`] compared against the monotonic millisecond clock.  The
//! main loop polls at high frequency; a component does its work only when
//! its timer reports the deadline has passed, so skipping a poll is harmless.
//!
//! ```text
//!   now ──▶ is_due? ──no──▶ return (no state change)
//!              │
//!             yes
//!              ▼
//!        deadline = now + period ──▶ do periodic work
//! ```

/// A rearming deadline with a fixed period, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period_ms: u64,
    deadline_ms: u64,
}

impl IntervalTimer {
    /// First deadline is one full period after `now_ms`.
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            deadline_ms: now_ms.saturating_add(period_ms),
        }
    }

    /// A timer that is already due at `now_ms`.
    pub fn immediate(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            deadline_ms: now_ms,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// True once `now_ms` has reached the deadline.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// If due, rearm one period from `now_ms` and return `true`.
    /// Otherwise leave the timer untouched and return `false`.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.rearm(now_ms);
        true
    }

    /// Next deadline is one period from `now_ms`.
    pub fn rearm(&mut self, now_ms: u64) {
        self.deadline_ms = now_ms.saturating_add(self.period_ms);
    }

    /// Push the deadline out to `periods` full periods from `now_ms`.
    pub fn defer(&mut self, now_ms: u64, periods: u32) {
        self.deadline_ms = now_ms.saturating_add(self.period_ms.saturating_mul(periods as u64));
    }

    /// Change the period; the next deadline is one new period from `now_ms`.
    pub fn set_period(&mut self, period_ms: u64, now_ms: u64) {
        self.period_ms = period_ms;
        self.rearm(now_ms);
    }

    /// Milliseconds until the deadline (0 when due).
    pub fn remaining(&self, now_ms: u64) -> u64 {
        self.deadline_ms.saturating_sub(now_ms)
    }
}
