//! Billing clock
//!
//! Elapsed time is derived on demand from monotonic time: the stored
//! elapsed total plus the interval since the clock last started running.
//! A periodic tick may fold the running interval into the stored total;
//! that never changes the reported value, only where it is kept.

use cueclock_util::{MonotonicInstant, round_currency, round_minutes};
use std::time::Duration;

/// Accumulates running time for one table
#[derive(Debug, Clone, Default)]
pub struct BillingClock {
    /// Running time folded in so far
    stored: Duration,

    /// Set iff the clock is running
    running_since: Option<MonotonicInstant>,
}

impl BillingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the clock and start it
    pub fn start(&mut self, now_mono: MonotonicInstant) {
        self.stored = Duration::ZERO;
        self.running_since = Some(now_mono);
    }

    /// Stop accruing, keeping the elapsed total
    pub fn pause(&mut self, now_mono: MonotonicInstant) {
        self.fold(now_mono);
        self.running_since = None;
    }

    /// Continue accruing from the frozen total
    pub fn resume(&mut self, now_mono: MonotonicInstant) {
        if self.running_since.is_none() {
            self.running_since = Some(now_mono);
        }
    }

    /// Stop the clock and return the final elapsed time, leaving it zeroed
    pub fn stop(&mut self, now_mono: MonotonicInstant) -> Duration {
        let elapsed = self.elapsed(now_mono);
        self.stored = Duration::ZERO;
        self.running_since = None;
        elapsed
    }

    /// Move the running interval into the stored total
    pub fn fold(&mut self, now_mono: MonotonicInstant) {
        if let Some(since) = self.running_since {
            self.stored += now_mono.duration_since(since);
            self.running_since = Some(now_mono);
        }
    }

    /// Elapsed running time as of `now_mono`
    pub fn elapsed(&self, now_mono: MonotonicInstant) -> Duration {
        match self.running_since {
            Some(since) => self.stored + now_mono.duration_since(since),
            None => self.stored,
        }
    }

    /// Whole elapsed seconds as of `now_mono`
    pub fn elapsed_seconds(&self, now_mono: MonotonicInstant) -> u64 {
        self.elapsed(now_mono).as_secs()
    }
}

/// Live charge for `elapsed_seconds` at `rate` per minute. Not rounded.
pub fn accrued_amount(elapsed_seconds: u64, rate: f64) -> f64 {
    elapsed_seconds as f64 / 60.0 * rate
}

/// Minutes written on a session record
pub fn billed_minutes(elapsed_seconds: u64) -> f64 {
    round_minutes(elapsed_seconds as f64 / 60.0)
}

/// Amount written on a session record
pub fn billed_amount(elapsed_seconds: u64, rate: f64) -> f64 {
    round_currency(accrued_amount(elapsed_seconds, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_clock_accrues() {
        let t0 = MonotonicInstant::now();
        let mut clock = BillingClock::new();
        clock.start(t0);

        assert_eq!(clock.elapsed_seconds(t0), 0);
        assert_eq!(clock.elapsed_seconds(t0 + Duration::from_secs(90)), 90);
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let t0 = MonotonicInstant::now();
        let mut clock = BillingClock::new();
        clock.start(t0);
        clock.pause(t0 + Duration::from_secs(30));

        // Frozen while paused
        assert_eq!(clock.elapsed_seconds(t0 + Duration::from_secs(500)), 30);

        clock.resume(t0 + Duration::from_secs(500));
        assert_eq!(clock.elapsed_seconds(t0 + Duration::from_secs(530)), 60);
    }

    #[test]
    fn test_fold_does_not_change_elapsed() {
        let t0 = MonotonicInstant::now();
        let mut clock = BillingClock::new();
        clock.start(t0);

        let mut now = t0;
        for _ in 0..10 {
            now = now + Duration::from_millis(1500);
            clock.fold(now);
        }

        assert_eq!(clock.elapsed(now), Duration::from_secs(15));
        assert_eq!(clock.elapsed_seconds(now + Duration::from_millis(500)), 15);
    }

    #[test]
    fn test_stop_resets() {
        let t0 = MonotonicInstant::now();
        let mut clock = BillingClock::new();
        clock.start(t0);

        let elapsed = clock.stop(t0 + Duration::from_secs(42));
        assert_eq!(elapsed, Duration::from_secs(42));
        assert_eq!(clock.elapsed_seconds(t0 + Duration::from_secs(100)), 0);
    }

    #[test]
    fn test_start_zeroes_previous_total() {
        let t0 = MonotonicInstant::now();
        let mut clock = BillingClock::new();
        clock.start(t0);
        clock.pause(t0 + Duration::from_secs(20));

        clock.start(t0 + Duration::from_secs(25));
        assert_eq!(clock.elapsed_seconds(t0 + Duration::from_secs(25)), 0);
    }

    #[test]
    fn test_amounts() {
        assert_eq!(accrued_amount(90, 3.0), 4.5);
        assert_eq!(accrued_amount(0, 6.5), 0.0);
        // Linear, never capped
        assert_eq!(accrued_amount(6 * 3600, 2.0), 720.0);

        assert_eq!(billed_minutes(90), 1.5);
        assert_eq!(billed_minutes(100), 1.7);
        assert_eq!(billed_amount(100, 3.5), 5.83);
    }
}
