//! Time utilities for cueclockd
//!
//! Billing accrues on monotonic time so a wall-clock jump never changes a
//! charge. Wall-clock time is only used for the start/end stamps written
//! into session records.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `CUECLOCK_MOCK_TIME` environment variable overrides
//! the wall clock used for session stamps.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "CUECLOCK_MOCK_TIME";

/// Format accepted by `CUECLOCK_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, computed once at first use so
/// mock time advances naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_mock_time(&mock_time_str) {
                    Some(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(chrono::Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time, using system clock"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

fn parse_mock_time(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value, MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // the one place that reads the system clock
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Time of day as stamped on session records, whole seconds only.
pub fn clock_time(dt: &DateTime<Local>) -> NaiveTime {
    dt.time().with_nanosecond(0).unwrap_or_default()
}

/// Running-time display for a table: `MM:SS`.
///
/// Minutes are not wrapped into hours, so 65 minutes shows as `65:00`.
pub fn format_elapsed(elapsed_seconds: u64) -> String {
    format!("{:02}:{:02}", elapsed_seconds / 60, elapsed_seconds % 60)
}

/// A point in monotonic time, immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Time since `earlier`, zero if `earlier` is actually later.
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(90), "01:30");
        assert_eq!(format_elapsed(65 * 60 + 5), "65:05");
    }

    #[test]
    fn test_clock_time_drops_fraction() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap()
            + chrono::Duration::milliseconds(528);
        let time = clock_time(&dt);
        assert_eq!(time, NaiveTime::from_hms_opt(14, 30, 45).unwrap());
        assert_eq!(time.to_string(), "14:30:45");

        assert_eq!(clock_time(&now()).nanosecond(), 0);
    }

    #[test]
    fn test_monotonic_instant_arithmetic() {
        let t1 = MonotonicInstant::now();
        let t2 = t1 + Duration::from_secs(90);

        assert!(t2 > t1);
        assert_eq!(t2.duration_since(t1), Duration::from_secs(90));
        // Going backwards saturates instead of panicking
        assert_eq!(t1.duration_since(t2), Duration::ZERO);
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_parse_mock_time() {
        let parsed = parse_mock_time("2025-12-25 14:30:00").unwrap();
        assert_eq!(clock_time(&parsed).to_string(), "14:30:00");

        for invalid in ["2025-12-25", "14:30:00", "2025-12-25T14:30:00", "", "not a date"] {
            assert!(parse_mock_time(invalid).is_none(), "{invalid:?} should not parse");
        }
    }
}
