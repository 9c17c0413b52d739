//! Timestamp representation and window arithmetic.
//!
//! Timestamps are milliseconds since the Unix epoch. This keeps samples
//! trivially serializable and makes window bounds plain integer math.

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Get current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp_ms() -> Timestamp {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Start of a trailing window of `hours` ending at `now`.
///
/// Saturates at the epoch rather than wrapping.
pub const fn window_start(now: Timestamp, hours: u64) -> Timestamp {
    now.saturating_sub(hours.saturating_mul(MILLIS_PER_HOUR))
}

/// Cutoff timestamp for data older than `days` relative to `now`.
pub const fn retention_cutoff(now: Timestamp, days: u64) -> Timestamp {
    now.saturating_sub(days.saturating_mul(MILLIS_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_start_subtracts_hours() {
        let now = 10 * MILLIS_PER_HOUR;
        assert_eq!(window_start(now, 3), 7 * MILLIS_PER_HOUR);
    }

    #[test]
    fn window_start_saturates_at_epoch() {
        assert_eq!(window_start(1_000, 24), 0);
        assert_eq!(window_start(1_000, u64::MAX), 0);
    }

    #[test]
    fn retention_cutoff_subtracts_days() {
        let now = 40 * MILLIS_PER_DAY;
        assert_eq!(retention_cutoff(now, 30), 10 * MILLIS_PER_DAY);
    }

    #[test]
    fn current_timestamp_is_after_2023() {
        assert!(current_timestamp_ms() > 1_672_531_200_000);
    }
}
