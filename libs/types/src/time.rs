//! Nanosecond clock helpers
//!
//! Engine components take timestamps as arguments; only the edges read the
//! wall clock.

use chrono::Utc;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// Current wall-clock time as Unix nanoseconds
pub fn now_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000))
}

/// UTC day number for a Unix-nanos timestamp
pub fn day_index(timestamp: i64) -> i64 {
    timestamp.div_euclid(NANOS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_index_boundaries() {
        assert_eq!(day_index(0), 0);
        assert_eq!(day_index(NANOS_PER_DAY - 1), 0);
        assert_eq!(day_index(NANOS_PER_DAY), 1);
        assert_eq!(day_index(-1), -1);
    }

    #[test]
    fn test_now_is_after_2024() {
        assert!(now_nanos() > 1_704_067_200 * NANOS_PER_SECOND);
    }
}
