//! Time helpers for window computations.
//!
//! Window sizes are expressed in whole days. The difference used for
//! queue eviction truncates sub-day remainders, so a draw at 07:25 and
//! another 4 days and 2 hours later are 4 days apart.

use chrono::{DateTime, NaiveDateTime};

/// Whole days elapsed from `from` to `to`.
///
/// Truncates toward zero, so a span of 3 days 22 hours is 3 days and a
/// negative span of the same magnitude is -3 days.
pub fn day_difference(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_days()
}

/// Seconds since the Unix epoch, treating the naive timestamp as UTC.
pub fn to_epoch_seconds(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

/// Inverse of [`to_epoch_seconds`]. `None` for out-of-range values.
pub fn from_epoch_seconds(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_day_difference_truncates() {
        // 3 days 22 hours 28 minutes -> 3 whole days
        let a = dt(2010, 9, 9, 16, 43);
        let b = dt(2010, 9, 13, 15, 11);
        assert_eq!(day_difference(a, b), 3);

        // 4 days 1 hour 10 minutes -> 4 whole days
        let a = dt(2013, 5, 1, 6, 55);
        let b = dt(2013, 5, 5, 8, 5);
        assert_eq!(day_difference(a, b), 4);
    }

    #[test]
    fn test_day_difference_signed() {
        let a = dt(2013, 2, 2, 9, 40);
        let b = dt(2013, 1, 29, 1, 3);
        assert_eq!(day_difference(a, b), -4);
        assert_eq!(day_difference(a, a), 0);
    }

    #[test]
    fn test_epoch_roundtrip() {
        let a = dt(2012, 9, 10, 7, 25);
        let secs = to_epoch_seconds(a);
        assert_eq!(from_epoch_seconds(secs), Some(a));
    }
}
