//! Microsecond timestamps and saturating time deltas.
//!
//! All controller state is stamped with i64 microseconds since the Unix epoch,
//! with 0 meaning "never". Deltas saturate at zero so a clock that steps
//! backwards cannot wrap into a huge positive age.

use chrono::{DateTime, Utc};

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_us() -> i64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => d.as_micros() as i64,
        Err(_) => 0,
    }
}

/// Elapsed microseconds between two timestamps, 0 if the clock went backwards.
#[inline]
pub fn dt_us(now_us: i64, last_us: i64) -> u64 {
    if now_us >= last_us {
        (now_us - last_us) as u64
    } else {
        0
    }
}

/// Elapsed seconds between two timestamps, 0.0 if the clock went backwards.
#[inline]
pub fn dt_sec(now_us: i64, last_us: i64) -> f32 {
    (dt_us(now_us, last_us) as f32) / 1_000_000.0
}

/// Format a microsecond timestamp as ISO-8601 UTC with second precision.
pub fn iso8601_utc(ts_us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(ts_us)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_saturates_on_backwards_clock() {
        assert_eq!(dt_us(1_000, 2_000), 0);
        assert_eq!(dt_us(2_000, 1_000), 1_000);
        assert_eq!(dt_sec(1_000_000, 2_000_000), 0.0);
    }

    #[test]
    fn dt_sec_converts() {
        assert_eq!(dt_sec(1_500_000, 1_000_000), 0.5);
    }

    #[test]
    fn iso_formatting() {
        assert_eq!(iso8601_utc(0), "1970-01-01T00:00:00Z");
        // 2021-01-01T00:00:00Z
        assert_eq!(iso8601_utc(1_609_459_200_000_000), "2021-01-01T00:00:00Z");
    }

    #[test]
    fn iso_out_of_range_falls_back_to_epoch() {
        assert_eq!(iso8601_utc(i64::MAX), "1970-01-01T00:00:00Z");
    }
}
