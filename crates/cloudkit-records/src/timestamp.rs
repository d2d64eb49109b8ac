//! Millisecond conversions used by TIMESTAMP fields, audit blocks, and
//! location fixes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, rounded to the nearest millisecond.
pub fn to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => round_millis(after),
        Err(before) => -round_millis(before.duration()),
    }
}

fn round_millis(duration: Duration) -> i64 {
    let millis = (duration.as_nanos() + 500_000) / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}

pub fn from_millis(millis: i64) -> Option<SystemTime> {
    let magnitude = Duration::from_millis(millis.unsigned_abs());
    if millis >= 0 {
        UNIX_EPOCH.checked_add(magnitude)
    } else {
        UNIX_EPOCH.checked_sub(magnitude)
    }
}

/// Fractional millisecond payloads are legal on the wire.
pub fn from_millis_f64(millis: f64) -> Option<SystemTime> {
    if !millis.is_finite() {
        return None;
    }
    let magnitude = Duration::try_from_secs_f64(millis.abs() / 1000.0).ok()?;
    if millis >= 0.0 {
        UNIX_EPOCH.checked_add(magnitude)
    } else {
        UNIX_EPOCH.checked_sub(magnitude)
    }
}

/// Reads a millisecond count from a JSON number, preferring the exact
/// integer form.
pub fn from_json(value: &serde_json::Value) -> Option<SystemTime> {
    match value.as_i64() {
        Some(millis) => from_millis(millis),
        None => from_millis_f64(value.as_f64()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_millis_rounds_to_nearest() {
        let time = UNIX_EPOCH + Duration::from_micros(1_500_600);
        assert_eq!(to_millis(time), 1_501);
        let time = UNIX_EPOCH + Duration::from_micros(1_500_400);
        assert_eq!(to_millis(time), 1_500);
    }

    #[test]
    fn from_millis_before_epoch_expected_earlier_time() {
        let time = from_millis(-2_000).expect("pre-epoch millis should convert");
        assert_eq!(to_millis(time), -2_000);
        assert!(time < UNIX_EPOCH);
    }

    #[test]
    fn from_millis_f64_rejects_non_finite() {
        assert_eq!(from_millis_f64(f64::NAN), None);
        assert_eq!(from_millis_f64(f64::INFINITY), None);
        assert_eq!(
            from_millis_f64(1_500.0),
            Some(UNIX_EPOCH + Duration::from_millis(1_500))
        );
    }
}
