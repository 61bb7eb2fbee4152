//! Timestamp helpers.

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// Format: `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`
///
/// # Examples
///
/// ```
/// use paperflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Seconds elapsed since `since`, clamped at zero.
#[must_use]
pub fn elapsed_seconds(since: Timestamp) -> f64 {
    let micros = (Utc::now() - since).num_microseconds().unwrap_or(i64::MAX);
    #[allow(clippy::cast_precision_loss)]
    let secs = micros.max(0) as f64 / 1_000_000.0;
    secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_elapsed_seconds() {
        let past = now_utc() - Duration::seconds(2);
        let elapsed = elapsed_seconds(past);
        assert!(elapsed >= 2.0);
        assert!(elapsed < 60.0);
    }

    #[test]
    fn test_elapsed_seconds_future_is_zero() {
        let future = now_utc() + Duration::seconds(30);
        assert!(elapsed_seconds(future).abs() < f64::EPSILON);
    }
}
