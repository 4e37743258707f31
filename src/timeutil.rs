//! Timestamp normalization.
//!
//! Every timestamp comparison in the engine goes through
//! [`parse_timestamp`] so naive-vs-aware handling lives in one place.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a provider-supplied creation timestamp into UTC.
///
/// Timezone-aware inputs are converted; timezone-naive inputs are read
/// as UTC. Returns `None` when the value cannot be parsed — callers
/// exclude such records from recency scoring instead of failing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_rfc3339_with_offset_is_converted() {
        let ts = parse_timestamp("2026-07-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_rfc3339_utc() {
        let ts = parse_timestamp("2026-07-01T12:00:00Z").unwrap();
        assert_eq!(ts.hour(), 12);
    }

    #[test]
    fn test_naive_assumed_utc() {
        let ts = parse_timestamp("2026-07-01T12:00:00").unwrap();
        assert_eq!(ts.hour(), 12);
        assert!(parse_timestamp("2026-07-01 12:00:00.123").is_some());
    }

    #[test]
    fn test_date_only() {
        let ts = parse_timestamp("2026-07-01").unwrap();
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_garbage_returns_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2026-99-99").is_none());
    }
}
