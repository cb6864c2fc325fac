//! Record type shared by the store, the analyzers and the report renderer.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single vehicle-count observation.
///
/// Records are append-only: once a store has accepted one it is never
/// updated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRecord {
    pub timestamp: NaiveDateTime,
    pub car_count: u32,
    pub recorded_at: DateTime<Utc>,
}

impl TrafficRecord {
    pub fn new(timestamp: NaiveDateTime, car_count: u32) -> Self {
        Self {
            timestamp,
            car_count,
            recorded_at: Utc::now(),
        }
    }

    /// Ordering used for "busiest" rankings: highest count first, earliest
    /// timestamp first among equal counts.
    pub fn busiest_first(a: &TrafficRecord, b: &TrafficRecord) -> Ordering {
        b.car_count
            .cmp(&a.car_count)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    }
}

/// Formats a timestamp as an ISO-8601 local date-time.
///
/// The seconds field is dropped when both seconds and sub-seconds are zero,
/// so half-hour samples render as `2023-01-01T12:30`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() != 0 {
        ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    } else if ts.second() != 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_format_timestamp_drops_zero_seconds() {
        assert_eq!(format_timestamp(&ts(12, 30, 0)), "2023-01-01T12:30");
    }

    #[test]
    fn test_format_timestamp_keeps_seconds() {
        assert_eq!(format_timestamp(&ts(7, 5, 9)), "2023-01-01T07:05:09");
    }

    #[test]
    fn test_format_timestamp_fractional() {
        let t = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_milli_opt(7, 5, 9, 250)
            .unwrap();
        assert_eq!(format_timestamp(&t), "2023-01-01T07:05:09.250");
    }

    #[test]
    fn test_busiest_first_breaks_ties_by_timestamp() {
        let early = TrafficRecord::new(ts(1, 0, 0), 10);
        let late = TrafficRecord::new(ts(2, 0, 0), 10);
        let big = TrafficRecord::new(ts(3, 0, 0), 11);

        let mut v = vec![late.clone(), big.clone(), early.clone()];
        v.sort_by(TrafficRecord::busiest_first);

        assert_eq!(v, vec![big, early, late]);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let r = TrafficRecord::new(ts(12, 0, 0), 5);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["carCount"], 5);
        assert_eq!(json["timestamp"], "2023-01-01T12:00:00");
        assert!(json.get("recordedAt").is_some());
    }
}
