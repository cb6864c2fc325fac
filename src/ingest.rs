//! Validation and parsing of incoming samples.
//!
//! Bulk input is one sample per line:
//!
//! ```text
//! 2023-01-01T12:00:00 10
//! 2023-01-01T12:30 20
//! ```
//!
//! i.e. an ISO-8601 local date-time, a run of whitespace, and a non-negative
//! integer. Blank lines are ignored.

use chrono::NaiveDateTime;

use crate::error::{Result, TrafficError};
use crate::model::TrafficRecord;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Validates a single sample and builds the record to store.
pub fn validate_record(timestamp: Option<NaiveDateTime>, car_count: i64) -> Result<TrafficRecord> {
    let timestamp =
        timestamp.ok_or_else(|| TrafficError::InvalidInput("Timestamp cannot be null".into()))?;
    if car_count < 0 {
        return Err(TrafficError::InvalidInput(
            "Car count cannot be negative".into(),
        ));
    }
    let car_count = u32::try_from(car_count).map_err(|_| {
        TrafficError::InvalidInput(format!("Car count {car_count} is out of range"))
    })?;

    Ok(TrafficRecord::new(timestamp, car_count))
}

/// Parses an ISO-8601 local date-time, with or without seconds.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parses one non-blank line into a record.
pub fn parse_line(line: &str) -> Result<TrafficRecord> {
    let malformed = |reason: &str| TrafficError::MalformedLine {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [ts, count] = fields.as_slice() else {
        return Err(malformed("expected '<timestamp> <car count>'"));
    };

    let timestamp = parse_timestamp(ts).ok_or_else(|| malformed("invalid ISO-8601 timestamp"))?;
    if !count.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("car count must be a non-negative integer"));
    }
    let car_count: u32 = count
        .parse()
        .map_err(|_| malformed("car count is out of range"))?;

    Ok(TrafficRecord::new(timestamp, car_count))
}

/// Parses every non-blank line, stopping at the first malformed one.
pub fn parse_bulk(text: &str) -> Result<Vec<TrafficRecord>> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(parse_line)
        .collect()
}

/// Like [`parse_bulk`] but silently skips lines that do not have exactly two
/// fields, which is how bundled sample files are loaded.
pub fn parse_bulk_lenient(text: &str) -> Result<Vec<TrafficRecord>> {
    text.lines()
        .filter(|l| l.split_whitespace().count() == 2)
        .map(parse_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_validate_record_ok() {
        let r = validate_record(Some(at(12, 0, 0)), 7).unwrap();
        assert_eq!(r.timestamp, at(12, 0, 0));
        assert_eq!(r.car_count, 7);
    }

    #[test]
    fn test_validate_record_missing_timestamp() {
        assert!(matches!(
            validate_record(None, 1),
            Err(TrafficError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_record_negative_count() {
        assert!(matches!(
            validate_record(Some(at(12, 0, 0)), -1),
            Err(TrafficError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_record_zero_is_allowed() {
        assert_eq!(validate_record(Some(at(12, 0, 0)), 0).unwrap().car_count, 0);
    }

    #[test]
    fn test_validate_record_overflow() {
        assert!(validate_record(Some(at(12, 0, 0)), i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2023-01-01T12:30:15"), Some(at(12, 30, 15)));
        assert_eq!(parse_timestamp("2023-01-01T12:30"), Some(at(12, 30, 0)));
        assert!(parse_timestamp("2023-01-01T12:30:15.5").is_some());
        assert_eq!(parse_timestamp("2023-01-01 12:30"), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_line() {
        let r = parse_line("2023-01-01T12:00:00   10").unwrap();
        assert_eq!(r.timestamp, at(12, 0, 0));
        assert_eq!(r.car_count, 10);

        let tabbed = parse_line("  2023-01-01T12:30\t5  ").unwrap();
        assert_eq!(tabbed.car_count, 5);
    }

    #[test]
    fn test_parse_line_rejects_bad_shapes() {
        for line in [
            "2023-01-01T12:00:00",
            "2023-01-01T12:00:00 10 extra",
            "2023-01-01T12:00:00 -3",
            "2023-01-01T12:00:00 +3",
            "2023-01-01T12:00:00 ten",
            "2023-01-01T12:00:00 99999999999",
            "2023-13-01T12:00:00 1",
        ] {
            match parse_line(line) {
                Err(TrafficError::MalformedLine { line: l, .. }) => assert_eq!(l, line),
                other => panic!("expected MalformedLine for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_bulk_skips_blank_lines() {
        let text = "2023-01-01T12:00:00 10\r\n\n   \n2023-01-01T12:30:00 20\n";
        let records = parse_bulk(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].car_count, 20);
    }

    #[test]
    fn test_parse_bulk_stops_on_malformed() {
        let text = "2023-01-01T12:00:00 10\nnot a line at all\n";
        assert!(matches!(
            parse_bulk(text),
            Err(TrafficError::MalformedLine { .. })
        ));
    }

    #[test]
    fn test_parse_bulk_lenient_skips_odd_lines() {
        let text = "# sample data\n2023-01-01T12:00:00 10\nheader\n2023-01-01T12:30:00 20\n";
        assert_eq!(parse_bulk_lenient(text).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_bulk_lenient_still_rejects_bad_values() {
        assert!(parse_bulk_lenient("2023-01-01T12:00:00 lots\n").is_err());
    }
}
