//! Timestamp parsing and (de)serialization
//!
//! Timestamps are naive local wall-clock values. Offsets on input are
//! dropped, keeping the wall-clock reading.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use chrono::Timelike;
use serde::{Deserialize, Deserializer, Serializer};

/// Format used when writing timestamps back to the map
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp in any of the accepted forms
///
/// Accepts RFC 3339 (offset discarded), ISO-8601 with `T` or space
/// separator and optional fractional seconds, and a bare date (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Current local wall-clock time, truncated to whole seconds
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Render a timestamp the way the map stores it
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// `#[serde(with = "timestamp::optional")]` for `Option<NaiveDateTime>`
pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&format_timestamp(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
        let text = match raw {
            None | Some(serde_yaml::Value::Null) => return Ok(None),
            Some(serde_yaml::Value::String(s)) => s,
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "expected a timestamp string, got {:?}",
                    other
                )))
            }
        };
        parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_accepted_forms() {
        let expected = at(2024, 3, 1, 10, 30, 0);
        assert_eq!(parse_timestamp("2024-03-01T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00+08:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01"), Some(at(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_fractional_seconds_are_kept_in_order() {
        let with_fraction = parse_timestamp("2024-03-01T10:30:00.5").unwrap();
        assert!(with_fraction > at(2024, 3, 1, 10, 30, 0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_round_trip() {
        let ts = at(2023, 12, 31, 23, 59, 1);
        assert_eq!(format_timestamp(&ts), "2023-12-31T23:59:01");
        assert_eq!(parse_timestamp(&format_timestamp(&ts)), Some(ts));
    }
}
