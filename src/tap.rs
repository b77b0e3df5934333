//! Tap and fare record models for CSV parsing and internal representation.

use crate::fare::Fare;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};

/// Layout used for `tap_time` in fare output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Input layouts accepted for `tap_time`. Fractional seconds are optional.
const ACCEPTED_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Raw tap record as read from CSV.
#[derive(Debug, Deserialize)]
pub struct TapRecord {
    /// Rider identifier (opaque string)
    #[serde(alias = "rider_id")]
    pub payee_id: String,

    /// Tap instant, e.g. `2023-09-01 05:12:33`
    pub tap_time: String,
}

impl TapRecord {
    /// Parses the raw CSV record into a typed tap.
    ///
    /// Returns `None` if the rider id is blank or the timestamp is unreadable.
    pub fn parse(&self) -> Option<Tap> {
        let rider_id = self.payee_id.trim();
        if rider_id.is_empty() {
            return None;
        }
        let timestamp = parse_timestamp(&self.tap_time)?;
        Some(Tap::new(rider_id, timestamp))
    }
}

/// Parses a tap instant in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// A single fare-payment event by a rider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tap {
    /// Rider who tapped
    pub rider_id: String,

    /// When the tap happened
    pub timestamp: NaiveDateTime,
}

impl Tap {
    pub fn new(rider_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Tap {
            rider_id: rider_id.into(),
            timestamp,
        }
    }
}

/// The fare decision for one tap.
///
/// Serializes to the three columns `payee_id,tap_time,fare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareRecord {
    #[serde(rename = "payee_id")]
    pub rider_id: String,

    #[serde(rename = "tap_time", serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,

    pub fare: Fare,
}

impl FareRecord {
    /// Returns `true` if this tap was charged.
    pub fn is_paid(&self) -> bool {
        !self.fare.is_zero()
    }
}

fn serialize_timestamp<S>(ts: &NaiveDateTime, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 9, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_parse_tap() {
        let record = TapRecord {
            payee_id: "abc123".to_string(),
            tap_time: "2023-09-01 05:12:33".to_string(),
        };

        let tap = record.parse().unwrap();
        assert_eq!(tap.rider_id, "abc123");
        assert_eq!(tap.timestamp, at(5, 12, 33));
    }

    #[test]
    fn test_parse_handles_whitespace() {
        let record = TapRecord {
            payee_id: "  abc123 ".to_string(),
            tap_time: " 2023-09-01 05:12:33  ".to_string(),
        };

        let tap = record.parse().unwrap();
        assert_eq!(tap.rider_id, "abc123");
        assert_eq!(tap.timestamp, at(5, 12, 33));
    }

    #[test]
    fn test_parse_fractional_and_iso_layouts() {
        let fractional = parse_timestamp("2023-09-01 05:12:33.250000").unwrap();
        assert_eq!(fractional.format(TIMESTAMP_FORMAT).to_string(), "2023-09-01 05:12:33");
        assert!(fractional > at(5, 12, 33));

        assert_eq!(parse_timestamp("2023-09-01T05:12:33"), Some(at(5, 12, 33)));
    }

    #[test]
    fn test_parse_rejects_blank_rider() {
        let record = TapRecord {
            payee_id: "   ".to_string(),
            tap_time: "2023-09-01 05:12:33".to_string(),
        };

        assert!(record.parse().is_none());
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let record = TapRecord {
            payee_id: "abc123".to_string(),
            tap_time: "yesterday".to_string(),
        };

        assert!(record.parse().is_none());
    }

    #[test]
    fn test_fare_record_is_paid() {
        let paid = FareRecord {
            rider_id: "r".to_string(),
            timestamp: at(6, 0, 0),
            fare: Fare::standard(),
        };
        let free = FareRecord {
            fare: Fare::ZERO,
            ..paid.clone()
        };

        assert!(paid.is_paid());
        assert!(!free.is_paid());
    }
}
