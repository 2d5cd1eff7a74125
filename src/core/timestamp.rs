//! Timestamp rendering for the record prefix
//!
//! Timestamps are written straight into the line buffer being encoded, so
//! rendering never allocates an intermediate `String`.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Timestamp format used between the leading brackets of every line
///
/// # Examples
///
/// ```
/// use rust_fast_logger::TimestampFormat;
/// use chrono::Utc;
///
/// let mut out = String::new();
/// TimestampFormat::Iso8601.write_into(&mut out, &Utc::now()).unwrap();
/// assert!(out.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format, validated when the logger is built
    Custom(String),
}

impl TimestampFormat {
    /// Append the formatted timestamp to `out`.
    ///
    /// Fails only for a `Custom` pattern chrono cannot render.
    pub fn write_into<W: Write>(&self, out: &mut W, datetime: &DateTime<Utc>) -> fmt::Result {
        match self {
            TimestampFormat::Iso8601 => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
            }
            TimestampFormat::Iso8601Micros => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ"))
            }
            TimestampFormat::Rfc3339 => out.write_str(&datetime.to_rfc3339()),
            TimestampFormat::Unix => write!(out, "{}", datetime.timestamp()),
            TimestampFormat::UnixMillis => write!(out, "{}", datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => write!(out, "{}", datetime.timestamp_micros()),
            TimestampFormat::Custom(pattern) => write!(out, "{}", datetime.format(pattern)),
        }
    }

    /// Format into a new string, falling back to ISO 8601 on failure
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        let mut out = String::with_capacity(32);
        if self.write_into(&mut out, datetime).is_err() {
            out.clear();
            let _ = TimestampFormat::Iso8601.write_into(&mut out, datetime);
        }
        out
    }

    /// Reject custom patterns containing unknown strftime specifiers
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(pattern) = self {
            if pattern.is_empty() {
                return Err(LoggerError::config("TimestampFormat", "empty custom pattern"));
            }
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "TimestampFormat",
                    format!("invalid strftime pattern '{}'", pattern),
                ));
            }
        }
        Ok(())
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_iso8601_format() {
        assert_eq!(
            TimestampFormat::Iso8601.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123Z"
        );
        assert_eq!(
            TimestampFormat::Iso8601Micros.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123456Z"
        );
    }

    #[test]
    fn test_unix_formats_are_ordered() {
        let secs: i64 = TimestampFormat::Unix.format(&fixed_datetime()).parse().unwrap();
        let millis: i64 = TimestampFormat::UnixMillis
            .format(&fixed_datetime())
            .parse()
            .unwrap();
        let micros: i64 = TimestampFormat::UnixMicros
            .format(&fixed_datetime())
            .parse()
            .unwrap();
        assert_eq!(millis / 1000, secs);
        assert_eq!(micros / 1000, millis);
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string());
        assert!(format.validate().is_ok());
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_write_into_appends() {
        let mut out = String::from("[");
        TimestampFormat::Unix
            .write_into(&mut out, &fixed_datetime())
            .unwrap();
        assert!(out.starts_with("[17"));
    }

    #[test]
    fn test_invalid_custom_pattern_rejected() {
        let format = TimestampFormat::Custom("%Y-%Q".to_string());
        assert!(matches!(
            format.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
        assert!(TimestampFormat::Custom(String::new()).validate().is_err());
        assert!(TimestampFormat::Iso8601.validate().is_ok());
    }

    #[test]
    fn test_is_numeric() {
        assert!(!TimestampFormat::Iso8601.is_numeric());
        assert!(TimestampFormat::UnixMillis.is_numeric());
        assert!(!TimestampFormat::Custom("%s".to_string()).is_numeric());
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&TimestampFormat::Iso8601).expect("serialize");
        assert_eq!(json, "\"iso8601\"");

        let format: TimestampFormat =
            serde_json::from_str("\"unix_millis\"").expect("deserialize unit variant");
        assert_eq!(format, TimestampFormat::UnixMillis);

        let format: TimestampFormat =
            serde_json::from_str(r#"{"custom":"%Y-%m-%d"}"#).expect("deserialize Custom");
        assert_eq!(format, TimestampFormat::Custom("%Y-%m-%d".to_string()));
    }
}
