//! Parsing of the semicolon-delimited quote record carried in feed messages

use chrono::{Local, NaiveDateTime, TimeZone};
use thiserror::Error;

/// Format of the first field of every record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FIELD_COUNT: usize = 8;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected 8 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
    #[error("timestamp {0:?} does not exist in the local time zone")]
    NonexistentTime(String),
    #[error("invalid {field} value {text:?}")]
    Number { field: &'static str, text: String },
}

/// The latest quote for the displayed symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockObservation {
    pub symbol: String,
    pub formatted_time: String,
    /// Seconds since the Unix epoch, local time zone.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub percent_change: f64,
    pub change: f64,
    /// True only for the message that advanced the timestamp watermark.
    pub updated: bool,
}

/// Parses one record. The symbol comes from the channel name, never from
/// the payload. `updated` is left false; the session decides it.
pub fn parse_record(payload: &str, channel: &str) -> Result<StockObservation, ParseError> {
    let fields: Vec<&str> = payload.split(';').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount(fields.len()));
    }

    let formatted_time = fields[0];
    let naive = NaiveDateTime::parse_from_str(formatted_time, TIMESTAMP_FORMAT)
        .map_err(|_| ParseError::Timestamp(formatted_time.to_string()))?;
    let time = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ParseError::NonexistentTime(formatted_time.to_string()))?
        .timestamp();

    Ok(StockObservation {
        symbol: channel.to_string(),
        formatted_time: formatted_time.to_string(),
        time,
        open: number("open", fields[1])?,
        high: number("high", fields[2])?,
        low: number("low", fields[3])?,
        close: number("close", fields[4])?,
        volume: fields[5].parse().map_err(|_| ParseError::Number {
            field: "volume",
            text: fields[5].to_string(),
        })?,
        percent_change: number("percent_change", fields[6])?,
        change: number("change", fields[7])?,
        updated: false,
    })
}

fn number(field: &'static str, text: &str) -> Result<f64, ParseError> {
    text.parse().map_err(|_| ParseError::Number {
        field,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "2024-01-02 09:30:00;100;105;99;102;1000;+2.0;2.04";

    #[test]
    fn test_parse_literal_values() {
        let obs = parse_record(SAMPLE, "SP500").unwrap();
        assert_eq!(obs.symbol, "SP500");
        assert_eq!(obs.formatted_time, "2024-01-02 09:30:00");
        assert_eq!(obs.open, 100.0);
        assert_eq!(obs.high, 105.0);
        assert_eq!(obs.low, 99.0);
        assert_eq!(obs.close, 102.0);
        assert_eq!(obs.volume, 1000);
        assert_eq!(obs.percent_change, 2.0);
        assert_eq!(obs.change, 2.04);
        assert!(!obs.updated, "parse alone never marks an update");
    }

    #[test]
    fn test_epoch_matches_local_time() {
        let obs = parse_record(SAMPLE, "SP500").unwrap();
        let naive = NaiveDateTime::parse_from_str("2024-01-02 09:30:00", TIMESTAMP_FORMAT).unwrap();
        let expected = Local.from_local_datetime(&naive).earliest().unwrap().timestamp();
        assert_eq!(obs.time, expected);
    }

    #[test]
    fn test_symbol_from_channel_only() {
        let obs = parse_record(SAMPLE, "ES1").unwrap();
        assert_eq!(obs.symbol, "ES1");
    }

    #[test]
    fn test_seven_fields_rejected() {
        let err = parse_record("2024-01-02 09:30:00;100;105;99;102;1000;+2.0", "SP500").unwrap_err();
        assert_eq!(err, ParseError::FieldCount(7));
    }

    #[test]
    fn test_nine_fields_rejected() {
        let payload = format!("{SAMPLE};extra");
        assert_eq!(parse_record(&payload, "SP500").unwrap_err(), ParseError::FieldCount(9));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let err = parse_record("02/01/2024 09:30;100;105;99;102;1000;+2.0;2.04", "SP500").unwrap_err();
        assert!(matches!(err, ParseError::Timestamp(_)), "got {err:?}");
    }

    #[test]
    fn test_bad_number_rejected() {
        let err = parse_record("2024-01-02 09:30:00;100;abc;99;102;1000;+2.0;2.04", "SP500").unwrap_err();
        assert_eq!(
            err,
            ParseError::Number {
                field: "high",
                text: "abc".to_string()
            }
        );

        let err = parse_record("2024-01-02 09:30:00;100;105;99;102;10.5;+2.0;2.04", "SP500").unwrap_err();
        assert!(matches!(err, ParseError::Number { field: "volume", .. }));
    }

    #[test]
    fn test_long_timestamp_field_is_not_truncated() {
        // The timestamp must match the format exactly; trailing garbage is an error
        let payload = "2024-01-02 09:30:00.123456789012345678901234567890;1;1;1;1;1;0;0";
        assert!(parse_record(payload, "SP500").is_err());
    }
}
