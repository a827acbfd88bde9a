//! Client-supplied date handling.
//!
//! Dates arrive as ISO-8601 strings, either full RFC 3339 timestamps
//! (`2025-03-01T09:30:00+03:00`) or bare calendar dates (`2025-03-01`, read
//! as midnight UTC). They are stored as given and parsed when compared.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{DomainError, DomainResult};

/// Parse an ISO-8601 timestamp or calendar date.
pub fn parse_instant(value: &str) -> DomainResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(DomainError::validation(format!(
        "'{value}' is not an ISO-8601 date or timestamp"
    )))
}

/// Validate a required date field, naming the field in the error.
pub fn validate_date(field: &str, value: &str) -> DomainResult<()> {
    parse_instant(value)
        .map(|_| ())
        .map_err(|_| DomainError::validation(format!("{field} must be an ISO-8601 date")))
}

/// Parse the inclusive upper bound of a date range. A calendar date covers
/// the whole day; timestamps are taken as given.
pub fn parse_range_end(value: &str) -> DomainResult<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        if let Some(last) = date.and_hms_nano_opt(23, 59, 59, 999_999_999) {
            return Ok(last.and_utc());
        }
    }
    parse_instant(value)
}

/// Validate an optional date field. Empty strings are treated as absent.
pub fn validate_optional_date(field: &str, value: Option<&str>) -> DomainResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_date(field, v),
        _ => Ok(()),
    }
}

/// Parse an optional stored date; unparsable or empty values read as `None`.
pub fn parse_optional(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| parse_instant(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_rfc3339_with_offset() {
        let ts = parse_instant("2025-03-01T09:30:00+03:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 1, 6, 30, 0).unwrap());
    }

    #[test]
    fn accepts_calendar_date_as_midnight_utc() {
        let ts = parse_instant("2025-03-01").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn calendar_range_end_covers_the_whole_day() {
        let end = parse_range_end("2025-03-01").unwrap();
        assert!(end > Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap());

        let exact = parse_range_end("2025-03-01T12:00:00Z").unwrap();
        assert_eq!(exact, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_instant("next tuesday"), Err(DomainError::Validation(_))));
        assert!(validate_date("inspection_expiry", "2025-13-01").is_err());
    }

    #[test]
    fn empty_optional_dates_are_absent() {
        assert!(validate_optional_date("kasko_expiry", Some("  ")).is_ok());
        assert!(validate_optional_date("kasko_expiry", None).is_ok());
        assert_eq!(parse_optional(Some("")), None);
        assert_eq!(parse_optional(Some("bogus")), None);
    }
}
