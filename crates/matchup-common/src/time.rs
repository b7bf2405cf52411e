//! Time handling utilities for sensor acquisition times.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::error::{MatchupError, MatchupResult};

/// Convert milliseconds since the epoch to a UTC timestamp.
pub fn datetime_from_millis(millis: i64) -> MatchupResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| MatchupError::InvalidTime(format!("{} ms is out of range", millis)))
}

/// Shift a timestamp by a (possibly negative) number of seconds.
///
/// Fails with [`MatchupError::InvalidTime`] when the result leaves the
/// representable range.
pub fn add_seconds(seconds: i64, time: DateTime<Utc>) -> MatchupResult<DateTime<Utc>> {
    Duration::try_seconds(seconds)
        .and_then(|delta| time.checked_add_signed(delta))
        .ok_or_else(|| {
            MatchupError::InvalidTime(format!("{} shifted by {} s is out of range", time, seconds))
        })
}

/// Parse a `yyyy-DDD` day-of-year string to the first millisecond of that day.
pub fn parse_doy_begin_of_day(s: &str) -> MatchupResult<DateTime<Utc>> {
    let date = parse_doy(s)?;
    date.and_hms_milli_opt(0, 0, 0, 0)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| MatchupError::InvalidTime(s.to_string()))
}

/// Parse a `yyyy-DDD` day-of-year string to the last millisecond of that day.
pub fn parse_doy_end_of_day(s: &str) -> MatchupResult<DateTime<Utc>> {
    let date = parse_doy(s)?;
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| MatchupError::InvalidTime(s.to_string()))
}

/// Format as `dd-Mon-yyyy HH:MM:SS`, the layout used in log and summary output.
pub fn format_datetime(time: &DateTime<Utc>) -> String {
    time.format("%d-%b-%Y %H:%M:%S").to_string()
}

fn parse_doy(s: &str) -> MatchupResult<NaiveDate> {
    let invalid = || MatchupError::InvalidTime(format!("'{}', expected format 'yyyy-DDD'", s));

    let (year, doy) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let doy: u32 = doy.parse().map_err(|_| invalid())?;

    NaiveDate::from_yo_opt(year, doy).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_datetime_from_millis() {
        let dt = datetime_from_millis(1435000000000).unwrap();
        assert_eq!(dt.year(), 2015);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 22);
        assert_eq!(dt.hour(), 19);
        assert_eq!(dt.minute(), 6);
        assert_eq!(dt.second(), 40);
    }

    #[test]
    fn test_format_datetime() {
        let dt = datetime_from_millis(1435000000000).unwrap();
        assert_eq!(format_datetime(&dt), "22-Jun-2015 19:06:40");
    }

    #[test]
    fn test_parse_doy_end_of_day() {
        let dt = parse_doy_end_of_day("1998-345").unwrap();
        assert_eq!(dt.year(), 1998);
        assert_eq!(dt.month(), 12);
        assert_eq!(dt.day(), 11);
        assert_eq!(dt.hour(), 23);
        assert_eq!(dt.minute(), 59);
        assert_eq!(dt.second(), 59);
        assert_eq!(dt.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn test_parse_doy_begin_of_day() {
        let dt = parse_doy_begin_of_day("1999-346").unwrap();
        assert_eq!(dt.year(), 1999);
        assert_eq!(dt.month(), 12);
        assert_eq!(dt.day(), 12);
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.timestamp_subsec_millis(), 0);

        let dt = parse_doy_begin_of_day("2002-23").unwrap();
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 23);
    }

    #[test]
    fn test_parse_doy_invalid() {
        assert!(parse_doy_begin_of_day("1999").is_err());
        assert!(parse_doy_begin_of_day("1999-400").is_err());
        assert!(parse_doy_end_of_day("yyyy-001").is_err());
    }

    #[test]
    fn test_add_seconds() {
        let dt = datetime_from_millis(10_000).unwrap();
        assert_eq!(add_seconds(-5, dt).unwrap().timestamp_millis(), 5_000);
        assert_eq!(add_seconds(5, dt).unwrap().timestamp_millis(), 15_000);
    }

    #[test]
    fn test_add_seconds_out_of_range() {
        let dt = datetime_from_millis(10_000).unwrap();
        assert!(matches!(
            add_seconds(9_000_000_000_000, dt),
            Err(MatchupError::InvalidTime(_))
        ));
        assert!(add_seconds(-9_000_000_000_000, dt).is_err());
        assert!(add_seconds(i64::MAX, dt).is_err());
    }
}
