//! Timestamps in the DevTest report format `yyyy-MM-dd'T'HH:mm:ss-SSSS`.
//!
//! The trailing `-SSSS` group is read as milliseconds, leniently: `-0500`
//! adds 500 ms and `-1500` rolls over into the next second.

use chrono::{Duration, NaiveDateTime};

const BASE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a report timestamp. Returns `None` for anything that does not match.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let (base, millis) = raw.trim().rsplit_once('-')?;
    if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: i64 = millis.parse().ok()?;
    let base = NaiveDateTime::parse_from_str(base, BASE_FORMAT).ok()?;
    base.checked_add_signed(Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parse_report_timestamp() {
        let ts = parse_timestamp("2017-12-20T13:02:20-0500").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2017, 12, 20).unwrap());
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (13, 2, 20));
        assert_eq!(ts.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_subsecond_overflow_rolls_forward() {
        let ts = parse_timestamp("2018-05-22T10:05:25-1500").unwrap();
        assert_eq!(ts.second(), 26);
        assert_eq!(ts.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_unparseable_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2017-12-20 13:02:20").is_none());
        assert!(parse_timestamp("2017-12-20T13:02:20-").is_none());
        assert!(parse_timestamp("2017-12-20T13:02:20-05:00").is_none());
    }
}
