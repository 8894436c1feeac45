//! Utility functions for the flow_analysis crate

use crate::data::Period;
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Timestamp parsing helpers
pub mod date_parser {
    use super::*;

    /// Parse an ISO-8601 instant.
    ///
    /// Accepts a trailing `Z`, an explicit offset, a naive date-time (read as
    /// UTC) or a bare date (midnight UTC).
    pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(naive.and_utc());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }
        Err(AnalysisError::ParseError(format!(
            "unrecognised timestamp '{}'",
            s
        )))
    }
}

/// Every UTC calendar day fully covered by `[start, end)`, ascending.
///
/// A day is covered when both its midnight and the following midnight lie in
/// `[start, end]`; days the period only touches are left out.
pub fn days_in_period(period: &Period) -> Vec<NaiveDate> {
    let start = period.start();
    let starts_at_midnight = start.num_seconds_from_midnight() == 0 && start.nanosecond() == 0;
    let first = if starts_at_midnight {
        Some(start.date_naive())
    } else {
        start.date_naive().succ_opt()
    };
    let Some(first) = first else {
        return Vec::new();
    };
    let end_day = period.end().date_naive();
    first.iter_days().take_while(|d| *d < end_day).collect()
}

#[cfg(test)]
mod tests {
    use super::date_parser::parse_instant;
    use super::*;

    #[test]
    fn parses_common_forms() {
        let z = parse_instant("2022-01-11T00:00:00Z").unwrap();
        assert_eq!(z.to_rfc3339(), "2022-01-11T00:00:00+00:00");
        let offset = parse_instant("2022-01-11T08:00:00+08:00").unwrap();
        assert_eq!(offset, z);
        let naive = parse_instant("2022-01-11 00:00:00").unwrap();
        assert_eq!(naive, z);
        assert_eq!(parse_instant("2022-01-11").unwrap(), z);
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn days_of_aligned_and_unaligned_periods() {
        let aligned = Period::parse("2022-01-11", "2022-01-14").unwrap();
        assert_eq!(days_in_period(&aligned).len(), 3);

        let short = Period::parse("2022-01-11T12:00:00Z", "2022-01-12T06:00:00Z").unwrap();
        assert!(days_in_period(&short).is_empty());

        let wide = Period::parse("2022-01-10T12:00:00Z", "2022-01-13T06:00:00Z").unwrap();
        let days: Vec<String> = days_in_period(&wide).iter().map(|d| d.to_string()).collect();
        assert_eq!(days, vec!["2022-01-11", "2022-01-12"]);

        let late_end = Period::parse("2022-01-11", "2022-01-12T23:59:59Z").unwrap();
        assert_eq!(days_in_period(&late_end).len(), 1);
    }
}
