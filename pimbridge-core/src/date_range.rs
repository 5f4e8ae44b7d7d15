//! Date range for filtering events.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Date range for filtering events.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// ±`days` from now.
    pub fn around_now(days: i64) -> Self {
        let now = Utc::now();
        DateRange {
            from: Some(now - Duration::days(days)),
            to: Some(now + Duration::days(days)),
        }
    }

    /// Build a range from command-line style arguments.
    /// - `from`: "start" for unbounded, or YYYY-MM-DD
    /// - `to`: "end" for unbounded, or YYYY-MM-DD
    ///
    /// A missing bound defaults to `default_days` from now.
    pub fn from_args(from: Option<&str>, to: Option<&str>, default_days: i64) -> Result<Self, String> {
        let now = Utc::now();

        let from_dt = match from {
            Some("start") => None,
            Some(s) => Some(parse_date_start(s)?),
            None => Some(now - Duration::days(default_days)),
        };

        let to_dt = match to {
            Some("end") => None,
            Some(s) => Some(parse_date_end(s)?),
            None => Some(now + Duration::days(default_days)),
        };

        if let (Some(f), Some(t)) = (from_dt, to_dt) {
            if t < f {
                return Err(format!("Range ends ({}) before it starts ({})", t, f));
            }
        }

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }

    /// Whether `[start, end]` overlaps the range.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| end >= from) && self.to.is_none_or(|to| start <= to)
    }
}

/// Parse YYYY-MM-DD as start of day in UTC
fn parse_date_start(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Parse YYYY-MM-DD as end of day in UTC
fn parse_date_end(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))?;
    let end_of_day = chrono::NaiveTime::from_hms_opt(23, 59, 59)
        .ok_or_else(|| "Could not build end of day".to_string())?;
    Ok(date.and_time(end_of_day).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_args_parses_bounds() {
        let range = DateRange::from_args(Some("2025-03-01"), Some("2025-03-31"), 30).unwrap();
        assert_eq!(range.from, Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(range.to, Some(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_from_args_unbounded() {
        let range = DateRange::from_args(Some("start"), Some("end"), 30).unwrap();
        assert_eq!(range.from, None);
        assert_eq!(range.to, None);
    }

    #[test]
    fn test_from_args_rejects_bad_input() {
        assert!(DateRange::from_args(Some("March"), None, 30).is_err());
        assert!(DateRange::from_args(Some("2025-03-31"), Some("2025-03-01"), 30).is_err());
    }

    #[test]
    fn test_overlaps() {
        let range = DateRange::from_args(Some("2025-03-01"), Some("2025-03-31"), 30).unwrap();
        let inside = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap();

        assert!(range.overlaps(inside, inside));
        assert!(range.overlaps(before, inside));
        assert!(!range.overlaps(before, before));
    }
}
