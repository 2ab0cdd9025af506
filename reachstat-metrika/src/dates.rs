use chrono::{Days, Local, NaiveDate};
use reachstat_common::{ReachError, Result};

/// Longest span the reporting API accepts, in days.
pub const MAX_SPAN_DAYS: i64 = 730;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive, validated reporting window.
///
/// Only [`validate_dates_at`] and [`DateRange::default_window`] construct it, so
/// `date_from <= date_to` and the span limit always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    date_from: NaiveDate,
    date_to: NaiveDate,
}

impl DateRange {
    /// Today and the six days before it.
    pub fn default_window(today: NaiveDate) -> Self {
        let date_from = today.checked_sub_days(Days::new(6)).unwrap_or(today);
        Self {
            date_from,
            date_to: today,
        }
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    /// Days between the two ends (0 for a single-day range).
    pub fn span_days(&self) -> i64 {
        (self.date_to - self.date_from).num_days()
    }
}

/// [`validate_dates_at`] against the local calendar date.
pub fn validate_dates(date_from: &str, date_to: &str) -> Result<DateRange> {
    validate_dates_at(date_from, date_to, Local::now().date_naive())
}

/// Parse and check a `YYYY-MM-DD` range.
///
/// A string that is not a calendar date fails with
/// [`ReachError::InvalidDateFormat`]; a well-formed range that is reversed,
/// ends after `today`, or spans more than [`MAX_SPAN_DAYS`] fails with
/// [`ReachError::Validation`].
pub fn validate_dates_at(date_from: &str, date_to: &str, today: NaiveDate) -> Result<DateRange> {
    let from = parse_date(date_from)?;
    let to = parse_date(date_to)?;

    if from > to {
        return Err(ReachError::Validation(format!(
            "start date {from} is after end date {to}"
        )));
    }
    if to > today {
        return Err(ReachError::Validation(format!(
            "end date {to} is in the future"
        )));
    }
    let range = DateRange {
        date_from: from,
        date_to: to,
    };
    if range.span_days() > MAX_SPAN_DAYS {
        return Err(ReachError::Validation(format!(
            "period of {} days exceeds the {MAX_SPAN_DAYS}-day limit",
            range.span_days()
        )));
    }
    Ok(range)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ReachError::InvalidDateFormat(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn accepts_valid_ranges() {
        let today = day("2024-06-30");
        for (from, to) in [
            ("2024-06-30", "2024-06-30"),
            ("2024-01-01", "2024-06-30"),
            ("2022-07-01", "2024-06-30"),
            ("2023-02-28", "2023-03-01"),
        ] {
            let range = validate_dates_at(from, to, today)
                .unwrap_or_else(|e| panic!("{from}..{to}: {e}"));
            assert_eq!(range.date_from(), day(from));
            assert_eq!(range.date_to(), day(to));
        }
    }

    #[test]
    fn rejects_reversed_range() {
        let err = validate_dates_at("2024-02-01", "2024-01-01", day("2024-06-30")).unwrap_err();
        assert!(matches!(err, ReachError::Validation(_)));
    }

    #[test]
    fn rejects_future_end() {
        let err = validate_dates_at("2024-06-01", "2024-07-01", day("2024-06-30")).unwrap_err();
        assert!(matches!(err, ReachError::Validation(ref m) if m.contains("future")));
    }

    #[test]
    fn span_limit_is_inclusive_of_730() {
        let today = day("2024-12-31");
        assert!(validate_dates_at("2023-01-01", "2024-12-31", today).is_ok());
        let err = validate_dates_at("2022-12-31", "2024-12-31", today).unwrap_err();
        assert!(matches!(err, ReachError::Validation(_)));
    }

    #[test]
    fn malformed_dates_are_format_errors() {
        let today = day("2024-06-30");
        for bad in ["2024/01/01", "01-02-2024", "2024-02-30", "yesterday", ""] {
            let err = validate_dates_at(bad, "2024-06-01", today).unwrap_err();
            assert!(
                matches!(err, ReachError::InvalidDateFormat(ref s) if s == bad),
                "{bad:?} gave {err:?}"
            );
        }
        let err = validate_dates_at("2024-06-01", "2024-13-01", today).unwrap_err();
        assert!(matches!(err, ReachError::InvalidDateFormat(_)));
    }

    #[test]
    fn default_window_is_seven_days() {
        let range = DateRange::default_window(day("2024-03-03"));
        assert_eq!(range.date_from(), day("2024-02-26"));
        assert_eq!(range.date_to(), day("2024-03-03"));
        assert_eq!(range.span_days(), 6);
    }
}
