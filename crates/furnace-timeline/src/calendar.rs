//! Calendar geometry for the projection horizon.
//!
//! Pure date arithmetic: the day axis a projection runs over, calendar-month
//! grouping for header rendering, and Gregorian leap-year day counts. Nothing
//! here reads the system clock; the horizon start is always supplied by the
//! caller.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::{Result, TimelineError};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ── Gregorian counts ────────────────────────────────────────────────────────

/// Proleptic Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `year` (365 or 366).
pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Number of days in `month` (1-12) of `year`. Returns 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// ── Day axis ────────────────────────────────────────────────────────────────

/// A finite run of consecutive dates starting at the horizon start.
///
/// The axis is a value: iterating it twice yields the same dates, and
/// day indices are stable offsets from [`DayAxis::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayAxis {
    start: NaiveDate,
    days: u32,
}

impl DayAxis {
    /// Create an axis of `horizon_days` dates beginning at `start` (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::InvalidHorizon`] if `horizon_days` is zero or
    /// the last date would fall outside chrono's representable range.
    pub fn new(start: NaiveDate, horizon_days: u32) -> Result<Self> {
        if horizon_days == 0 {
            return Err(TimelineError::InvalidHorizon(
                "horizon must cover at least one day".to_string(),
            ));
        }
        start
            .checked_add_days(Days::new(u64::from(horizon_days - 1)))
            .ok_or_else(|| {
                TimelineError::InvalidHorizon(format!(
                    "{horizon_days} days from {start} is out of range"
                ))
            })?;
        Ok(Self {
            start,
            days: horizon_days,
        })
    }

    /// A one-year axis: as many days as the start date's year has.
    pub fn one_year(start: NaiveDate) -> Result<Self> {
        Self::new(start, days_in_year(start.year()))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Number of days on the axis (always at least 1).
    pub fn days(&self) -> u32 {
        self.days
    }

    /// The date at day index `index`, if it lies on the axis.
    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.days as usize {
            return None;
        }
        self.start.checked_add_days(Days::new(index as u64))
    }

    /// Iterate the axis dates in order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.days as usize)
    }
}

/// Enumerate exactly `horizon_days` consecutive dates beginning at `start`.
///
/// # Errors
///
/// Returns [`TimelineError::InvalidHorizon`] when `horizon_days` is zero.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use furnace_timeline::calendar::enumerate_days;
///
/// let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
/// let days = enumerate_days(start, 3).unwrap();
/// assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
/// ```
pub fn enumerate_days(start: NaiveDate, horizon_days: u32) -> Result<Vec<NaiveDate>> {
    Ok(DayAxis::new(start, horizon_days)?.iter().collect())
}

// ── Month buckets ───────────────────────────────────────────────────────────

/// A contiguous calendar-month run of the day axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    /// Header label, e.g. `"October 2026"`.
    pub label: String,
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
    /// Days of this month that fall on the axis.
    pub days: u32,
}

/// Group the axis into calendar-month runs.
///
/// The first bucket counts only the days remaining in the starting month,
/// and the last bucket only the days the axis reaches into its month.
pub fn month_buckets(axis: &DayAxis) -> Vec<MonthBucket> {
    let mut buckets = Vec::new();
    let (mut year, mut month) = (axis.start.year(), axis.start.month());
    let mut first_day = axis.start.day();
    let mut remaining = axis.days;
    while remaining > 0 {
        let days = (days_in_month(year, month) - first_day + 1).min(remaining);
        buckets.push(MonthBucket {
            label: format!("{} {}", MONTH_NAMES[(month - 1) as usize], year),
            year,
            month,
            days,
        });
        remaining -= days;
        first_day = 1;
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_year_rule() {
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2026), 365);
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);
    }

    #[test]
    fn test_days_in_month_february() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn test_enumerate_days_crosses_year_end() {
        let days = enumerate_days(ymd(2026, 12, 30), 4).unwrap();
        assert_eq!(
            days,
            vec![ymd(2026, 12, 30), ymd(2026, 12, 31), ymd(2027, 1, 1), ymd(2027, 1, 2)]
        );
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let err = DayAxis::new(ymd(2026, 1, 1), 0).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidHorizon(_)));
    }

    #[test]
    fn test_axis_is_restartable() {
        let axis = DayAxis::new(ymd(2026, 3, 1), 10).unwrap();
        let first: Vec<_> = axis.iter().collect();
        let second: Vec<_> = axis.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(first[9], ymd(2026, 3, 10));
    }

    #[test]
    fn test_axis_date_lookup() {
        let axis = DayAxis::new(ymd(2026, 3, 1), 10).unwrap();
        assert_eq!(axis.date(9), Some(ymd(2026, 3, 10)));
        assert_eq!(axis.date(10), None);
    }

    #[test]
    fn test_one_year_axis_uses_leap_rule() {
        assert_eq!(DayAxis::one_year(ymd(2024, 6, 1)).unwrap().days(), 366);
        assert_eq!(DayAxis::one_year(ymd(2026, 6, 1)).unwrap().days(), 365);
    }

    #[test]
    fn test_month_buckets_first_bucket_is_remainder() {
        let axis = DayAxis::new(ymd(2026, 10, 19), 365).unwrap();
        let buckets = month_buckets(&axis);
        assert_eq!(buckets[0].label, "October 2026");
        assert_eq!(buckets[0].days, 13);
        assert_eq!(buckets[1].label, "November 2026");
        assert_eq!(buckets[1].days, 30);
        let last = buckets.last().unwrap();
        assert_eq!(last.label, "October 2027");
        assert_eq!(last.days, 18);
        assert_eq!(buckets.len(), 13);
        assert_eq!(buckets.iter().map(|b| b.days).sum::<u32>(), 365);
    }

    #[test]
    fn test_month_buckets_leap_february() {
        let axis = DayAxis::new(ymd(2024, 2, 10), 30).unwrap();
        let buckets = month_buckets(&axis);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].days, 20);
        assert_eq!(buckets[1].label, "March 2024");
        assert_eq!(buckets[1].days, 10);
    }

    #[test]
    fn test_month_buckets_single_day() {
        let axis = DayAxis::new(ymd(2024, 2, 29), 1).unwrap();
        let buckets = month_buckets(&axis);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, "February 2024");
        assert_eq!(buckets[0].days, 1);
    }
}
