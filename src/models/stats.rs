//! Statistics models
//!
//! A [`Period`] is the aggregation window: one calendar month, or a whole
//! year when the month is 0. Ranges are half-open and in UTC.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

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

/// A month, or a whole year when `month == 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    year: i32,
    month: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    /// Build a period. Returns `None` for months outside `0..=12` or years
    /// the calendar cannot represent.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if month > 12 {
            return None;
        }

        let (start, end) = if month == 0 {
            (
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
            )
        } else {
            let (next_year, next_month) = if month == 12 {
                (year.checked_add(1)?, 1)
            } else {
                (year, month + 1)
            };
            (
                NaiveDate::from_ymd_opt(year, month, 1)?,
                NaiveDate::from_ymd_opt(next_year, next_month, 1)?,
            )
        };

        Some(Self {
            year,
            month,
            start: start.and_hms_opt(0, 0, 0)?.and_utc(),
            end: end.and_hms_opt(0, 0, 0)?.and_utc(),
        })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        if month == 0 {
            return None;
        }
        Self::new(year, month)
    }

    pub fn year(year: i32) -> Option<Self> {
        Self::new(year, 0)
    }

    /// The calendar month containing `at`
    pub fn month_of(at: DateTime<Utc>) -> Self {
        Self::new(at.year(), at.month()).unwrap_or_else(Self::epoch_month)
    }

    fn epoch_month() -> Self {
        Self {
            year: 1970,
            month: 1,
            start: DateTime::<Utc>::UNIX_EPOCH,
            end: DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(31),
        }
    }

    pub fn year_number(&self) -> i32 {
        self.year
    }

    /// Month number, 0 for a whole year
    pub fn month_number(&self) -> u32 {
        self.month
    }

    pub fn is_whole_year(&self) -> bool {
        self.month == 0
    }

    /// Start of the period (inclusive)
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Start of the following period (exclusive)
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Number of days in a month period, 0 for a year period
    pub fn days_in_month(&self) -> u32 {
        if self.is_whole_year() {
            0
        } else {
            (self.end - self.start).num_days() as u32
        }
    }

    pub fn previous(&self) -> Option<Self> {
        match self.month {
            0 => Self::year(self.year.checked_sub(1)?),
            1 => Self::month(self.year.checked_sub(1)?, 12),
            m => Self::month(self.year, m - 1),
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self.month {
            0 => Self::year(self.year.checked_add(1)?),
            12 => Self::month(self.year.checked_add(1)?, 1),
            m => Self::month(self.year, m + 1),
        }
    }

    /// "November 2025", or "2025" for a whole year
    pub fn label(&self) -> String {
        match month_name(self.month) {
            Some(name) => format!("{} {}", name, self.year),
            None => self.year.to_string(),
        }
    }
}

/// English month name for 1..=12
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get((month as usize).checked_sub(1)?).copied()
}

/// Sum and count of one category within a period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: i64,
}

/// Total of one month (1..=12) within a year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: u32,
    pub total: f64,
}

/// Total of one day (1..=31) within a month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub day: u32,
    pub total: f64,
}

/// Share of `part` in `whole`, in percent; 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        100.0 * part / whole
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_month_range_is_half_open() {
        let period = Period::month(2025, 11).unwrap();
        assert_eq!(period.start(), Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap());
        assert_eq!(period.end(), Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert!(period.contains(Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap()));
        assert!(!period.contains(period.end()));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let period = Period::month(2025, 12).unwrap();
        assert_eq!(period.end(), Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(period.next(), Period::month(2026, 1));
        assert_eq!(Period::month(2026, 1).unwrap().previous(), Some(period));
    }

    #[test]
    fn test_year_period() {
        let period = Period::year(2024).unwrap();
        assert!(period.is_whole_year());
        assert_eq!(period.start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(period.end(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(period.label(), "2024");
        assert_eq!(period.previous(), Period::year(2023));
        assert_eq!(period.days_in_month(), 0);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(Period::new(2025, 13).is_none());
        assert!(Period::month(2025, 0).is_none());
        assert!(Period::new(i32::MAX, 1).is_none());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(Period::month(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(Period::month(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(Period::month(2025, 11).unwrap().days_in_month(), 30);
    }

    #[test]
    fn test_label() {
        assert_eq!(Period::month(2025, 11).unwrap().label(), "November 2025");
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert_eq!(percentage(25.0, 100.0), 25.0);
    }

    proptest! {
        #[test]
        fn month_navigation_roundtrips(year in 1900i32..2200, month in 1u32..=12) {
            let period = Period::month(year, month).unwrap();
            prop_assert_eq!(period.next().unwrap().previous(), Some(period));
            prop_assert_eq!(period.next().unwrap().start(), period.end());
        }
    }
}
