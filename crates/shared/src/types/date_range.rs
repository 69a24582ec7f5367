//! Inclusive calendar date ranges.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar dates, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range.
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, returning `None` when `end` precedes `start`.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// A range covering a single day.
    #[must_use]
    pub const fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Returns true if the two ranges share at least one day.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns true if `day` falls inside the range.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Returns true if `other` lies entirely inside this range.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Number of calendar days in the range, both ends included.
    #[must_use]
    pub fn calendar_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterates every day in the range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Calendar year of the first day.
    #[must_use]
    pub fn start_year(&self) -> i32 {
        self.start.year()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        assert!(DateRange::new(d(2025, 12, 5), d(2025, 12, 1)).is_none());
        assert!(DateRange::new(d(2025, 12, 1), d(2025, 12, 1)).is_some());
    }

    #[rstest]
    #[case((1, 5), (3, 7), true)]
    #[case((3, 7), (1, 5), true)]
    #[case((1, 5), (5, 9), true)]
    #[case((1, 5), (6, 9), false)]
    #[case((10, 12), (1, 9), false)]
    #[case((1, 31), (10, 12), true)]
    fn test_intersects(#[case] a: (u32, u32), #[case] b: (u32, u32), #[case] expected: bool) {
        let a = DateRange::new(d(2025, 12, a.0), d(2025, 12, a.1)).unwrap();
        let b = DateRange::new(d(2025, 12, b.0), d(2025, 12, b.1)).unwrap();
        assert_eq!(a.intersects(&b), expected);
    }

    #[test]
    fn test_calendar_days_and_iteration() {
        let range = DateRange::new(d(2025, 12, 30), d(2026, 1, 2)).unwrap();
        assert_eq!(range.calendar_days(), 4);
        assert_eq!(range.days().count(), 4);
        assert_eq!(range.start_year(), 2025);
    }

    #[test]
    fn test_contains_and_covers() {
        let range = DateRange::new(d(2025, 6, 1), d(2025, 6, 30)).unwrap();
        assert!(range.contains(d(2025, 6, 15)));
        assert!(!range.contains(d(2025, 7, 1)));
        assert!(range.covers(&DateRange::single(d(2025, 6, 30))));
        assert!(!range.covers(&DateRange::new(d(2025, 6, 20), d(2025, 7, 2)).unwrap()));
    }
}
