//! Accrual year model and resolvers.
//!
//! This module contains the [`AccrualYear`] date window and the
//! [`AccrualYearResolver`] lookup that answers "which holiday year is
//! active right now".

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityGenerator, Identifier};

/// A statutory holiday year, inclusive of both ends.
///
/// # Example
///
/// ```
/// use holiday_ledger::models::AccrualYear;
/// use chrono::NaiveDate;
///
/// let year = AccrualYear::starting(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
/// assert_eq!(year.end, NaiveDate::from_ymd_opt(2026, 4, 5).unwrap());
/// assert_eq!(year.days(), 365);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccrualYear {
    /// First day of the year (inclusive).
    pub start: NaiveDate,
    /// Last day of the year (inclusive).
    pub end: NaiveDate,
}

impl AccrualYear {
    /// Creates a year from explicit bounds.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Creates the twelve-month year beginning on `start`.
    pub fn starting(start: NaiveDate) -> Self {
        let end = start
            .checked_add_months(Months::new(12))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Returns the year's identifier.
    pub fn id(&self, generator: &IdentityGenerator) -> Identifier {
        generator.accrual_year_id(self.start, self.end)
    }

    /// Checks if a given date falls within this year (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days in the year, counting both ends. Never negative.
    pub fn days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    /// Returns the anniversary year starting on `month`/`day` that contains `date`.
    ///
    /// A 29 February anniversary falls back to 28 February in other years.
    pub fn anniversary_containing(month: u32, day: u32, date: NaiveDate) -> Self {
        let this_year = anniversary_in(date.year(), month, day);
        let start = if this_year <= date {
            this_year
        } else {
            anniversary_in(date.year() - 1, month, day)
        };
        Self::starting(start)
    }
}

fn anniversary_in(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, day.saturating_sub(1)))
        .unwrap_or(NaiveDate::MIN)
}

/// Resolves the currently active accrual year.
///
/// Implementations are process-wide and cheap to call.
pub trait AccrualYearResolver: Send + Sync {
    /// Returns the year active today.
    fn current(&self) -> AccrualYear;

    /// Returns the year containing `date`.
    fn year_containing(&self, date: NaiveDate) -> AccrualYear;
}

/// Years that begin on the same month and day every calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnniversaryYear {
    /// Month the year starts in (1-12).
    pub start_month: u32,
    /// Day of month the year starts on.
    pub start_day: u32,
}

impl AccrualYearResolver for AnniversaryYear {
    fn current(&self) -> AccrualYear {
        self.year_containing(Utc::now().date_naive())
    }

    fn year_containing(&self, date: NaiveDate) -> AccrualYear {
        AccrualYear::anniversary_containing(self.start_month, self.start_day, date)
    }
}

/// A pinned current year, used for corrections and tests.
///
/// Dates outside the pinned year resolve to the anniversary years around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedYear(pub AccrualYear);

impl AccrualYearResolver for FixedYear {
    fn current(&self) -> AccrualYear {
        self.0
    }

    fn year_containing(&self, date: NaiveDate) -> AccrualYear {
        if self.0.contains_date(date) {
            return self.0;
        }
        AccrualYear::anniversary_containing(self.0.start.month(), self.0.start.day(), date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_starting_spans_twelve_months() {
        let year = AccrualYear::starting(date(2025, 4, 6));
        assert_eq!(year.end, date(2026, 4, 5));
    }

    #[test]
    fn test_leap_year_has_366_days() {
        let year = AccrualYear::starting(date(2024, 1, 1));
        assert_eq!(year.days(), 366);
    }

    #[test]
    fn test_inverted_year_has_zero_days() {
        let year = AccrualYear::new(date(2025, 4, 6), date(2025, 4, 1));
        assert_eq!(year.days(), 0);
    }

    #[test]
    fn test_contains_date_inclusive() {
        let year = AccrualYear::starting(date(2025, 4, 6));
        assert!(year.contains_date(date(2025, 4, 6)));
        assert!(year.contains_date(date(2026, 4, 5)));
        assert!(!year.contains_date(date(2025, 4, 5)));
        assert!(!year.contains_date(date(2026, 4, 6)));
    }

    #[test]
    fn test_anniversary_before_start_uses_previous_year() {
        let year = AccrualYear::anniversary_containing(4, 6, date(2026, 1, 15));
        assert_eq!(year.start, date(2025, 4, 6));
    }

    #[test]
    fn test_anniversary_on_start_day_uses_this_year() {
        let year = AccrualYear::anniversary_containing(4, 6, date(2026, 4, 6));
        assert_eq!(year.start, date(2026, 4, 6));
    }

    #[test]
    fn test_leap_day_anniversary_falls_back() {
        let year = AccrualYear::anniversary_containing(2, 29, date(2025, 3, 1));
        assert_eq!(year.start, date(2025, 2, 28));
    }

    #[test]
    fn test_fixed_resolver_pins_current() {
        let pinned = AccrualYear::starting(date(2025, 4, 6));
        let resolver = FixedYear(pinned);
        assert_eq!(resolver.current(), pinned);
        assert_eq!(resolver.year_containing(date(2025, 12, 25)), pinned);
        assert_eq!(
            resolver.year_containing(date(2024, 12, 25)).start,
            date(2024, 4, 6)
        );
    }

    #[test]
    fn test_id_depends_on_bounds() {
        let generator = IdentityGenerator::default();
        let a = AccrualYear::starting(date(2025, 4, 6));
        let b = AccrualYear::starting(date(2026, 4, 6));
        assert_ne!(a.id(&generator), b.id(&generator));
        assert_eq!(a.id(&generator), a.id(&generator));
    }
}
