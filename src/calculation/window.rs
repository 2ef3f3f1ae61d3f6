//! Effective date windows and pro-rata factors.
//!
//! Inverted windows are not errors: they simply contain no days, so
//! inconsistent upstream dates degrade to zero entitlement instead of
//! aborting a recalculation.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AccrualYear, EmploymentWindow};

/// An inclusive range of whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// The whole accrual year.
    pub fn of_year(year: &AccrualYear) -> Self {
        Self {
            start: year.start,
            end: year.end,
        }
    }

    /// Intersects the accrual year with the employment bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use holiday_ledger::calculation::DateWindow;
    /// use holiday_ledger::models::{AccrualYear, EmploymentWindow};
    /// use chrono::NaiveDate;
    ///
    /// let year = AccrualYear::starting(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
    /// let employment = EmploymentWindow {
    ///     start: NaiveDate::from_ymd_opt(2025, 10, 1),
    ///     end: None,
    /// };
    /// let window = DateWindow::effective(&year, &employment);
    /// assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    /// assert_eq!(window.end, year.end);
    /// ```
    pub fn effective(year: &AccrualYear, employment: &EmploymentWindow) -> Self {
        let start = employment.start.map_or(year.start, |s| s.max(year.start));
        let end = employment.end.map_or(year.end, |e| e.min(year.end));
        Self { start, end }
    }

    /// Returns true if the window contains no days.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of days in the window, counting both ends. Never negative.
    pub fn days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }

    /// Checks whether a timestamp falls on a day inside the window.
    pub fn contains_timestamp(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        date >= self.start && date <= self.end
    }
}

/// Fraction of the accrual year covered by `window`, clamped to [0, 1].
///
/// # Example
///
/// ```
/// use holiday_ledger::calculation::{pro_rata_factor, DateWindow};
/// use holiday_ledger::models::AccrualYear;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let year = AccrualYear::starting(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
/// assert_eq!(pro_rata_factor(&DateWindow::of_year(&year), &year), Decimal::ONE);
/// ```
pub fn pro_rata_factor(window: &DateWindow, year: &AccrualYear) -> Decimal {
    let year_days = year.days();
    if year_days == 0 {
        return Decimal::ZERO;
    }
    let window_days = window.days();
    if window_days >= year_days {
        return Decimal::ONE;
    }
    Decimal::from(window_days) / Decimal::from(year_days)
}
