//! Statutory entitlement for fixed-hours contracts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AccrualYear, EmploymentWindow};

use super::{AccrualRates, DateWindow, pro_rata_factor};

/// Base statutory entitlement and the figures behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryEntitlement {
    /// Contracted hours x statutory weeks.
    pub full_year_hours: Decimal,
    /// Days of employment inside the accrual year.
    pub employed_days: i64,
    /// Days in the accrual year.
    pub year_days: i64,
    /// `employed_days / year_days`, clamped to [0, 1].
    pub pro_rata_factor: Decimal,
    /// Pro-rated entitlement in hours.
    pub hours: Decimal,
    /// Pro-rated entitlement in days.
    pub days: Decimal,
}

/// Calculates the statutory entitlement for a fixed weekly contract.
///
/// A pure function of its inputs: the accrual year is the twelve months
/// beginning at `year_start`. Negative contracted hours count as zero.
///
/// # Example
///
/// ```
/// use holiday_ledger::calculation::{statutory_entitlement, AccrualRates};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let base = statutory_entitlement(
///     Decimal::new(375, 1),
///     None,
///     None,
///     NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
///     &AccrualRates::default(),
/// );
/// assert_eq!(base.days, Decimal::new(175, 1));
/// ```
pub fn statutory_entitlement(
    contracted_hours: Decimal,
    employment_start: Option<NaiveDate>,
    employment_end: Option<NaiveDate>,
    year_start: NaiveDate,
    rates: &AccrualRates,
) -> StatutoryEntitlement {
    let year = AccrualYear::starting(year_start);
    let window = DateWindow::effective(
        &year,
        &EmploymentWindow {
            start: employment_start,
            end: employment_end,
        },
    );

    let full_year_hours = contracted_hours.max(Decimal::ZERO) * rates.statutory_weeks;
    let factor = pro_rata_factor(&window, &year);
    let hours = full_year_hours * factor;

    StatutoryEntitlement {
        full_year_hours,
        employed_days: window.days(),
        year_days: year.days(),
        pro_rata_factor: factor,
        hours,
        days: rates.hours_to_days(hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_year_full_time() {
        let base = statutory_entitlement(
            dec("37.5"),
            Some(date(2020, 1, 1)),
            None,
            date(2025, 4, 6),
            &AccrualRates::default(),
        );
        assert_eq!(base.full_year_hours, dec("210"));
        assert_eq!(base.pro_rata_factor, Decimal::ONE);
        assert_eq!(base.hours, dec("210"));
        assert_eq!(base.days, dec("17.5"));
    }

    #[test]
    fn test_leaver_is_pro_rated() {
        // 2025-04-06..=2025-10-04 is 182 days of a 365-day year.
        let base = statutory_entitlement(
            dec("37.5"),
            None,
            Some(date(2025, 10, 4)),
            date(2025, 4, 6),
            &AccrualRates::default(),
        );
        assert_eq!(base.employed_days, 182);
        assert_eq!(base.year_days, 365);
        assert_eq!(base.pro_rata_factor, Decimal::from(182) / Decimal::from(365));
        assert!(base.days < dec("17.5"));
        assert!(base.days > dec("8.7"));
    }

    #[test]
    fn test_employment_after_year_is_zero() {
        let base = statutory_entitlement(
            dec("37.5"),
            Some(date(2026, 4, 6)),
            None,
            date(2025, 4, 6),
            &AccrualRates::default(),
        );
        assert_eq!(base.employed_days, 0);
        assert_eq!(base.days, Decimal::ZERO);
    }

    #[test]
    fn test_negative_hours_clamped() {
        let base = statutory_entitlement(
            dec("-10"),
            None,
            None,
            date(2025, 4, 6),
            &AccrualRates::default(),
        );
        assert_eq!(base.days, Decimal::ZERO);
    }

    #[test]
    fn test_leap_year_uses_366_days() {
        let base = statutory_entitlement(
            dec("20"),
            Some(date(2023, 7, 1)),
            None,
            date(2023, 4, 6),
            &AccrualRates::default(),
        );
        assert_eq!(base.year_days, 366);
    }
}
