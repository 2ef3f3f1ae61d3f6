//! Zero-hours entitlement calculation.
//!
//! Staff without guaranteed weekly hours accrue holiday from the hours they
//! actually work: 12.07% of every worked hour inside the effective window,
//! pro-rated by the share of the accrual year that window covers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;
use crate::identity::Identifier;
use crate::models::{AccrualYear, AuditStep, EmploymentWindow};

use super::{AccrualRates, DateWindow, ShiftHistory, pro_rata_factor};

/// The result of a zero-hours entitlement calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroHourEntitlement {
    /// The part of the accrual year the staff member was employed.
    pub window: DateWindow,
    /// Accruing hours worked inside the window.
    pub worked_hours: Decimal,
    /// Share of the accrual year covered by the window.
    pub pro_rata_factor: Decimal,
    /// Entitlement in hours.
    pub entitlement_hours: Decimal,
    /// Entitlement in days.
    pub entitlement_days: Decimal,
    /// The audit steps recorded during calculation.
    pub audit_steps: Vec<AuditStep>,
}

/// Calculates a zero-hours staff member's entitlement for one accrual year.
///
/// Holiday-taken shifts are ignored. When `employment` carries neither bound
/// the pro-rata factor is exactly one. The result is never rounded.
///
/// # Arguments
///
/// * `history` - Source of the staff member's shifts
/// * `staff_id` - The staff member
/// * `year` - The accrual year being calculated
/// * `employment` - Employment bounds (or the pro-rata anchor) for the year
/// * `rates` - Accrual rate and hours-per-day convention
/// * `step_number` - The first audit step number to use
///
/// # Errors
///
/// Propagates the history's `NotFound` when `staff_id` is unknown.
///
/// # Example
///
/// ```
/// use holiday_ledger::calculation::{calculate_zero_hour_entitlement, AccrualRates};
/// use holiday_ledger::identity::IdentityGenerator;
/// use holiday_ledger::models::{AccrualYear, EmploymentWindow, NewShift, Shift, ShiftType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let generator = IdentityGenerator::default();
/// let year = AccrualYear::starting(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
/// let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let shifts = vec![Shift::from_new(&generator, &year, NewShift {
///     staff_name: "Alice".to_string(),
///     start_time: start,
///     end_time: start + chrono::Duration::hours(12),
///     overtime: false,
///     shift_type: ShiftType::Ordinary,
/// })];
///
/// let result = calculate_zero_hour_entitlement(
///     shifts.as_slice(),
///     generator.staff_id("Alice"),
///     &year,
///     &EmploymentWindow::default(),
///     &AccrualRates::default(),
///     1,
/// ).unwrap();
///
/// assert_eq!(result.worked_hours, Decimal::new(12, 0));
/// assert_eq!(result.entitlement_days, Decimal::new(1207, 4));
/// ```
pub fn calculate_zero_hour_entitlement<H>(
    history: &H,
    staff_id: Identifier,
    year: &AccrualYear,
    employment: &EmploymentWindow,
    rates: &AccrualRates,
    step_number: u32,
) -> EngineResult<ZeroHourEntitlement>
where
    H: ShiftHistory + ?Sized,
{
    let window = DateWindow::effective(year, employment);
    let mut step = step_number;
    let mut audit_steps = Vec::with_capacity(3);

    if window.is_empty() {
        debug!(staff_id = %staff_id, "Employment window empty for accrual year");
    }
    // Always consulted so an unknown staff member surfaces as NotFound.
    let shifts = history.shifts_in_window(staff_id, &window)?;
    let accruing: Vec<_> = shifts.iter().filter(|s| s.accrues()).collect();
    let worked_hours: Decimal = accruing.iter().map(|s| s.worked_hours()).sum();

    audit_steps.push(AuditStep {
        step_number: step,
        rule_id: "zero_hours_worked".to_string(),
        rule_name: "Zero-Hours Worked Hours".to_string(),
        basis: "hours worked in effective window".to_string(),
        input: serde_json::json!({
            "window_start": window.start.to_string(),
            "window_end": window.end.to_string(),
            "shifts": shifts.len(),
        }),
        output: serde_json::json!({
            "accruing_shifts": accruing.len(),
            "worked_hours": worked_hours.normalize().to_string(),
        }),
        reasoning: format!(
            "{} of {} shifts accrue, totalling {} hours",
            accruing.len(),
            shifts.len(),
            worked_hours.normalize()
        ),
    });
    step += 1;

    let factor = if employment.is_unbounded() {
        Decimal::ONE
    } else {
        pro_rata_factor(&window, year)
    };

    audit_steps.push(AuditStep {
        step_number: step,
        rule_id: "zero_hours_pro_rata".to_string(),
        rule_name: "Zero-Hours Pro-Rata".to_string(),
        basis: "days in effective window over days in accrual year".to_string(),
        input: serde_json::json!({
            "window_days": window.days(),
            "year_days": year.days(),
            "bounded": !employment.is_unbounded(),
        }),
        output: serde_json::json!({
            "pro_rata_factor": factor.normalize().to_string(),
        }),
        reasoning: if employment.is_unbounded() {
            "No employment bounds supplied, pro-ration skipped".to_string()
        } else {
            format!("{} of {} days employed", window.days(), year.days())
        },
    });
    step += 1;

    let entitlement_hours = worked_hours * rates.zero_hours_accrual_rate * factor;
    let entitlement_days = rates.hours_to_days(entitlement_hours);

    audit_steps.push(AuditStep {
        step_number: step,
        rule_id: "zero_hours_accrual".to_string(),
        rule_name: "Zero-Hours Accrual".to_string(),
        basis: "5.6 weeks over 46.4 working weeks".to_string(),
        input: serde_json::json!({
            "worked_hours": worked_hours.normalize().to_string(),
            "accrual_rate": rates.zero_hours_accrual_rate.normalize().to_string(),
            "pro_rata_factor": factor.normalize().to_string(),
            "hours_per_day": rates.hours_per_day.normalize().to_string(),
        }),
        output: serde_json::json!({
            "entitlement_hours": entitlement_hours.normalize().to_string(),
            "entitlement_days": entitlement_days.normalize().to_string(),
        }),
        reasoning: format!(
            "{} hours x {} x {} = {} hours ({} days)",
            worked_hours.normalize(),
            rates.zero_hours_accrual_rate.normalize(),
            factor.normalize(),
            entitlement_hours.normalize(),
            entitlement_days.normalize()
        ),
    });

    Ok(ZeroHourEntitlement {
        window,
        worked_hours,
        pro_rata_factor: factor,
        entitlement_hours,
        entitlement_days,
        audit_steps,
    })
}
