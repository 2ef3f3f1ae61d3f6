//! Fixed-hours entitlement calculation.
//!
//! The base comes from [`statutory_entitlement`]; overtime worked anywhere in
//! the accrual year adds proportional days on top, uncapped and not
//! pro-rated.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::identity::Identifier;
use crate::models::{AccrualYear, AuditStep, EmploymentWindow};

use super::{AccrualRates, DateWindow, ShiftHistory, StatutoryEntitlement, statutory_entitlement};

/// The result of a fixed-hours entitlement calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedEntitlement {
    /// The statutory base.
    pub base: StatutoryEntitlement,
    /// Overtime hours worked in the accrual year.
    pub overtime_hours: Decimal,
    /// Days accrued from overtime.
    pub overtime_days: Decimal,
    /// Total entitlement in days.
    pub entitlement_days: Decimal,
    /// Total entitlement in hours.
    pub entitlement_hours: Decimal,
    /// The audit steps recorded during calculation.
    pub audit_steps: Vec<AuditStep>,
}

/// Calculates a fixed-hours staff member's entitlement for one accrual year.
///
/// # Arguments
///
/// * `history` - Source of the staff member's shifts
/// * `staff_id` - The staff member
/// * `contracted_hours` - Weekly contracted hours
/// * `employment` - Employment bounds (or the pro-rata anchor) for the year
/// * `year` - The accrual year being calculated
/// * `rates` - Statutory weeks and hours-per-day convention
/// * `step_number` - The first audit step number to use
///
/// # Errors
///
/// Propagates the history's `NotFound` when `staff_id` is unknown.
pub fn calculate_fixed_entitlement<H>(
    history: &H,
    staff_id: Identifier,
    contracted_hours: Decimal,
    employment: &EmploymentWindow,
    year: &AccrualYear,
    rates: &AccrualRates,
    step_number: u32,
) -> EngineResult<FixedEntitlement>
where
    H: ShiftHistory + ?Sized,
{
    let mut step = step_number;
    let mut audit_steps = Vec::with_capacity(3);

    let base = statutory_entitlement(
        contracted_hours,
        employment.start,
        employment.end,
        year.start,
        rates,
    );

    audit_steps.push(AuditStep {
        step_number: step,
        rule_id: "statutory_base".to_string(),
        rule_name: "Statutory Base Entitlement".to_string(),
        basis: "5.6 weeks of contracted hours, pro-rated by employment".to_string(),
        input: serde_json::json!({
            "contracted_hours": contracted_hours.normalize().to_string(),
            "statutory_weeks": rates.statutory_weeks.normalize().to_string(),
            "employed_days": base.employed_days,
            "year_days": base.year_days,
        }),
        output: serde_json::json!({
            "pro_rata_factor": base.pro_rata_factor.normalize().to_string(),
            "base_hours": base.hours.normalize().to_string(),
            "base_days": base.days.normalize().to_string(),
        }),
        reasoning: format!(
            "{} hours x {} weeks x {} = {} hours ({} days)",
            contracted_hours.normalize(),
            rates.statutory_weeks.normalize(),
            base.pro_rata_factor.normalize(),
            base.hours.normalize(),
            base.days.normalize()
        ),
    });
    step += 1;

    let shifts = history.shifts_in_window(staff_id, &DateWindow::of_year(year))?;
    let overtime: Vec<_> = shifts.iter().filter(|s| s.overtime && s.accrues()).collect();
    let overtime_hours: Decimal = overtime.iter().map(|s| s.worked_hours()).sum();
    let overtime_days = rates.hours_to_days(overtime_hours);

    audit_steps.push(AuditStep {
        step_number: step,
        rule_id: "overtime_accrual".to_string(),
        rule_name: "Overtime Accrual".to_string(),
        basis: "every overtime hour accrues, uncapped".to_string(),
        input: serde_json::json!({
            "overtime_shifts": overtime.len(),
            "hours_per_day": rates.hours_per_day.normalize().to_string(),
        }),
        output: serde_json::json!({
            "overtime_hours": overtime_hours.normalize().to_string(),
            "overtime_days": overtime_days.normalize().to_string(),
        }),
        reasoning: format!(
            "{} overtime shifts totalling {} hours add {} days",
            overtime.len(),
            overtime_hours.normalize(),
            overtime_days.normalize()
        ),
    });
    step += 1;

    let entitlement_days = base.days + overtime_days;
    let entitlement_hours = base.hours + overtime_hours;

    audit_steps.push(AuditStep {
        step_number: step,
        rule_id: "fixed_total".to_string(),
        rule_name: "Fixed-Hours Total".to_string(),
        basis: "base plus overtime".to_string(),
        input: serde_json::json!({
            "base_days": base.days.normalize().to_string(),
            "overtime_days": overtime_days.normalize().to_string(),
        }),
        output: serde_json::json!({
            "entitlement_days": entitlement_days.normalize().to_string(),
            "entitlement_hours": entitlement_hours.normalize().to_string(),
        }),
        reasoning: format!(
            "{} + {} = {} days",
            base.days.normalize(),
            overtime_days.normalize(),
            entitlement_days.normalize()
        ),
    });

    Ok(FixedEntitlement {
        base,
        overtime_hours,
        overtime_days,
        entitlement_days,
        entitlement_hours,
        audit_steps,
    })
}
