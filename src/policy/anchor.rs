//! Pro-rata anchor selection.

use chrono::NaiveDate;

use crate::models::{AccrualYear, CONTRACTED_HOURS_FIELD, ChangeHistory, EmploymentWindow, StaffMember};

/// Picks the date pro-ration starts from.
///
/// The earliest contracted-hours change inside `year` wins. Otherwise the
/// later of employment start and year start is used, or `None` when the
/// staff member has no recorded start.
pub fn anchor(history: &ChangeHistory, staff: &StaffMember, year: &AccrualYear) -> Option<NaiveDate> {
    history
        .iter()
        .filter(|c| c.staff_id == staff.id && c.field == CONTRACTED_HOURS_FIELD)
        .map(|c| c.changed_at.date())
        .find(|d| year.contains_date(*d))
        .or_else(|| staff.employment_start.map(|start| start.max(year.start)))
}

/// The employment bounds handed to the calculators.
///
/// The anchor replaces the employment start; the override, when given,
/// replaces the persisted employment end.
pub fn effective_employment(
    history: &ChangeHistory,
    staff: &StaffMember,
    year: &AccrualYear,
    employment_end_override: Option<NaiveDate>,
) -> EmploymentWindow {
    EmploymentWindow {
        start: anchor(history, staff, year),
        end: employment_end_override.or(staff.employment_end),
    }
}
