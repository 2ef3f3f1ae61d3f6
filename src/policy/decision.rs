//! The recompute decision table.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::Identifier;
use crate::models::{MutationEvent, Operation, RowChange, Shift, StaffMember};

/// A request to recompute one staff member's entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalcRequest {
    /// The staff member.
    pub staff_id: Identifier,
    /// The staff member's name.
    pub staff_name: String,
    /// Employment end to use instead of the persisted one.
    pub employment_end_override: Option<NaiveDate>,
}

/// Why an event did not trigger a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A fixed-hours shift edit that cannot change overtime accrual.
    NoOvertimeEffect,
    /// A staff update that left contracted hours and employment dates alone.
    TermsUnchanged,
    /// The staff row was deleted.
    StaffDeleted,
    /// The event carried no usable image.
    MissingImage,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoOvertimeEffect => "shift change does not affect overtime",
            Self::TermsUnchanged => "contracted hours and employment dates unchanged",
            Self::StaffDeleted => "staff deleted",
            Self::MissingImage => "event has no row image",
        };
        f.write_str(reason)
    }
}

/// The outcome of evaluating a mutation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Recompute the entitlement.
    Recompute(RecalcRequest),
    /// Leave the entitlement as it is.
    Skip {
        /// Why nothing happens.
        reason: SkipReason,
    },
}

impl Decision {
    fn skip(reason: SkipReason) -> Self {
        Self::Skip { reason }
    }

    /// Returns true for [`Decision::Recompute`].
    pub fn is_recompute(&self) -> bool {
        matches!(self, Self::Recompute(_))
    }
}

/// Decides whether `event` requires recomputing `staff`'s entitlement.
///
/// `staff` is the current staff record the event belongs to; for shift
/// events it selects between the zero-hours and fixed-hours rules.
///
/// # Example
///
/// ```
/// use holiday_ledger::identity::IdentityGenerator;
/// use holiday_ledger::models::{AccrualYear, MutationEvent, NewShift, RowChange, Shift, ShiftType, StaffMember};
/// use holiday_ledger::policy::evaluate;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let generator = IdentityGenerator::default();
/// let bob = StaffMember::new(&generator, "Bob", Some(Decimal::new(375, 1)), None, None);
/// let year = AccrualYear::starting(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
/// let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let shift = Shift::from_new(&generator, &year, NewShift {
///     staff_name: "Bob".to_string(),
///     start_time: start,
///     end_time: start + chrono::Duration::hours(8),
///     overtime: false,
///     shift_type: ShiftType::Ordinary,
/// });
///
/// let event = MutationEvent::shift(RowChange::inserted(shift));
/// assert!(!evaluate(&event, &bob).is_recompute());
/// ```
pub fn evaluate(event: &MutationEvent, staff: &StaffMember) -> Decision {
    match event {
        MutationEvent::Shift { change } => evaluate_shift(change, staff),
        MutationEvent::Staff {
            change,
            employment_end_override,
        } => evaluate_staff(change, *employment_end_override),
    }
}

fn request(staff: &StaffMember, employment_end_override: Option<NaiveDate>) -> Decision {
    Decision::Recompute(RecalcRequest {
        staff_id: staff.id,
        staff_name: staff.name.clone(),
        employment_end_override,
    })
}

fn evaluate_shift(change: &RowChange<Shift>, staff: &StaffMember) -> Decision {
    if staff.is_zero_hours() {
        return request(staff, None);
    }

    let affects_overtime = match (change.operation, &change.before, &change.after) {
        (Operation::Insert, _, Some(after)) => after.overtime,
        (Operation::Delete, Some(before), _) => before.overtime,
        (Operation::Update, Some(before), Some(after)) => {
            before.overtime != after.overtime
                || (after.overtime
                    && (before.start_time != after.start_time
                        || before.end_time != after.end_time
                        || before.shift_type != after.shift_type))
        }
        _ => return Decision::skip(SkipReason::MissingImage),
    };

    if affects_overtime {
        request(staff, None)
    } else {
        Decision::skip(SkipReason::NoOvertimeEffect)
    }
}

fn evaluate_staff(
    change: &RowChange<StaffMember>,
    employment_end_override: Option<NaiveDate>,
) -> Decision {
    match (change.operation, &change.before, &change.after) {
        (Operation::Delete, _, _) => Decision::skip(SkipReason::StaffDeleted),
        (Operation::Insert, _, Some(after)) => request(after, employment_end_override),
        (Operation::Update, Some(before), Some(after)) => {
            let hours_changed = before.contracted_hours != after.contracted_hours;
            let start_changed = before.employment_start != after.employment_start;
            let end_changed = before.employment_end != after.employment_end;

            if !(hours_changed || start_changed || end_changed) && employment_end_override.is_none() {
                return Decision::skip(SkipReason::TermsUnchanged);
            }

            let override_end = employment_end_override.or(if end_changed {
                after.employment_end
            } else {
                None
            });
            request(after, override_end)
        }
        _ => Decision::skip(SkipReason::MissingImage),
    }
}
