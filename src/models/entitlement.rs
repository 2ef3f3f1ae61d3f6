//! Entitlement records and calculation audit steps.
//!
//! This module contains the persisted [`EntitlementRecord`] (one per staff
//! member per accrual year) and the [`AuditStep`] trail the calculators
//! leave behind.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityGenerator, Identifier};

/// Holiday entitlement for one staff member in one accrual year.
///
/// # Example
///
/// ```
/// use holiday_ledger::identity::IdentityGenerator;
/// use holiday_ledger::models::EntitlementRecord;
/// use chrono::{NaiveDate, Utc};
/// use rust_decimal::Decimal;
///
/// let generator = IdentityGenerator::default();
/// let record = EntitlementRecord::new(
///     &generator,
///     generator.staff_id("Bob"),
///     NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 4, 5).unwrap(),
///     Some(Decimal::new(375, 1)),
///     Decimal::new(175, 1),
///     Decimal::new(210, 0),
///     false,
///     Utc::now(),
/// );
/// assert_eq!(record.id, generator.entitlement_id(record.staff_id, record.year_start));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// Identifier derived from (staff id, year start).
    pub id: Identifier,
    /// The staff member.
    pub staff_id: Identifier,
    /// First day of the accrual year.
    pub year_start: NaiveDate,
    /// Last day of the accrual year.
    pub year_end: NaiveDate,
    /// Contracted hours at the time of calculation.
    pub contracted_hours: Option<Decimal>,
    /// Entitlement in days.
    pub entitlement_days: Decimal,
    /// Entitlement in hours.
    pub entitlement_hours: Decimal,
    /// Whether the zero-hours regime was used.
    pub zero_hours: bool,
    /// When the values last changed.
    pub updated_at: DateTime<Utc>,
}

impl EntitlementRecord {
    /// Creates a record, deriving its identifier.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: &IdentityGenerator,
        staff_id: Identifier,
        year_start: NaiveDate,
        year_end: NaiveDate,
        contracted_hours: Option<Decimal>,
        entitlement_days: Decimal,
        entitlement_hours: Decimal,
        zero_hours: bool,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generator.entitlement_id(staff_id, year_start),
            staff_id,
            year_start,
            year_end,
            contracted_hours,
            entitlement_days,
            entitlement_hours,
            zero_hours,
            updated_at,
        }
    }

    /// Returns true if both records carry the same computed values.
    ///
    /// `updated_at` is ignored. Decimals compare by value and scale, so a
    /// stored row only matches when it would serialise identically.
    pub fn same_values(&self, other: &Self) -> bool {
        self.id == other.id
            && self.staff_id == other.staff_id
            && self.year_start == other.year_start
            && self.year_end == other.year_end
            && same_decimal(self.contracted_hours, other.contracted_hours)
            && same_decimal(Some(self.entitlement_days), Some(other.entitlement_days))
            && same_decimal(Some(self.entitlement_hours), Some(other.entitlement_hours))
            && self.zero_hours == other.zero_hours
    }
}

fn same_decimal(a: Option<Decimal>, b: Option<Decimal>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b && a.scale() == b.scale(),
        (None, None) => true,
        _ => false,
    }
}

/// A single step in the audit trail recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The statutory or organisational basis for the rule.
    pub basis: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}
