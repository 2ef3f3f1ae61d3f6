//! Staff model and related types.
//!
//! This module defines the StaffMember struct and the ContractKind enum
//! used to select the entitlement regime for a member of staff.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityGenerator, Identifier};

/// The contract regime a staff member is employed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "hours")]
pub enum ContractKind {
    /// No guaranteed weekly hours; entitlement accrues from hours worked.
    ZeroHours,
    /// A fixed number of contracted hours per week.
    FixedHours(Decimal),
}

/// The employment bounds of a staff member. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentWindow {
    /// First day of employment, if known.
    pub start: Option<NaiveDate>,
    /// Last day of employment, if the staff member has left or is leaving.
    pub end: Option<NaiveDate>,
}

impl EmploymentWindow {
    /// Returns true if neither bound was supplied.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Represents a member of staff.
///
/// The staff name is the natural key; the identifier is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    /// Identifier derived from the staff name.
    pub id: Identifier,
    /// Staff name, assumed unique.
    pub name: String,
    /// Contracted hours per week. `None` and zero both mean zero-hours.
    pub contracted_hours: Option<Decimal>,
    /// The date the staff member started employment.
    pub employment_start: Option<NaiveDate>,
    /// The date employment ends, `None` while still employed.
    pub employment_end: Option<NaiveDate>,
}

impl StaffMember {
    /// Creates a staff member whose identifier is derived from `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use holiday_ledger::identity::IdentityGenerator;
    /// use holiday_ledger::models::StaffMember;
    /// use rust_decimal::Decimal;
    ///
    /// let generator = IdentityGenerator::default();
    /// let alice = StaffMember::new(&generator, "Alice", None, None, None);
    /// assert!(alice.is_zero_hours());
    ///
    /// let bob = StaffMember::new(&generator, "Bob", Some(Decimal::new(375, 1)), None, None);
    /// assert!(!bob.is_zero_hours());
    /// ```
    pub fn new(
        generator: &IdentityGenerator,
        name: impl Into<String>,
        contracted_hours: Option<Decimal>,
        employment_start: Option<NaiveDate>,
        employment_end: Option<NaiveDate>,
    ) -> Self {
        let name = name.into();
        Self {
            id: generator.staff_id(&name),
            name,
            contracted_hours,
            employment_start,
            employment_end,
        }
    }

    /// Returns the contract regime for this staff member.
    pub fn contract(&self) -> ContractKind {
        match self.contracted_hours {
            Some(hours) if hours > Decimal::ZERO => ContractKind::FixedHours(hours),
            _ => ContractKind::ZeroHours,
        }
    }

    /// Returns true if the staff member is on a zero-hours contract.
    pub fn is_zero_hours(&self) -> bool {
        self.contract() == ContractKind::ZeroHours
    }

    /// Returns the employment bounds.
    pub fn employment(&self) -> EmploymentWindow {
        EmploymentWindow {
            start: self.employment_start,
            end: self.employment_end,
        }
    }
}
