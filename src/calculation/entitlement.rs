//! Regime selection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{AccrualYear, AuditStep, ContractKind, EmploymentWindow, StaffMember};

use super::{
    AccrualRates, FixedEntitlement, ShiftHistory, ZeroHourEntitlement, calculate_fixed_entitlement,
    calculate_zero_hour_entitlement,
};

/// The outcome of either entitlement regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum EntitlementCalculation {
    /// Calculated from hours worked.
    ZeroHours(ZeroHourEntitlement),
    /// Calculated from contracted hours plus overtime.
    FixedHours(FixedEntitlement),
}

impl EntitlementCalculation {
    /// Entitlement in days.
    pub fn days(&self) -> Decimal {
        match self {
            Self::ZeroHours(z) => z.entitlement_days,
            Self::FixedHours(f) => f.entitlement_days,
        }
    }

    /// Entitlement in hours.
    pub fn hours(&self) -> Decimal {
        match self {
            Self::ZeroHours(z) => z.entitlement_hours,
            Self::FixedHours(f) => f.entitlement_hours,
        }
    }

    /// Returns true if the zero-hours regime was used.
    pub fn is_zero_hours(&self) -> bool {
        matches!(self, Self::ZeroHours(_))
    }

    /// The audit trail of the calculation.
    pub fn audit_steps(&self) -> &[AuditStep] {
        match self {
            Self::ZeroHours(z) => &z.audit_steps,
            Self::FixedHours(f) => &f.audit_steps,
        }
    }
}

/// Calculates a staff member's entitlement, choosing the regime from their contract.
pub fn calculate_entitlement<H>(
    history: &H,
    staff: &StaffMember,
    year: &AccrualYear,
    employment: &EmploymentWindow,
    rates: &AccrualRates,
) -> EngineResult<EntitlementCalculation>
where
    H: ShiftHistory + ?Sized,
{
    match staff.contract() {
        ContractKind::ZeroHours => {
            calculate_zero_hour_entitlement(history, staff.id, year, employment, rates, 1)
                .map(EntitlementCalculation::ZeroHours)
        }
        ContractKind::FixedHours(hours) => {
            calculate_fixed_entitlement(history, staff.id, hours, employment, year, rates, 1)
                .map(EntitlementCalculation::FixedHours)
        }
    }
}
