//! Statutory accrual rates.
//!
//! This module holds the constants behind the entitlement formulas and the
//! [`AccrualRates`] bundle that configuration can override.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Holiday accrued per hour worked on a zero-hours contract.
///
/// 12.07% is 5.6 weeks of leave over the 46.4 weeks left to work.
pub const DEFAULT_ZERO_HOURS_ACCRUAL_RATE: Decimal = Decimal::from_parts(1207, 0, 0, false, 4);

/// The organisation's hours-per-day convention for converting hours to days.
pub const DEFAULT_HOURS_PER_DAY: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Statutory weeks of leave per year.
pub const DEFAULT_STATUTORY_WEEKS: Decimal = Decimal::from_parts(56, 0, 0, false, 1);

/// Rates used by the entitlement calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualRates {
    /// Fraction of each worked hour accrued as holiday (zero-hours regime).
    #[serde(default = "default_accrual_rate")]
    pub zero_hours_accrual_rate: Decimal,
    /// Hours in one day of entitlement.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: Decimal,
    /// Weeks of statutory leave per full year (fixed-hours regime).
    #[serde(default = "default_statutory_weeks")]
    pub statutory_weeks: Decimal,
}

fn default_accrual_rate() -> Decimal {
    DEFAULT_ZERO_HOURS_ACCRUAL_RATE
}

fn default_hours_per_day() -> Decimal {
    DEFAULT_HOURS_PER_DAY
}

fn default_statutory_weeks() -> Decimal {
    DEFAULT_STATUTORY_WEEKS
}

impl Default for AccrualRates {
    fn default() -> Self {
        Self {
            zero_hours_accrual_rate: DEFAULT_ZERO_HOURS_ACCRUAL_RATE,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            statutory_weeks: DEFAULT_STATUTORY_WEEKS,
        }
    }
}

impl AccrualRates {
    /// Rejects rates that would divide by zero or produce negative entitlement.
    pub fn validate(&self) -> EngineResult<()> {
        if self.hours_per_day <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                field: "rates.hours_per_day".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.zero_hours_accrual_rate < Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                field: "rates.zero_hours_accrual_rate".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if self.statutory_weeks < Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                field: "rates.statutory_weeks".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Converts entitlement hours to days.
    pub fn hours_to_days(&self, hours: Decimal) -> Decimal {
        hours / self.hours_per_day
    }
}
