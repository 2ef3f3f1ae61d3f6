//! Entitlement calculation for the holiday ledger.
//!
//! This module contains the two entitlement regimes (zero-hours accrual from
//! worked hours, and the statutory fixed-hours base plus overtime), the
//! effective-window and pro-rata arithmetic they share, and the
//! [`ShiftHistory`] query they read shifts through.

mod entitlement;
mod fixed_hours;
mod history;
mod rates;
mod statutory;
mod window;
mod zero_hours;

pub use entitlement::{EntitlementCalculation, calculate_entitlement};
pub use fixed_hours::{FixedEntitlement, calculate_fixed_entitlement};
pub use history::ShiftHistory;
pub use rates::{
    AccrualRates, DEFAULT_HOURS_PER_DAY, DEFAULT_STATUTORY_WEEKS, DEFAULT_ZERO_HOURS_ACCRUAL_RATE,
};
pub use statutory::{StatutoryEntitlement, statutory_entitlement};
pub use window::{DateWindow, pro_rata_factor};
pub use zero_hours::{ZeroHourEntitlement, calculate_zero_hour_entitlement};
