//! Configuration loading and management for the holiday ledger.
//!
//! This module provides functionality to load the identity namespace,
//! accrual-year rule, statutory rates and record-store settings from YAML
//! files.
//!
//! # Example
//!
//! ```no_run
//! use holiday_ledger::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Hours per day: {}", config.rates().hours_per_day);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AccrualConfig, AccrualYearConfig, IdentityConfig, LedgerConfig, StoreConfig};
