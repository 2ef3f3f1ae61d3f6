//! Holiday ledger with deterministic identity
//!
//! This crate derives stable identifiers for HR records from their natural
//! keys and keeps each staff member's statutory holiday entitlement current
//! as shifts, contracts and employment dates change.
//!
//! Zero-hours staff accrue a fixed fraction of hours worked; fixed-hours
//! staff receive the statutory allowance pro-rated from an anchor date plus
//! accrual on overtime.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod models;
pub mod policy;
pub mod store;
