//! Core data models for the holiday ledger.
//!
//! This module contains all the domain records the ledger stores and the
//! events the record store emits when they change.

mod accrual_year;
mod change_of_terms;
mod entitlement;
mod event;
mod shift;
mod staff;

pub use accrual_year::{AccrualYear, AccrualYearResolver, AnniversaryYear, FixedYear};
pub use change_of_terms::{CONTRACTED_HOURS_FIELD, ChangeHistory, ChangeKind, ChangeOfTerms};
pub use entitlement::{AuditStep, EntitlementRecord};
pub use event::{MutationEvent, Operation, RowChange};
pub use shift::{NewShift, Shift, ShiftType};
pub use staff::{ContractKind, EmploymentWindow, StaffMember};
