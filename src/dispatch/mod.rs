//! Change-notification dispatch.
//!
//! The record store hands every shift and staff write to an
//! [`EventDispatcher`] inside the same transaction. The dispatcher asks the
//! policy whether the write matters, recalculates, and upserts the
//! entitlement row through the [`LedgerTransaction`] it was given.

mod dispatcher;
mod transaction;

pub use dispatcher::{EventDispatcher, RecalculationReport};
pub use transaction::{LedgerTransaction, UpsertOutcome};
