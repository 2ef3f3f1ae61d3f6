//! SQLite persistence for staff, shifts, changes of terms and entitlements.
//!
//! All writes go through [`SqliteStore`]. Each write and the recompute it
//! triggers share one transaction.

mod ledger;
mod migration;
mod requests;
mod rows;
mod schema;
mod sqlite;

pub use requests::{MigrationReport, NewStaff, TermsUpdate, WriteOutcome};
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;
