//! Deterministic identity for ledger records.
//!
//! This module maps natural keys to stable 128-bit identifiers so that
//! independently operated replicas converge on identical primary keys
//! without coordination.
//!
//! # Example
//!
//! ```
//! use holiday_ledger::identity::{IdentityGenerator, IdentityNamespace};
//!
//! let generator = IdentityGenerator::new(IdentityNamespace::V1);
//! assert_eq!(generator.staff_id("Alice"), generator.staff_id("Alice"));
//! assert_ne!(generator.staff_id("Alice"), generator.staff_id("Bob"));
//! ```

mod generator;
mod namespace;

pub use generator::{
    EntityType, IdentityGenerator, Identifier, KEY_DATE_FORMAT, KEY_TIMESTAMP_FORMAT, KeyField,
    NaturalKey, identify,
};
pub use namespace::{DEFAULT_NAMESPACE_UUID, IdentityNamespace, NamespaceMigration};
