//! Error types for the holiday ledger.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while identifying records,
//! calculating entitlement, and writing to the record store.

use thiserror::Error;

/// The main error type for the holiday ledger.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use holiday_ledger::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "staff".to_string(),
///     key: "Alice".to_string(),
/// };
/// assert_eq!(error.to_string(), "staff not found: Alice");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value was outside its permitted range.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of record (e.g. "staff", "shift").
        entity: String,
        /// The key that failed to resolve.
        key: String,
    },

    /// A shift was invalid or contained inconsistent data.
    #[error("Invalid shift '{shift_id}': {message}")]
    InvalidShift {
        /// The ID (or natural key) of the invalid shift.
        shift_id: String,
        /// A description of what made the shift invalid.
        message: String,
    },

    /// A staff record was invalid or contained inconsistent data.
    #[error("Invalid staff field '{field}': {message}")]
    InvalidStaff {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A concurrent writer held the lock or won a race; the transaction can be retried.
    #[error("Concurrency conflict: {message}")]
    ConcurrencyConflict {
        /// Detail from the storage layer.
        message: String,
    },

    /// A transaction kept conflicting and was abandoned.
    #[error("Transaction abandoned after {attempts} conflicting attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// The store was created under a different identity namespace.
    #[error(
        "Identity namespace mismatch: store uses v{stored_version} ({stored}), configuration uses v{configured_version} ({configured})"
    )]
    NamespaceMismatch {
        /// Namespace version recorded in the store.
        stored_version: u32,
        /// Namespace uuid recorded in the store.
        stored: String,
        /// Namespace version from configuration.
        configured_version: u32,
        /// Namespace uuid from configuration.
        configured: String,
    },

    /// A namespace migration plan was rejected.
    #[error("Invalid namespace migration: {message}")]
    InvalidNamespaceMigration {
        /// Why the plan was rejected.
        message: String,
    },

    /// The underlying record store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a missing staff record.
    pub fn staff_not_found(key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "staff".to_string(),
            key: key.into(),
        }
    }

    /// Returns true if retrying the enclosing transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
