//! Write requests accepted by the store and what they return.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dispatch::RecalculationReport;
use crate::error::{EngineError, EngineResult};
use crate::identity::IdentityNamespace;

/// A staff member to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStaff {
    /// Staff name, the natural key.
    pub name: String,
    /// Contracted weekly hours; absent or zero means zero-hours.
    #[serde(default)]
    pub contracted_hours: Option<Decimal>,
    /// First day of employment.
    #[serde(default)]
    pub employment_start: Option<NaiveDate>,
    /// Last day of employment.
    #[serde(default)]
    pub employment_end: Option<NaiveDate>,
}

impl NewStaff {
    /// Rejects blank names and negative hours.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidStaff {
                field: "name".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        validate_hours(self.contracted_hours)
    }
}

pub(crate) fn validate_hours(hours: Option<Decimal>) -> EngineResult<()> {
    match hours {
        Some(h) if h < Decimal::ZERO => Err(EngineError::InvalidStaff {
            field: "contracted_hours".to_string(),
            message: format!("{h} is negative"),
        }),
        _ => Ok(()),
    }
}

/// A change to a staff member's terms.
///
/// Outer `None` leaves a field alone; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermsUpdate {
    /// New contracted hours.
    pub contracted_hours: Option<Option<Decimal>>,
    /// New employment start.
    pub employment_start: Option<Option<NaiveDate>>,
    /// New employment end.
    pub employment_end: Option<Option<NaiveDate>>,
    /// Employment end to use for this recompute even if not persisted.
    pub employment_end_override: Option<NaiveDate>,
    /// When the change takes effect; defaults to now.
    pub effective_at: Option<NaiveDateTime>,
}

/// A written record and the recompute it triggered, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome<T> {
    /// The record as written (or as it was, for deletes).
    pub record: T,
    /// The entitlement recompute performed in the same transaction.
    pub recalculation: Option<RecalculationReport>,
}

/// Rows re-keyed by a namespace migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// The namespace the store used before.
    pub from: IdentityNamespace,
    /// The namespace the store uses now.
    pub to: IdentityNamespace,
    /// Staff rows re-keyed.
    pub staff: usize,
    /// Accrual-year rows re-keyed.
    pub accrual_years: usize,
    /// Shift rows re-keyed.
    pub shifts: usize,
    /// Change-of-terms rows re-keyed.
    pub changes_of_terms: usize,
    /// Entitlement rows re-keyed.
    pub entitlements: usize,
}
