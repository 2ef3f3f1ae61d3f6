//! What the dispatcher needs from an open store transaction.

use serde::{Deserialize, Serialize};

use crate::calculation::ShiftHistory;
use crate::error::EngineResult;
use crate::identity::Identifier;
use crate::models::{AccrualYear, ChangeHistory, EntitlementRecord, StaffMember};

/// The result of writing an entitlement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No row existed for (staff, year start); one was created.
    Inserted,
    /// The existing row held different values and was overwritten.
    Updated,
    /// The existing row already held these values and was left alone.
    Unchanged,
}

/// Reads and writes available inside one record-store transaction.
///
/// Everything done through a `LedgerTransaction` commits or rolls back with
/// the write that triggered it.
pub trait LedgerTransaction: ShiftHistory {
    /// Looks up a staff member by identifier.
    fn staff_by_id(&self, staff_id: Identifier) -> EngineResult<Option<StaffMember>>;

    /// Contracted-hours changes for the staff member within `year`, earliest first.
    fn contract_changes(&self, staff_id: Identifier, year: &AccrualYear) -> EngineResult<ChangeHistory>;

    /// Writes the entitlement row keyed by (staff id, year start).
    ///
    /// Returns the outcome and the row as stored afterwards, which keeps its
    /// previous `updated_at` when the outcome is [`UpsertOutcome::Unchanged`].
    fn upsert_entitlement(
        &self,
        record: &EntitlementRecord,
    ) -> EngineResult<(UpsertOutcome, EntitlementRecord)>;
}
