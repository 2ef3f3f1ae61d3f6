//! Row-level operations over one open connection or transaction.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, OptionalExtension, params};

use crate::calculation::{DateWindow, ShiftHistory};
use crate::dispatch::{LedgerTransaction, UpsertOutcome};
use crate::error::{EngineError, EngineResult};
use crate::identity::{IdentityGenerator, Identifier};
use crate::models::{
    AccrualYear, CONTRACTED_HOURS_FIELD, ChangeHistory, ChangeOfTerms, EntitlementRecord, Shift,
    StaffMember,
};

use super::rows::{
    CHANGE_COLUMNS, DecimalText, ENTITLEMENT_COLUMNS, SHIFT_COLUMNS, STAFF_COLUMNS,
    change_from_row, db_error, entitlement_from_row, shift_from_row, staff_from_row,
};

/// A view of the ledger tables through one connection.
///
/// Writers construct it over an `IMMEDIATE` transaction so every statement
/// runs under the write lock.
pub(crate) struct SqliteLedger<'c> {
    conn: &'c Connection,
    generator: &'c IdentityGenerator,
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Timestamp bounds `[start, end)` covering the window's whole days.
fn window_bounds(window: &DateWindow) -> (NaiveDateTime, NaiveDateTime) {
    let upper = window.end.succ_opt().unwrap_or(NaiveDate::MAX);
    (day_start(window.start), day_start(upper))
}

impl<'c> SqliteLedger<'c> {
    pub(crate) fn new(conn: &'c Connection, generator: &'c IdentityGenerator) -> Self {
        Self { conn, generator }
    }

    pub(crate) fn generator(&self) -> &IdentityGenerator {
        self.generator
    }

    // ==========================================================================
    // Staff
    // ==========================================================================

    pub(crate) fn staff_by_name(&self, name: &str) -> EngineResult<Option<StaffMember>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE name = ?1"))
            .map_err(db_error)?;
        stmt.query_row(params![name], staff_from_row)
            .optional()
            .map_err(db_error)
    }

    pub(crate) fn require_staff(&self, name: &str) -> EngineResult<StaffMember> {
        self.staff_by_name(name)?
            .ok_or_else(|| EngineError::staff_not_found(name))
    }

    pub(crate) fn insert_staff(&self, staff: &StaffMember) -> EngineResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO staff (id, name, contracted_hours, employment_start, employment_end) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    staff.id,
                    staff.name,
                    staff.contracted_hours.map(DecimalText),
                    staff.employment_start,
                    staff.employment_end,
                ])
            })
            .map_err(db_error)?;
        Ok(())
    }

    pub(crate) fn update_staff(&self, staff: &StaffMember) -> EngineResult<()> {
        self.conn
            .prepare_cached(
                "UPDATE staff SET contracted_hours = ?2, employment_start = ?3, employment_end = ?4 \
                 WHERE id = ?1",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    staff.id,
                    staff.contracted_hours.map(DecimalText),
                    staff.employment_start,
                    staff.employment_end,
                ])
            })
            .map_err(db_error)?;
        Ok(())
    }

    pub(crate) fn delete_staff(&self, staff_id: Identifier) -> EngineResult<()> {
        self.conn
            .execute("DELETE FROM staff WHERE id = ?1", params![staff_id])
            .map_err(db_error)?;
        Ok(())
    }

    pub(crate) fn all_staff(&self) -> EngineResult<Vec<StaffMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY name"))
            .map_err(db_error)?;
        let rows = stmt.query_map([], staff_from_row).map_err(db_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_error)
    }

    // ==========================================================================
    // Accrual years and shifts
    // ==========================================================================

    pub(crate) fn ensure_accrual_year(&self, year: &AccrualYear) -> EngineResult<Identifier> {
        let id = year.id(self.generator);
        self.conn
            .prepare_cached(
                "INSERT INTO accrual_years (id, start_date, end_date) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(id) DO NOTHING",
            )
            .and_then(|mut stmt| stmt.execute(params![id, year.start, year.end]))
            .map_err(db_error)?;
        Ok(id)
    }

    pub(crate) fn shift_by_id(&self, shift_id: Identifier) -> EngineResult<Option<Shift>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"))
            .map_err(db_error)?;
        stmt.query_row(params![shift_id], shift_from_row)
            .optional()
            .map_err(db_error)
    }

    pub(crate) fn insert_shift(&self, shift: &Shift) -> EngineResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO shifts (id, accrual_year_id, staff_id, staff_name, start_time, \
                 end_time, overtime, shift_type) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    shift.id,
                    shift.accrual_year_id,
                    shift.staff_id,
                    shift.staff_name,
                    shift.start_time,
                    shift.end_time,
                    shift.overtime,
                    shift.shift_type,
                ])
            })
            .map_err(db_error)?;
        Ok(())
    }

    /// Overwrites the non-key attributes of an existing shift.
    pub(crate) fn update_shift_attributes(&self, shift: &Shift) -> EngineResult<()> {
        self.conn
            .prepare_cached("UPDATE shifts SET end_time = ?2, overtime = ?3 WHERE id = ?1")
            .and_then(|mut stmt| stmt.execute(params![shift.id, shift.end_time, shift.overtime]))
            .map_err(db_error)?;
        Ok(())
    }

    pub(crate) fn delete_shift(&self, shift_id: Identifier) -> EngineResult<()> {
        self.conn
            .execute("DELETE FROM shifts WHERE id = ?1", params![shift_id])
            .map_err(db_error)?;
        Ok(())
    }

    // ==========================================================================
    // Change of terms
    // ==========================================================================

    /// Inserts a change record. Returns false if it was already present.
    pub(crate) fn insert_change(&self, change: &ChangeOfTerms) -> EngineResult<bool> {
        let inserted = self
            .conn
            .prepare_cached(
                "INSERT INTO change_of_terms (id, staff_id, kind, field, changed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(id) DO NOTHING",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    change.id,
                    change.staff_id,
                    change.kind,
                    change.field,
                    change.changed_at,
                ])
            })
            .map_err(db_error)?;
        Ok(inserted == 1)
    }

    // ==========================================================================
    // Entitlements
    // ==========================================================================

    pub(crate) fn entitlement(
        &self,
        staff_id: Identifier,
        year_start: NaiveDate,
    ) -> EngineResult<Option<EntitlementRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {ENTITLEMENT_COLUMNS} FROM entitlements WHERE staff_id = ?1 AND year_start = ?2"
            ))
            .map_err(db_error)?;
        stmt.query_row(params![staff_id, year_start], entitlement_from_row)
            .optional()
            .map_err(db_error)
    }
}

impl ShiftHistory for SqliteLedger<'_> {
    fn shifts_in_window(&self, staff_id: Identifier, window: &DateWindow) -> EngineResult<Vec<Shift>> {
        if self.staff_by_id(staff_id)?.is_none() {
            return Err(EngineError::staff_not_found(staff_id.to_string()));
        }
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let (lower, upper) = window_bounds(window);
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {SHIFT_COLUMNS} FROM shifts \
                 WHERE staff_id = ?1 AND start_time >= ?2 AND start_time < ?3 \
                 ORDER BY start_time, id"
            ))
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![staff_id, lower, upper], shift_from_row)
            .map_err(db_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_error)
    }
}

impl LedgerTransaction for SqliteLedger<'_> {
    fn staff_by_id(&self, staff_id: Identifier) -> EngineResult<Option<StaffMember>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"))
            .map_err(db_error)?;
        stmt.query_row(params![staff_id], staff_from_row)
            .optional()
            .map_err(db_error)
    }

    fn contract_changes(&self, staff_id: Identifier, year: &AccrualYear) -> EngineResult<ChangeHistory> {
        let (lower, upper) = window_bounds(&DateWindow::of_year(year));
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {CHANGE_COLUMNS} FROM change_of_terms \
                 WHERE staff_id = ?1 AND field = ?2 AND changed_at >= ?3 AND changed_at < ?4 \
                 ORDER BY changed_at ASC, id ASC"
            ))
            .map_err(db_error)?;
        let rows = stmt
            .query_map(
                params![staff_id, CONTRACTED_HOURS_FIELD, lower, upper],
                change_from_row,
            )
            .map_err(db_error)?;
        let changes = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_error)?;
        Ok(ChangeHistory::new(changes))
    }

    fn upsert_entitlement(
        &self,
        record: &EntitlementRecord,
    ) -> EngineResult<(UpsertOutcome, EntitlementRecord)> {
        let existing = self.entitlement(record.staff_id, record.year_start)?;
        if let Some(existing) = existing.as_ref().filter(|e| e.same_values(record)) {
            return Ok((UpsertOutcome::Unchanged, existing.clone()));
        }

        self.conn
            .prepare_cached(
                "INSERT INTO entitlements (id, staff_id, year_start, year_end, contracted_hours, \
                 entitlement_days, entitlement_hours, zero_hours, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(staff_id, year_start) DO UPDATE SET \
                 id = excluded.id, year_end = excluded.year_end, \
                 contracted_hours = excluded.contracted_hours, \
                 entitlement_days = excluded.entitlement_days, \
                 entitlement_hours = excluded.entitlement_hours, \
                 zero_hours = excluded.zero_hours, updated_at = excluded.updated_at",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    record.id,
                    record.staff_id,
                    record.year_start,
                    record.year_end,
                    record.contracted_hours.map(DecimalText),
                    DecimalText(record.entitlement_days),
                    DecimalText(record.entitlement_hours),
                    record.zero_hours,
                    record.updated_at,
                ])
            })
            .map_err(db_error)?;

        let outcome = if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        Ok((outcome, record.clone()))
    }
}
