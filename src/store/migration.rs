//! Re-keying every row under a new identity namespace.
//!
//! Parent rows are re-keyed first; `ON UPDATE CASCADE` carries the new
//! staff and accrual-year ids into child rows, whose own ids are then
//! derived from the cascaded values.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};

use crate::error::EngineResult;
use crate::identity::{IdentityGenerator, Identifier};
use crate::models::{ChangeKind, ShiftType};

use super::rows::db_error;

/// Number of rows whose identifier changed, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RekeyCounts {
    pub staff: usize,
    pub accrual_years: usize,
    pub shifts: usize,
    pub changes_of_terms: usize,
    pub entitlements: usize,
}

/// Re-derives every identifier with `target`. Must run inside a transaction.
pub(crate) fn rekey(conn: &Connection, target: &IdentityGenerator) -> EngineResult<RekeyCounts> {
    let staff = collect(conn, "SELECT id, name FROM staff", |row| {
        let name: String = row.get(1)?;
        Ok((row.get::<_, Identifier>(0)?, target.staff_id(&name)))
    })?;
    let staff = apply(conn, "UPDATE staff SET id = ?2 WHERE id = ?1", &staff)?;

    let years = collect(conn, "SELECT id, start_date, end_date FROM accrual_years", |row| {
        let start: NaiveDate = row.get(1)?;
        let end: NaiveDate = row.get(2)?;
        Ok((row.get::<_, Identifier>(0)?, target.accrual_year_id(start, end)))
    })?;
    let accrual_years = apply(conn, "UPDATE accrual_years SET id = ?2 WHERE id = ?1", &years)?;

    let shifts = collect(
        conn,
        "SELECT id, accrual_year_id, staff_name, start_time, shift_type FROM shifts",
        |row| {
            let year_id: Identifier = row.get(1)?;
            let staff_name: String = row.get(2)?;
            let start: NaiveDateTime = row.get(3)?;
            let shift_type: ShiftType = row.get(4)?;
            Ok((
                row.get::<_, Identifier>(0)?,
                target.shift_id(year_id, &staff_name, start, shift_type.tag()),
            ))
        },
    )?;
    let shifts = apply(conn, "UPDATE shifts SET id = ?2 WHERE id = ?1", &shifts)?;

    let changes = collect(
        conn,
        "SELECT id, staff_id, kind, field, changed_at FROM change_of_terms",
        |row| {
            let staff_id: Identifier = row.get(1)?;
            let kind: ChangeKind = row.get(2)?;
            let field: String = row.get(3)?;
            let changed_at: NaiveDateTime = row.get(4)?;
            Ok((
                row.get::<_, Identifier>(0)?,
                target.change_of_terms_id(staff_id, kind.tag(), &field, changed_at),
            ))
        },
    )?;
    let changes_of_terms = apply(conn, "UPDATE change_of_terms SET id = ?2 WHERE id = ?1", &changes)?;

    let entitlements = collect(conn, "SELECT id, staff_id, year_start FROM entitlements", |row| {
        let staff_id: Identifier = row.get(1)?;
        let year_start: NaiveDate = row.get(2)?;
        Ok((row.get::<_, Identifier>(0)?, target.entitlement_id(staff_id, year_start)))
    })?;
    let entitlements = apply(conn, "UPDATE entitlements SET id = ?2 WHERE id = ?1", &entitlements)?;

    Ok(RekeyCounts {
        staff,
        accrual_years,
        shifts,
        changes_of_terms,
        entitlements,
    })
}

fn collect<F>(conn: &Connection, sql: &str, map: F) -> EngineResult<Vec<(Identifier, Identifier)>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<(Identifier, Identifier)>,
{
    let mut stmt = conn.prepare(sql).map_err(db_error)?;
    let rows = stmt.query_map([], map).map_err(db_error)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_error)
}

fn apply(conn: &Connection, sql: &str, pairs: &[(Identifier, Identifier)]) -> EngineResult<usize> {
    let mut stmt = conn.prepare(sql).map_err(db_error)?;
    let mut changed = 0;
    for (old, new) in pairs.iter().filter(|(old, new)| old != new) {
        stmt.execute(params![old, new]).map_err(db_error)?;
        changed += 1;
    }
    Ok(changed)
}
