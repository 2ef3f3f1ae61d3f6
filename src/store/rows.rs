//! Column codecs and row mappers.
//!
//! Identifiers are stored as hyphenated text, decimals as their exact string
//! form (scale preserved), dates and timestamps through rusqlite's chrono
//! support.

use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{ErrorCode, Row};
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::identity::Identifier;
use crate::models::{ChangeKind, ChangeOfTerms, EntitlementRecord, Shift, ShiftType, StaffMember};

impl ToSql for Identifier {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Identifier {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Identifier::from_str(value.as_str()?).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl ToSql for ShiftType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.tag()))
    }
}

impl FromSql for ShiftType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tag = value.as_str()?;
        ShiftType::from_tag(tag)
            .ok_or_else(|| FromSqlError::Other(format!("unknown shift type '{tag}'").into()))
    }
}

impl ToSql for ChangeKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.tag()))
    }
}

impl FromSql for ChangeKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tag = value.as_str()?;
        ChangeKind::from_tag(tag)
            .ok_or_else(|| FromSqlError::Other(format!("unknown change kind '{tag}'").into()))
    }
}

/// A decimal stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecimalText(pub Decimal);

impl ToSql for DecimalText {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for DecimalText {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Decimal::from_str(value.as_str()?)
            .map(DecimalText)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Maps a rusqlite error, classifying lock contention as retryable.
pub(crate) fn db_error(err: rusqlite::Error) -> EngineError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            EngineError::ConcurrencyConflict {
                message: err.to_string(),
            }
        }
        _ => EngineError::Storage {
            message: err.to_string(),
        },
    }
}

pub(crate) const STAFF_COLUMNS: &str =
    "id, name, contracted_hours, employment_start, employment_end";

pub(crate) fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<StaffMember> {
    Ok(StaffMember {
        id: row.get(0)?,
        name: row.get(1)?,
        contracted_hours: row.get::<_, Option<DecimalText>>(2)?.map(|d| d.0),
        employment_start: row.get(3)?,
        employment_end: row.get(4)?,
    })
}

pub(crate) const SHIFT_COLUMNS: &str =
    "id, accrual_year_id, staff_id, staff_name, start_time, end_time, overtime, shift_type";

pub(crate) fn shift_from_row(row: &Row<'_>) -> rusqlite::Result<Shift> {
    Ok(Shift {
        id: row.get(0)?,
        accrual_year_id: row.get(1)?,
        staff_id: row.get(2)?,
        staff_name: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        overtime: row.get(6)?,
        shift_type: row.get(7)?,
    })
}

pub(crate) const CHANGE_COLUMNS: &str = "id, staff_id, kind, field, changed_at";

pub(crate) fn change_from_row(row: &Row<'_>) -> rusqlite::Result<ChangeOfTerms> {
    Ok(ChangeOfTerms {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        kind: row.get(2)?,
        field: row.get(3)?,
        changed_at: row.get(4)?,
    })
}

pub(crate) const ENTITLEMENT_COLUMNS: &str = "id, staff_id, year_start, year_end, contracted_hours, \
     entitlement_days, entitlement_hours, zero_hours, updated_at";

pub(crate) fn entitlement_from_row(row: &Row<'_>) -> rusqlite::Result<EntitlementRecord> {
    Ok(EntitlementRecord {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        year_start: row.get(2)?,
        year_end: row.get(3)?,
        contracted_hours: row.get::<_, Option<DecimalText>>(4)?.map(|d| d.0),
        entitlement_days: row.get::<_, DecimalText>(5)?.0,
        entitlement_hours: row.get::<_, DecimalText>(6)?.0,
        zero_hours: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
