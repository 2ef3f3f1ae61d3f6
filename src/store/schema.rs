//! Schema creation and the namespace guard.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{EngineError, EngineResult};
use crate::identity::IdentityNamespace;

use super::rows::db_error;

/// Current schema version recorded in `meta`.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS staff (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    contracted_hours TEXT,
    employment_start TEXT,
    employment_end TEXT
);
CREATE TABLE IF NOT EXISTS accrual_years (
    id TEXT PRIMARY KEY,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    UNIQUE (start_date, end_date)
);
CREATE TABLE IF NOT EXISTS shifts (
    id TEXT PRIMARY KEY,
    accrual_year_id TEXT NOT NULL
        REFERENCES accrual_years(id) ON UPDATE CASCADE DEFERRABLE INITIALLY DEFERRED,
    staff_id TEXT NOT NULL
        REFERENCES staff(id) ON DELETE CASCADE ON UPDATE CASCADE DEFERRABLE INITIALLY DEFERRED,
    staff_name TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    overtime INTEGER NOT NULL,
    shift_type TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_shifts_staff_start ON shifts (staff_id, start_time);
CREATE TABLE IF NOT EXISTS change_of_terms (
    id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL
        REFERENCES staff(id) ON DELETE CASCADE ON UPDATE CASCADE DEFERRABLE INITIALLY DEFERRED,
    kind TEXT NOT NULL,
    field TEXT NOT NULL,
    changed_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_change_of_terms_staff_time ON change_of_terms (staff_id, changed_at);
CREATE TABLE IF NOT EXISTS entitlements (
    id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL
        REFERENCES staff(id) ON DELETE CASCADE ON UPDATE CASCADE DEFERRABLE INITIALLY DEFERRED,
    year_start TEXT NOT NULL,
    year_end TEXT NOT NULL,
    contracted_hours TEXT,
    entitlement_days TEXT NOT NULL,
    entitlement_hours TEXT NOT NULL,
    zero_hours INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (staff_id, year_start)
);
";

/// Applies connection pragmas.
pub(crate) fn apply_pragmas(conn: &Connection, config: &StoreConfig) -> EngineResult<()> {
    conn.pragma_update(None, "foreign_keys", true).map_err(db_error)?;
    // In-memory databases report "memory" and keep it.
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(db_error)?;
    conn.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Creates missing tables and checks the stored namespace.
///
/// A fresh database adopts `namespace`. An existing one must already use it.
pub(crate) fn initialize(conn: &mut Connection, namespace: IdentityNamespace) -> EngineResult<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(db_error)?;
    tx.execute_batch(SCHEMA).map_err(db_error)?;

    match read_namespace(&tx)? {
        None => {
            write_meta(&tx, "schema_version", &SCHEMA_VERSION.to_string())?;
            write_namespace(&tx, namespace)?;
        }
        Some(stored) if stored == namespace => {}
        Some(stored) => {
            return Err(EngineError::NamespaceMismatch {
                stored_version: stored.version(),
                stored: stored.uuid().to_string(),
                configured_version: namespace.version(),
                configured: namespace.uuid().to_string(),
            });
        }
    }

    tx.commit().map_err(db_error)
}

/// Reads the namespace recorded in `meta`, if any.
pub(crate) fn read_namespace(conn: &Connection) -> EngineResult<Option<IdentityNamespace>> {
    let version = read_meta(conn, "namespace_version")?;
    let uuid = read_meta(conn, "namespace_uuid")?;
    let (Some(version), Some(uuid)) = (version, uuid) else {
        return Ok(None);
    };

    let version: u32 = version.parse().map_err(|_| EngineError::Storage {
        message: format!("corrupt namespace_version '{version}'"),
    })?;
    let uuid = Uuid::parse_str(&uuid).map_err(|_| EngineError::Storage {
        message: format!("corrupt namespace_uuid '{uuid}'"),
    })?;
    IdentityNamespace::new(version, uuid).map(Some)
}

/// Records `namespace` in `meta`.
pub(crate) fn write_namespace(conn: &Connection, namespace: IdentityNamespace) -> EngineResult<()> {
    write_meta(conn, "namespace_version", &namespace.version().to_string())?;
    write_meta(conn, "namespace_uuid", &namespace.uuid().to_string())
}

fn read_meta(conn: &Connection, key: &str) -> EngineResult<Option<String>> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(db_error)
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> EngineResult<()> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(db_error)?;
    Ok(())
}
