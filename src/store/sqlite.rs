//! The SQLite-backed record store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, warn};

use crate::calculation::AccrualRates;
use crate::config::{LedgerConfig, StoreConfig};
use crate::dispatch::{EventDispatcher, RecalculationReport};
use crate::error::{EngineError, EngineResult};
use crate::identity::{IdentityGenerator, IdentityNamespace, Identifier, NamespaceMigration};
use crate::models::{
    AccrualYear, AccrualYearResolver, ChangeKind, ChangeOfTerms, EntitlementRecord, MutationEvent,
    NewShift, RowChange, Shift, StaffMember,
};
use crate::policy::RecalcRequest;

use super::ledger::SqliteLedger;
use super::migration;
use super::requests::{MigrationReport, NewStaff, TermsUpdate, WriteOutcome, validate_hours};
use super::rows::db_error;
use super::schema;

/// Base delay between conflicting attempts; attempt `n` waits `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Field names recorded for employment-date changes.
const EMPLOYMENT_START_FIELD: &str = "employment_start";
const EMPLOYMENT_END_FIELD: &str = "employment_end";

/// Runs `work` inside an `IMMEDIATE` transaction, committing on success.
///
/// Any error drops the transaction, rolling back everything `work` wrote.
fn run_immediate<R>(
    conn: &mut Connection,
    work: impl FnOnce(&Connection) -> EngineResult<R>,
) -> EngineResult<R> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(db_error)?;
    let value = work(&tx)?;
    tx.commit().map_err(db_error)?;
    Ok(value)
}

/// The ledger's record store.
///
/// Every write runs in one `IMMEDIATE` transaction together with the
/// entitlement recompute it triggers, so the entitlement row is never stale
/// relative to committed staff and shift data.
///
/// # Example
///
/// ```
/// use holiday_ledger::config::LedgerConfig;
/// use holiday_ledger::store::{NewStaff, SqliteStore};
/// use rust_decimal::Decimal;
///
/// let store = SqliteStore::open_in_memory(&LedgerConfig::default()).unwrap();
/// let written = store
///     .create_staff(NewStaff {
///         name: "Bob".to_string(),
///         contracted_hours: Some(Decimal::new(375, 1)),
///         employment_start: None,
///         employment_end: None,
///     })
///     .unwrap();
///
/// let report = written.recalculation.unwrap();
/// assert_eq!(report.record.entitlement_days, Decimal::new(175, 1));
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    generator: IdentityGenerator,
    resolver: Arc<dyn AccrualYearResolver>,
    rates: AccrualRates,
    config: StoreConfig,
}

impl SqliteStore {
    /// Opens (or creates) a store file.
    ///
    /// # Errors
    ///
    /// `NamespaceMismatch` if the file was created under a different
    /// identity namespace than `config` carries.
    pub fn open<P: AsRef<Path>>(path: P, config: &LedgerConfig) -> EngineResult<Self> {
        let conn = Connection::open(path).map_err(db_error)?;
        Self::from_connection(conn, config)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(config: &LedgerConfig) -> EngineResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::from_connection(conn, config)
    }

    fn from_connection(mut conn: Connection, config: &LedgerConfig) -> EngineResult<Self> {
        schema::apply_pragmas(&conn, config.store())?;
        schema::initialize(&mut conn, config.namespace())?;
        Ok(Self {
            conn: Mutex::new(conn),
            generator: IdentityGenerator::new(config.namespace()),
            resolver: config.accrual().accrual_year.resolver(),
            rates: *config.rates(),
            config: *config.store(),
        })
    }

    /// Replaces the accrual-year resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn AccrualYearResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// The namespace identifiers are derived under.
    pub fn namespace(&self) -> IdentityNamespace {
        self.generator.namespace()
    }

    /// The identity generator bound to this store's namespace.
    pub fn generator(&self) -> &IdentityGenerator {
        &self.generator
    }

    /// The currently active accrual year.
    pub fn current_year(&self) -> AccrualYear {
        self.resolver.current()
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| EngineError::Storage {
            message: "connection mutex poisoned".to_string(),
        })
    }

    fn read<R>(&self, work: impl FnOnce(&SqliteLedger<'_>) -> EngineResult<R>) -> EngineResult<R> {
        let conn = self.lock()?;
        work(&SqliteLedger::new(&conn, &self.generator))
    }

    /// Runs `work` in a write transaction, retrying on lock contention.
    fn write<R>(
        &self,
        operation: &'static str,
        mut work: impl FnMut(&SqliteLedger<'_>, &EventDispatcher<'_>) -> EngineResult<R>,
    ) -> EngineResult<R> {
        let dispatcher = EventDispatcher::new(&self.generator, self.resolver.as_ref(), &self.rates);
        let attempts = self.config.max_conflict_retries;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = {
                let mut conn = self.lock()?;
                run_immediate(&mut conn, |tx| {
                    work(&SqliteLedger::new(tx, &self.generator), &dispatcher)
                })
            };

            match result {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(operation, attempt, error = %err, "Write conflicted, retrying");
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(err) if err.is_retryable() => {
                    warn!(operation, attempts, error = %err, "Write abandoned after conflicts");
                    return Err(EngineError::RetriesExhausted { attempts });
                }
                other => return other,
            }
        }
    }

    // ==========================================================================
    // Reads
    // ==========================================================================

    /// Looks up a staff member by name.
    pub fn staff(&self, name: &str) -> EngineResult<Option<StaffMember>> {
        self.read(|ledger| ledger.staff_by_name(name))
    }

    /// Lists every staff member, ordered by name.
    pub fn all_staff(&self) -> EngineResult<Vec<StaffMember>> {
        self.read(|ledger| ledger.all_staff())
    }

    /// Looks up a shift by identifier.
    pub fn shift(&self, shift_id: Identifier) -> EngineResult<Option<Shift>> {
        self.read(|ledger| ledger.shift_by_id(shift_id))
    }

    /// The staff member's entitlement row for the current accrual year.
    ///
    /// # Errors
    ///
    /// `NotFound` if the staff member does not exist.
    pub fn entitlement(&self, name: &str) -> EngineResult<Option<EntitlementRecord>> {
        let year = self.resolver.current();
        self.read(|ledger| {
            let staff = ledger.require_staff(name)?;
            ledger.entitlement(staff.id, year.start)
        })
    }

    // ==========================================================================
    // Staff writes
    // ==========================================================================

    /// Creates a staff member and computes their first entitlement.
    ///
    /// # Errors
    ///
    /// `InvalidStaff` for a blank or duplicate name or negative hours.
    pub fn create_staff(&self, new: NewStaff) -> EngineResult<WriteOutcome<StaffMember>> {
        new.validate()?;
        self.write("create_staff", |ledger, dispatcher| {
            if ledger.staff_by_name(&new.name)?.is_some() {
                return Err(EngineError::InvalidStaff {
                    field: "name".to_string(),
                    message: format!("'{}' already exists", new.name),
                });
            }

            let staff = StaffMember::new(
                ledger.generator(),
                new.name.clone(),
                new.contracted_hours,
                new.employment_start,
                new.employment_end,
            );
            ledger.insert_staff(&staff)?;

            let event = MutationEvent::staff(RowChange::inserted(staff.clone()), None);
            let recalculation = dispatcher.dispatch(ledger, &event)?;
            info!(staff = %staff.name, staff_id = %staff.id, "Staff created");
            Ok(WriteOutcome {
                record: staff,
                recalculation,
            })
        })
    }

    /// Changes contracted hours and/or employment dates.
    ///
    /// Each changed field is recorded as a change of terms at
    /// `update.effective_at` (default: now) before the recompute runs.
    ///
    /// # Errors
    ///
    /// `NotFound` if the staff member does not exist; `InvalidStaff` for
    /// negative hours.
    pub fn update_staff_terms(
        &self,
        name: &str,
        update: TermsUpdate,
    ) -> EngineResult<WriteOutcome<StaffMember>> {
        if let Some(hours) = update.contracted_hours {
            validate_hours(hours)?;
        }
        let effective_at = update
            .effective_at
            .unwrap_or_else(|| Utc::now().naive_utc());

        self.write("update_staff_terms", |ledger, dispatcher| {
            let before = ledger.require_staff(name)?;
            let mut after = before.clone();
            if let Some(hours) = update.contracted_hours {
                after.contracted_hours = hours;
            }
            if let Some(start) = update.employment_start {
                after.employment_start = start;
            }
            if let Some(end) = update.employment_end {
                after.employment_end = end;
            }
            ledger.update_staff(&after)?;

            let generator = ledger.generator();
            if before.contracted_hours != after.contracted_hours {
                ledger.insert_change(&ChangeOfTerms::contracted_hours(generator, after.id, effective_at))?;
            }
            if before.employment_start != after.employment_start {
                ledger.insert_change(&ChangeOfTerms::new(
                    generator,
                    after.id,
                    ChangeKind::Employment,
                    EMPLOYMENT_START_FIELD,
                    effective_at,
                ))?;
            }
            if before.employment_end != after.employment_end {
                ledger.insert_change(&ChangeOfTerms::new(
                    generator,
                    after.id,
                    ChangeKind::Employment,
                    EMPLOYMENT_END_FIELD,
                    effective_at,
                ))?;
            }

            let event = MutationEvent::staff(
                RowChange::updated(before, after.clone()),
                update.employment_end_override,
            );
            let recalculation = dispatcher.dispatch(ledger, &event)?;
            Ok(WriteOutcome {
                record: after,
                recalculation,
            })
        })
    }

    /// Deletes a staff member with their shifts, changes and entitlements.
    pub fn delete_staff(&self, name: &str) -> EngineResult<WriteOutcome<StaffMember>> {
        self.write("delete_staff", |ledger, dispatcher| {
            let before = ledger.require_staff(name)?;
            ledger.delete_staff(before.id)?;
            let event = MutationEvent::staff(RowChange::deleted(before.clone()), None);
            let recalculation = dispatcher.dispatch(ledger, &event)?;
            info!(staff = %before.name, "Staff deleted");
            Ok(WriteOutcome {
                record: before,
                recalculation,
            })
        })
    }

    /// Records a change of terms without recomputing.
    ///
    /// Recording the same change twice is a no-op. Call
    /// [`recalculate`](Self::recalculate) afterwards to apply a new anchor.
    pub fn record_change_of_terms(
        &self,
        name: &str,
        kind: ChangeKind,
        field: &str,
        changed_at: NaiveDateTime,
    ) -> EngineResult<ChangeOfTerms> {
        self.write("record_change_of_terms", |ledger, _| {
            let staff = ledger.require_staff(name)?;
            let change = ChangeOfTerms::new(ledger.generator(), staff.id, kind, field, changed_at);
            ledger.insert_change(&change)?;
            Ok(change)
        })
    }

    // ==========================================================================
    // Shift writes
    // ==========================================================================

    /// Inserts a shift, or updates the shift with the same natural key.
    ///
    /// # Errors
    ///
    /// `NotFound` if the named staff member does not exist.
    pub fn upsert_shift(&self, new: NewShift) -> EngineResult<WriteOutcome<Shift>> {
        self.write("upsert_shift", |ledger, dispatcher| {
            ledger.require_staff(&new.staff_name)?;
            let year = self.resolver.year_containing(new.start_time.date());
            ledger.ensure_accrual_year(&year)?;

            let shift = Shift::from_new(ledger.generator(), &year, new.clone());
            let change = match ledger.shift_by_id(shift.id)? {
                Some(before) => {
                    ledger.update_shift_attributes(&shift)?;
                    RowChange::updated(before, shift.clone())
                }
                None => {
                    ledger.insert_shift(&shift)?;
                    RowChange::inserted(shift.clone())
                }
            };

            let recalculation = dispatcher.dispatch(ledger, &MutationEvent::shift(change))?;
            Ok(WriteOutcome {
                record: shift,
                recalculation,
            })
        })
    }

    /// Replaces an existing shift.
    ///
    /// Changing a natural-key field (staff, start, type) re-keys the row.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown shift or staff member; `InvalidShift` if
    /// the new natural key already belongs to another shift.
    pub fn update_shift(&self, shift_id: Identifier, new: NewShift) -> EngineResult<WriteOutcome<Shift>> {
        self.write("update_shift", |ledger, dispatcher| {
            let before = ledger
                .shift_by_id(shift_id)?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "shift".to_string(),
                    key: shift_id.to_string(),
                })?;
            ledger.require_staff(&new.staff_name)?;
            let year = self.resolver.year_containing(new.start_time.date());
            ledger.ensure_accrual_year(&year)?;
            let after = Shift::from_new(ledger.generator(), &year, new.clone());

            let events = if after.id == before.id {
                ledger.update_shift_attributes(&after)?;
                vec![MutationEvent::shift(RowChange::updated(before, after.clone()))]
            } else {
                if ledger.shift_by_id(after.id)?.is_some() {
                    return Err(EngineError::InvalidShift {
                        shift_id: after.id.to_string(),
                        message: "another shift already has this staff member, start and type"
                            .to_string(),
                    });
                }
                ledger.delete_shift(before.id)?;
                ledger.insert_shift(&after)?;
                if before.staff_id == after.staff_id {
                    vec![MutationEvent::shift(RowChange::updated(before, after.clone()))]
                } else {
                    vec![
                        MutationEvent::shift(RowChange::deleted(before)),
                        MutationEvent::shift(RowChange::inserted(after.clone())),
                    ]
                }
            };

            let mut recalculation = None;
            for event in &events {
                if let Some(report) = dispatcher.dispatch(ledger, event)? {
                    recalculation = Some(report);
                }
            }
            Ok(WriteOutcome {
                record: after,
                recalculation,
            })
        })
    }

    /// Deletes a shift.
    ///
    /// # Errors
    ///
    /// `NotFound` if the shift does not exist.
    pub fn delete_shift(&self, shift_id: Identifier) -> EngineResult<WriteOutcome<Shift>> {
        self.write("delete_shift", |ledger, dispatcher| {
            let before = ledger
                .shift_by_id(shift_id)?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "shift".to_string(),
                    key: shift_id.to_string(),
                })?;
            ledger.delete_shift(shift_id)?;
            let event = MutationEvent::shift(RowChange::deleted(before.clone()));
            let recalculation = dispatcher.dispatch(ledger, &event)?;
            Ok(WriteOutcome {
                record: before,
                recalculation,
            })
        })
    }

    // ==========================================================================
    // Recalculation and migration
    // ==========================================================================

    /// Forces a recompute of the staff member's current-year entitlement.
    ///
    /// Running it twice with no data change in between leaves the row
    /// untouched the second time.
    ///
    /// # Errors
    ///
    /// `NotFound` if the staff member does not exist; nothing is written.
    pub fn recalculate(
        &self,
        name: &str,
        employment_end_override: Option<chrono::NaiveDate>,
    ) -> EngineResult<RecalculationReport> {
        self.write("recalculate", |ledger, dispatcher| {
            let staff = ledger.require_staff(name)?;
            dispatcher.recalculate(
                ledger,
                &RecalcRequest {
                    staff_id: staff.id,
                    staff_name: staff.name,
                    employment_end_override,
                },
            )
        })
    }

    /// Re-keys every row under the plan's target namespace.
    ///
    /// Consumes the store and returns one bound to the new namespace.
    /// Configuration must be switched to the target namespace before the
    /// store is opened again.
    ///
    /// # Errors
    ///
    /// `InvalidNamespaceMigration` if the plan does not start from this
    /// store's namespace.
    pub fn migrate_namespace(self, plan: NamespaceMigration) -> EngineResult<(Self, MigrationReport)> {
        if plan.from() != self.generator.namespace() {
            return Err(EngineError::InvalidNamespaceMigration {
                message: format!(
                    "store uses namespace v{} but the plan starts from v{}",
                    self.generator.namespace().version(),
                    plan.from().version()
                ),
            });
        }

        let target = IdentityGenerator::new(plan.to());
        let counts = {
            let mut conn = self.lock()?;
            run_immediate(&mut conn, |tx| {
                let counts = migration::rekey(tx, &target)?;
                schema::write_namespace(tx, plan.to())?;
                Ok(counts)
            })?
        };

        let report = MigrationReport {
            from: plan.from(),
            to: plan.to(),
            staff: counts.staff,
            accrual_years: counts.accrual_years,
            shifts: counts.shifts,
            changes_of_terms: counts.changes_of_terms,
            entitlements: counts.entitlements,
        };
        info!(
            from_version = report.from.version(),
            to_version = report.to.version(),
            staff = report.staff,
            shifts = report.shifts,
            entitlements = report.entitlements,
            "Identity namespace migrated"
        );

        Ok((
            Self {
                generator: target,
                ..self
            },
            report,
        ))
    }
}
