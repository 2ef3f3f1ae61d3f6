//! Routes mutation events through the policy into a recompute.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculation::{AccrualRates, EntitlementCalculation, calculate_entitlement};
use crate::error::{EngineError, EngineResult};
use crate::identity::{IdentityGenerator, Identifier};
use crate::models::{
    AccrualYear, AccrualYearResolver, EmploymentWindow, EntitlementRecord, MutationEvent,
    StaffMember,
};
use crate::policy::{Decision, RecalcRequest, effective_employment, evaluate};

use super::{LedgerTransaction, UpsertOutcome};

/// Everything a recompute produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationReport {
    /// The staff member.
    pub staff_id: Identifier,
    /// The staff member's name.
    pub staff_name: String,
    /// The accrual year recomputed.
    pub year: AccrualYear,
    /// The employment bounds used (anchor and end).
    pub employment: EmploymentWindow,
    /// The regime result with its audit trail.
    pub calculation: EntitlementCalculation,
    /// The entitlement row as stored.
    pub record: EntitlementRecord,
    /// What the upsert did.
    pub outcome: UpsertOutcome,
}

/// Applies the recalculation policy to events raised inside a transaction.
pub struct EventDispatcher<'a> {
    generator: &'a IdentityGenerator,
    resolver: &'a dyn AccrualYearResolver,
    rates: &'a AccrualRates,
}

impl<'a> EventDispatcher<'a> {
    /// Creates a dispatcher.
    pub fn new(
        generator: &'a IdentityGenerator,
        resolver: &'a dyn AccrualYearResolver,
        rates: &'a AccrualRates,
    ) -> Self {
        Self {
            generator,
            resolver,
            rates,
        }
    }

    /// Evaluates `event` and recomputes if the policy says so.
    ///
    /// Returns `None` when the event was skipped.
    ///
    /// # Errors
    ///
    /// `NotFound` when a shift event names a staff member that does not
    /// exist; any storage error from `tx`. Either aborts the transaction.
    pub fn dispatch<T>(&self, tx: &T, event: &MutationEvent) -> EngineResult<Option<RecalculationReport>>
    where
        T: LedgerTransaction + ?Sized,
    {
        let staff = match event {
            MutationEvent::Shift { change } => {
                let Some(shift) = change.current() else {
                    debug!(entity = event.entity_name(), "Event without row image ignored");
                    return Ok(None);
                };
                tx.staff_by_id(shift.staff_id)?
                    .ok_or_else(|| EngineError::staff_not_found(shift.staff_name.clone()))?
            }
            MutationEvent::Staff { change, .. } => match change.current() {
                Some(staff) => staff.clone(),
                None => {
                    debug!(entity = event.entity_name(), "Event without row image ignored");
                    return Ok(None);
                }
            },
        };

        match evaluate(event, &staff) {
            Decision::Skip { reason } => {
                debug!(
                    entity = event.entity_name(),
                    staff = %staff.name,
                    %reason,
                    "Recalculation skipped"
                );
                Ok(None)
            }
            Decision::Recompute(request) => self.recalculate(tx, &request).map(Some),
        }
    }

    /// Recomputes and stores one staff member's entitlement for the current year.
    ///
    /// # Errors
    ///
    /// `NotFound` if the staff member does not exist. Nothing is written in
    /// that case.
    pub fn recalculate<T>(&self, tx: &T, request: &RecalcRequest) -> EngineResult<RecalculationReport>
    where
        T: LedgerTransaction + ?Sized,
    {
        let staff: StaffMember = tx
            .staff_by_id(request.staff_id)?
            .ok_or_else(|| EngineError::staff_not_found(request.staff_name.clone()))?;

        let year = self.resolver.current();
        let changes = tx.contract_changes(staff.id, &year)?;
        let employment = effective_employment(&changes, &staff, &year, request.employment_end_override);
        let calculation = calculate_entitlement(tx, &staff, &year, &employment, self.rates)?;

        let computed = EntitlementRecord::new(
            self.generator,
            staff.id,
            year.start,
            year.end,
            staff.contracted_hours,
            calculation.days(),
            calculation.hours(),
            calculation.is_zero_hours(),
            Utc::now(),
        );
        let (outcome, record) = tx.upsert_entitlement(&computed)?;

        info!(
            staff = %staff.name,
            staff_id = %staff.id,
            year_start = %year.start,
            entitlement_days = %record.entitlement_days,
            zero_hours = record.zero_hours,
            ?outcome,
            "Entitlement recalculated"
        );

        Ok(RecalculationReport {
            staff_id: staff.id,
            staff_name: staff.name,
            year,
            employment,
            calculation,
            record,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{DateWindow, ShiftHistory};
    use crate::models::{ChangeHistory, ChangeOfTerms, FixedYear, NewShift, RowChange, Shift, ShiftType};
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use std::cell::RefCell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year() -> AccrualYear {
        AccrualYear::starting(date(2025, 4, 6))
    }

    #[derive(Default)]
    struct MemoryLedger {
        staff: Vec<StaffMember>,
        shifts: Vec<Shift>,
        changes: Vec<ChangeOfTerms>,
        entitlements: RefCell<Vec<EntitlementRecord>>,
    }

    impl ShiftHistory for MemoryLedger {
        fn shifts_in_window(&self, staff_id: Identifier, window: &DateWindow) -> EngineResult<Vec<Shift>> {
            if !self.staff.iter().any(|s| s.id == staff_id) {
                return Err(EngineError::staff_not_found(staff_id.to_string()));
            }
            self.shifts.as_slice().shifts_in_window(staff_id, window)
        }
    }

    impl LedgerTransaction for MemoryLedger {
        fn staff_by_id(&self, staff_id: Identifier) -> EngineResult<Option<StaffMember>> {
            Ok(self.staff.iter().find(|s| s.id == staff_id).cloned())
        }

        fn contract_changes(&self, staff_id: Identifier, year: &AccrualYear) -> EngineResult<ChangeHistory> {
            Ok(ChangeHistory::new(
                self.changes
                    .iter()
                    .filter(|c| c.staff_id == staff_id && year.contains_date(c.changed_at.date()))
                    .cloned()
                    .collect(),
            ))
        }

        fn upsert_entitlement(
            &self,
            record: &EntitlementRecord,
        ) -> EngineResult<(UpsertOutcome, EntitlementRecord)> {
            let mut rows = self.entitlements.borrow_mut();
            match rows
                .iter_mut()
                .find(|r| r.staff_id == record.staff_id && r.year_start == record.year_start)
            {
                Some(existing) if existing.same_values(record) => {
                    Ok((UpsertOutcome::Unchanged, existing.clone()))
                }
                Some(existing) => {
                    *existing = record.clone();
                    Ok((UpsertOutcome::Updated, record.clone()))
                }
                None => {
                    rows.push(record.clone());
                    Ok((UpsertOutcome::Inserted, record.clone()))
                }
            }
        }
    }

    fn shift(generator: &IdentityGenerator, name: &str, on: NaiveDate, hours: i64, overtime: bool) -> Shift {
        let start = on.and_hms_opt(9, 0, 0).unwrap();
        Shift::from_new(
            generator,
            &year(),
            NewShift {
                staff_name: name.to_string(),
                start_time: start,
                end_time: start + Duration::hours(hours),
                overtime,
                shift_type: ShiftType::Ordinary,
            },
        )
    }

    #[test]
    fn test_zero_hours_shift_insert_recomputes() {
        let generator = IdentityGenerator::default();
        let resolver = FixedYear(year());
        let rates = AccrualRates::default();
        let dispatcher = EventDispatcher::new(&generator, &resolver, &rates);

        let alice = StaffMember::new(&generator, "Alice", None, None, None);
        let new_shift = shift(&generator, "Alice", date(2025, 5, 1), 12, false);
        let ledger = MemoryLedger {
            staff: vec![alice.clone()],
            shifts: vec![new_shift.clone()],
            ..MemoryLedger::default()
        };

        let report = dispatcher
            .dispatch(&ledger, &MutationEvent::shift(RowChange::inserted(new_shift)))
            .unwrap()
            .expect("zero-hours shift must recompute");

        assert_eq!(report.outcome, UpsertOutcome::Inserted);
        assert_eq!(report.record.entitlement_days, Decimal::new(1207, 4));
        assert!(report.record.zero_hours);
        assert_eq!(report.record.id, generator.entitlement_id(alice.id, year().start));
    }

    #[test]
    fn test_fixed_hours_plain_shift_is_skipped() {
        let generator = IdentityGenerator::default();
        let resolver = FixedYear(year());
        let rates = AccrualRates::default();
        let dispatcher = EventDispatcher::new(&generator, &resolver, &rates);

        let bob = StaffMember::new(&generator, "Bob", Some(Decimal::new(375, 1)), None, None);
        let plain = shift(&generator, "Bob", date(2025, 5, 1), 8, false);
        let ledger = MemoryLedger {
            staff: vec![bob],
            shifts: vec![plain.clone()],
            ..MemoryLedger::default()
        };

        let report = dispatcher
            .dispatch(&ledger, &MutationEvent::shift(RowChange::inserted(plain)))
            .unwrap();
        assert!(report.is_none());
        assert!(ledger.entitlements.borrow().is_empty());
    }

    #[test]
    fn test_unknown_staff_is_not_found_without_write() {
        let generator = IdentityGenerator::default();
        let resolver = FixedYear(year());
        let rates = AccrualRates::default();
        let dispatcher = EventDispatcher::new(&generator, &resolver, &rates);

        let orphan = shift(&generator, "Nobody", date(2025, 5, 1), 8, true);
        let ledger = MemoryLedger::default();

        let result = dispatcher.dispatch(&ledger, &MutationEvent::shift(RowChange::inserted(orphan)));
        assert!(matches!(result, Err(EngineError::NotFound { entity, .. }) if entity == "staff"));
        assert!(ledger.entitlements.borrow().is_empty());
    }

    #[test]
    fn test_recalculate_twice_is_unchanged() {
        let generator = IdentityGenerator::default();
        let resolver = FixedYear(year());
        let rates = AccrualRates::default();
        let dispatcher = EventDispatcher::new(&generator, &resolver, &rates);

        let bob = StaffMember::new(&generator, "Bob", Some(Decimal::new(375, 1)), None, None);
        let ledger = MemoryLedger {
            staff: vec![bob.clone()],
            ..MemoryLedger::default()
        };
        let request = RecalcRequest {
            staff_id: bob.id,
            staff_name: bob.name.clone(),
            employment_end_override: None,
        };

        let first = dispatcher.recalculate(&ledger, &request).unwrap();
        let second = dispatcher.recalculate(&ledger, &request).unwrap();

        assert_eq!(first.outcome, UpsertOutcome::Inserted);
        assert_eq!(second.outcome, UpsertOutcome::Unchanged);
        assert_eq!(first.record, second.record);
    }

    #[test]
    fn test_change_of_terms_anchors_pro_rata() {
        let generator = IdentityGenerator::default();
        let resolver = FixedYear(year());
        let rates = AccrualRates::default();
        let dispatcher = EventDispatcher::new(&generator, &resolver, &rates);

        let dana = StaffMember::new(
            &generator,
            "Dana",
            Some(Decimal::new(20, 0)),
            Some(date(2018, 1, 1)),
            None,
        );
        let change = ChangeOfTerms::contracted_hours(
            &generator,
            dana.id,
            date(2025, 10, 1).and_hms_opt(9, 0, 0).unwrap(),
        );
        let ledger = MemoryLedger {
            staff: vec![dana.clone()],
            changes: vec![change],
            ..MemoryLedger::default()
        };

        let report = dispatcher
            .recalculate(
                &ledger,
                &RecalcRequest {
                    staff_id: dana.id,
                    staff_name: dana.name.clone(),
                    employment_end_override: None,
                },
            )
            .unwrap();

        assert_eq!(report.employment.start, Some(date(2025, 10, 1)));
        assert!(report.record.entitlement_days < Decimal::new(20 * 56, 1) / Decimal::new(12, 0));
    }
}
