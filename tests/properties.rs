//! Property-based tests for identity and entitlement invariants.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use holiday_ledger::calculation::{
    AccrualRates, DateWindow, calculate_fixed_entitlement, calculate_zero_hour_entitlement,
    pro_rata_factor, statutory_entitlement,
};
use holiday_ledger::identity::{IdentityGenerator, IdentityNamespace};
use holiday_ledger::models::{AccrualYear, EmploymentWindow, NewShift, Shift, ShiftType};

fn year_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 6).unwrap()
}

fn year() -> AccrualYear {
    AccrualYear::starting(year_start())
}

fn base_time() -> NaiveDateTime {
    year_start().and_hms_opt(0, 0, 0).unwrap()
}

fn shift_type_strategy() -> impl Strategy<Value = ShiftType> {
    prop_oneof![
        Just(ShiftType::Ordinary),
        Just(ShiftType::HolidayTaken),
    ]
}

/// Day offsets from the year start, reaching either side of the year.
fn offset_strategy() -> impl Strategy<Value = i64> {
    -400i64..800
}

fn shifts_strategy() -> impl Strategy<Value = Vec<(i64, i64, bool, ShiftType)>> {
    // (start minute offset, length in minutes, overtime, type); length may be negative
    prop::collection::vec(
        (0i64..525_600, -600i64..1_440, any::<bool>(), shift_type_strategy()),
        0..40,
    )
}

fn build_shifts(generator: &IdentityGenerator, name: &str, raw: &[(i64, i64, bool, ShiftType)]) -> Vec<Shift> {
    let year = year();
    raw.iter()
        .map(|&(start, length, overtime, shift_type)| {
            let start_time = base_time() + Duration::minutes(start);
            Shift::from_new(
                generator,
                &year,
                NewShift {
                    staff_name: name.to_string(),
                    start_time,
                    end_time: start_time + Duration::minutes(length),
                    overtime,
                    shift_type,
                },
            )
        })
        .collect()
}

fn optional_date(offset: Option<i64>) -> Option<NaiveDate> {
    offset.map(|days| year_start() + Duration::days(days))
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn ten_thousand_distinct_keys_give_distinct_identifiers() {
    let generator = IdentityGenerator::default();
    let year_id = year().id(&generator);
    let mut seen = HashSet::new();

    for i in 0..10_000i64 {
        let name = format!("staff-{}", i % 97);
        let start = base_time() + Duration::minutes(i * 7);
        let tag = if i % 2 == 0 { "ordinary" } else { "holiday_taken" };
        assert!(seen.insert(generator.shift_id(year_id, &name, start, tag)));
    }
    assert_eq!(seen.len(), 10_000);
}

proptest! {
    #[test]
    fn identifiers_are_deterministic(name in ".{0,40}", minutes in 0i64..1_000_000) {
        let first = IdentityGenerator::default();
        let second = IdentityGenerator::new(IdentityNamespace::V1);
        let year_id = year().id(&first);
        let start = base_time() + Duration::minutes(minutes);

        prop_assert_eq!(first.staff_id(&name), second.staff_id(&name));
        prop_assert_eq!(
            first.shift_id(year_id, &name, start, "ordinary"),
            second.shift_id(year_id, &name, start, "ordinary")
        );
    }

    #[test]
    fn different_names_give_different_identifiers(a in "[a-zA-Z ]{1,20}", b in "[a-zA-Z ]{1,20}") {
        prop_assume!(a != b);
        let generator = IdentityGenerator::default();
        prop_assert_ne!(generator.staff_id(&a), generator.staff_id(&b));
    }
}

// =============================================================================
// Entitlement
// =============================================================================

proptest! {
    #[test]
    fn pro_rata_factor_stays_in_unit_interval(
        start in prop::option::of(offset_strategy()),
        end in prop::option::of(offset_strategy()),
    ) {
        let year = year();
        let window = DateWindow::effective(
            &year,
            &EmploymentWindow { start: optional_date(start), end: optional_date(end) },
        );
        let factor = pro_rata_factor(&window, &year);
        prop_assert!(factor >= Decimal::ZERO);
        prop_assert!(factor <= Decimal::ONE);
    }

    #[test]
    fn statutory_entitlement_is_never_negative(
        hours in -100i64..100,
        start in prop::option::of(offset_strategy()),
        end in prop::option::of(offset_strategy()),
    ) {
        let base = statutory_entitlement(
            Decimal::new(hours, 0),
            optional_date(start),
            optional_date(end),
            year_start(),
            &AccrualRates::default(),
        );
        prop_assert!(base.hours >= Decimal::ZERO);
        prop_assert!(base.days >= Decimal::ZERO);
    }

    #[test]
    fn zero_hour_entitlement_is_never_negative(
        raw in shifts_strategy(),
        start in prop::option::of(offset_strategy()),
        end in prop::option::of(offset_strategy()),
    ) {
        let generator = IdentityGenerator::default();
        let shifts = build_shifts(&generator, "Alice", &raw);
        let employment = EmploymentWindow { start: optional_date(start), end: optional_date(end) };

        let result = calculate_zero_hour_entitlement(
            shifts.as_slice(),
            generator.staff_id("Alice"),
            &year(),
            &employment,
            &AccrualRates::default(),
            1,
        )
        .unwrap();
        prop_assert!(result.worked_hours >= Decimal::ZERO);
        prop_assert!(result.entitlement_days >= Decimal::ZERO);
    }

    #[test]
    fn overtime_never_reduces_fixed_entitlement(
        raw in shifts_strategy(),
        hours in 1i64..60,
    ) {
        let generator = IdentityGenerator::default();
        let shifts = build_shifts(&generator, "Bob", &raw);
        let employment = EmploymentWindow { start: Some(year_start()), end: None };

        let result = calculate_fixed_entitlement(
            shifts.as_slice(),
            generator.staff_id("Bob"),
            Decimal::new(hours, 0),
            &employment,
            &year(),
            &AccrualRates::default(),
            1,
        )
        .unwrap();
        prop_assert!(result.overtime_days >= Decimal::ZERO);
        prop_assert!(result.entitlement_days >= result.base.days);
    }
}

#[test]
fn start_on_year_start_gives_full_factor() {
    let year = year();
    let window = DateWindow::effective(&year, &EmploymentWindow { start: Some(year.start), end: None });
    assert_eq!(pro_rata_factor(&window, &year), Decimal::ONE);
}

#[test]
fn start_after_year_end_gives_zero_factor() {
    let year = year();
    let start = year.end + Duration::days(1);
    let window = DateWindow::effective(&year, &EmploymentWindow { start: Some(start), end: None });
    assert_eq!(pro_rata_factor(&window, &year), Decimal::ZERO);
}
