//! Integration tests for the holiday ledger.
//!
//! This test suite covers:
//! - Zero-hours and fixed-hours entitlement through the record store
//! - Which writes trigger a recompute and which do not
//! - Change-of-terms anchoring
//! - Recompute idempotence and all-or-nothing writes
//! - The namespace guard and namespace migration
//! - Concurrent writers
//! - The HTTP API

use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use holiday_ledger::api::{AppState, create_router};
use holiday_ledger::calculation::EntitlementCalculation;
use holiday_ledger::config::{AccrualYearConfig, ConfigLoader, LedgerConfig};
use holiday_ledger::dispatch::UpsertOutcome;
use holiday_ledger::error::EngineError;
use holiday_ledger::identity::{IdentityGenerator, IdentityNamespace, NamespaceMigration};
use holiday_ledger::models::{ChangeKind, NewShift, Shift, ShiftType};
use holiday_ledger::store::{NewStaff, SqliteStore, TermsUpdate};

// =============================================================================
// Test Helpers
// =============================================================================

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Accrual year 2025-04-06 to 2026-04-05, pinned so tests do not depend on today.
fn test_config() -> LedgerConfig {
    LedgerConfig::default().with_accrual_year(AccrualYearConfig::Fixed {
        start: date("2025-04-06"),
        end: date("2026-04-05"),
    })
}

fn create_store() -> SqliteStore {
    SqliteStore::open_in_memory(&test_config()).expect("Failed to open store")
}

fn staff(name: &str, hours: Option<&str>, start: Option<&str>) -> NewStaff {
    NewStaff {
        name: name.to_string(),
        contracted_hours: hours.map(decimal),
        employment_start: start.map(date),
        employment_end: None,
    }
}

fn shift(name: &str, start: &str, end: &str, overtime: bool) -> NewShift {
    NewShift {
        staff_name: name.to_string(),
        start_time: ts(start),
        end_time: ts(end),
        overtime,
        shift_type: ShiftType::Ordinary,
    }
}

/// Ten 10-hour shifts in May 2025.
fn hundred_hours(name: &str) -> Vec<NewShift> {
    (1..=10)
        .map(|day| {
            shift(
                name,
                &format!("2025-05-{:02} 08:00:00", day),
                &format!("2025-05-{:02} 18:00:00", day),
                false,
            )
        })
        .collect()
}

fn assert_days_approx(actual: Decimal, expected: Decimal) {
    assert_eq!(
        actual.round_dp(12),
        expected.round_dp(12),
        "Expected {} days, got {}",
        expected,
        actual
    );
}

// =============================================================================
// Scenario A: zero-hours accrual
// =============================================================================

#[test]
fn test_scenario_a_zero_hours_accrues_on_worked_hours() {
    let store = create_store();
    store.create_staff(staff("Alice", Some("0"), None)).unwrap();
    for new in hundred_hours("Alice") {
        store.upsert_shift(new).unwrap();
    }

    let record = store.entitlement("Alice").unwrap().unwrap();
    assert!(record.zero_hours);
    assert_days_approx(record.entitlement_days, decimal("100") * decimal("0.1207") / decimal("12"));

    let report = store.recalculate("Alice", None).unwrap();
    match report.calculation {
        EntitlementCalculation::ZeroHours(z) => {
            assert_eq!(z.worked_hours, decimal("100"));
            assert_eq!(z.pro_rata_factor, Decimal::ONE);
        }
        other => panic!("expected zero-hours calculation, got {:?}", other),
    }
}

#[test]
fn test_holiday_taken_shift_does_not_accrue() {
    let store = create_store();
    store.create_staff(staff("Alice", None, None)).unwrap();
    store
        .upsert_shift(NewShift {
            shift_type: ShiftType::HolidayTaken,
            ..shift("Alice", "2025-06-02 09:00:00", "2025-06-02 17:00:00", false)
        })
        .unwrap();

    let record = store.entitlement("Alice").unwrap().unwrap();
    assert_eq!(record.entitlement_days, Decimal::ZERO);
}

// =============================================================================
// Scenarios B and C: fixed hours and overtime
// =============================================================================

#[test]
fn test_scenario_b_full_year_statutory() {
    let store = create_store();
    let written = store
        .create_staff(staff("Bob", Some("37.5"), Some("2020-01-01")))
        .unwrap();

    let report = written.recalculation.expect("staff insert recomputes");
    match &report.calculation {
        EntitlementCalculation::FixedHours(f) => {
            assert_eq!(f.base.pro_rata_factor, Decimal::ONE);
            assert_eq!(f.overtime_days, Decimal::ZERO);
        }
        other => panic!("expected fixed-hours calculation, got {:?}", other),
    }
    // 37.5 hours x 5.6 weeks / 12 hours per day
    assert_eq!(report.record.entitlement_days, decimal("17.5"));
}

#[test]
fn test_scenario_c_overtime_adds_hours_over_twelve() {
    let store = create_store();
    store
        .create_staff(staff("Bob", Some("37.5"), Some("2020-01-01")))
        .unwrap();
    let before = store.entitlement("Bob").unwrap().unwrap();

    let written = store
        .upsert_shift(shift("Bob", "2025-07-05 08:00:00", "2025-07-05 18:00:00", true))
        .unwrap();
    assert!(written.recalculation.is_some());

    let after = store.entitlement("Bob").unwrap().unwrap();
    assert_days_approx(
        after.entitlement_days - before.entitlement_days,
        decimal("10") / decimal("12"),
    );
}

#[test]
fn test_overtime_deleted_reverts_entitlement() {
    let store = create_store();
    store
        .create_staff(staff("Bob", Some("37.5"), Some("2020-01-01")))
        .unwrap();
    let overtime = store
        .upsert_shift(shift("Bob", "2025-07-05 08:00:00", "2025-07-05 18:00:00", true))
        .unwrap();

    let deleted = store.delete_shift(overtime.record.id).unwrap();
    assert!(deleted.recalculation.is_some());
    assert_eq!(
        store.entitlement("Bob").unwrap().unwrap().entitlement_days,
        decimal("17.5")
    );
}

#[test]
fn test_clearing_overtime_flag_recomputes() {
    let store = create_store();
    store
        .create_staff(staff("Bob", Some("37.5"), Some("2020-01-01")))
        .unwrap();
    store
        .upsert_shift(shift("Bob", "2025-07-05 08:00:00", "2025-07-05 18:00:00", true))
        .unwrap();

    let cleared = store
        .upsert_shift(shift("Bob", "2025-07-05 08:00:00", "2025-07-05 18:00:00", false))
        .unwrap();
    assert!(cleared.recalculation.is_some());
    assert_eq!(
        store.entitlement("Bob").unwrap().unwrap().entitlement_days,
        decimal("17.5")
    );
}

// =============================================================================
// Scenario D: non-overtime edits skip fixed-hours staff
// =============================================================================

#[test]
fn test_scenario_d_plain_shift_edit_leaves_row_untouched() {
    let store = create_store();
    store
        .create_staff(staff("Bob", Some("37.5"), Some("2020-01-01")))
        .unwrap();
    let original = store
        .upsert_shift(shift("Bob", "2025-08-01 09:00:00", "2025-08-01 17:00:00", false))
        .unwrap();
    assert!(original.recalculation.is_none());
    let before = store.entitlement("Bob").unwrap().unwrap();

    // End time edit keeps the natural key
    let edited = store
        .upsert_shift(shift("Bob", "2025-08-01 09:00:00", "2025-08-01 18:30:00", false))
        .unwrap();
    assert!(edited.recalculation.is_none());

    // Start time edit re-keys the row
    let moved = store
        .update_shift(
            original.record.id,
            shift("Bob", "2025-08-01 10:00:00", "2025-08-01 18:30:00", false),
        )
        .unwrap();
    assert!(moved.recalculation.is_none());

    let after = store.entitlement("Bob").unwrap().unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after, before);
}

// =============================================================================
// Scenario E: change of terms anchors pro-ration
// =============================================================================

#[test]
fn test_scenario_e_change_of_terms_sets_anchor() {
    let store = create_store();
    store
        .create_staff(staff("Carol", Some("20"), Some("2020-01-01")))
        .unwrap();
    store
        .upsert_shift(shift("Carol", "2025-06-01 08:00:00", "2025-06-01 18:00:00", false))
        .unwrap();
    store
        .upsert_shift(shift("Carol", "2025-11-01 08:00:00", "2025-11-01 18:00:00", false))
        .unwrap();

    let written = store
        .update_staff_terms(
            "Carol",
            TermsUpdate {
                contracted_hours: Some(Some(Decimal::ZERO)),
                effective_at: Some(ts("2025-10-06 00:00:00")),
                ..TermsUpdate::default()
            },
        )
        .unwrap();

    let report = written.recalculation.expect("hours change recomputes");
    assert_eq!(report.employment.start, Some(date("2025-10-06")));
    match report.calculation {
        EntitlementCalculation::ZeroHours(z) => {
            assert_eq!(z.window.start, date("2025-10-06"));
            // Only the November shift falls after the anchor
            assert_eq!(z.worked_hours, decimal("10"));
            assert_eq!(z.pro_rata_factor, decimal("182") / decimal("365"));
        }
        other => panic!("expected zero-hours calculation, got {:?}", other),
    }
}

#[test]
fn test_change_outside_year_falls_back_to_employment_start() {
    let store = create_store();
    store
        .create_staff(staff("Dana", Some("20"), Some("2025-06-01")))
        .unwrap();
    store
        .update_staff_terms(
            "Dana",
            TermsUpdate {
                contracted_hours: Some(Some(decimal("25"))),
                effective_at: Some(ts("2024-12-01 00:00:00")),
                ..TermsUpdate::default()
            },
        )
        .unwrap();

    let report = store.recalculate("Dana", None).unwrap();
    assert_eq!(report.employment.start, Some(date("2025-06-01")));
}

#[test]
fn test_employment_end_override_is_not_persisted() {
    let store = create_store();
    store
        .create_staff(staff("Bob", Some("37.5"), Some("2020-01-01")))
        .unwrap();

    let report = store.recalculate("Bob", Some(date("2025-10-05"))).unwrap();
    assert_eq!(report.employment.end, Some(date("2025-10-05")));
    assert!(report.record.entitlement_days < decimal("17.5"));
    assert_eq!(store.staff("Bob").unwrap().unwrap().employment_end, None);
}

// =============================================================================
// Idempotence and failure atomicity
// =============================================================================

#[test]
fn test_recalculate_twice_is_unchanged() {
    let store = create_store();
    store.create_staff(staff("Alice", None, None)).unwrap();
    for new in hundred_hours("Alice") {
        store.upsert_shift(new).unwrap();
    }

    store.recalculate("Alice", None).unwrap();
    let first = store.entitlement("Alice").unwrap().unwrap();
    let again = store.recalculate("Alice", None).unwrap();
    let second = store.entitlement("Alice").unwrap().unwrap();

    assert_eq!(again.outcome, UpsertOutcome::Unchanged);
    assert_eq!(first, second);
}

#[test]
fn test_unknown_staff_leaves_no_partial_write() {
    let store = create_store();

    let result = store.upsert_shift(shift("Ghost", "2025-05-01 09:00:00", "2025-05-01 17:00:00", false));
    assert!(matches!(result, Err(EngineError::NotFound { .. })));

    let result = store.recalculate("Ghost", None);
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
    assert!(store.all_staff().unwrap().is_empty());
}

#[test]
fn test_recording_same_change_twice_is_noop() {
    let store = create_store();
    store.create_staff(staff("Bob", Some("20"), None)).unwrap();
    let at = ts("2025-09-01 12:00:00");

    let first = store
        .record_change_of_terms("Bob", ChangeKind::Contract, "contracted_hours", at)
        .unwrap();
    let second = store
        .record_change_of_terms("Bob", ChangeKind::Contract, "contracted_hours", at)
        .unwrap();
    assert_eq!(first.id, second.id);

    let report = store.recalculate("Bob", None).unwrap();
    assert_eq!(report.employment.start, Some(date("2025-09-01")));
}

// =============================================================================
// Namespace guard and migration
// =============================================================================

#[test]
fn test_reopen_with_other_namespace_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    drop(SqliteStore::open(&path, &test_config()).unwrap());

    let other = IdentityNamespace::new(2, Uuid::from_u128(0x42)).unwrap();
    let result = SqliteStore::open(&path, &test_config().with_namespace(other));
    assert!(matches!(
        result,
        Err(EngineError::NamespaceMismatch {
            stored_version: 1,
            configured_version: 2,
            ..
        })
    ));
}

#[test]
fn test_migration_rekeys_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let store = SqliteStore::open(&path, &test_config()).unwrap();
    store.create_staff(staff("Alice", None, None)).unwrap();
    for new in hundred_hours("Alice") {
        store.upsert_shift(new).unwrap();
    }
    let before = store.entitlement("Alice").unwrap().unwrap();

    let target = IdentityNamespace::new(2, Uuid::from_u128(0x42)).unwrap();
    let plan = NamespaceMigration::plan(store.namespace(), target).unwrap();
    let (store, report) = store.migrate_namespace(plan).unwrap();
    drop(store);

    assert_eq!(report.staff, 1);
    assert_eq!(report.accrual_years, 1);
    assert_eq!(report.shifts, 10);
    assert_eq!(report.entitlements, 1);

    // The old namespace is refused, the new one is accepted
    assert!(SqliteStore::open(&path, &test_config()).is_err());
    let store = SqliteStore::open(&path, &test_config().with_namespace(target)).unwrap();

    let generator = IdentityGenerator::new(target);
    let alice = store.staff("Alice").unwrap().unwrap();
    assert_eq!(alice.id, generator.staff_id("Alice"));

    let after = store.entitlement("Alice").unwrap().unwrap();
    assert_eq!(after.id, generator.entitlement_id(alice.id, date("2025-04-06")));
    assert_eq!(after.entitlement_days, before.entitlement_days);

    // Shifts are reachable under their new identifiers
    let year = store.current_year();
    let first = Shift::from_new(&generator, &year, hundred_hours("Alice").remove(0));
    assert!(store.shift(first.id).unwrap().is_some());

    // A recompute after migration changes nothing
    let report = store.recalculate("Alice", None).unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Unchanged);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_writers_converge() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let setup = SqliteStore::open(&path, &test_config()).unwrap();
    setup.create_staff(staff("Alice", None, None)).unwrap();
    setup.create_staff(staff("Erin", None, None)).unwrap();
    drop(setup);

    thread::scope(|scope| {
        for name in ["Alice", "Erin"] {
            let path = path.clone();
            scope.spawn(move || {
                let store = SqliteStore::open(&path, &test_config()).unwrap();
                for new in hundred_hours(name) {
                    store.upsert_shift(new).unwrap();
                }
            });
        }
    });

    let store = SqliteStore::open(&path, &test_config()).unwrap();
    let expected = decimal("100") * decimal("0.1207") / decimal("12");
    for name in ["Alice", "Erin"] {
        let record = store.entitlement(name).unwrap().unwrap();
        assert_days_approx(record.entitlement_days, expected);
    }
}

#[test]
fn test_shared_store_across_threads() {
    let store = Arc::new(create_store());
    store.create_staff(staff("Alice", None, None)).unwrap();

    let handles: Vec<_> = hundred_hours("Alice")
        .into_iter()
        .map(|new| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.upsert_shift(new).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let record = store.entitlement("Alice").unwrap().unwrap();
    assert_days_approx(record.entitlement_days, decimal("100") * decimal("0.1207") / decimal("12"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_shipped_config_opens_store() {
    let loader = ConfigLoader::load("./config/default").expect("Failed to load config");
    let store = SqliteStore::open_in_memory(loader.config()).unwrap();
    assert_eq!(store.namespace(), IdentityNamespace::V1);
}

// =============================================================================
// HTTP API
// =============================================================================

fn create_router_for_test() -> Router {
    create_router(AppState::new(create_store()))
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("Content-Type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn json_decimal(value: &Value) -> Decimal {
    decimal(value.as_str().expect("decimal serialized as string"))
}

#[tokio::test]
async fn test_http_fixed_hours_flow() {
    let router = create_router_for_test();

    let (status, created) = send(
        &router,
        "POST",
        "/staff",
        Some(json!({
            "name": "Bob",
            "contracted_hours": "37.5",
            "employment_start": "2020-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["recalculation"]["outcome"], "inserted");

    let (status, written) = send(
        &router,
        "POST",
        "/shifts",
        Some(json!({
            "staff_name": "Bob",
            "start_time": "2025-07-05T08:00:00",
            "end_time": "2025-07-05T20:00:00",
            "overtime": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(written["recalculation"]["outcome"], "updated");

    let (status, record) = send(&router, "GET", "/staff/Bob/entitlement", None).await;
    assert_eq!(status, StatusCode::OK);
    // 17.5 statutory days plus 12 / 12 overtime
    assert_eq!(json_decimal(&record["entitlement_days"]), decimal("18.5"));

    let shift_id = written["record"]["id"].as_str().unwrap().to_string();
    let (status, deleted) = send(&router, "DELETE", &format!("/shifts/{}", shift_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_decimal(&deleted["recalculation"]["record"]["entitlement_days"]), decimal("17.5"));
}

#[tokio::test]
async fn test_http_terms_patch_distinguishes_null() {
    let router = create_router_for_test();
    send(
        &router,
        "POST",
        "/staff",
        Some(json!({"name": "Carol", "contracted_hours": "20", "employment_start": "2020-01-01"})),
    )
    .await;

    // Omitting contracted_hours leaves it alone
    let (status, patched) = send(
        &router,
        "PATCH",
        "/staff/Carol/terms",
        Some(json!({"employment_end": "2025-12-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_decimal(&patched["record"]["contracted_hours"]), decimal("20"));
    assert_eq!(patched["recalculation"]["employment"]["end"], "2025-12-31");

    // Explicit null clears it, switching to zero-hours
    let (status, patched) = send(
        &router,
        "PATCH",
        "/staff/Carol/terms",
        Some(json!({"contracted_hours": null, "effective_at": "2025-10-06T00:00:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(patched["record"]["contracted_hours"].is_null());
    assert_eq!(patched["recalculation"]["record"]["zero_hours"], true);
}

#[tokio::test]
async fn test_http_recalculate_without_body() {
    let router = create_router_for_test();
    send(&router, "POST", "/staff", Some(json!({"name": "Alice"}))).await;

    let (status, report) = send(&router, "POST", "/staff/Alice/recalculate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["outcome"], "unchanged");
    assert_eq!(report["calculation"]["regime"], "zero_hours");
}

#[tokio::test]
async fn test_http_shift_for_unknown_staff_is_404() {
    let router = create_router_for_test();
    let (status, error) = send(
        &router,
        "POST",
        "/shifts",
        Some(json!({
            "staff_name": "Ghost",
            "start_time": "2025-07-05T08:00:00",
            "end_time": "2025-07-05T16:00:00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");
    assert!(error["message"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn test_http_entitlement_for_unknown_staff_is_404() {
    let router = create_router_for_test();
    let (status, error) = send(&router, "GET", "/staff/Nobody/entitlement", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_http_duplicate_staff_is_400() {
    let router = create_router_for_test();
    send(&router, "POST", "/staff", Some(json!({"name": "Alice"}))).await;
    let (status, error) = send(&router, "POST", "/staff", Some(json!({"name": "Alice"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_STAFF");
}
