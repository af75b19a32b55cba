//! End-to-end flow over the public engine API: first-year accrual,
//! approval, year-end carry-over, and an administrative overdraft,
//! all against the in-memory store.

use chrono::NaiveDate;

use hrm_leave::LeaveEngine;
use hrm_leave::engine::{RecordAdjustment, SubmitLeave};
use hrm_leave::error::EngineError;
use hrm_leave::model::adjustment::AdjustmentType;
use hrm_leave::model::employee::Employee;
use hrm_leave::model::leave_request::LeaveType;
use hrm_leave::store::LeaveStore;
use hrm_leave::store::memory::InMemoryStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine_with_employee() -> LeaveEngine<InMemoryStore> {
    let store = InMemoryStore::new();
    store.insert_employee(Employee {
        id: 1,
        employee_code: "EMP-001".into(),
        hire_date: date(2023, 1, 15),
        is_active: true,
    });
    LeaveEngine::new(store)
}

fn annual(start: NaiveDate, end: NaiveDate, allow_advance: bool) -> SubmitLeave {
    SubmitLeave {
        employee_id: 1,
        leave_type: LeaveType::Annual,
        start_date: start,
        end_date: end,
        reason: None,
        allow_advance,
    }
}

#[tokio::test]
async fn first_year_through_carry_over_and_overdraft() {
    let engine = engine_with_employee();

    // Five completed service months by mid-June of the hire year.
    let snapshot = engine.snapshot(1, 2023, date(2023, 6, 15)).await.unwrap();
    assert_eq!(snapshot.base_entitlement, 5.0);
    assert_eq!(snapshot.carry_over_leave, 0.0);
    assert_eq!(snapshot.remaining_leave, 5.0);

    // A full working week in July, approved by HR.
    let request = engine
        .submit(annual(date(2023, 7, 3), date(2023, 7, 7), false), date(2023, 6, 15))
        .await
        .unwrap();
    assert_eq!(request.days_count, 5.0);
    engine.approve(request.id, 42, date(2023, 7, 1)).await.unwrap();

    let snapshot = engine.snapshot(1, 2023, date(2023, 8, 1)).await.unwrap();
    assert_eq!(snapshot.base_entitlement, 6.0);
    assert_eq!(snapshot.used_leave, 5.0);
    assert_eq!(snapshot.remaining_leave, 1.0);

    // Before any year-end run the carry-over is purely automatic:
    // 11 accrued in the first year minus the 5 taken.
    assert_eq!(engine.carry_over_for_year(1, 2024).await.unwrap(), 6.0);

    // Year-end batch materializes it as a ledger entry, exactly once.
    let first_run = engine.process_year(2023, 999).await.unwrap();
    assert_eq!(first_run.processed, 1);
    assert_eq!(first_run.employees[0].unused, 6.0);

    let second_run = engine.process_year(2023, 999).await.unwrap();
    assert_eq!(second_run.processed, 0);
    assert_eq!(second_run.already_exists, 1);
    let entries = engine
        .store()
        .find_adjustments(1, 2024, Some(AdjustmentType::CarryOver))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].created_by, 999);

    // One full service year now: 15 base; the ledger total and the
    // automatic component are additive on the read path.
    let snapshot = engine.snapshot(1, 2024, date(2024, 3, 1)).await.unwrap();
    assert_eq!(snapshot.base_entitlement, 15.0);
    assert_eq!(snapshot.carry_over_leave, 12.0);
    assert_eq!(snapshot.total_entitlement, 27.0);

    // An administrative subtraction may overdraw the balance, but the
    // outcome says so and the snapshot keeps the deficit visible.
    let outcome = engine
        .record_adjustment(
            RecordAdjustment {
                employee_id: 1,
                year: 2024,
                adjustment_type: AdjustmentType::Subtract,
                amount: 28.0,
                reason: "imported balance correction".into(),
                actor_id: 7,
            },
            date(2024, 3, 1),
        )
        .await
        .unwrap();
    assert!(outcome.resulted_in_overdraft);

    let snapshot = engine.snapshot(1, 2024, date(2024, 3, 1)).await.unwrap();
    assert_eq!(snapshot.remaining_leave, -1.0);

    // Submitting against the deficit needs the explicit override.
    let err = engine
        .submit(annual(date(2024, 5, 6), date(2024, 5, 7), false), date(2024, 3, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance { .. }));

    let advance = engine
        .submit(annual(date(2024, 5, 6), date(2024, 5, 7), true), date(2024, 3, 1))
        .await
        .unwrap();
    assert!(advance.is_advance_usage);
    assert_eq!(advance.overdraft_days, 3.0);

    // Advance-usage requests skip the approval-time balance check.
    engine.approve(advance.id, 42, date(2024, 3, 1)).await.unwrap();
    let snapshot = engine.snapshot(1, 2024, date(2024, 3, 1)).await.unwrap();
    assert_eq!(snapshot.remaining_leave, -3.0);
}
