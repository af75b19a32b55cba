use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::LeaveEngine;
use crate::error::EngineError;
use crate::model::adjustment::{AdjustmentType, LeaveAdjustment, NewAdjustment};
use crate::model::employee::Employee;
use crate::store::LeaveStore;

/// Input for a manual ledger entry.
#[derive(Debug, Clone)]
pub struct RecordAdjustment {
    pub employee_id: u64,
    /// Year the adjustment applies to.
    pub year: i32,
    pub adjustment_type: AdjustmentType,
    /// Positive number of days; the sign comes from the type.
    pub amount: f64,
    pub reason: String,
    pub actor_id: u64,
}

/// A written ledger entry plus whether it drove the remaining balance
/// below zero. Overdrafts are permitted here; whether to block them
/// is the calling policy layer's decision.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub entry: LeaveAdjustment,
    pub resulted_in_overdraft: bool,
}

impl<S: LeaveStore> LeaveEngine<S> {
    /// Appends a manual balance change to the audit ledger. The
    /// ledger keeps no running total of its own;
    /// `previous_balance`/`new_balance` are point-in-time audit notes
    /// taken from the aggregator at the moment of recording, and the
    /// effect on future snapshots comes from the aggregator reading
    /// the entry back.
    pub async fn record_adjustment(
        &self,
        input: RecordAdjustment,
        as_of: NaiveDate,
    ) -> Result<AdjustmentOutcome, EngineError> {
        if !input.amount.is_finite() || input.amount <= 0.0 {
            return Err(EngineError::Validation(format!(
                "adjustment amount must be a positive number of days, got {}",
                input.amount
            )));
        }
        let employee = self.require_employee(input.employee_id).await?;

        let lock = self.lock_employee(employee.id);
        let _guard = lock.lock().await;

        self.append_adjustment_locked(&employee, input, as_of).await
    }

    /// Caller must hold the employee lock.
    pub(crate) async fn append_adjustment_locked(
        &self,
        employee: &Employee,
        input: RecordAdjustment,
        as_of: NaiveDate,
    ) -> Result<AdjustmentOutcome, EngineError> {
        let before = self.snapshot_with(employee, input.year, as_of).await?;
        let previous_balance = before.remaining_leave;
        let new_balance = previous_balance + input.adjustment_type.balance_sign() * input.amount;

        let entry = self
            .store()
            .append_adjustment(NewAdjustment {
                employee_id: employee.id,
                year: input.year,
                adjustment_type: input.adjustment_type,
                amount: input.amount,
                previous_balance,
                new_balance,
                reason: input.reason,
                created_by: input.actor_id,
            })
            .await?;

        let resulted_in_overdraft = new_balance < 0.0;
        if resulted_in_overdraft {
            warn!(
                employee_id = employee.id,
                year = input.year,
                new_balance,
                "Adjustment drove remaining balance negative"
            );
        }
        info!(
            adjustment_id = entry.id,
            employee_id = employee.id,
            year = input.year,
            adjustment_type = %entry.adjustment_type,
            amount = input.amount,
            "Recorded balance adjustment"
        );

        Ok(AdjustmentOutcome {
            entry,
            resulted_in_overdraft,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Hired 2024-01-02: a clean 5-day balance as of 2024-06-10.
    fn engine() -> LeaveEngine<InMemoryStore> {
        let store = InMemoryStore::new();
        store.insert_employee(Employee {
            id: 1,
            employee_code: "EMP-001".into(),
            hire_date: date(2024, 1, 2),
            is_active: true,
        });
        LeaveEngine::new(store)
    }

    fn adjustment(adjustment_type: AdjustmentType, amount: f64) -> RecordAdjustment {
        RecordAdjustment {
            employee_id: 1,
            year: 2024,
            adjustment_type,
            amount,
            reason: "manual correction".into(),
            actor_id: 9,
        }
    }

    #[tokio::test]
    async fn entry_records_previous_and_new_balance() {
        let engine = engine();
        let outcome = engine
            .record_adjustment(adjustment(AdjustmentType::Add, 2.0), date(2024, 6, 10))
            .await
            .unwrap();

        assert_eq!(outcome.entry.previous_balance, 5.0);
        assert_eq!(outcome.entry.new_balance, 7.0);
        assert!(!outcome.resulted_in_overdraft);

        // The aggregator reads the entry back.
        let snapshot = engine.snapshot(1, 2024, date(2024, 6, 10)).await.unwrap();
        assert_eq!(snapshot.remaining_leave, 7.0);
    }

    #[tokio::test]
    async fn subtracting_past_zero_is_allowed_but_flagged() {
        let engine = engine();
        let outcome = engine
            .record_adjustment(adjustment(AdjustmentType::Subtract, 6.5), date(2024, 6, 10))
            .await
            .unwrap();

        assert!(outcome.resulted_in_overdraft);
        assert_eq!(outcome.entry.new_balance, -1.5);
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let engine = engine();
        for amount in [0.0, -3.0, f64::NAN] {
            let err = engine
                .record_adjustment(adjustment(AdjustmentType::Add, amount), date(2024, 6, 10))
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn consecutive_entries_chain_their_audit_balances() {
        let engine = engine();
        let as_of = date(2024, 6, 10);
        engine
            .record_adjustment(adjustment(AdjustmentType::Add, 2.0), as_of)
            .await
            .unwrap();
        let second = engine
            .record_adjustment(adjustment(AdjustmentType::Subtract, 3.0), as_of)
            .await
            .unwrap();

        assert_eq!(second.entry.previous_balance, 7.0);
        assert_eq!(second.entry.new_balance, 4.0);
    }

    #[tokio::test]
    async fn unknown_employee_is_reported() {
        let engine = engine();
        let mut input = adjustment(AdjustmentType::Add, 1.0);
        input.employee_id = 99;
        let err = engine
            .record_adjustment(input, date(2024, 6, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
