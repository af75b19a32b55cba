use chrono::Datelike;
use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{error, info};

use super::LeaveEngine;
use super::carry_over::{AUTOMATIC_CARRY_OVER_CAP, year_end_date};
use super::entitlement::base_entitlement;
use super::ledger::RecordAdjustment;
use crate::error::EngineError;
use crate::model::adjustment::AdjustmentType;
use crate::model::employee::Employee;
use crate::store::LeaveStore;

/// Bounded fan-out across employees. Each employee still runs inside
/// its own exclusion scope.
const BATCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryOverOutcome {
    Processed,
    /// A `carry_over` ledger entry for the next year already exists;
    /// rerunning the batch never writes a duplicate.
    AlreadyExists,
    NoCarryOver,
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeCarryOver {
    pub employee_id: u64,
    pub employee_code: String,
    pub entitlement: f64,
    pub used: f64,
    pub unused: f64,
    pub carry_over: f64,
    pub outcome: CarryOverOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub target_year: i32,
    pub processed: usize,
    pub already_exists: usize,
    pub no_carry_over: usize,
    pub errors: usize,
    pub employees: Vec<EmployeeCarryOver>,
}

impl<S: LeaveStore> LeaveEngine<S> {
    /// Year-end carry-over for the whole active population: for every
    /// active employee hired in or before `target_year`, computes the
    /// unused entitlement of that year and writes a capped
    /// `carry_over` ledger entry for `target_year + 1` unless one
    /// already exists. Per-employee failures are recorded in the
    /// result and never abort the rest of the run.
    pub async fn process_year(
        &self,
        target_year: i32,
        actor_id: u64,
    ) -> Result<BatchResult, EngineError> {
        super::validate_year(target_year)?;
        let employees = self.store().list_active_employees().await?;
        let eligible: Vec<Employee> = employees
            .into_iter()
            .filter(|employee| employee.hire_date.year() <= target_year)
            .collect();
        info!(
            target_year,
            eligible = eligible.len(),
            "Starting year-end carry-over batch"
        );

        let mut rows: Vec<EmployeeCarryOver> = stream::iter(eligible)
            .map(|employee| self.carry_over_employee(employee, target_year, actor_id))
            .buffer_unordered(BATCH_CONCURRENCY)
            .collect()
            .await;
        rows.sort_by_key(|row| row.employee_id);

        let (mut processed, mut already_exists, mut no_carry_over, mut errors) = (0, 0, 0, 0);
        for row in &rows {
            match row.outcome {
                CarryOverOutcome::Processed => processed += 1,
                CarryOverOutcome::AlreadyExists => already_exists += 1,
                CarryOverOutcome::NoCarryOver => no_carry_over += 1,
                CarryOverOutcome::Error(_) => errors += 1,
            }
        }
        let result = BatchResult {
            target_year,
            processed,
            already_exists,
            no_carry_over,
            errors,
            employees: rows,
        };
        info!(
            target_year,
            processed = result.processed,
            already_exists = result.already_exists,
            no_carry_over = result.no_carry_over,
            errors = result.errors,
            "Year-end carry-over batch finished"
        );
        Ok(result)
    }

    async fn carry_over_employee(
        &self,
        employee: Employee,
        target_year: i32,
        actor_id: u64,
    ) -> EmployeeCarryOver {
        let mut row = EmployeeCarryOver {
            employee_id: employee.id,
            employee_code: employee.employee_code.clone(),
            entitlement: 0.0,
            used: 0.0,
            unused: 0.0,
            carry_over: 0.0,
            outcome: CarryOverOutcome::NoCarryOver,
        };
        match self
            .try_carry_over(&employee, target_year, actor_id, &mut row)
            .await
        {
            Ok(outcome) => row.outcome = outcome,
            Err(e) => {
                error!(
                    error = %e,
                    employee_id = employee.id,
                    target_year,
                    "Carry-over failed for employee"
                );
                row.outcome = CarryOverOutcome::Error(e.to_string());
            }
        }
        row
    }

    async fn try_carry_over(
        &self,
        employee: &Employee,
        target_year: i32,
        actor_id: u64,
        row: &mut EmployeeCarryOver,
    ) -> Result<CarryOverOutcome, EngineError> {
        let year_end = year_end_date(target_year);
        row.entitlement = base_entitlement(employee.hire_date, year_end);
        row.used = self.approved_annual_days(employee.id, target_year).await?;
        row.unused = (row.entitlement - row.used).max(0.0);
        row.carry_over = row.unused.min(AUTOMATIC_CARRY_OVER_CAP);

        if row.carry_over <= 0.0 {
            return Ok(CarryOverOutcome::NoCarryOver);
        }

        let lock = self.lock_employee(employee.id);
        let _guard = lock.lock().await;

        let existing = self
            .store()
            .find_adjustments(employee.id, target_year + 1, Some(AdjustmentType::CarryOver))
            .await?;
        if !existing.is_empty() {
            return Ok(CarryOverOutcome::AlreadyExists);
        }

        self.append_adjustment_locked(
            employee,
            RecordAdjustment {
                employee_id: employee.id,
                year: target_year + 1,
                adjustment_type: AdjustmentType::CarryOver,
                amount: row.carry_over,
                reason: format!("Year-end carry-over of unused {target_year} leave"),
                actor_id,
            },
            year_end,
        )
        .await?;

        Ok(CarryOverOutcome::Processed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::leave_request::{LeaveStatus, LeaveType, NewLeaveRequest};
    use crate::store::memory::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(id: u64, hire_date: NaiveDate, is_active: bool) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP-{id:03}"),
            hire_date,
            is_active,
        }
    }

    fn engine_with(employees: Vec<Employee>) -> LeaveEngine<InMemoryStore> {
        let store = InMemoryStore::new();
        for e in employees {
            store.insert_employee(e);
        }
        LeaveEngine::new(store)
    }

    #[tokio::test]
    async fn batch_writes_capped_entries_for_the_next_year() {
        let engine = engine_with(vec![
            // 20 days entitlement, 8 used -> carries 12.
            employee(1, date(2017, 1, 4), true),
            // 25 days, nothing used -> capped at 15.
            employee(2, date(2000, 1, 4), true),
        ]);
        engine.store().seed_request(
            NewLeaveRequest {
                employee_id: 1,
                leave_type: LeaveType::Annual,
                start_date: date(2023, 5, 1),
                end_date: date(2023, 5, 10),
                days_count: 8.0,
                reason: None,
                is_advance_usage: false,
                overdraft_days: 0.0,
            },
            LeaveStatus::Approved,
        );

        let result = engine.process_year(2023, 99).await.unwrap();
        assert_eq!(result.processed, 2);
        assert_eq!(result.errors, 0);

        let rows = &result.employees;
        assert_eq!(rows[0].unused, 12.0);
        assert_eq!(rows[0].carry_over, 12.0);
        assert_eq!(rows[1].unused, 25.0);
        assert_eq!(rows[1].carry_over, 15.0);

        // The entries land in the following year's ledger.
        assert_eq!(engine.carry_over_for_year(1, 2024).await.unwrap(), 12.0 + 12.0);
    }

    #[tokio::test]
    async fn rerunning_the_batch_is_idempotent() {
        let engine = engine_with(vec![employee(1, date(2017, 1, 4), true)]);

        let first = engine.process_year(2023, 99).await.unwrap();
        assert_eq!(first.processed, 1);

        let second = engine.process_year(2023, 99).await.unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.already_exists, 1);

        let entries = engine
            .store()
            .find_adjustments(1, 2024, Some(AdjustmentType::CarryOver))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn inactive_and_not_yet_hired_employees_are_skipped() {
        let engine = engine_with(vec![
            employee(1, date(2017, 1, 4), false),
            employee(2, date(2024, 2, 1), true),
        ]);

        let result = engine.process_year(2023, 99).await.unwrap();
        assert!(result.employees.is_empty());
    }

    #[tokio::test]
    async fn fully_used_entitlement_yields_no_carry_over() {
        let engine = engine_with(vec![employee(1, date(2017, 1, 4), true)]);
        engine.store().seed_request(
            NewLeaveRequest {
                employee_id: 1,
                leave_type: LeaveType::Annual,
                start_date: date(2023, 3, 1),
                end_date: date(2023, 3, 31),
                days_count: 20.0,
                reason: None,
                is_advance_usage: false,
                overdraft_days: 0.0,
            },
            LeaveStatus::Approved,
        );

        let result = engine.process_year(2023, 99).await.unwrap();
        assert_eq!(result.no_carry_over, 1);
        assert_eq!(result.processed, 0);

        let entries = engine
            .store()
            .find_adjustments(1, 2024, Some(AdjustmentType::CarryOver))
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
