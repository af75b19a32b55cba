use chrono::{Datelike, NaiveDate};

use super::LeaveEngine;
use super::entitlement::base_entitlement;
use crate::error::EngineError;
use crate::model::adjustment::AdjustmentType;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveStatus, LeaveType};
use crate::store::{LeaveStore, RequestFilter};

/// Hard cap on the automatically computed carry-over component. The
/// manual ledger is not subject to it.
pub const AUTOMATIC_CARRY_OVER_CAP: f64 = 15.0;

impl<S: LeaveStore> LeaveEngine<S> {
    /// Total carry-over credited to `(employee, target_year)`: the
    /// manually recorded `carry_over` ledger entries plus the capped
    /// automatic component computed from the preceding year.
    ///
    /// Read-only and idempotent; the year-end batch owns the writes.
    pub async fn carry_over_for_year(
        &self,
        employee_id: u64,
        target_year: i32,
    ) -> Result<f64, EngineError> {
        let employee = self.require_employee(employee_id).await?;
        self.carry_over_with(&employee, target_year).await
    }

    pub(crate) async fn carry_over_with(
        &self,
        employee: &Employee,
        target_year: i32,
    ) -> Result<f64, EngineError> {
        super::validate_year(target_year)?;
        let manual = self.manual_carry_over(employee.id, target_year).await?;
        let automatic = self.automatic_carry_over(employee, target_year).await?;
        Ok(manual + automatic)
    }

    async fn manual_carry_over(&self, employee_id: u64, target_year: i32) -> Result<f64, EngineError> {
        let entries = self
            .store()
            .find_adjustments(employee_id, target_year, Some(AdjustmentType::CarryOver))
            .await?;
        Ok(entries.iter().map(|entry| entry.amount).sum())
    }

    /// Unused entitlement carried in from `target_year - 1`, capped.
    /// Zero when the employee was not yet employed in the prior year.
    pub(crate) async fn automatic_carry_over(
        &self,
        employee: &Employee,
        target_year: i32,
    ) -> Result<f64, EngineError> {
        if employee.hire_date.year() >= target_year {
            return Ok(0.0);
        }
        let unused = self.unused_entitlement(employee, target_year - 1).await?;
        Ok(unused.min(AUTOMATIC_CARRY_OVER_CAP))
    }

    /// `max(0, entitlement - approved annual usage)` for `year`, with
    /// the entitlement taken as of Dec 31 of that year and usage
    /// attributed by request start date.
    pub(crate) async fn unused_entitlement(
        &self,
        employee: &Employee,
        year: i32,
    ) -> Result<f64, EngineError> {
        let entitlement = base_entitlement(employee.hire_date, year_end_date(year));
        let used = self.approved_annual_days(employee.id, year).await?;
        Ok((entitlement - used).max(0.0))
    }

    pub(crate) async fn approved_annual_days(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<f64, EngineError> {
        self.annual_days_with_status(employee_id, year, LeaveStatus::Approved)
            .await
    }

    pub(crate) async fn annual_days_with_status(
        &self,
        employee_id: u64,
        year: i32,
        status: LeaveStatus,
    ) -> Result<f64, EngineError> {
        let filter = RequestFilter {
            leave_type: Some(LeaveType::Annual),
            statuses: vec![status],
            date_range: Some(year_bounds(year)),
        };
        let requests = self.store().find_leave_requests(employee_id, &filter).await?;
        Ok(requests.iter().map(|request| request.days_count).sum())
    }
}

pub(crate) fn year_bounds(year: i32) -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(year, 1, 1).expect("valid calendar date"),
        year_end_date(year),
    )
}

pub(crate) fn year_end_date(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).expect("valid calendar date")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::engine::LeaveEngine;
    use crate::model::adjustment::AdjustmentType;
    use crate::model::employee::Employee;
    use crate::model::leave_request::{LeaveStatus, LeaveType, NewLeaveRequest};
    use crate::store::memory::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(id: u64, hire_date: NaiveDate) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP-{id:03}"),
            hire_date,
            is_active: true,
        }
    }

    fn engine_with(employees: Vec<Employee>) -> LeaveEngine<InMemoryStore> {
        let store = InMemoryStore::new();
        for e in employees {
            store.insert_employee(e);
        }
        LeaveEngine::new(store)
    }

    fn approved_annual(employee_id: u64, start: NaiveDate, end: NaiveDate, days: f64) -> NewLeaveRequest {
        NewLeaveRequest {
            employee_id,
            leave_type: LeaveType::Annual,
            start_date: start,
            end_date: end,
            days_count: days,
            reason: None,
            is_advance_usage: false,
            overdraft_days: 0.0,
        }
    }

    #[tokio::test]
    async fn unused_entitlement_carries_over_under_the_cap() {
        // Hired 2017: 20 days entitlement by the end of 2023, 8 used.
        let engine = engine_with(vec![employee(1, date(2017, 1, 4))]);
        engine.store().seed_request(
            approved_annual(1, date(2023, 5, 1), date(2023, 5, 10), 8.0),
            LeaveStatus::Approved,
        );

        assert_eq!(engine.carry_over_for_year(1, 2024).await.unwrap(), 12.0);
    }

    #[tokio::test]
    async fn automatic_component_is_capped_at_fifteen() {
        // Hired 2000: 25 days entitlement, nothing used.
        let engine = engine_with(vec![employee(1, date(2000, 1, 4))]);
        assert_eq!(engine.carry_over_for_year(1, 2024).await.unwrap(), 15.0);
    }

    #[tokio::test]
    async fn manual_entries_add_on_top_of_the_automatic_component() {
        let engine = engine_with(vec![employee(1, date(2017, 1, 4))]);
        engine.store().seed_request(
            approved_annual(1, date(2023, 5, 1), date(2023, 5, 10), 8.0),
            LeaveStatus::Approved,
        );
        engine
            .record_adjustment(
                crate::engine::RecordAdjustment {
                    employee_id: 1,
                    year: 2024,
                    adjustment_type: AdjustmentType::CarryOver,
                    amount: 3.0,
                    reason: "negotiated carry-over".into(),
                    actor_id: 99,
                },
                date(2024, 1, 2),
            )
            .await
            .unwrap();

        assert_eq!(engine.carry_over_for_year(1, 2024).await.unwrap(), 15.0);
    }

    #[tokio::test]
    async fn no_automatic_carry_over_before_the_first_full_year() {
        // Hired during the target year: nothing to carry in.
        let engine = engine_with(vec![employee(1, date(2024, 3, 1))]);
        assert_eq!(engine.carry_over_for_year(1, 2024).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn repeated_reads_return_the_same_value() {
        let engine = engine_with(vec![employee(1, date(2017, 1, 4))]);
        let first = engine.carry_over_for_year(1, 2024).await.unwrap();
        let second = engine.carry_over_for_year(1, 2024).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_employee_is_reported() {
        let engine = engine_with(vec![]);
        let err = engine.carry_over_for_year(7, 2024).await.unwrap_err();
        assert!(matches!(err, crate::error::EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn out_of_range_years_are_rejected() {
        let engine = engine_with(vec![employee(1, date(2017, 1, 4))]);
        let err = engine.carry_over_for_year(1, 99999).await.unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Validation(_)));
    }
}
