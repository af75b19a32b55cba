use chrono::NaiveDate;

use super::LeaveEngine;
use super::entitlement::base_entitlement;
use crate::error::EngineError;
use crate::model::adjustment::AdjustmentType;
use crate::model::balance::LeaveBalanceSnapshot;
use crate::model::employee::Employee;
use crate::model::leave_request::LeaveStatus;
use crate::store::LeaveStore;

impl<S: LeaveStore> LeaveEngine<S> {
    /// Point-in-time balance view for `(employee, year)`, recomputed
    /// from the store on every call. Read-only; `as_of` is the
    /// reference date for the base entitlement.
    pub async fn snapshot(
        &self,
        employee_id: u64,
        year: i32,
        as_of: NaiveDate,
    ) -> Result<LeaveBalanceSnapshot, EngineError> {
        let employee = self.require_employee(employee_id).await?;
        self.snapshot_with(&employee, year, as_of).await
    }

    pub(crate) async fn snapshot_with(
        &self,
        employee: &Employee,
        year: i32,
        as_of: NaiveDate,
    ) -> Result<LeaveBalanceSnapshot, EngineError> {
        let base_entitlement = base_entitlement(employee.hire_date, as_of);
        let carry_over_leave = self.carry_over_with(employee, year).await?;
        let total_entitlement = base_entitlement + carry_over_leave;

        let approved = self.approved_annual_days(employee.id, year).await?;
        let pending_leave = self
            .annual_days_with_status(employee.id, year, LeaveStatus::Pending)
            .await?;

        // Manual debits and credits ride on the usage side so that
        // total stays base + carry-over exactly.
        let adjustments = self.store().find_adjustments(employee.id, year, None).await?;
        let mut used_leave = approved;
        for entry in &adjustments {
            match entry.adjustment_type {
                AdjustmentType::Subtract => used_leave += entry.amount,
                AdjustmentType::Add | AdjustmentType::CancelUsage => used_leave -= entry.amount,
                AdjustmentType::CarryOver => {}
            }
        }

        // An overdraft must stay visible: remaining is not clamped.
        let remaining_leave = total_entitlement - used_leave;

        Ok(LeaveBalanceSnapshot {
            base_entitlement,
            carry_over_leave,
            total_entitlement,
            used_leave,
            pending_leave,
            remaining_leave,
        })
    }
}
