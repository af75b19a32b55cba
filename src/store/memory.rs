use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::{LeaveStore, RequestFilter};
use crate::error::EngineError;
use crate::model::adjustment::{AdjustmentType, LeaveAdjustment, NewAdjustment};
use crate::model::employee::Employee;
use crate::model::leave_request::{
    LeaveRequest, LeaveStatus, NewLeaveRequest, RequestEdit, StatusChange,
};

/// In-memory store. Backs the test suite and lightweight embeddings
/// that bring their own records instead of a database.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    employees: HashMap<u64, Employee>,
    requests: HashMap<u64, LeaveRequest>,
    adjustments: Vec<LeaveAdjustment>,
    next_request_id: u64,
    next_adjustment_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_employee(&self, employee: Employee) {
        self.lock().employees.insert(employee.id, employee);
    }

    /// Backfills a request in an arbitrary state, e.g. historical
    /// records imported from the surrounding system.
    pub fn seed_request(&self, request: NewLeaveRequest, status: LeaveStatus) -> LeaveRequest {
        let mut tables = self.lock();
        tables.next_request_id += 1;
        let now = Utc::now();
        let row = LeaveRequest {
            id: tables.next_request_id,
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            days_count: request.days_count,
            status,
            reason: request.reason,
            is_advance_usage: request.is_advance_usage,
            overdraft_days: request.overdraft_days,
            approver_id: None,
            rejection_reason: None,
            created_at: Some(now),
            approved_at: (status == LeaveStatus::Approved).then_some(now),
            rejected_at: (status == LeaveStatus::Rejected).then_some(now),
        };
        tables.requests.insert(row.id, row.clone());
        row
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

impl LeaveStore for InMemoryStore {
    async fn get_employee(&self, id: u64) -> Result<Option<Employee>, EngineError> {
        Ok(self.lock().employees.get(&id).cloned())
    }

    async fn list_active_employees(&self) -> Result<Vec<Employee>, EngineError> {
        let mut employees: Vec<Employee> = self
            .lock()
            .employees
            .values()
            .filter(|employee| employee.is_active)
            .cloned()
            .collect();
        employees.sort_by_key(|employee| employee.id);
        Ok(employees)
    }

    async fn get_leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, EngineError> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn find_leave_requests(
        &self,
        employee_id: u64,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        let mut rows: Vec<LeaveRequest> = self
            .lock()
            .requests
            .values()
            .filter(|request| request.employee_id == employee_id && filter.matches(request))
            .cloned()
            .collect();
        rows.sort_by_key(|request| request.id);
        Ok(rows)
    }

    async fn save_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, EngineError> {
        Ok(self.seed_request(request, LeaveStatus::Pending))
    }

    async fn update_leave_request(&self, id: u64, edit: &RequestEdit) -> Result<(), EngineError> {
        let mut tables = self.lock();
        let row = tables.requests.get_mut(&id).ok_or(EngineError::NotFound {
            entity: "leave request",
            id,
        })?;
        row.start_date = edit.start_date;
        row.end_date = edit.end_date;
        row.reason = edit.reason.clone();
        row.days_count = edit.days_count;
        row.is_advance_usage = edit.is_advance_usage;
        row.overdraft_days = edit.overdraft_days;
        Ok(())
    }

    async fn update_leave_request_status(
        &self,
        id: u64,
        change: StatusChange,
    ) -> Result<(), EngineError> {
        let mut tables = self.lock();
        let row = tables.requests.get_mut(&id).ok_or(EngineError::NotFound {
            entity: "leave request",
            id,
        })?;
        row.status = change.status;
        row.approver_id = change.approver_id;
        row.rejection_reason = change.rejection_reason;
        match change.status {
            LeaveStatus::Approved => row.approved_at = Some(Utc::now()),
            LeaveStatus::Rejected => row.rejected_at = Some(Utc::now()),
            _ => {}
        }
        Ok(())
    }

    async fn find_adjustments(
        &self,
        employee_id: u64,
        year: i32,
        adjustment_type: Option<AdjustmentType>,
    ) -> Result<Vec<LeaveAdjustment>, EngineError> {
        Ok(self
            .lock()
            .adjustments
            .iter()
            .filter(|entry| {
                entry.employee_id == employee_id
                    && entry.year == year
                    && adjustment_type.is_none_or(|kind| entry.adjustment_type == kind)
            })
            .cloned()
            .collect())
    }

    async fn append_adjustment(
        &self,
        entry: NewAdjustment,
    ) -> Result<LeaveAdjustment, EngineError> {
        let mut tables = self.lock();
        tables.next_adjustment_id += 1;
        let row = LeaveAdjustment {
            id: tables.next_adjustment_id,
            employee_id: entry.employee_id,
            year: entry.year,
            adjustment_type: entry.adjustment_type,
            amount: entry.amount,
            previous_balance: entry.previous_balance,
            new_balance: entry.new_balance,
            reason: entry.reason,
            created_by: entry.created_by,
            created_at: Some(Utc::now()),
        };
        tables.adjustments.push(row.clone());
        Ok(row)
    }
}
