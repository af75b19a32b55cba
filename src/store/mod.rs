pub mod memory;
pub mod mysql;

use chrono::NaiveDate;

use crate::error::EngineError;
use crate::model::adjustment::{AdjustmentType, LeaveAdjustment, NewAdjustment};
use crate::model::employee::Employee;
use crate::model::leave_request::{
    LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, RequestEdit, StatusChange,
};

/// Typed filter for leave-request lookups. Replaces the ad hoc query
/// objects of the source system with enumerated optional fields.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub leave_type: Option<LeaveType>,
    /// Empty matches any status.
    pub statuses: Vec<LeaveStatus>,
    /// Inclusive bounds on `start_date`.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl RequestFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        if let Some(leave_type) = self.leave_type {
            if request.leave_type != leave_type {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&request.status) {
            return false;
        }
        if let Some((from, to)) = self.date_range {
            if request.start_date < from || request.start_date > to {
                return false;
            }
        }
        true
    }
}

/// Persistence collaborator the engine reads and writes through.
///
/// Adjustments are append-only: no update or delete is exposed, the
/// ledger is the audit trail. Timestamps (`created_at`,
/// `approved_at`/`rejected_at`) are stamped by the store.
#[allow(async_fn_in_trait)]
pub trait LeaveStore: Send + Sync {
    async fn get_employee(&self, id: u64) -> Result<Option<Employee>, EngineError>;

    async fn list_active_employees(&self) -> Result<Vec<Employee>, EngineError>;

    async fn get_leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, EngineError>;

    async fn find_leave_requests(
        &self,
        employee_id: u64,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, EngineError>;

    /// Inserts a new request in `pending` state.
    async fn save_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, EngineError>;

    /// Rewrites the mutable fields of a still-pending request.
    async fn update_leave_request(&self, id: u64, edit: &RequestEdit) -> Result<(), EngineError>;

    /// Moves a pending request into a terminal state.
    async fn update_leave_request_status(
        &self,
        id: u64,
        change: StatusChange,
    ) -> Result<(), EngineError>;

    async fn find_adjustments(
        &self,
        employee_id: u64,
        year: i32,
        adjustment_type: Option<AdjustmentType>,
    ) -> Result<Vec<LeaveAdjustment>, EngineError>;

    async fn append_adjustment(
        &self,
        entry: NewAdjustment,
    ) -> Result<LeaveAdjustment, EngineError>;
}
