use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Only `annual` leave participates in entitlement and balance math;
/// the other types still go through conflict detection and the
/// request lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Family,
    Unpaid,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Always derived from the date range by the engine, never taken
    /// from external input.
    pub days_count: f64,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    /// Set when the request was granted against a negative remaining
    /// balance (explicit advance-usage override).
    pub is_advance_usage: bool,
    pub overdraft_days: f64,
    pub approver_id: Option<u64>,
    pub rejection_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// Insert payload; the store assigns `id` and `created_at` and the
/// request always starts out `pending`.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_count: f64,
    pub reason: Option<String>,
    pub is_advance_usage: bool,
    pub overdraft_days: f64,
}

/// Caller-supplied fields of an in-place edit of a pending request.
#[derive(Debug, Clone)]
pub struct UpdateLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Full edit as written to the store, with the engine-derived fields.
#[derive(Debug, Clone)]
pub struct RequestEdit {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub days_count: f64,
    pub is_advance_usage: bool,
    pub overdraft_days: f64,
}

/// Metadata applied together with a status transition. The store
/// stamps `approved_at`/`rejected_at`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub rejection_reason: Option<String>,
}
