use chrono::{Datelike, NaiveDate};
use tracing::info;

use super::LeaveEngine;
use super::date_span::count_leave_days;
use super::ledger::{AdjustmentOutcome, RecordAdjustment};
use crate::error::EngineError;
use crate::model::adjustment::AdjustmentType;
use crate::model::leave_request::{
    LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, RequestEdit, StatusChange, UpdateLeave,
};
use crate::store::LeaveStore;

/// Input for a new leave request. The day count is always derived by
/// the engine, never taken from the caller.
#[derive(Debug, Clone)]
pub struct SubmitLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    /// Permit the request even when it overdraws the remaining
    /// balance; the request is then flagged as advance usage.
    pub allow_advance: bool,
}

fn ensure_pending(request: &LeaveRequest, action: &'static str) -> Result<(), EngineError> {
    if request.status.is_terminal() {
        return Err(EngineError::InvalidTransition {
            from: request.status,
            action,
        });
    }
    Ok(())
}

impl<S: LeaveStore> LeaveEngine<S> {
    /* =========================
    Submit
    ========================= */
    pub async fn submit(
        &self,
        input: SubmitLeave,
        as_of: NaiveDate,
    ) -> Result<LeaveRequest, EngineError> {
        let employee = self.require_employee(input.employee_id).await?;

        // 1️⃣ validate dates and derive the day count
        let days_count = count_leave_days(input.start_date, input.end_date)?;

        let lock = self.lock_employee(employee.id);
        let _guard = lock.lock().await;

        // 2️⃣ overlap check against pending and approved requests
        let conflicts = self
            .has_conflict(employee.id, input.start_date, input.end_date, None)
            .await?;
        if conflicts.has_conflicts {
            return Err(EngineError::Conflict {
                count: conflicts.conflict_count,
            });
        }

        // 3️⃣ balance pre-check; only annual leave draws on the balance
        let (is_advance_usage, overdraft_days) = if input.leave_type == LeaveType::Annual {
            let snapshot = self
                .snapshot_with(&employee, input.start_date.year(), as_of)
                .await?;
            check_balance(days_count, snapshot.remaining_leave, input.allow_advance)?
        } else {
            (false, 0.0)
        };

        let saved = self
            .store()
            .save_leave_request(NewLeaveRequest {
                employee_id: employee.id,
                leave_type: input.leave_type,
                start_date: input.start_date,
                end_date: input.end_date,
                days_count,
                reason: input.reason,
                is_advance_usage,
                overdraft_days,
            })
            .await?;

        info!(
            request_id = saved.id,
            employee_id = employee.id,
            days = days_count,
            is_advance_usage,
            "Leave request submitted"
        );
        Ok(saved)
    }

    /* =========================
    Approve
    ========================= */
    /// Allowed only from `pending`, and not by the requester. The
    /// balance check reruns under the employee lock so two
    /// overlapping approvals cannot both pass against a stale
    /// snapshot; approved usage is picked up by the aggregator, no
    /// stored balance is mutated.
    pub async fn approve(
        &self,
        request_id: u64,
        approver_id: u64,
        as_of: NaiveDate,
    ) -> Result<(), EngineError> {
        let request = self.require_request(request_id).await?;
        ensure_pending(&request, "approve")?;
        if request.employee_id == approver_id {
            return Err(EngineError::Validation(
                "a leave request cannot be approved by its requester".into(),
            ));
        }
        let employee = self.require_employee(request.employee_id).await?;

        let lock = self.lock_employee(employee.id);
        let _guard = lock.lock().await;

        // Re-read now that the lock is held.
        let request = self.require_request(request_id).await?;
        ensure_pending(&request, "approve")?;

        if request.leave_type == LeaveType::Annual && !request.is_advance_usage {
            let snapshot = self
                .snapshot_with(&employee, request.start_date.year(), as_of)
                .await?;
            if request.days_count > snapshot.remaining_leave {
                return Err(EngineError::InsufficientBalance {
                    requested: request.days_count,
                    remaining: snapshot.remaining_leave,
                });
            }
        }

        self.store()
            .update_leave_request_status(
                request_id,
                StatusChange {
                    status: LeaveStatus::Approved,
                    approver_id: Some(approver_id),
                    rejection_reason: None,
                },
            )
            .await?;

        info!(
            request_id,
            approver_id,
            employee_id = request.employee_id,
            "Leave request approved"
        );
        Ok(())
    }

    /* =========================
    Reject
    ========================= */
    /// Allowed only from `pending`. No balance effect.
    pub async fn reject(
        &self,
        request_id: u64,
        approver_id: u64,
        reason: Option<String>,
    ) -> Result<(), EngineError> {
        let request = self.require_request(request_id).await?;
        ensure_pending(&request, "reject")?;

        self.store()
            .update_leave_request_status(
                request_id,
                StatusChange {
                    status: LeaveStatus::Rejected,
                    approver_id: Some(approver_id),
                    rejection_reason: reason,
                },
            )
            .await?;

        info!(request_id, approver_id, "Leave request rejected");
        Ok(())
    }

    /* =========================
    Cancel
    ========================= */
    /// Allowed only from `pending`. Cancelling an approved request is
    /// the separate [`LeaveEngine::cancel_approved_usage`] ledger
    /// flow, not a lifecycle transition.
    pub async fn cancel(&self, request_id: u64, actor_id: u64) -> Result<(), EngineError> {
        let request = self.require_request(request_id).await?;
        ensure_pending(&request, "cancel")?;

        self.store()
            .update_leave_request_status(
                request_id,
                StatusChange {
                    status: LeaveStatus::Cancelled,
                    approver_id: None,
                    rejection_reason: None,
                },
            )
            .await?;

        info!(request_id, actor_id, "Leave request cancelled");
        Ok(())
    }

    /* =========================
    Edit
    ========================= */
    /// Reshapes a still-pending request. Conflict and balance checks
    /// rerun against the new range, with the request itself excluded
    /// from the overlap scan.
    pub async fn edit(
        &self,
        request_id: u64,
        update: UpdateLeave,
        allow_advance: bool,
        as_of: NaiveDate,
    ) -> Result<LeaveRequest, EngineError> {
        let request = self.require_request(request_id).await?;
        ensure_pending(&request, "edit")?;
        let employee = self.require_employee(request.employee_id).await?;

        let days_count = count_leave_days(update.start_date, update.end_date)?;

        let lock = self.lock_employee(employee.id);
        let _guard = lock.lock().await;

        let request = self.require_request(request_id).await?;
        ensure_pending(&request, "edit")?;

        let conflicts = self
            .has_conflict(employee.id, update.start_date, update.end_date, Some(request_id))
            .await?;
        if conflicts.has_conflicts {
            return Err(EngineError::Conflict {
                count: conflicts.conflict_count,
            });
        }

        let (is_advance_usage, overdraft_days) = if request.leave_type == LeaveType::Annual {
            let snapshot = self
                .snapshot_with(&employee, update.start_date.year(), as_of)
                .await?;
            check_balance(days_count, snapshot.remaining_leave, allow_advance)?
        } else {
            (false, 0.0)
        };

        self.store()
            .update_leave_request(
                request_id,
                &RequestEdit {
                    start_date: update.start_date,
                    end_date: update.end_date,
                    reason: update.reason,
                    days_count,
                    is_advance_usage,
                    overdraft_days,
                },
            )
            .await?;

        info!(request_id, days = days_count, "Leave request edited");
        self.require_request(request_id).await
    }

    /* =========================
    Cancel approved usage
    ========================= */
    /// Administrative reversal of an approved request. The request
    /// row itself stays approved; the balance is restored through an
    /// auditable `cancel_usage` ledger entry instead of a rewrite of
    /// history.
    pub async fn cancel_approved_usage(
        &self,
        request_id: u64,
        actor_id: u64,
        reason: impl Into<String>,
        as_of: NaiveDate,
    ) -> Result<AdjustmentOutcome, EngineError> {
        let request = self.require_request(request_id).await?;
        if request.status != LeaveStatus::Approved {
            return Err(EngineError::InvalidTransition {
                from: request.status,
                action: "cancel usage of",
            });
        }

        self.record_adjustment(
            RecordAdjustment {
                employee_id: request.employee_id,
                year: request.start_date.year(),
                adjustment_type: AdjustmentType::CancelUsage,
                amount: request.days_count,
                reason: reason.into(),
                actor_id,
            },
            as_of,
        )
        .await
    }
}

fn check_balance(
    requested: f64,
    remaining: f64,
    allow_advance: bool,
) -> Result<(bool, f64), EngineError> {
    if requested <= remaining {
        return Ok((false, 0.0));
    }
    if allow_advance {
        return Ok((true, requested - remaining));
    }
    Err(EngineError::InsufficientBalance {
        requested,
        remaining,
    })
}
