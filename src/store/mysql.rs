use sqlx::MySqlPool;

use super::{LeaveStore, RequestFilter};
use crate::error::EngineError;
use crate::model::adjustment::{AdjustmentType, LeaveAdjustment, NewAdjustment};
use crate::model::employee::Employee;
use crate::model::leave_request::{
    LeaveRequest, LeaveStatus, NewLeaveRequest, RequestEdit, StatusChange,
};

const EMPLOYEE_COLUMNS: &str = "id, employee_code, hire_date, is_active";

const REQUEST_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, days_count, \
     status, reason, is_advance_usage, overdraft_days, approver_id, rejection_reason, \
     created_at, approved_at, rejected_at";

const ADJUSTMENT_COLUMNS: &str = "id, employee_id, year, adjustment_type, amount, \
     previous_balance, new_balance, reason, created_by, created_at";

/// MySQL-backed store. Queries are built and bound at runtime so the
/// crate compiles without a live schema; status-changing updates are
/// guarded with `AND status = 'pending'` so a row that was decided
/// elsewhere is never silently overwritten.
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl LeaveStore for MySqlLeaveStore {
    async fn get_employee(&self, id: u64) -> Result<Option<Employee>, EngineError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn list_active_employees(&self) -> Result<Vec<Employee>, EngineError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE is_active = 1 ORDER BY id");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, EngineError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        let request = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }

    async fn find_leave_requests(
        &self,
        employee_id: u64,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE employee_id = ?");

        if filter.leave_type.is_some() {
            sql.push_str(" AND leave_type = ?");
        }
        if !filter.statuses.is_empty() {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({placeholders})"));
        }
        if filter.date_range.is_some() {
            sql.push_str(" AND start_date BETWEEN ? AND ?");
        }
        sql.push_str(" ORDER BY start_date, id");

        // -------------------------
        // Bind in clause order
        // -------------------------
        let mut query = sqlx::query_as::<_, LeaveRequest>(&sql).bind(employee_id);
        if let Some(leave_type) = filter.leave_type {
            query = query.bind(leave_type);
        }
        for status in &filter.statuses {
            query = query.bind(*status);
        }
        if let Some((from, to)) = filter.date_range {
            query = query.bind(from).bind(to);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn save_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, EngineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, days_count,
                 reason, is_advance_usage, overdraft_days, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days_count)
        .bind(request.reason)
        .bind(request.is_advance_usage)
        .bind(request.overdraft_days)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.get_leave_request(id)
            .await?
            .ok_or_else(|| EngineError::Storage(anyhow::anyhow!(
                "leave request {id} not readable back after insert"
            )))
    }

    async fn update_leave_request(&self, id: u64, edit: &RequestEdit) -> Result<(), EngineError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, days_count = ?, reason = ?,
                is_advance_usage = ?, overdraft_days = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(edit.start_date)
        .bind(edit.end_date)
        .bind(edit.days_count)
        .bind(edit.reason.clone())
        .bind(edit.is_advance_usage)
        .bind(edit.overdraft_days)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound {
                entity: "pending leave request",
                id,
            });
        }
        Ok(())
    }

    async fn update_leave_request_status(
        &self,
        id: u64,
        change: StatusChange,
    ) -> Result<(), EngineError> {
        let result = match change.status {
            LeaveStatus::Approved => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = 'approved', approver_id = ?, approved_at = NOW()
                    WHERE id = ?
                    AND status = 'pending'
                    "#,
                )
                .bind(change.approver_id)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            LeaveStatus::Rejected => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = 'rejected', approver_id = ?, rejection_reason = ?, rejected_at = NOW()
                    WHERE id = ?
                    AND status = 'pending'
                    "#,
                )
                .bind(change.approver_id)
                .bind(change.rejection_reason)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            LeaveStatus::Cancelled => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = 'cancelled'
                    WHERE id = ?
                    AND status = 'pending'
                    "#,
                )
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            LeaveStatus::Pending => {
                return Err(EngineError::Validation(
                    "a leave request cannot be moved back to pending".into(),
                ));
            }
        };

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound {
                entity: "pending leave request",
                id,
            });
        }
        Ok(())
    }

    async fn find_adjustments(
        &self,
        employee_id: u64,
        year: i32,
        adjustment_type: Option<AdjustmentType>,
    ) -> Result<Vec<LeaveAdjustment>, EngineError> {
        let mut sql = format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM leave_adjustments WHERE employee_id = ? AND year = ?"
        );
        if adjustment_type.is_some() {
            sql.push_str(" AND adjustment_type = ?");
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query_as::<_, LeaveAdjustment>(&sql)
            .bind(employee_id)
            .bind(year);
        if let Some(kind) = adjustment_type {
            query = query.bind(kind);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn append_adjustment(
        &self,
        entry: NewAdjustment,
    ) -> Result<LeaveAdjustment, EngineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_adjustments
                (employee_id, year, adjustment_type, amount,
                 previous_balance, new_balance, reason, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.employee_id)
        .bind(entry.year)
        .bind(entry.adjustment_type)
        .bind(entry.amount)
        .bind(entry.previous_balance)
        .bind(entry.new_balance)
        .bind(entry.reason)
        .bind(entry.created_by)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        let sql = format!("SELECT {ADJUSTMENT_COLUMNS} FROM leave_adjustments WHERE id = ?");
        sqlx::query_as::<_, LeaveAdjustment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| EngineError::Storage(anyhow::anyhow!(
                "leave adjustment {id} not readable back after insert"
            )))
    }
}
