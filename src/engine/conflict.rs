use chrono::NaiveDate;
use serde::Serialize;

use super::LeaveEngine;
use crate::error::EngineError;
use crate::model::leave_request::LeaveStatus;
use crate::store::{LeaveStore, RequestFilter};

/// Result of an overlap scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictCheck {
    pub has_conflicts: bool,
    pub conflict_count: usize,
}

/// Two inclusive ranges overlap iff each starts no later than the
/// other ends. This single predicate covers partial overlap from
/// either side as well as full containment in both directions.
pub(crate) fn ranges_overlap(
    start: NaiveDate,
    end: NaiveDate,
    other_start: NaiveDate,
    other_end: NaiveDate,
) -> bool {
    start <= other_end && end >= other_start
}

impl<S: LeaveStore> LeaveEngine<S> {
    /// Scans the employee's pending and approved requests (any leave
    /// type) for overlaps with `[start_date, end_date]`.
    /// `exclude_request_id` lets an in-place edit ignore itself.
    /// No side effects.
    pub async fn has_conflict(
        &self,
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_request_id: Option<u64>,
    ) -> Result<ConflictCheck, EngineError> {
        if end_date < start_date {
            return Err(EngineError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let filter = RequestFilter {
            statuses: vec![LeaveStatus::Pending, LeaveStatus::Approved],
            ..RequestFilter::default()
        };
        let existing = self.store().find_leave_requests(employee_id, &filter).await?;

        let conflict_count = existing
            .iter()
            .filter(|request| exclude_request_id != Some(request.id))
            .filter(|request| {
                ranges_overlap(start_date, end_date, request.start_date, request.end_date)
            })
            .count();

        Ok(ConflictCheck {
            has_conflicts: conflict_count > 0,
            conflict_count,
        })
    }
}
