use chrono::NaiveDate;

use crate::model::leave_request::LeaveStatus;

/// Engine error kinds. All are recoverable at the caller's discretion;
/// none are fatal to the process and the engine never retries.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("cannot {action} a leave request in state '{from}'")]
    InvalidTransition {
        from: LeaveStatus,
        action: &'static str,
    },

    #[error("requested range overlaps {count} existing leave request(s)")]
    Conflict { count: usize },

    #[error("insufficient balance: requested {requested} day(s) with {remaining} remaining")]
    InsufficientBalance { requested: f64, remaining: f64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("{0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Storage(err.into())
    }
}
