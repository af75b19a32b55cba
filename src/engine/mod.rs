pub mod balance;
pub mod carry_over;
pub mod conflict;
pub mod date_span;
pub mod entitlement;
pub mod ledger;
pub mod lifecycle;
pub mod year_end;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::EngineError;
use crate::model::employee::Employee;
use crate::model::leave_request::LeaveRequest;
use crate::store::LeaveStore;

pub use conflict::ConflictCheck;
pub use ledger::{AdjustmentOutcome, RecordAdjustment};
pub use lifecycle::SubmitLeave;
pub use year_end::{BatchResult, CarryOverOutcome, EmployeeCarryOver};

/// Callers pass years straight from user input; reject anything the
/// calendar math cannot represent before a date gets constructed.
pub(crate) fn validate_year(year: i32) -> Result<(), EngineError> {
    if !(1900..=9999).contains(&year) {
        return Err(EngineError::Validation(format!(
            "year {year} is out of range"
        )));
    }
    Ok(())
}

/// Leave engine facade over a persistence collaborator.
///
/// Every operation takes explicit `actor_id`/`as_of` parameters; the
/// engine reads no ambient session or clock state. Operations that
/// read a balance and then write based on it run inside the owning
/// employee's exclusion scope (see [`LeaveEngine::lock_employee`]);
/// pure queries go straight to the store.
pub struct LeaveEngine<S: LeaveStore> {
    store: S,
    locks: Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: LeaveStore> LeaveEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Per-employee mutual-exclusion handle. Serializes every
    /// read-balance-then-write operation on one employee so two
    /// concurrent approvals cannot both pass a check against a stale
    /// snapshot.
    pub(crate) fn lock_employee(&self, employee_id: u64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("employee lock map poisoned");
        locks.entry(employee_id).or_default().clone()
    }

    pub(crate) async fn require_employee(&self, employee_id: u64) -> Result<Employee, EngineError> {
        self.store
            .get_employee(employee_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "employee",
                id: employee_id,
            })
    }

    pub(crate) async fn require_request(&self, request_id: u64) -> Result<LeaveRequest, EngineError> {
        self.store
            .get_leave_request(request_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "leave request",
                id: request_id,
            })
    }
}
