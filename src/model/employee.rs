use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Employee record as seen by the engine. Owned by the external user
/// directory; read-only here. Inactive employees are skipped by batch
/// processing but keep their historical balances.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub hire_date: NaiveDate,
    pub is_active: bool,
}
