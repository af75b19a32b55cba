use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Kind of a manual balance change. `amount` is stored positive; the
/// sign is applied by type when the adjustment is projected onto a
/// balance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdjustmentType {
    Add,
    Subtract,
    CarryOver,
    CancelUsage,
}

impl AdjustmentType {
    /// Sign applied to `amount` when the entry is projected onto the
    /// remaining balance.
    pub fn balance_sign(&self) -> f64 {
        match self {
            AdjustmentType::Add | AdjustmentType::CarryOver | AdjustmentType::CancelUsage => 1.0,
            AdjustmentType::Subtract => -1.0,
        }
    }
}

/// Append-only audit ledger entry. Never mutated or deleted;
/// `previous_balance`/`new_balance` are point-in-time audit notes, not
/// authoritative state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveAdjustment {
    pub id: u64,
    pub employee_id: u64,
    /// Fiscal/calendar year the adjustment applies to.
    pub year: i32,
    pub adjustment_type: AdjustmentType,
    pub amount: f64,
    pub previous_balance: f64,
    pub new_balance: f64,
    pub reason: String,
    pub created_by: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewAdjustment {
    pub employee_id: u64,
    pub year: i32,
    pub adjustment_type: AdjustmentType,
    pub amount: f64,
    pub previous_balance: f64,
    pub new_balance: f64,
    pub reason: String,
    pub created_by: u64,
}
