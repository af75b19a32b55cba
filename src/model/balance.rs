use serde::Serialize;

/// Point-in-time balance view for one employee and year. Recomputed
/// on demand, never persisted as authoritative state.
///
/// Invariants: `total_entitlement = base_entitlement + carry_over_leave`
/// and `remaining_leave = total_entitlement - used_leave`. Pending
/// usage is reported separately, not subtracted, and a negative
/// remaining balance is surfaced as-is so administrative overdrafts
/// stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeaveBalanceSnapshot {
    pub base_entitlement: f64,
    pub carry_over_leave: f64,
    pub total_entitlement: f64,
    pub used_leave: f64,
    pub pending_leave: f64,
    pub remaining_leave: f64,
}
