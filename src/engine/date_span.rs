use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::EngineError;

/// Weight of one calendar day: Sunday is free, Saturday counts as a
/// half working day, everything else as a full one.
fn day_weight(date: NaiveDate) -> f64 {
    match date.weekday() {
        Weekday::Sun => 0.0,
        Weekday::Sat => 0.5,
        _ => 1.0,
    }
}

/// Counts leave days over the inclusive range `[start, end]`.
///
/// No holiday calendar is consulted; that simplification is carried
/// over from the source system on purpose.
pub fn count_leave_days(start: NaiveDate, end: NaiveDate) -> Result<f64, EngineError> {
    if end < start {
        return Err(EngineError::InvalidRange { start, end });
    }
    Ok(start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(day_weight)
        .sum())
}
