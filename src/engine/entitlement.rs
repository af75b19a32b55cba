use chrono::{Datelike, NaiveDate};

/// First-year accrual: one day per completed service month.
const FIRST_YEAR_CAP: f64 = 11.0;
/// Entitlement after the first full year of service.
const TENURED_BASE: f64 = 15.0;
const TENURED_CAP: f64 = 25.0;
const AVG_DAYS_PER_YEAR: f64 = 365.25;

/// Base annual leave entitlement from hire date and a reference date.
///
/// The first service year accrues one day per completed calendar
/// month, capped at 11; afterwards the entitlement steps up from 15
/// by one day per further service year, capped at 25. A hire date in
/// the future simply yields 0.
pub fn base_entitlement(hire_date: NaiveDate, as_of: NaiveDate) -> f64 {
    if as_of < hire_date {
        return 0.0;
    }
    let days_of_service = (as_of - hire_date).num_days();
    let years_of_service = (days_of_service as f64 / AVG_DAYS_PER_YEAR).floor() as i64;
    if years_of_service == 0 {
        f64::from(completed_months(hire_date, as_of)).min(FIRST_YEAR_CAP)
    } else {
        (TENURED_BASE + (years_of_service - 1) as f64).min(TENURED_CAP)
    }
}

/// Completed service months by exact calendar rollover: a month is
/// complete once the hire day-of-month recurs. Months too short for
/// that day complete on their last day, so someone hired Jan 31
/// finishes the first month on Feb 28 (or 29).
pub fn completed_months(hire_date: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of <= hire_date {
        return 0;
    }
    let mut months = (as_of.year() - hire_date.year()) * 12 + as_of.month() as i32
        - hire_date.month() as i32;
    let rollover_day = hire_date
        .day()
        .min(last_day_of_month(as_of.year(), as_of.month()));
    if as_of.day() < rollover_day {
        months -= 1;
    }
    months.max(0) as u32
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}
