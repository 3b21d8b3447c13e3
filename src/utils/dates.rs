//! Calendar month stepping for installment schedules

use chrono::{Months, NaiveDate};

/// Step a date forward by whole calendar months.
///
/// When the day-of-month does not exist in the target month the result
/// clamps to the last valid day (Jan 31 + 1 month = Feb 28/29). Returns
/// `None` only when the result would fall outside chrono's representable
/// range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn steps_by_calendar_months() {
        assert_eq!(add_months(ymd(2024, 1, 15), 1), Some(ymd(2024, 2, 15)));
        assert_eq!(add_months(ymd(2024, 1, 15), 2), Some(ymd(2024, 3, 15)));
        assert_eq!(add_months(ymd(2024, 11, 10), 3), Some(ymd(2025, 2, 10)));
    }

    #[test]
    fn clamps_month_end() {
        // leap year February
        assert_eq!(add_months(ymd(2024, 1, 31), 1), Some(ymd(2024, 2, 29)));
        assert_eq!(add_months(ymd(2023, 1, 31), 1), Some(ymd(2023, 2, 28)));
        assert_eq!(add_months(ymd(2024, 3, 31), 1), Some(ymd(2024, 4, 30)));
    }
}
