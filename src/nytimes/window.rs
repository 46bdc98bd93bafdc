//! The trailing date window searched on every call.

use chrono::{Days, NaiveDate, Utc};

/// Number of calendar days the search window reaches back.
pub const WINDOW_DAYS: u64 = 30;

/// Inclusive `[begin, end]` date range in upstream `YYYYMMDD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First day searched.
    pub begin: NaiveDate,
    /// Last day searched.
    pub end: NaiveDate,
}

impl DateWindow {
    /// The window ending on `today` and starting [`WINDOW_DAYS`] calendar
    /// days earlier.
    ///
    /// Uses calendar arithmetic on dates, never elapsed-time subtraction, so
    /// DST and timezone offsets cannot move either boundary.
    #[must_use]
    pub fn ending_on(today: NaiveDate) -> Self {
        let begin = today
            .checked_sub_days(Days::new(WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);
        Self { begin, end: today }
    }

    /// `begin_date` query value.
    #[must_use]
    pub fn begin_param(&self) -> String {
        format_param(self.begin)
    }

    /// `end_date` query value.
    #[must_use]
    pub fn end_param(&self) -> String {
        format_param(self.end)
    }
}

/// The current date in UTC.
#[must_use]
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn format_param(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mid_march_2024() {
        let window = DateWindow::ending_on(date(2024, 3, 15));
        assert_eq!(window.begin_param(), "20240214");
        assert_eq!(window.end_param(), "20240315");
    }

    #[test]
    fn crosses_leap_day() {
        let window = DateWindow::ending_on(date(2024, 3, 1));
        assert_eq!(window.begin_param(), "20240131");
    }

    #[test]
    fn crosses_year_boundary() {
        let window = DateWindow::ending_on(date(2024, 1, 10));
        assert_eq!(window.begin_param(), "20231211");
        assert_eq!(window.end_param(), "20240110");
    }

    #[test]
    fn spans_dst_transitions() {
        // US and EU clocks change inside these windows.
        let window = DateWindow::ending_on(date(2024, 3, 31));
        assert_eq!(window.begin_param(), "20240301");
        let window = DateWindow::ending_on(date(2024, 11, 5));
        assert_eq!(window.begin_param(), "20241006");
    }

    #[test]
    fn params_are_eight_digits() {
        let window = DateWindow::ending_on(utc_today());
        assert_eq!(window.begin_param().len(), 8);
        assert!(window.end_param().chars().all(|c| c.is_ascii_digit()));
    }

    proptest! {
        #[test]
        fn prop_window_is_exactly_thirty_days(offset in 0i64..40_000) {
            let today = date(1950, 1, 1) + chrono::Duration::days(offset);
            let window = DateWindow::ending_on(today);
            prop_assert_eq!(window.end, today);
            prop_assert_eq!((window.end - window.begin).num_days(), 30);
            prop_assert!(window.begin_param() < window.end_param());
        }
    }
}
