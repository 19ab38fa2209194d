//! Calendar-month date windows
//!
//! Every list endpoint and the monthly metric filter by the same window: from
//! local midnight on day 1 of the month to one millisecond before local
//! midnight on day 1 of the next month, inclusive on both ends.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

/// Inclusive `[start, end]` window covering one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// Window for a 1-based month in the server's local time zone
    pub fn local(year: i32, month: u32) -> Option<Self> {
        Self::in_zone(year, month, &Local)
    }

    /// Window for a 1-based month in an arbitrary time zone.
    ///
    /// Returns `None` for a month outside 1..=12 or a year chrono cannot represent.
    pub fn in_zone<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        let start = start_of_day(first, tz)?;
        let end = start_of_day(next_first, tz)? - Duration::milliseconds(1);

        Some(Self { start, end })
    }

    /// Window for raw query integers, checking they fit the calendar
    pub fn from_query(year: i64, month: i64) -> Option<Self> {
        let year = i32::try_from(year).ok()?;
        let month = u32::try_from(month).ok()?;
        Self::local(year, month)
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn contains_millis(&self, millis: i64) -> bool {
        (self.start_millis()..=self.end_millis()).contains(&millis)
    }
}

/// First instant of a calendar day in `tz`.
///
/// Where a DST transition skips midnight, the first existing local time of
/// the day is used; where midnight repeats, the earlier one.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    (1..=24 * 4)
        .map(|quarter| midnight + Duration::minutes(15 * quarter))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a `year`/`month` query value.
///
/// Absent, non-numeric and zero values all mean "not given".
pub fn parse_period_param(raw: Option<&str>) -> Option<i64> {
    let trimmed = raw?.trim();
    let value = trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15)
                .map(|n| n as i64)
        })?;
    (value != 0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset, Timelike};

    fn assert_window_shape<Tz: TimeZone>(window: &MonthWindow, year: i32, month: u32, tz: &Tz) {
        let start = window.start.with_timezone(tz);
        let end = window.end.with_timezone(tz);
        assert_eq!((start.year(), start.month(), start.day()), (year, month, 1));
        assert_eq!((end.year(), end.month()), (year, month));
        assert_eq!(start.hour(), 0);
        assert_eq!(end.nanosecond() / 1_000_000, 999);
    }

    #[test]
    fn window_start_and_end_stay_in_month_for_every_month() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        for year in [1999, 2023, 2024, 2100] {
            for month in 1..=12 {
                let window = MonthWindow::in_zone(year, month, &brt).unwrap();
                assert_window_shape(&window, year, month, &brt);
            }
        }
    }

    #[test]
    fn window_end_is_next_start_minus_one_millisecond() {
        for (year, month) in [(2024, 1), (2024, 2), (2024, 11), (2024, 12)] {
            let this = MonthWindow::local(year, month).unwrap();
            let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
            let next = MonthWindow::local(ny, nm).unwrap();
            assert_eq!(this.end_millis(), next.start_millis() - 1);
        }
    }

    #[test]
    fn window_in_local_zone_stays_in_month() {
        for month in 1..=12 {
            let window = MonthWindow::local(2025, month).unwrap();
            assert_window_shape(&window, 2025, month, &Local);
        }
    }

    #[test]
    fn leap_february_includes_29th_and_excludes_march_first() {
        let window = MonthWindow::in_zone(2024, 2, &Utc).unwrap();
        let feb29 = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let mar1 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert!(window.contains_millis(feb29.timestamp_millis()));
        assert!(!window.contains_millis(mar1.timestamp_millis()));
        assert_eq!(window.end, mar1 - Duration::milliseconds(1));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = MonthWindow::in_zone(2023, 6, &Utc).unwrap();
        assert!(window.contains_millis(window.start_millis()));
        assert!(window.contains_millis(window.end_millis()));
        assert!(!window.contains_millis(window.start_millis() - 1));
        assert!(!window.contains_millis(window.end_millis() + 1));
    }

    #[test]
    fn window_uses_zone_offset() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let window = MonthWindow::in_zone(2024, 5, &brt).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap());
    }

    #[test]
    fn invalid_months_have_no_window() {
        assert!(MonthWindow::local(2024, 0).is_none());
        assert!(MonthWindow::local(2024, 13).is_none());
        assert!(MonthWindow::from_query(2024, -1).is_none());
        assert!(MonthWindow::from_query(i64::MAX, 3).is_none());
    }

    #[test]
    fn parse_period_param_treats_junk_and_zero_as_absent() {
        assert_eq!(parse_period_param(Some("2024")), Some(2024));
        assert_eq!(parse_period_param(Some(" 02 ")), Some(2));
        assert_eq!(parse_period_param(Some("3.0")), Some(3));
        assert_eq!(parse_period_param(Some("0")), None);
        assert_eq!(parse_period_param(Some("")), None);
        assert_eq!(parse_period_param(Some("fev")), None);
        assert_eq!(parse_period_param(Some("2.5")), None);
        assert_eq!(parse_period_param(None), None);
    }
}
