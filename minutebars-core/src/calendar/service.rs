//! Calendar service — trading-day resolution and session boundaries.

use super::holidays::HolidayTable;
use super::schedule::SessionSchedule;
use super::CalendarError;
use crate::domain::SessionWindow;
use chrono::{Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;

/// Why a date is or is not a trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Trading,
    Weekend,
    Holiday,
    /// Shortened session. Treated as non-trading: the output format has no
    /// notion of a partial day.
    EarlyClose,
}

/// Immutable calendar built once per run and shared by reference.
#[derive(Debug, Clone)]
pub struct CalendarService {
    holidays: HolidayTable,
    schedule: SessionSchedule,
}

impl CalendarService {
    pub fn new(holidays: HolidayTable, schedule: SessionSchedule) -> Self {
        Self { holidays, schedule }
    }

    pub fn holidays(&self) -> &HolidayTable {
        &self.holidays
    }

    pub fn schedule(&self) -> &SessionSchedule {
        &self.schedule
    }

    pub fn timezone(&self) -> Tz {
        self.schedule.timezone()
    }

    /// Classify `date`. Weekends win over holiday entries.
    pub fn day_kind(&self, date: NaiveDate) -> DayKind {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return DayKind::Weekend;
        }
        match self.holidays.lookup(date) {
            Some(entry) if entry.early_close => DayKind::EarlyClose,
            Some(_) => DayKind::Holiday,
            None => DayKind::Trading,
        }
    }

    /// True only for full regular sessions.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.day_kind(date) == DayKind::Trading
    }

    /// `(fetch_window, publish_window)` for `date` in UTC.
    pub fn session_windows(
        &self,
        date: NaiveDate,
    ) -> Result<(SessionWindow, SessionWindow), CalendarError> {
        self.schedule.windows_for(date)
    }

    /// Trading days in `[start, end]`, ascending.
    pub fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        start
            .iter_days()
            .take_while(move |d| *d <= end)
            .filter(move |d| self.is_trading_day(*d))
    }

    /// Years in `[start, end]` with no holiday list recorded.
    pub fn uncovered_years(&self, start: NaiveDate, end: NaiveDate) -> Vec<i32> {
        if end < start {
            return Vec::new();
        }
        (start.year()..=end.year())
            .filter(|y| !self.holidays.covers_year(*y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CalendarService {
        let holidays = HolidayTable::from_json_str(
            r#"{"2024": [
                {"Month": 1, "Day": 1, "EarlyClose": false},
                {"Month": 7, "Day": 4, "EarlyClose": false},
                {"Month": 11, "Day": 29, "EarlyClose": true},
                {"Month": 12, "Day": 25, "EarlyClose": false}
            ]}"#,
        )
        .unwrap();
        CalendarService::new(holidays, SessionSchedule::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plain_weekday_is_trading() {
        assert_eq!(service().day_kind(date(2024, 3, 5)), DayKind::Trading);
        assert!(service().is_trading_day(date(2024, 3, 5)));
    }

    #[test]
    fn christmas_is_not_trading() {
        // Wednesday
        assert_eq!(service().day_kind(date(2024, 12, 25)), DayKind::Holiday);
        assert!(!service().is_trading_day(date(2024, 12, 25)));
    }

    #[test]
    fn early_close_counts_as_non_trading() {
        assert_eq!(service().day_kind(date(2024, 11, 29)), DayKind::EarlyClose);
        assert!(!service().is_trading_day(date(2024, 11, 29)));
    }

    #[test]
    fn weekends_are_never_trading() {
        let empty = CalendarService::new(HolidayTable::default(), SessionSchedule::default());
        assert_eq!(empty.day_kind(date(2024, 3, 9)), DayKind::Weekend);
        assert_eq!(empty.day_kind(date(2024, 3, 10)), DayKind::Weekend);
    }

    #[test]
    fn unknown_year_is_holiday_free() {
        // 2030-12-25 is a Wednesday; no 2030 list is loaded.
        assert!(service().is_trading_day(date(2030, 12, 25)));
    }

    #[test]
    fn trading_days_skips_weekend_and_holiday() {
        let days: Vec<_> = service()
            .trading_days(date(2024, 7, 1), date(2024, 7, 8))
            .collect();
        assert_eq!(
            days,
            vec![
                date(2024, 7, 1),
                date(2024, 7, 2),
                date(2024, 7, 3),
                date(2024, 7, 5),
                date(2024, 7, 8),
            ]
        );
    }

    #[test]
    fn trading_days_of_inverted_range_is_empty() {
        assert_eq!(
            service()
                .trading_days(date(2024, 7, 8), date(2024, 7, 1))
                .count(),
            0
        );
    }

    #[test]
    fn uncovered_years_lists_missing_tables() {
        assert_eq!(
            service().uncovered_years(date(2023, 12, 1), date(2025, 1, 5)),
            vec![2023, 2025]
        );
    }

    #[test]
    fn session_windows_delegate_to_schedule() {
        let (fetch, publish) = service().session_windows(date(2024, 3, 5)).unwrap();
        assert!(publish.start > fetch.start);
        assert_eq!(fetch.minute_count(), 481);
        assert_eq!(publish.minute_count(), 451);
    }
}
