//! Session schedule — the exchange timezone and the fixed daily boundaries.

use super::CalendarError;
use chrono::{NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain::SessionWindow;

/// Exchange-local boundaries used to build the fetch and publish windows.
///
/// Invariant: `fetch_start < publish_start < end`, all on whole minutes.
/// The gap between `fetch_start` and `publish_start` is the warm-up history
/// that guarantees a reference close exists before the first published minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSchedule {
    tz: Tz,
    fetch_start: NaiveTime,
    publish_start: NaiveTime,
    end: NaiveTime,
}

impl SessionSchedule {
    pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

    pub fn new(
        tz: Tz,
        fetch_start: NaiveTime,
        publish_start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, CalendarError> {
        for t in [fetch_start, publish_start, end] {
            if t.second() != 0 || t.nanosecond() != 0 {
                return Err(CalendarError::InvalidSchedule(format!(
                    "boundary {t} is not on a whole minute"
                )));
            }
        }
        if fetch_start >= publish_start {
            return Err(CalendarError::InvalidSchedule(format!(
                "publish start {publish_start} must be after fetch start {fetch_start}"
            )));
        }
        if publish_start >= end {
            return Err(CalendarError::InvalidSchedule(format!(
                "session end {end} must be after publish start {publish_start}"
            )));
        }
        Ok(Self {
            tz,
            fetch_start,
            publish_start,
            end,
        })
    }

    /// Build a schedule from a timezone name and `HH:MM` strings.
    pub fn parse(
        timezone: &str,
        fetch_start: &str,
        publish_start: &str,
        end: &str,
    ) -> Result<Self, CalendarError> {
        let tz = timezone
            .parse::<Tz>()
            .map_err(|_| CalendarError::UnknownTimezone(timezone.to_string()))?;
        Self::new(
            tz,
            parse_hhmm(fetch_start)?,
            parse_hhmm(publish_start)?,
            parse_hhmm(end)?,
        )
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn fetch_start(&self) -> NaiveTime {
        self.fetch_start
    }

    pub fn publish_start(&self) -> NaiveTime {
        self.publish_start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Fetch and publish windows for `date`, converted to UTC.
    pub fn windows_for(
        &self,
        date: NaiveDate,
    ) -> Result<(SessionWindow, SessionWindow), CalendarError> {
        let fetch_start = self.instant(date, self.fetch_start)?;
        let publish_start = self.instant(date, self.publish_start)?;
        let end = self.instant(date, self.end)?;
        Ok((
            SessionWindow::new(fetch_start, end),
            SessionWindow::new(publish_start, end),
        ))
    }

    fn instant(&self, date: NaiveDate, time: NaiveTime) -> Result<chrono::DateTime<Utc>, CalendarError> {
        self.tz
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(CalendarError::NonexistentLocalTime { date, time })
    }
}

impl Default for SessionSchedule {
    /// 08:00 fetch start, 08:30 publish start, 16:00 end, New York time.
    fn default() -> Self {
        Self {
            tz: Self::DEFAULT_TIMEZONE,
            fetch_start: hm(8, 0),
            publish_start: hm(8, 30),
            end: hm(16, 0),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("literal session boundary is a valid time")
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, CalendarError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| CalendarError::InvalidSchedule(format!("'{s}' is not an HH:MM time")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_in_winter_are_utc_minus_five() {
        let schedule = SessionSchedule::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let (fetch, publish) = schedule.windows_for(date).unwrap();
        assert_eq!(fetch.start, Utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap());
        assert_eq!(publish.start, Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap());
        assert_eq!(fetch.end, Utc.with_ymd_and_hms(2024, 3, 5, 21, 0, 0).unwrap());
        assert_eq!(fetch.end, publish.end);
    }

    #[test]
    fn default_windows_in_summer_follow_daylight_saving() {
        let schedule = SessionSchedule::default();
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        let (fetch, _) = schedule.windows_for(date).unwrap();
        assert_eq!(fetch.start, Utc.with_ymd_and_hms(2024, 7, 9, 12, 0, 0).unwrap());
        assert_eq!(fetch.minute_count(), 481);
    }

    #[test]
    fn parse_accepts_hhmm() {
        let schedule = SessionSchedule::parse("America/Chicago", "07:00", "07:30", "15:00").unwrap();
        assert_eq!(schedule.timezone(), chrono_tz::America::Chicago);
        assert_eq!(schedule.publish_start(), hm(7, 30));
    }

    #[test]
    fn parse_rejects_unknown_timezone() {
        let err = SessionSchedule::parse("Mars/Olympus", "08:00", "08:30", "16:00").unwrap_err();
        assert!(matches!(err, CalendarError::UnknownTimezone(_)));
    }

    #[test]
    fn publish_must_start_after_fetch() {
        let err = SessionSchedule::new(SessionSchedule::DEFAULT_TIMEZONE, hm(8, 30), hm(8, 30), hm(16, 0))
            .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidSchedule(_)));
    }

    #[test]
    fn end_must_follow_publish_start() {
        let err = SessionSchedule::parse("America/New_York", "08:00", "08:30", "08:15").unwrap_err();
        assert!(matches!(err, CalendarError::InvalidSchedule(_)));
    }

    #[test]
    fn nonexistent_local_time_is_reported() {
        // 02:30 does not exist in New York on the spring-forward date.
        let schedule =
            SessionSchedule::parse("America/New_York", "02:30", "03:30", "16:00").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let err = schedule.windows_for(date).unwrap_err();
        assert!(matches!(err, CalendarError::NonexistentLocalTime { .. }));
    }
}
