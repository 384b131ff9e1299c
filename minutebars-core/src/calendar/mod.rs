//! Trading calendar: holiday table, session schedule, calendar service.

pub mod holidays;
pub mod schedule;
pub mod service;

pub use holidays::{HolidayEntry, HolidayTable};
pub use schedule::SessionSchedule;
pub use service::{CalendarService, DayKind};

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Calendar setup and lookup errors.
///
/// Every configuration variant is fatal for the whole run: without a
/// trustworthy holiday table the trading days cannot be determined.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("cannot read holiday configuration {path}: {source}")]
    ConfigurationRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse holiday configuration: {0}")]
    ConfigurationParse(String),

    #[error("holiday configuration has a non-numeric year key '{0}'")]
    InvalidYearKey(String),

    #[error("holiday configuration has an impossible date {year}-{month:02}-{day:02}")]
    InvalidHolidayEntry { year: i32, month: u32, day: u32 },

    #[error("holiday configuration lists {year}-{month:02}-{day:02} more than once")]
    DuplicateHoliday { year: i32, month: u32, day: u32 },

    #[error("holiday configuration lists year {0} more than once")]
    DuplicateYear(i32),

    #[error("invalid session schedule: {0}")]
    InvalidSchedule(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("local time {time} on {date} does not exist or is ambiguous in the exchange timezone")]
    NonexistentLocalTime { date: NaiveDate, time: NaiveTime },
}
