//! Minutebars Core — trading calendar, series repair, session projection, bar providers.
//!
//! This crate holds everything between "which days do we publish" and "which
//! rows go in the file":
//! - Domain types (minute bars, session windows)
//! - Holiday table and exchange session schedule
//! - Gap repair with flat-fill synthesis
//! - Projection of a repaired series onto the publish window
//! - Bar providers (Alpaca, CSV replay)
//!
//! File layout and the per-day export loop live in `minutebars-runner`.

pub mod calendar;
pub mod data;
pub mod domain;
pub mod projection;
pub mod repair;

pub use calendar::{CalendarError, CalendarService, DayKind, HolidayTable, SessionSchedule};
pub use data::{BarProvider, ProviderError};
pub use domain::{MinuteBar, SessionWindow};
pub use projection::{project, OutputRow, ProjectionError, OUTPUT_HEADER};
pub use repair::{repair_series, RepairError, RepairedSeries};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: shared types can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<MinuteBar>();
        require_sync::<MinuteBar>();
        require_send::<SessionWindow>();
        require_sync::<SessionWindow>();
        require_send::<CalendarService>();
        require_sync::<CalendarService>();
        require_send::<RepairedSeries>();
        require_sync::<RepairedSeries>();
        require_send::<OutputRow>();
        require_sync::<OutputRow>();

        require_send::<data::AlpacaProvider>();
        require_sync::<data::AlpacaProvider>();
        require_send::<data::CsvReplayProvider>();
        require_sync::<data::CsvReplayProvider>();
        require_send::<Box<dyn BarProvider>>();
        require_sync::<Box<dyn BarProvider>>();

        require_send::<CalendarError>();
        require_sync::<CalendarError>();
        require_send::<ProviderError>();
        require_sync::<ProviderError>();
    }
}
