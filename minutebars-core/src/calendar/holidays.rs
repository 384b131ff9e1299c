//! Exchange holiday table.
//!
//! Loaded once per run from a JSON document keyed by year:
//!
//! ```json
//! { "2024": [ { "Month": 1, "Day": 1, "EarlyClose": false },
//!             { "Month": 11, "Day": 29, "EarlyClose": true } ] }
//! ```
//!
//! The table is validated on load and immutable afterwards.

use super::CalendarError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// A non-trading or shortened exchange day within a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HolidayEntry {
    #[serde(rename = "Month", alias = "month")]
    pub month: u32,
    #[serde(rename = "Day", alias = "day")]
    pub day: u32,
    #[serde(rename = "EarlyClose", alias = "earlyClose", alias = "early_close", default)]
    pub early_close: bool,
}

/// Year → holiday entries. An unknown year has no holidays recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTable {
    years: BTreeMap<i32, Vec<HolidayEntry>>,
}

impl HolidayTable {
    /// Build a table from already-parsed entries, enforcing the same rules as the JSON loader.
    pub fn from_entries(
        years: impl IntoIterator<Item = (i32, Vec<HolidayEntry>)>,
    ) -> Result<Self, CalendarError> {
        let mut table = BTreeMap::new();
        for (year, entries) in years {
            validate_year(year, &entries)?;
            if table.insert(year, entries).is_some() {
                return Err(CalendarError::DuplicateYear(year));
            }
        }
        Ok(Self { years: table })
    }

    /// Parse a table from its JSON representation.
    pub fn from_json_str(content: &str) -> Result<Self, CalendarError> {
        let raw: BTreeMap<String, Vec<HolidayEntry>> = serde_json::from_str(content)
            .map_err(|e| CalendarError::ConfigurationParse(e.to_string()))?;

        let mut parsed = Vec::with_capacity(raw.len());
        for (key, entries) in raw {
            let year = key
                .trim()
                .parse::<i32>()
                .map_err(|_| CalendarError::InvalidYearKey(key.clone()))?;
            parsed.push((year, entries));
        }
        Self::from_entries(parsed)
    }

    /// Read and parse a holiday file from disk.
    pub fn from_file(path: &Path) -> Result<Self, CalendarError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| CalendarError::ConfigurationRead {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json_str(&content)
    }

    /// Entries recorded for `year` (empty if the year is unknown).
    pub fn entries_for(&self, year: i32) -> &[HolidayEntry] {
        self.years.get(&year).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The entry matching `date`, if any.
    pub fn lookup(&self, date: NaiveDate) -> Option<&HolidayEntry> {
        use chrono::Datelike;
        self.entries_for(date.year())
            .iter()
            .find(|h| h.month == date.month() && h.day == date.day())
    }

    /// True if the table has an entry list for `year`.
    pub fn covers_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    /// Years present in the table, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

fn validate_year(year: i32, entries: &[HolidayEntry]) -> Result<(), CalendarError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if NaiveDate::from_ymd_opt(year, entry.month, entry.day).is_none() {
            return Err(CalendarError::InvalidHolidayEntry {
                year,
                month: entry.month,
                day: entry.day,
            });
        }
        if !seen.insert((entry.month, entry.day)) {
            return Err(CalendarError::DuplicateHoliday {
                year,
                month: entry.month,
                day: entry.day,
            });
        }
    }
    Ok(())
}
