use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Holiday,
    Weekend,
    Business,
}

impl DayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayKind::Holiday => "holiday",
            DayKind::Weekend => "weekend",
            DayKind::Business => "business",
        }
    }
}

#[derive(Debug, Error)]
pub enum HolidayLoadError {
    #[error("failed to read holiday data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse holiday data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One entry of the holiday data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRecord {
    pub date: NaiveDate,
    pub name: String,
}

/// Entries stay raw so one bad record does not sink the whole file.
#[derive(Debug, Default, Deserialize)]
struct HolidayFile {
    holidays: Vec<serde_json::Value>,
}

/// Lookup from calendar date to holiday name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTable {
    holidays: HashMap<NaiveDate, String>,
}

impl HolidayTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = HolidayRecord>,
    {
        let mut table = Self::new();
        for record in records {
            table.insert(record.date, record.name);
        }
        table
    }

    /// Parse `{"holidays": [{"date": "YYYY-MM-DD", "name": "..."}]}`.
    ///
    /// Entries that do not decode are skipped with a warning.
    pub fn from_json_str(json: &str) -> Result<Self, HolidayLoadError> {
        let file: HolidayFile = serde_json::from_str(json)?;
        let records = file
            .holidays
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                match serde_json::from_value::<HolidayRecord>(entry) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("Skipping holiday entry {}: {}", index, e);
                        None
                    }
                }
            });
        Ok(Self::from_records(records))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, HolidayLoadError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load the table, falling back to an empty one when the source is
    /// unreadable. Only weekends count as non-business days in that case.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(table) => {
                tracing::info!("Loaded {} holidays from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load holidays from {}: {}, using weekends only",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    pub fn insert(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.holidays.insert(date, name.into());
    }

    pub fn name(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }

    /// Records sorted by date.
    pub fn records(&self) -> Vec<HolidayRecord> {
        let mut records: Vec<HolidayRecord> = self
            .holidays
            .iter()
            .map(|(date, name)| HolidayRecord {
                date: *date,
                name: name.clone(),
            })
            .collect();
        records.sort_by_key(|record| record.date);
        records
    }
}

/// Business-day arithmetic over an optional holiday table.
///
/// Without a table only Saturdays and Sundays are excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessCalendar<'a> {
    holidays: Option<&'a HolidayTable>,
}

impl<'a> BusinessCalendar<'a> {
    pub fn new(holidays: &'a HolidayTable) -> Self {
        Self {
            holidays: Some(holidays),
        }
    }

    pub fn weekends_only() -> Self {
        Self { holidays: None }
    }

    pub fn has_holidays(&self) -> bool {
        self.holidays.is_some()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.is_some_and(|table| table.contains(date))
    }

    pub fn holiday_name(&self, date: NaiveDate) -> Option<&'a str> {
        self.holidays.and_then(|table| table.name(date))
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend(date) && !self.is_holiday(date)
    }

    /// A holiday on a weekend reports as a holiday.
    pub fn classify(&self, date: NaiveDate) -> DayKind {
        if self.is_holiday(date) {
            DayKind::Holiday
        } else if self.is_weekend(date) {
            DayKind::Weekend
        } else {
            DayKind::Business
        }
    }

    /// Count business days in `[start, end]`, both ends included.
    pub fn count_business_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start > end {
            return 0;
        }
        let mut count = 0;
        let mut current = start;

        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// Walk forward from the day after `start` until `days` business days
    /// have been seen and return the day the count is reached.
    pub fn add_business_days(&self, start: NaiveDate, days: i64) -> NaiveDate {
        let mut current = start;
        let mut count = 0;

        while count < days {
            current = current + Duration::days(1);
            if self.is_business_day(current) {
                count += 1;
            }
        }
        current
    }

    /// Mirror of [`Self::add_business_days`], walking backward from `end`.
    pub fn subtract_business_days(&self, end: NaiveDate, days: i64) -> NaiveDate {
        let mut current = end;
        let mut remaining = days;

        while remaining > 0 {
            current = current - Duration::days(1);
            if self.is_business_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    pub fn business_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;

        while current <= end {
            if self.is_business_day(current) {
                days.push(current);
            }
            current = current + Duration::days(1);
        }
        days
    }
}

/// Shared handle to the session's holiday table.
///
/// Starts out weekend-only; the table can be installed exactly once, from any
/// thread, and every calendar handed out afterwards sees it. Results computed
/// before the install are left as they were.
#[derive(Debug, Clone, Default)]
pub struct CalendarSource {
    table: Arc<OnceLock<HolidayTable>>,
}

impl CalendarSource {
    pub fn weekends_only() -> Self {
        Self::default()
    }

    pub fn with_table(table: HolidayTable) -> Self {
        let source = Self::default();
        source.install(table);
        source
    }

    /// Returns `false` when a table was already installed; the new one is dropped.
    pub fn install(&self, table: HolidayTable) -> bool {
        let count = table.len();
        match self.table.set(table) {
            Ok(()) => {
                tracing::info!("Holiday calendar ready with {} entries", count);
                true
            }
            Err(_) => {
                tracing::debug!("Holiday calendar already installed, ignoring reload");
                false
            }
        }
    }

    /// Read the data file and install it. A failed read leaves the source
    /// weekend-only and not ready.
    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        match HolidayTable::from_path(path) {
            Ok(table) => self.install(table),
            Err(e) => {
                tracing::warn!(
                    "Failed to load holidays from {}: {}, using weekends only",
                    path.display(),
                    e
                );
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn table(&self) -> Option<&HolidayTable> {
        self.table.get()
    }

    pub fn calendar(&self) -> BusinessCalendar<'_> {
        match self.table.get() {
            Some(table) => BusinessCalendar::new(table),
            None => BusinessCalendar::weekends_only(),
        }
    }
}
