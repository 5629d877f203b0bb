use crate::task::Task;
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive span of calendar days shown on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

const DATE_TEXT_LEN: usize = 10;

/// Parse a fixed-width `YYYY/MM/DD` or `YYYY-MM-DD` string.
///
/// Anything that is not exactly ten characters with matching separators at
/// positions 4 and 7 is rejected, as is a day that does not exist.
pub fn parse(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() != DATE_TEXT_LEN {
        return None;
    }
    let sep = bytes[4];
    if !(sep == b'/' || sep == b'-') || bytes[7] != sep {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }

    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[5..7].parse().ok()?;
    let day: u32 = text[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format(date: NaiveDate) -> String {
    format!(
        "{:04}/{:02}/{:02}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Whether `date` fits the four-digit year of the text format.
pub fn is_representable(date: NaiveDate) -> bool {
    (0..=9999).contains(&date.year())
}

/// Same as [`format`] but renders a missing date as an empty string.
pub fn format_opt(date: Option<NaiveDate>) -> String {
    date.map(format).unwrap_or_default()
}

pub fn is_same_day(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// Whole days from `start` to `end`; negative when `end` comes first.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

pub fn generate_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current = current + Duration::days(1);
    }
    dates
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next_first| next_first - Duration::days(1))
        .unwrap_or(date)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

const LEAD_DAYS: i64 = 7;
const TRAIL_DAYS: i64 = 30;

/// Date axis for the chart: a week before the earliest task date through a
/// month after the latest one, or the current month when nothing is dated.
/// Theme rows do not count.
pub fn compute_display_range(tasks: &[Task], today: NaiveDate) -> DateRange {
    let mut min_date: Option<NaiveDate> = None;
    let mut max_date: Option<NaiveDate> = None;

    for task in tasks.iter().filter(|task| !task.is_theme()) {
        for date in task.schedule_dates().into_iter().flatten() {
            min_date = Some(min_date.map_or(date, |current| current.min(date)));
            max_date = Some(max_date.map_or(date, |current| current.max(date)));
        }
    }

    match (min_date, max_date) {
        (Some(min), Some(max)) => {
            DateRange::new(add_days(min, -LEAD_DAYS), add_days(max, TRAIL_DAYS))
        }
        _ => DateRange::new(
            first_day_of_month(today),
            add_days(last_day_of_month(today), TRAIL_DAYS),
        ),
    }
}

/// Serde adapter for optional dates stored as `"YYYY/MM/DD"` or `""`.
pub(crate) mod serde_slash_date {
    use super::{format_opt, parse};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_opt(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => parse(text)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{text}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_accepts_both_separators() {
        assert_eq!(parse("2025/08/20"), Some(d(2025, 8, 20)));
        assert_eq!(parse("2025-08-20"), Some(d(2025, 8, 20)));
    }

    #[test]
    fn parse_rejects_wrong_width_and_mixed_separators() {
        assert_eq!(parse("2025/1/1"), None);
        assert_eq!(parse("2025/01/011"), None);
        assert_eq!(parse("2025/08-20"), None);
        assert_eq!(parse("2025.08.20"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn parse_rejects_impossible_days() {
        assert_eq!(parse("2025/02/29"), None);
        assert_eq!(parse("2025/13/01"), None);
        assert_eq!(parse("2024/02/29"), Some(d(2024, 2, 29)));
    }

    #[test]
    fn format_zero_pads() {
        assert_eq!(format(d(2025, 1, 5)), "2025/01/05");
        assert_eq!(format_opt(None), "");
    }

    #[test]
    fn month_bounds() {
        assert_eq!(first_day_of_month(d(2025, 2, 17)), d(2025, 2, 1));
        assert_eq!(last_day_of_month(d(2024, 2, 3)), d(2024, 2, 29));
        assert_eq!(last_day_of_month(d(2025, 12, 9)), d(2025, 12, 31));
    }

    #[test]
    fn representable_years_have_four_digits() {
        assert!(is_representable(d(9999, 12, 31)));
        assert!(is_representable(d(0, 1, 1)));
        assert!(!is_representable(d(10000, 1, 1)));
        assert!(!is_representable(d(-1, 12, 31)));
    }
}
