use crate::calendar::{BusinessCalendar, DayKind};
use crate::dates::{self, DateRange};
use crate::task::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarKind {
    Planned,
    Actual,
    Progress,
}

impl BarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarKind::Planned => "planned",
            BarKind::Actual => "actual",
            BarKind::Progress => "progress",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "planned" => Some(BarKind::Planned),
            "actual" => Some(BarKind::Actual),
            "progress" => Some(BarKind::Progress),
            _ => None,
        }
    }
}

/// A bar located on the axis. Indices are day columns, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarSpan {
    pub kind: BarKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
}

impl BarSpan {
    pub fn width(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Pointer gestures on a bar, measured in whole day columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarGesture {
    Move,
    ResizeStart,
    ResizeEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub kind: DayKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday_name: Option<String>,
}

/// The chart's horizontal axis: one column per calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    range: DateRange,
    dates: Vec<NaiveDate>,
}

impl Timeline {
    pub fn new(range: DateRange) -> Self {
        Self {
            dates: dates::generate_range(range.start, range.end),
            range,
        }
    }

    pub fn for_tasks(tasks: &[Task], today: NaiveDate) -> Self {
        Self::new(dates::compute_display_range(tasks, today))
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if !self.range.contains(date) {
            return None;
        }
        usize::try_from(dates::days_between(self.range.start, date)).ok()
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn columns(&self, calendar: &BusinessCalendar<'_>) -> Vec<DayColumn> {
        self.dates
            .iter()
            .map(|date| DayColumn {
                date: *date,
                kind: calendar.classify(*date),
                holiday_name: calendar.holiday_name(*date).map(ToOwned::to_owned),
            })
            .collect()
    }

    fn span(&self, kind: BarKind, start: NaiveDate, end: NaiveDate) -> Option<BarSpan> {
        if start > end {
            return None;
        }
        match (self.index_of(start), self.index_of(end)) {
            (Some(start_index), Some(end_index)) => Some(BarSpan {
                kind,
                start,
                end,
                start_index,
                end_index,
            }),
            _ => {
                tracing::debug!(
                    kind = kind.as_str(),
                    start = %dates::format(start),
                    end = %dates::format(end),
                    "bar falls outside the timeline"
                );
                None
            }
        }
    }

    /// Bars to draw for a row. An actual bar without an end runs to `today`;
    /// the progress bar covers the first `progress` percent of the planned
    /// calendar days, rounded up.
    pub fn bars(&self, task: &Task, today: NaiveDate) -> Vec<BarSpan> {
        let mut bars = Vec::new();
        if task.is_theme() {
            return bars;
        }

        if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
            bars.extend(self.span(BarKind::Planned, start, end));
        }

        if let Some(actual_start) = task.actual_start_date {
            let actual_end = task.actual_end_date.unwrap_or(today);
            bars.extend(self.span(BarKind::Actual, actual_start, actual_end));
        }

        if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
            if task.progress > 0 && start <= end {
                let total_days = dates::days_between(start, end) + 1;
                let progress_days = (total_days * i64::from(task.progress) + 99) / 100;
                let progress_end = dates::add_days(start, progress_days - 1);
                bars.extend(self.span(BarKind::Progress, start, progress_end));
            }
        }
        bars
    }

    /// New `(start, end)` dates for `span` after a gesture of `delta` columns.
    ///
    /// A move stops at either edge of the axis and keeps the bar's width.
    /// Resizes that would leave the bar narrower than one column are ignored,
    /// and a resized end is clamped to the axis.
    pub fn apply_gesture(
        &self,
        span: &BarSpan,
        gesture: BarGesture,
        delta: i64,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let last = i64::try_from(self.dates.len()).ok()? - 1;
        if last < 0 {
            return None;
        }
        let start = i64::try_from(span.start_index).ok()?;
        let end = i64::try_from(span.end_index).ok()?;

        let (new_start, new_end) = match gesture {
            BarGesture::Move => {
                let shift = delta.max(-start).min(last - end);
                (start + shift, end + shift)
            }
            BarGesture::ResizeStart if start.saturating_add(delta) <= end => {
                (start.saturating_add(delta), end)
            }
            BarGesture::ResizeEnd if end.saturating_add(delta) >= start => {
                (start, end.saturating_add(delta))
            }
            BarGesture::ResizeStart | BarGesture::ResizeEnd => (start, end),
        };

        let clamp = |index: i64| usize::try_from(index.clamp(0, last)).ok();
        Some((
            self.date_at(clamp(new_start)?)?,
            self.date_at(clamp(new_end)?)?,
        ))
    }
}
