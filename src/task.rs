use crate::dates::{self, serde_slash_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TaskId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Theme,
    Task,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Theme => "theme",
            TaskKind::Task => "task",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable columns of a row, named as they appear in saved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    ThemeName,
    TaskName,
    Assignee,
    StartDate,
    EndDate,
    Duration,
    ActualStartDate,
    ActualEndDate,
    Progress,
}

impl TaskField {
    pub const ALL: [TaskField; 9] = [
        TaskField::ThemeName,
        TaskField::TaskName,
        TaskField::Assignee,
        TaskField::StartDate,
        TaskField::EndDate,
        TaskField::Duration,
        TaskField::ActualStartDate,
        TaskField::ActualEndDate,
        TaskField::Progress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::ThemeName => "themeName",
            TaskField::TaskName => "taskName",
            TaskField::Assignee => "assignee",
            TaskField::StartDate => "startDate",
            TaskField::EndDate => "endDate",
            TaskField::Duration => "duration",
            TaskField::ActualStartDate => "actualStartDate",
            TaskField::ActualEndDate => "actualEndDate",
            TaskField::Progress => "progress",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(value))
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            TaskField::StartDate
                | TaskField::EndDate
                | TaskField::ActualStartDate
                | TaskField::ActualEndDate
        )
    }

    pub fn applies_to(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::Theme => matches!(self, TaskField::ThemeName),
            TaskKind::Task => !matches!(self, TaskField::ThemeName),
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the chart: either a theme heading or a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub theme_name: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default, with = "serde_slash_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "serde_slash_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, with = "serde_duration")]
    pub duration: Option<u32>,
    #[serde(default, with = "serde_slash_date")]
    pub actual_start_date: Option<NaiveDate>,
    #[serde(default, with = "serde_slash_date")]
    pub actual_end_date: Option<NaiveDate>,
    #[serde(default, with = "serde_progress")]
    pub progress: u8,
}

/// Field values for a task that has not been given an id yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub task_name: String,
    pub assignee: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration: Option<u32>,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub progress: u8,
}

impl TaskDraft {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            ..Self::default()
        }
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    pub fn planned(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn actual(mut self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        self.actual_start_date = Some(start);
        self.actual_end_date = end;
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }
}

impl Task {
    pub fn theme(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: TaskKind::Theme,
            theme_name: name.into(),
            task_name: String::new(),
            assignee: String::new(),
            start_date: None,
            end_date: None,
            duration: None,
            actual_start_date: None,
            actual_end_date: None,
            progress: 0,
        }
    }

    pub fn task(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            kind: TaskKind::Task,
            theme_name: String::new(),
            task_name: draft.task_name,
            assignee: draft.assignee,
            start_date: draft.start_date,
            end_date: draft.end_date,
            duration: draft.duration,
            actual_start_date: draft.actual_start_date,
            actual_end_date: draft.actual_end_date,
            progress: draft.progress.min(100),
        }
    }

    pub fn is_theme(&self) -> bool {
        self.kind == TaskKind::Theme
    }

    /// Label shown in the chart: the theme name for themes, else the task name.
    pub fn label(&self) -> &str {
        match self.kind {
            TaskKind::Theme => &self.theme_name,
            TaskKind::Task => &self.task_name,
        }
    }

    /// Planned and actual dates, in that order.
    pub fn schedule_dates(&self) -> [Option<NaiveDate>; 4] {
        [
            self.start_date,
            self.end_date,
            self.actual_start_date,
            self.actual_end_date,
        ]
    }

    pub fn date(&self, field: TaskField) -> Option<NaiveDate> {
        match field {
            TaskField::StartDate => self.start_date,
            TaskField::EndDate => self.end_date,
            TaskField::ActualStartDate => self.actual_start_date,
            TaskField::ActualEndDate => self.actual_end_date,
            _ => None,
        }
    }

    pub(crate) fn date_mut(&mut self, field: TaskField) -> Option<&mut Option<NaiveDate>> {
        match field {
            TaskField::StartDate => Some(&mut self.start_date),
            TaskField::EndDate => Some(&mut self.end_date),
            TaskField::ActualStartDate => Some(&mut self.actual_start_date),
            TaskField::ActualEndDate => Some(&mut self.actual_end_date),
            _ => None,
        }
    }

    /// Text form of a field as it appears in the table and in saved data.
    pub fn field_text(&self, field: TaskField) -> String {
        match field {
            TaskField::ThemeName => self.theme_name.clone(),
            TaskField::TaskName => self.task_name.clone(),
            TaskField::Assignee => self.assignee.clone(),
            TaskField::Duration => self.duration.map(|d| d.to_string()).unwrap_or_default(),
            TaskField::Progress => self.progress.to_string(),
            date_field => dates::format_opt(self.date(date_field)),
        }
    }
}

/// Integers that older saves may hold as strings (`"5"`) or leave empty (`""`).
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn into_number(self) -> Result<Option<i64>, String> {
        match self {
            NumberOrText::Number(n) => Ok(Some(n)),
            NumberOrText::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| format!("expected an integer, got '{text}'"))
            }
        }
    }
}

mod serde_duration {
    use super::NumberOrText;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(duration: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(days) => serializer.serialize_str(&days.to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let value = raw.into_number().map_err(de::Error::custom)?;
        // Non-positive durations are stored as empty.
        Ok(value.and_then(|days| u32::try_from(days).ok()).filter(|days| *days > 0))
    }
}

mod serde_progress {
    use super::NumberOrText;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(progress: &u8, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&progress.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(0);
        };
        match raw.into_number().map_err(de::Error::custom)? {
            None => Ok(0),
            Some(pct) if (0..=100).contains(&pct) => Ok(pct as u8),
            Some(pct) => Err(de::Error::custom(format!(
                "progress {pct} is outside 0..=100"
            ))),
        }
    }
}
