use crate::dates;
use crate::task::{Task, TaskField, TaskId, TaskKind};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

pub const MAX_DURATION_DAYS: i64 = 9999;

/// Why a single field edit was refused. The task keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} expects a date as YYYY/MM/DD or YYYY-MM-DD, got '{value}'")]
    InvalidDate { field: TaskField, value: String },
    #[error("duration must be a whole number of business days up to 9999, got '{value}'")]
    InvalidDuration { value: String },
    #[error("progress must be an integer between 0 and 100, got '{value}'")]
    InvalidProgress { value: String },
    #[error("{field} does not apply to a {kind} row")]
    NotApplicable { field: TaskField, kind: TaskKind },
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

impl ValidationError {
    /// Field to flag in the table, when the error belongs to one.
    pub fn field(&self) -> Option<TaskField> {
        match self {
            ValidationError::InvalidDate { field, .. } => Some(*field),
            ValidationError::InvalidDuration { .. } => Some(TaskField::Duration),
            ValidationError::InvalidProgress { .. } => Some(TaskField::Progress),
            ValidationError::NotApplicable { field, .. } => Some(*field),
            ValidationError::UnknownField(_) => None,
        }
    }
}

/// A duration edit after numeric parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationInput {
    Empty,
    NonPositive,
    Days(u32),
}

/// Empty text clears the date; anything else must satisfy the fixed-width format.
pub fn parse_date_value(
    field: TaskField,
    value: &str,
) -> Result<Option<NaiveDate>, ValidationError> {
    if value.is_empty() {
        return Ok(None);
    }
    dates::parse(value)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

pub fn parse_duration_value(value: &str) -> Result<DurationInput, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(DurationInput::Empty);
    }
    let invalid = || ValidationError::InvalidDuration {
        value: value.to_string(),
    };
    let days: i64 = trimmed.parse().map_err(|_| invalid())?;
    if days <= 0 {
        return Ok(DurationInput::NonPositive);
    }
    if days > MAX_DURATION_DAYS {
        return Err(invalid());
    }
    u32::try_from(days).map(DurationInput::Days).map_err(|_| invalid())
}

/// Empty text resets progress to zero.
pub fn parse_progress_value(value: &str) -> Result<u8, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u8>()
        .ok()
        .filter(|pct| *pct <= 100)
        .ok_or_else(|| ValidationError::InvalidProgress {
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RecordValidationError {
    message: String,
}

impl RecordValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Shape checks for a record coming from saved data.
pub fn validate_task(task: &Task) -> Result<(), RecordValidationError> {
    if task.id <= 0 {
        return Err(RecordValidationError::new(format!(
            "task id {} must be positive",
            task.id
        )));
    }
    if task.progress > 100 {
        return Err(RecordValidationError::new(format!(
            "task {} has progress {} above 100",
            task.id, task.progress
        )));
    }
    if let Some(days) = task.duration {
        if i64::from(days) > MAX_DURATION_DAYS {
            return Err(RecordValidationError::new(format!(
                "task {} has duration {} above {}",
                task.id, days, MAX_DURATION_DAYS
            )));
        }
    }
    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), RecordValidationError> {
    let mut seen_ids: HashSet<TaskId> = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(RecordValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}
