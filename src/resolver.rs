//! Field-dependency rules between start date, end date and duration.
//!
//! A single edit is validated, written, and then the fields derived from it
//! are recomputed against the business-day calendar:
//!
//! - editing either planned date re-derives `duration` (or clears it when the
//!   dates are missing or reversed);
//! - editing `duration` re-derives `end_date` from `start_date`, or, without a
//!   start, walks back from `end_date` to derive `start_date`.
//!
//! Nothing here fails on missing inputs; such rules simply do not fire. A
//! duration whose derived date would leave years 0000-9999 is refused.

use crate::calendar::BusinessCalendar;
use crate::dates;
use crate::task::{Task, TaskField};
use crate::validation::{self, DurationInput, ValidationError};

pub struct ScheduleResolver<'a> {
    calendar: BusinessCalendar<'a>,
}

impl<'a> ScheduleResolver<'a> {
    pub fn new(calendar: BusinessCalendar<'a>) -> Self {
        Self { calendar }
    }

    /// Validate `value` for `field`, apply it to a copy of `task` and
    /// recompute the dependent fields. On error `task` is untouched.
    pub fn apply(
        &self,
        task: &Task,
        field: TaskField,
        value: &str,
    ) -> Result<Task, ValidationError> {
        if !field.applies_to(task.kind) {
            return Err(ValidationError::NotApplicable {
                field,
                kind: task.kind,
            });
        }

        let mut updated = task.clone();
        match field {
            TaskField::ThemeName => updated.theme_name = value.to_string(),
            TaskField::TaskName => updated.task_name = value.to_string(),
            TaskField::Assignee => updated.assignee = value.to_string(),
            TaskField::Progress => updated.progress = validation::parse_progress_value(value)?,
            TaskField::Duration => {
                let input = validation::parse_duration_value(value)?;
                self.apply_duration(&mut updated, input)?;
                return Ok(updated);
            }
            date_field => {
                let date = validation::parse_date_value(date_field, value)?;
                if let Some(slot) = updated.date_mut(date_field) {
                    *slot = date;
                }
            }
        }

        self.recompute(&mut updated, field)?;
        Ok(updated)
    }

    /// Restore the derived fields after `field` changed on `task`.
    ///
    /// Fails only when a date derived from the duration falls outside years
    /// 0000 to 9999; `task` is then left as it was.
    pub fn recompute(&self, task: &mut Task, field: TaskField) -> Result<(), ValidationError> {
        match field {
            TaskField::StartDate | TaskField::EndDate => self.derive_duration(task),
            TaskField::Duration => self.derive_from_duration(task)?,
            _ => {}
        }
        Ok(())
    }

    fn apply_duration(&self, task: &mut Task, input: DurationInput) -> Result<(), ValidationError> {
        match input {
            DurationInput::Empty => task.duration = None,
            DurationInput::NonPositive => {
                task.duration = None;
                task.end_date = None;
                tracing::debug!(task_id = task.id, "non-positive duration cleared end date");
            }
            DurationInput::Days(days) => {
                task.duration = Some(days);
                self.derive_from_duration(task)?;
            }
        }
        Ok(())
    }

    fn derive_duration(&self, task: &mut Task) {
        task.duration = match (task.start_date, task.end_date) {
            (Some(start), Some(end)) if start <= end => {
                let days = self.calendar.count_business_days(start, end);
                // A range made only of weekends and holidays has no business days.
                u32::try_from(days).ok().filter(|days| *days > 0)
            }
            _ => None,
        };
        tracing::debug!(
            task_id = task.id,
            duration = ?task.duration,
            "derived duration from planned dates"
        );
    }

    fn derive_from_duration(&self, task: &mut Task) -> Result<(), ValidationError> {
        let Some(days) = task.duration else {
            return Ok(());
        };
        let steps = i64::from(days) - 1;
        let out_of_range = || ValidationError::InvalidDuration {
            value: days.to_string(),
        };

        if let Some(start) = task.start_date {
            let end = self.calendar.add_business_days(start, steps);
            if !dates::is_representable(end) {
                return Err(out_of_range());
            }
            task.end_date = Some(end);
            tracing::debug!(
                task_id = task.id,
                end = %dates::format(end),
                "derived end date from duration"
            );
        } else if let Some(end) = task.end_date {
            let start = self.calendar.subtract_business_days(end, steps);
            if !dates::is_representable(start) {
                return Err(out_of_range());
            }
            task.start_date = Some(start);
            tracing::debug!(
                task_id = task.id,
                start = %dates::format(start),
                "derived start date from duration"
            );
        }
        Ok(())
    }
}

/// Apply a single edit with the given calendar. See [`ScheduleResolver::apply`].
pub fn apply_field_edit(
    task: &Task,
    field: TaskField,
    value: &str,
    calendar: BusinessCalendar<'_>,
) -> Result<Task, ValidationError> {
    ScheduleResolver::new(calendar).apply(task, field, value)
}
