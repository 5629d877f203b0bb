use super::{PersistenceError, PersistenceResult, TaskListStore};
use crate::dates;
use crate::task::{Task, TaskField, TaskId, TaskKind};
use crate::validation::{self, DurationInput};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub fn save_tasks_to_json<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    super::validate_tasks(tasks)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, tasks)?;
    Ok(())
}

pub fn load_tasks_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let contents = fs::read_to_string(path)?;
    super::tasks_from_json_str(&contents)
}

/// Task list kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileTaskStore {
    path: PathBuf,
}

impl JsonFileTaskStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clear(&self) -> PersistenceResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl TaskListStore for JsonFileTaskStore {
    fn save_tasks(&self, tasks: &[Task]) -> PersistenceResult<()> {
        save_tasks_to_json(tasks, &self.path)?;
        tracing::debug!("Saved {} rows to {}", tasks.len(), self.path.display());
        Ok(())
    }

    fn load_tasks(&self) -> PersistenceResult<Option<Vec<Task>>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        super::tasks_from_json_str(&contents).map(Some)
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskCsvRecord {
    id: TaskId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    theme_name: String,
    #[serde(default)]
    task_name: String,
    #[serde(default)]
    assignee: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    actual_start_date: String,
    #[serde(default)]
    actual_end_date: String,
    #[serde(default)]
    progress: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            kind: task.kind.as_str().to_string(),
            theme_name: task.theme_name.clone(),
            task_name: task.task_name.clone(),
            assignee: task.assignee.clone(),
            start_date: dates::format_opt(task.start_date),
            end_date: dates::format_opt(task.end_date),
            duration: task.duration.map(|d| d.to_string()).unwrap_or_default(),
            actual_start_date: dates::format_opt(task.actual_start_date),
            actual_end_date: dates::format_opt(task.actual_end_date),
            progress: task.progress.to_string(),
        }
    }
}

impl TaskCsvRecord {
    fn into_task(self) -> PersistenceResult<Task> {
        let invalid = |err: validation::ValidationError| {
            PersistenceError::InvalidData(format!("row {}: {err}", self.id))
        };
        let kind = match self.kind.trim().to_ascii_lowercase().as_str() {
            "theme" => TaskKind::Theme,
            "task" => TaskKind::Task,
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "row {}: unknown row type '{other}'",
                    self.id
                )));
            }
        };

        let mut task = Task::theme(self.id, self.theme_name.clone());
        task.kind = kind;
        task.task_name = self.task_name.clone();
        task.assignee = self.assignee.clone();
        task.start_date = parse_date(TaskField::StartDate, &self.start_date).map_err(invalid)?;
        task.end_date = parse_date(TaskField::EndDate, &self.end_date).map_err(invalid)?;
        task.actual_start_date =
            parse_date(TaskField::ActualStartDate, &self.actual_start_date).map_err(invalid)?;
        task.actual_end_date =
            parse_date(TaskField::ActualEndDate, &self.actual_end_date).map_err(invalid)?;
        task.duration = match validation::parse_duration_value(&self.duration).map_err(invalid)? {
            DurationInput::Days(days) => Some(days),
            DurationInput::Empty | DurationInput::NonPositive => None,
        };
        task.progress = validation::parse_progress_value(&self.progress).map_err(invalid)?;
        Ok(task)
    }
}

fn parse_date(
    field: TaskField,
    input: &str,
) -> Result<Option<NaiveDate>, validation::ValidationError> {
    validation::parse_date_value(field, input.trim())
}

pub fn save_tasks_to_csv<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    super::validate_tasks(tasks)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in tasks {
        writer.serialize(TaskCsvRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_tasks_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        tasks.push(record?.into_task()?);
    }
    super::validate_tasks(&tasks)?;
    Ok(tasks)
}
