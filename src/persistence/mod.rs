use crate::task::Task;
use crate::validation;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Somewhere a session's rows can be kept between runs.
pub trait TaskListStore {
    fn save_tasks(&self, tasks: &[Task]) -> PersistenceResult<()>;
    /// `Ok(None)` when nothing has been saved yet.
    fn load_tasks(&self) -> PersistenceResult<Option<Vec<Task>>>;
}

pub fn validate_tasks(tasks: &[Task]) -> PersistenceResult<()> {
    validation::validate_task_collection(tasks)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn tasks_to_json_string(tasks: &[Task]) -> PersistenceResult<String> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Decode a saved task list. The top-level value must be an array and every
/// element must decode as a row; otherwise nothing is returned.
pub fn tasks_from_json_str(json: &str) -> PersistenceResult<Vec<Task>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(PersistenceError::InvalidData(
            "top-level value must be an array of rows".into(),
        ));
    }
    let tasks: Vec<Task> = serde_json::from_value(value)
        .map_err(|err| PersistenceError::InvalidData(format!("invalid row: {err}")))?;
    validate_tasks(&tasks)?;
    Ok(tasks)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonFileTaskStore, load_tasks_from_csv, load_tasks_from_json, save_tasks_to_csv,
    save_tasks_to_json,
};
