pub mod calendar;
pub mod config;
pub mod dates;
#[cfg(feature = "http_api")]
pub mod http_api;
#[cfg(any(feature = "cli_api", feature = "http_api"))]
pub mod logging;
pub mod persistence;
pub mod resolver;
pub mod store;
pub mod task;
pub mod timeline;
pub mod validation;

pub use calendar::{BusinessCalendar, CalendarSource, DayKind, HolidayRecord, HolidayTable};
pub use config::AppConfig;
pub use dates::DateRange;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskStore;
pub use persistence::{
    JsonFileTaskStore, PersistenceError, TaskListStore, load_tasks_from_csv, load_tasks_from_json,
    save_tasks_to_csv, save_tasks_to_json,
};
pub use resolver::{ScheduleResolver, apply_field_edit};
pub use store::{EditError, TaskStore};
pub use task::{Task, TaskDraft, TaskField, TaskId, TaskKind};
pub use timeline::{BarGesture, BarKind, BarSpan, DayColumn, Timeline};
pub use validation::ValidationError;
