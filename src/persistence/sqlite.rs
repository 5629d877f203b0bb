use super::{PersistenceResult, TaskListStore};
use crate::task::Task;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

/// Task list kept in SQLite, one JSON blob per row in display order.
pub struct SqliteTaskStore {
    connection: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS task_list (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                position INTEGER PRIMARY KEY,
                id INTEGER NOT NULL UNIQUE,
                task_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl TaskListStore for SqliteTaskStore {
    fn save_tasks(&self, tasks: &[Task]) -> PersistenceResult<()> {
        super::validate_tasks(tasks)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM task_list", [])?;
        tx.execute(
            "INSERT INTO task_list (id, saved_at) VALUES (1, datetime('now'))",
            [],
        )?;
        tx.execute("DELETE FROM tasks", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO tasks (position, id, task_json) VALUES (?1, ?2, ?3)")?;
            for (position, task) in tasks.iter().enumerate() {
                let json = serde_json::to_string(task)?;
                stmt.execute(params![position as i64, task.id, json])?;
            }
        }
        tx.commit()?;
        tracing::debug!("Saved {} rows to sqlite", tasks.len());
        Ok(())
    }

    fn load_tasks(&self) -> PersistenceResult<Option<Vec<Task>>> {
        let conn = self.connection.lock();

        let saved: Option<String> = conn
            .query_row("SELECT saved_at FROM task_list WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        if saved.is_none() {
            return Ok(None);
        }

        let mut stmt = conn.prepare("SELECT task_json FROM tasks ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tasks = Vec::new();
        for json in rows {
            let json = json?;
            let task: Task = serde_json::from_str(&json)?;
            tasks.push(task);
        }

        super::validate_tasks(&tasks)?;
        Ok(Some(tasks))
    }
}
