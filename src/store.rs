use crate::calendar::CalendarSource;
use crate::dates::{self, DateRange};
use crate::persistence::{self, PersistenceError, PersistenceResult, TaskListStore};
use crate::resolver::ScheduleResolver;
use crate::task::{Task, TaskDraft, TaskField, TaskId};
use crate::timeline::BarKind;
use crate::validation::ValidationError;
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("progress bars of task {0} follow the planned dates and cannot be dragged")]
    NotDraggable(TaskId),
    #[error("task ids are exhausted at {0}")]
    IdsExhausted(TaskId),
}

/// Ordered rows of one editing session plus the row selection.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    selected: HashSet<TaskId>,
    next_id: TaskId,
    calendar: CalendarSource,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(CalendarSource::weekends_only())
    }
}

impl TaskStore {
    pub fn new(calendar: CalendarSource) -> Self {
        Self {
            tasks: Vec::new(),
            selected: HashSet::new(),
            next_id: 1,
            calendar,
        }
    }

    /// A store holding the rows a first-time user starts with.
    pub fn with_sample_data(calendar: CalendarSource) -> Self {
        let mut store = Self::new(calendar);
        if let Err(err) = store.add_sample_rows() {
            tracing::warn!("Sample rows incomplete: {}", err);
        }
        store
    }

    fn add_sample_rows(&mut self) -> Result<(), EditError> {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);

        self.add_theme("Project A", None)?;
        if let (Some(start), Some(end)) = (d(2025, 8, 20), d(2025, 8, 25)) {
            self.add_task(
                TaskDraft::new("Requirements")
                    .assignee("Tanaka")
                    .planned(start, end)
                    .progress(50),
                None,
            )?;
        }
        if let (Some(start), Some(end)) = (d(2025, 8, 26), d(2025, 9, 5)) {
            self.add_task(
                TaskDraft::new("Basic design")
                    .assignee("Sato")
                    .planned(start, end),
                None,
            )?;
        }

        self.add_theme("Project B", None)?;
        if let (Some(start), Some(end), Some(actual_end)) =
            (d(2025, 8, 22), d(2025, 8, 28), d(2025, 8, 27))
        {
            self.add_task(
                TaskDraft::new("Research")
                    .assignee("Suzuki")
                    .planned(start, end)
                    .actual(start, Some(actual_end))
                    .progress(100),
                None,
            )?;
        }
        Ok(())
    }

    pub fn calendar(&self) -> &CalendarSource {
        &self.calendar
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// The last representable id is never handed out, so `next_id` always
    /// stays valid.
    fn allocate_id(&mut self) -> Result<TaskId, EditError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(EditError::IdsExhausted(id))?;
        Ok(id)
    }

    /// Insert at `insert_at` when it is inside the list, otherwise append.
    fn insert_row(&mut self, task: Task, insert_at: Option<usize>) {
        match insert_at {
            Some(index) if index < self.tasks.len() => self.tasks.insert(index, task),
            _ => self.tasks.push(task),
        }
    }

    pub fn add_theme(
        &mut self,
        name: impl Into<String>,
        insert_at: Option<usize>,
    ) -> Result<TaskId, EditError> {
        let id = self.allocate_id()?;
        self.insert_row(Task::theme(id, name), insert_at);
        tracing::debug!(task_id = id, "added theme");
        Ok(id)
    }

    /// Add a task row. When the draft carries both planned dates its
    /// duration is derived from them.
    pub fn add_task(
        &mut self,
        draft: TaskDraft,
        insert_at: Option<usize>,
    ) -> Result<TaskId, EditError> {
        let id = self.allocate_id()?;
        let mut task = Task::task(id, draft);
        if task.start_date.is_some() && task.end_date.is_some() {
            ScheduleResolver::new(self.calendar.calendar())
                .recompute(&mut task, TaskField::StartDate)?;
        }
        self.insert_row(task, insert_at);
        tracing::debug!(task_id = id, "added task");
        Ok(id)
    }

    pub fn remove_task(&mut self, id: TaskId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.tasks.remove(index);
                self.selected.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Remove every selected row and clear the selection.
    pub fn remove_selected(&mut self) -> usize {
        let before = self.tasks.len();
        let selected = std::mem::take(&mut self.selected);
        self.tasks.retain(|task| !selected.contains(&task.id));
        before - self.tasks.len()
    }

    /// Write `value` into `field` and recompute the fields that depend on it.
    pub fn update_field(
        &mut self,
        id: TaskId,
        field: TaskField,
        value: &str,
    ) -> Result<&Task, EditError> {
        let index = self.position(id).ok_or(EditError::NotFound(id))?;
        let updated =
            ScheduleResolver::new(self.calendar.calendar()).apply(&self.tasks[index], field, value)?;
        self.tasks[index] = updated;
        Ok(&self.tasks[index])
    }

    pub fn update_field_by_name(
        &mut self,
        id: TaskId,
        field: &str,
        value: &str,
    ) -> Result<&Task, EditError> {
        let field = TaskField::from_str(field)
            .ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
        self.update_field(id, field, value)
    }

    /// Commit a dragged or resized bar: planned bars rewrite the planned
    /// dates, actual bars the actual dates.
    pub fn apply_bar_change(
        &mut self,
        id: TaskId,
        kind: BarKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<&Task, EditError> {
        let (start_field, end_field) = match kind {
            BarKind::Planned => (TaskField::StartDate, TaskField::EndDate),
            BarKind::Actual => (TaskField::ActualStartDate, TaskField::ActualEndDate),
            BarKind::Progress => return Err(EditError::NotDraggable(id)),
        };
        self.update_field(id, start_field, &dates::format(start))?;
        self.update_field(id, end_field, &dates::format(end))
    }

    /// Move the listed rows, in the order given, to a contiguous block at
    /// `target_index`. The index refers to the list with those rows already
    /// taken out. Unknown and repeated ids are skipped.
    pub fn move_tasks(&mut self, ids: &[TaskId], target_index: usize) -> usize {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut moving = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(index) = self.position(*id) {
                moving.push(self.tasks.remove(index));
            }
        }

        let count = moving.len();
        let at = target_index.min(self.tasks.len());
        self.tasks.splice(at..at, moving);
        count
    }

    /// Where "add" should put a new row: after the last selected row, or at
    /// the end (`None`) without a selection.
    pub fn insert_index(&self) -> Option<usize> {
        if self.selected.is_empty() {
            return None;
        }
        let last_selected = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| self.selected.contains(&task.id))
            .map(|(index, _)| index)
            .max();
        Some(last_selected.map_or(0, |index| index + 1))
    }

    pub fn toggle_selection(&mut self, id: TaskId) -> bool {
        if self.selected.remove(&id) {
            false
        } else if self.get_task(id).is_some() {
            self.selected.insert(id)
        } else {
            false
        }
    }

    pub fn select(&mut self, id: TaskId) -> bool {
        self.get_task(id).is_some() && self.selected.insert(id)
    }

    pub fn deselect(&mut self, id: TaskId) -> bool {
        self.selected.remove(&id)
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: TaskId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected ids in row order.
    pub fn selected_ids(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|task| self.selected.contains(&task.id))
            .map(|task| task.id)
            .collect()
    }

    pub fn display_range(&self, today: NaiveDate) -> DateRange {
        dates::compute_display_range(&self.tasks, today)
    }

    /// Replace every row. The id counter restarts after the largest id and the
    /// selection is cleared. Nothing changes when `tasks` fails validation or
    /// its largest id leaves no room for another row.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) -> PersistenceResult<usize> {
        persistence::validate_tasks(&tasks)?;
        let max_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
        self.next_id = max_id.checked_add(1).ok_or_else(|| {
            PersistenceError::InvalidData(format!("task id {max_id} leaves no id for new rows"))
        })?;
        self.tasks = tasks;
        self.selected.clear();
        Ok(self.tasks.len())
    }

    pub fn export_json(&self) -> PersistenceResult<String> {
        persistence::tasks_to_json_string(&self.tasks)
    }

    /// All-or-nothing import of a JSON array of rows.
    pub fn import_json(&mut self, json: &str) -> PersistenceResult<usize> {
        let tasks = persistence::tasks_from_json_str(json)?;
        let count = self.replace_tasks(tasks)?;
        tracing::info!("Imported {} rows", count);
        Ok(count)
    }

    pub fn save_to<S: TaskListStore + ?Sized>(&self, store: &S) -> PersistenceResult<()> {
        store.save_tasks(&self.tasks)
    }

    /// Load rows from `store`; returns `Ok(false)` when it holds nothing yet.
    pub fn load_from<S: TaskListStore + ?Sized>(&mut self, store: &S) -> PersistenceResult<bool> {
        match store.load_tasks()? {
            Some(tasks) => {
                self.replace_tasks(tasks)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
