use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    BarKind, DateRange, DayColumn, EditError, PersistenceError, Task, TaskDraft, TaskField,
    TaskId, TaskKind, TaskStore, Timeline, dates, validation,
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<TaskStore>>,
}

impl AppState {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn with_shared(store: Arc<RwLock<TaskStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> Arc<RwLock<TaskStore>> {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<TaskField>,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid {
        message: String,
        field: Option<TaskField>,
    },
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid {
            message: message.into(),
            field: None,
        }
    }
}

impl From<EditError> for ApiError {
    fn from(value: EditError) -> Self {
        match value {
            EditError::NotFound(id) => ApiError::not_found(format!("task {id} not found")),
            EditError::Invalid(err) => ApiError::Invalid {
                field: err.field(),
                message: err.to_string(),
            },
            other @ (EditError::NotDraggable(_) | EditError::IdsExhausted(_)) => {
                ApiError::invalid(other.to_string())
            }
        }
    }
}

impl From<validation::ValidationError> for ApiError {
    fn from(value: validation::ValidationError) -> Self {
        ApiError::from(EditError::from(value))
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        ApiError::invalid(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                let body = Json(ErrorBody {
                    error: "not_found",
                    message,
                    field: None,
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Invalid { message, field } => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                    field,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRowPayload {
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub progress: String,
    /// Defaults to "after the selection", like the add buttons.
    #[serde(default)]
    pub insert_at: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct FieldEditPayload {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub ids: Vec<TaskId>,
    pub target_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct BarChangePayload {
    pub kind: BarKind,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct TimelineBody {
    pub range: DateRange,
    pub columns: Vec<DayColumn>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendar/status", get(calendar_status))
        .route("/tasks", get(list_tasks).post(create_row))
        .route("/tasks/move", post(move_rows))
        .route("/tasks/:id", get(get_task).delete(delete_task))
        .route("/tasks/:id/fields", patch(update_field))
        .route("/tasks/:id/bars", post(change_bar))
        .route("/range", get(display_range))
        .route("/import", post(import_rows))
        .route("/export", get(export_rows))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, store: Arc<RwLock<TaskStore>>) -> std::io::Result<()> {
    let state = AppState::with_shared(store);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn calendar_status(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();
    let guard = store.read();
    let source = guard.calendar();
    Json(json!({
        "ready": source.is_ready(),
        "holidays": source.table().map_or(0, |table| table.len()),
    }))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let store = state.store();
    let tasks = store.read().tasks().to_vec();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store();
    let task = store.read().get_task(task_id).cloned();
    task.map(Json)
        .ok_or_else(|| ApiError::not_found(format!("task {task_id} not found")))
}

fn draft_from_payload(payload: &NewRowPayload) -> Result<TaskDraft, ApiError> {
    let mut draft = TaskDraft::new(payload.name.clone()).assignee(payload.assignee.clone());
    draft.start_date = validation::parse_date_value(TaskField::StartDate, &payload.start_date)?;
    draft.end_date = validation::parse_date_value(TaskField::EndDate, &payload.end_date)?;
    draft.progress = validation::parse_progress_value(&payload.progress)?;
    Ok(draft)
}

async fn create_row(
    State(state): State<AppState>,
    Json(payload): Json<NewRowPayload>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let store = state.store();
    let created = {
        let mut guard = store.write();
        let insert_at = payload.insert_at.or_else(|| guard.insert_index());
        let id = match payload.kind {
            TaskKind::Theme => guard.add_theme(payload.name.clone(), insert_at)?,
            TaskKind::Task => guard.add_task(draft_from_payload(&payload)?, insert_at)?,
        };
        guard.get_task(id).cloned()
    };
    created
        .map(|task| (StatusCode::CREATED, Json(task)))
        .ok_or_else(|| ApiError::invalid("row vanished after creation"))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    let store = state.store();
    let removed = store.write().remove_task(task_id);
    if !removed {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn update_field(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
    Json(payload): Json<FieldEditPayload>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store();
    let mut guard = store.write();
    let task = guard.update_field_by_name(task_id, &payload.field, &payload.value)?;
    Ok(Json(task.clone()))
}

async fn change_bar(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
    Json(payload): Json<BarChangePayload>,
) -> Result<Json<Task>, ApiError> {
    let parse = |text: &str| -> Result<NaiveDate, ApiError> {
        dates::parse(text).ok_or_else(|| ApiError::invalid(format!("invalid date '{text}'")))
    };
    let start = parse(&payload.start)?;
    let end = parse(&payload.end)?;
    let store = state.store();
    let mut guard = store.write();
    let task = guard.apply_bar_change(task_id, payload.kind, start, end)?;
    Ok(Json(task.clone()))
}

async fn move_rows(
    State(state): State<AppState>,
    Json(payload): Json<MovePayload>,
) -> Json<Vec<Task>> {
    let store = state.store();
    let mut guard = store.write();
    guard.move_tasks(&payload.ids, payload.target_index);
    Json(guard.tasks().to_vec())
}

async fn display_range(State(state): State<AppState>) -> Json<TimelineBody> {
    let store = state.store();
    let guard = store.read();
    let timeline = Timeline::for_tasks(guard.tasks(), dates::today());
    let calendar = guard.calendar().calendar();
    Json(TimelineBody {
        range: timeline.range(),
        columns: timeline.columns(&calendar),
    })
}

async fn import_rows(State(state): State<AppState>, body: String) -> Result<impl IntoResponse, ApiError> {
    let store = state.store();
    let imported = store.write().import_json(&body)?;
    Ok(Json(json!({ "imported": imported })))
}

async fn export_rows(State(state): State<AppState>) -> Json<Vec<Task>> {
    let store = state.store();
    let tasks = store.read().tasks().to_vec();
    Json(tasks)
}
