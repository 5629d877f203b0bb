#![cfg(feature = "http_api")]

use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use gantt_schedule::{CalendarSource, HolidayTable, Task, TaskStore, http_api};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> Router {
    let store = TaskStore::with_sample_data(CalendarSource::weekends_only());
    http_api::router(http_api::AppState::new(store))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_and_calendar_status() {
    let app = new_router();
    let response = app.clone().oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(empty_request("GET", "/calendar/status"))
        .await
        .unwrap();
    let status = read_json(response).await;
    assert_eq!(status["ready"], false);
    assert_eq!(status["holidays"], 0);
}

#[tokio::test]
async fn task_lifecycle_via_http_api() {
    let app = new_router();

    // Create task
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks",
            json!({"type": "task", "name": "HTTP Demo", "startDate": "2025/08/20", "endDate": "2025/08/25"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Task = serde_json::from_slice(
        &body::to_bytes(response.into_body(), usize::MAX).await.unwrap(),
    )
    .unwrap();
    assert_eq!(created.id, 6);
    assert_eq!(created.duration, Some(4));

    // Fetch created task
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/tasks/6"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = read_json(response).await;
    assert_eq!(fetched["taskName"], "HTTP Demo");

    // Delete the task
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/tasks/6"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Ensure the task is gone
    let response = app
        .oneshot(empty_request("GET", "/tasks/6"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_bad_dates() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks",
            json!({"type": "task", "name": "Broken", "startDate": "2025/8/20"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["field"], "startDate");

    let response = app.oneshot(empty_request("GET", "/tasks")).await.unwrap();
    let tasks = read_json(response).await;
    assert_eq!(tasks.as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn field_edits_recompute_and_validate() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/tasks/2/fields",
            json!({"field": "duration", "value": "2"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task = read_json(response).await;
    assert_eq!(task["endDate"], "2025/08/21");
    assert_eq!(task["duration"], "2");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/tasks/2/fields",
            json!({"field": "progress", "value": "150"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["field"], "progress");

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/tasks/99/fields",
            json!({"field": "taskName", "value": "Ghost"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn move_rows_as_a_block() {
    let app = new_router();
    let response = app
        .oneshot(json_request(
            "POST",
            "/tasks/move",
            json!({"ids": [4, 5], "targetIndex": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tasks = read_json(response).await;
    let ids: Vec<i64> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 5, 1, 2, 3]);
}

#[tokio::test]
async fn bar_changes_rewrite_dates() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks/2/bars",
            json!({"kind": "planned", "start": "2025/08/21", "end": "2025/08/26"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task = read_json(response).await;
    assert_eq!(task["startDate"], "2025/08/21");
    assert_eq!(task["duration"], "4");

    let response = app
        .oneshot(json_request(
            "POST",
            "/tasks/2/bars",
            json!({"kind": "progress", "start": "2025/08/21", "end": "2025/08/22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn range_lists_day_columns() {
    let mut table = HolidayTable::new();
    table.insert(
        chrono::NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        "Respect for the Aged Day",
    );
    let store = TaskStore::with_sample_data(CalendarSource::with_table(table));
    let app = http_api::router(http_api::AppState::new(store));

    let response = app.oneshot(empty_request("GET", "/range")).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["range"]["start"], "2025-08-13");
    assert_eq!(body["range"]["end"], "2025-10-05");
    let columns = body["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 54);
    let holiday = columns
        .iter()
        .find(|column| column["date"] == "2025-09-15")
        .unwrap();
    assert_eq!(holiday["kind"], "holiday");
    assert_eq!(holiday["holiday_name"], "Respect for the Aged Day");
}

#[tokio::test]
async fn import_and_export() {
    let app = new_router();
    let payload = r#"[{"id": 8, "type": "theme", "themeName": "Imported"}]"#;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["imported"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .body(Body::from(r#"{"not": "an array"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(empty_request("GET", "/export")).await.unwrap();
    let rows = read_json(response).await;
    assert_eq!(rows, json!([{
        "id": 8,
        "type": "theme",
        "themeName": "Imported",
        "taskName": "",
        "assignee": "",
        "startDate": "",
        "endDate": "",
        "duration": "",
        "actualStartDate": "",
        "actualEndDate": "",
        "progress": "0"
    }]));
}
