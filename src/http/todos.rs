//! Task endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::tasks::Task;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskResponse {
    pub message: &'static str,
    pub deleted_task: Task,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// GET /api/todos
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .tasks
        .list_tasks()
        .await
        .map_err(ApiError::task("list tasks"))?;
    Ok(Json(tasks))
}

/// POST /api/todos
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let request = json_body(body)?;
    let task = state
        .tasks
        .create_task(request.text.as_deref())
        .await
        .map_err(ApiError::task("create task"))?;

    metrics::record_task_created(&state.instance);
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/todos/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let request = json_body(body)?;
    let task = state
        .tasks
        .set_completion(&id, request.completed)
        .await
        .map_err(ApiError::task("update task"))?;
    Ok(Json(task))
}

/// DELETE /api/todos/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteTaskResponse>, ApiError> {
    let deleted_task = state
        .tasks
        .delete_task(&id)
        .await
        .map_err(ApiError::task("delete task"))?;
    Ok(Json(DeleteTaskResponse {
        message: "task deleted",
        deleted_task,
    }))
}
