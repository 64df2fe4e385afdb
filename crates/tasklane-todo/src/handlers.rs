//! Task route handlers. Every route requires a bearer token.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tasklane_core::ApiError;
use tracing::info;

use crate::auth::CurrentUser;
use crate::extract::{TaskBody, TaskId};
use crate::store::StoreError;
use crate::TodoState;

pub(crate) const TASK_NOT_FOUND: &str = "Tarea no encontrada";
const TITLE_TAKEN: &str = "Ya existe una tarea con ese título";

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateTitle => ApiError::Conflict(TITLE_TAKEN.to_string()),
            other => ApiError::internal(other),
        }
    }
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

/// GET /tasks
pub async fn list_tasks(
    State(state): State<TodoState>,
    CurrentUser(username): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.store.list(&username).await?;
    Ok(Json(tasks))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<TodoState>,
    CurrentUser(username): CurrentUser,
    TaskBody(input): TaskBody,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.store.create(&username, &input).await?;
    info!(%username, id, "task created");
    Ok(message("Tarea registrada"))
}

/// PUT /tasks/{id}
pub async fn update_task(
    State(state): State<TodoState>,
    CurrentUser(username): CurrentUser,
    TaskId(id): TaskId,
    TaskBody(input): TaskBody,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.update(&username, id, &input).await? {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }
    info!(%username, id, "task updated");
    Ok(message("Tarea actualizada"))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<TodoState>,
    CurrentUser(username): CurrentUser,
    TaskId(id): TaskId,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete(&username, id).await? {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }
    info!(%username, id, "task deleted");
    Ok(message("Tarea eliminada"))
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
