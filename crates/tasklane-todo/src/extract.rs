//! Path and body extractors that reject with the service's JSON error body.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use tasklane_core::ApiError;
use tracing::debug;

use crate::handlers::TASK_NOT_FOUND;
use crate::store::TaskInput;

/// Task id from the `{id}` path segment.
///
/// Ids that are numeric but outside the id column's range cannot name a
/// task and are answered with 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub i32);

impl<S> FromRequestParts<S> for TaskId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "task id rejected");
                ApiError::BadRequest(rejection.body_text())
            })?;
        i32::try_from(raw)
            .map(TaskId)
            .map_err(|_| ApiError::NotFound(TASK_NOT_FOUND.to_string()))
    }
}

/// JSON task payload.
#[derive(Debug, Clone)]
pub struct TaskBody(pub TaskInput);

impl<S> FromRequest<S> for TaskBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(input) = Json::<TaskInput>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "task body rejected");
                ApiError::BadRequest(rejection.body_text())
            })?;
        Ok(TaskBody(input))
    }
}
