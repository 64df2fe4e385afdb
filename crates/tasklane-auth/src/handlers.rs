//! Auth route handlers.
//!
//! Password hashing and verification are CPU-bound and run on the blocking
//! pool so they never stall the async workers.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tasklane_core::ApiError;
use tracing::{debug, info};

use crate::store::StoreError;
use crate::AuthState;

const USERNAME_TAKEN: &str = "Username already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ApiError::BadRequest(USERNAME_TAKEN.to_string()),
            other => ApiError::internal(other),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AuthState>,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse, ApiError> {
    let cost = state.bcrypt_cost;
    let password = form.password;
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    state.store.insert(&form.username, &form.email, &hash).await?;
    info!(username = %form.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AuthState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(hash) = state.store.password_hash(&form.username).await? else {
        debug!(username = %form.username, "login for unknown user");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let password = form.password;
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;
    if !verified {
        debug!(username = %form.username, "login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.keys.issue(&form.username).map_err(ApiError::internal)?;
    info!(username = %form.username, "token issued");
    Ok(Json(json!({ "token": token })))
}

/// GET /auth/users
pub async fn list_users(State(state): State<AuthState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.store.list().await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
