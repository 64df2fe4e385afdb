//! tasklane-todo — per-user task lists.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/tasks` | List the caller's tasks |
//! | POST | `/tasks` | Create a task (JSON: title, description) |
//! | PUT | `/tasks/{id}` | Replace title and description of an owned task |
//! | DELETE | `/tasks/{id}` | Delete an owned task |
//! | GET | `/healthz` | Liveness probe |
//!
//! The caller is identified by the `sub` claim of the bearer token issued
//! by the auth service; both services must share `SECRET_KEY`.

pub mod auth;
pub mod extract;
pub mod handlers;
pub mod store;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, put};
use tasklane_core::TokenKeys;
use tower_http::trace::TraceLayer;

pub use auth::CurrentUser;
pub use extract::{TaskBody, TaskId};
pub use store::{StoreError, StoreResult, Task, TaskInput, TaskStore};

#[derive(Clone)]
pub struct TodoState {
    pub store: TaskStore,
    pub keys: TokenKeys,
}

impl FromRef<TodoState> for TokenKeys {
    fn from_ref(state: &TodoState) -> Self {
        state.keys.clone()
    }
}

pub fn build_router(state: TodoState) -> Router {
    Router::new()
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/{id}", put(handlers::update_task).delete(handlers::delete_task))
        .with_state(state)
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
}
