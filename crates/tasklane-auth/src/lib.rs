//! tasklane-auth — user registration and access-token issuance.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/auth/register` | Register a user (form: username, email, password) |
//! | POST | `/auth/login` | Exchange credentials for an access token (form) |
//! | GET | `/auth/users` | List usernames and emails |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;
pub mod store;

use axum::Router;
use axum::routing::{get, post};
use tasklane_core::TokenKeys;
use tower_http::trace::TraceLayer;

pub use store::{StoreError, StoreResult, UserStore, UserSummary};

/// Shared state for the auth handlers.
#[derive(Clone)]
pub struct AuthState {
    pub store: UserStore,
    pub keys: TokenKeys,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
}

pub fn build_router(state: AuthState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/users", get(handlers::list_users))
        .with_state(state);

    Router::new()
        .nest("/auth", auth_routes)
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
}
