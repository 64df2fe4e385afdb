//! User persistence.
//!
//! [`UserStore`] is either backed by a Postgres pool (production) or by an
//! in-memory table (tests). Both enforce unique usernames.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tasklane_core::db::is_unique_violation;
use thiserror::Error;
use tracing::debug;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A user as listed by `GET /auth/users`. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
struct UserRow {
    username: String,
    email: String,
    password_hash: String,
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory(Arc<Mutex<Vec<UserRow>>>),
}

#[derive(Clone)]
pub struct UserStore {
    backend: Backend,
}

impl UserStore {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            backend: Backend::Postgres(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    /// Create the `users` table if it does not exist.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        if let Backend::Postgres(pool) = &self.backend {
            sqlx::query(
                r#"CREATE TABLE IF NOT EXISTS users (
                    id SERIAL PRIMARY KEY,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL,
                    password TEXT NOT NULL
                )"#,
            )
            .execute(pool)
            .await?;
            debug!("users table ready");
        }
        Ok(())
    }

    /// Insert a user; [`StoreError::Duplicate`] when the username is taken.
    pub async fn insert(&self, username: &str, email: &str, password_hash: &str) -> StoreResult<()> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let inserted = sqlx::query(
                    "INSERT INTO users (username, email, password) VALUES ($1, $2, $3)",
                )
                .bind(username)
                .bind(email)
                .bind(password_hash)
                .execute(pool)
                .await;
                match inserted {
                    Ok(_) => Ok(()),
                    Err(err) if is_unique_violation(&err) => Err(StoreError::Duplicate),
                    Err(err) => Err(err.into()),
                }
            }
            Backend::Memory(users) => {
                let mut users = users.lock().map_err(|_| StoreError::Poisoned)?;
                if users.iter().any(|u| u.username == username) {
                    return Err(StoreError::Duplicate);
                }
                users.push(UserRow {
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Stored password hash for `username`, if the user exists.
    pub async fn password_hash(&self, username: &str) -> StoreResult<Option<String>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let hash = sqlx::query_scalar::<_, String>(
                    "SELECT password FROM users WHERE username = $1",
                )
                .bind(username)
                .fetch_optional(pool)
                .await?;
                Ok(hash)
            }
            Backend::Memory(users) => {
                let users = users.lock().map_err(|_| StoreError::Poisoned)?;
                Ok(users
                    .iter()
                    .find(|u| u.username == username)
                    .map(|u| u.password_hash.clone()))
            }
        }
    }

    /// All users in insertion order.
    pub async fn list(&self) -> StoreResult<Vec<UserSummary>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let users = sqlx::query_as::<_, UserSummary>(
                    "SELECT username, email FROM users ORDER BY id",
                )
                .fetch_all(pool)
                .await?;
                Ok(users)
            }
            Backend::Memory(users) => {
                let users = users.lock().map_err(|_| StoreError::Poisoned)?;
                Ok(users
                    .iter()
                    .map(|u| UserSummary {
                        username: u.username.clone(),
                        email: u.email.clone(),
                    })
                    .collect())
            }
        }
    }
}
