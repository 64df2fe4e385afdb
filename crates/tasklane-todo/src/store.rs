//! Task persistence, Postgres or in-memory.
//!
//! Titles are unique per owner. Update and delete only match rows owned by
//! the caller, so another user's task id behaves as if it did not exist.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tasklane_core::db::is_unique_violation;
use thiserror::Error;
use tracing::debug;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task title already used by this owner")]
    DuplicateTitle,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Owner; never sent to clients.
    #[serde(skip_serializing)]
    pub username: String,
}

/// Title and description supplied by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
}

#[derive(Default)]
struct MemoryTasks {
    next_id: i32,
    rows: Vec<Task>,
}

impl MemoryTasks {
    fn title_taken(&self, username: &str, title: &str, except: Option<i32>) -> bool {
        self.rows
            .iter()
            .any(|t| t.username == username && t.title == title && Some(t.id) != except)
    }
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory(Arc<Mutex<MemoryTasks>>),
}

#[derive(Clone)]
pub struct TaskStore {
    backend: Backend,
}

fn unique_or(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicateTitle
    } else {
        StoreError::Database(err)
    }
}

impl TaskStore {
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

    /// Create the `tasks` table if it does not exist. Existing rows survive.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        if let Backend::Postgres(pool) = &self.backend {
            sqlx::query(
                r#"CREATE TABLE IF NOT EXISTS tasks (
                    id SERIAL PRIMARY KEY,
                    username TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    UNIQUE (username, title)
                )"#,
            )
            .execute(pool)
            .await?;
            debug!("tasks table ready");
        }
        Ok(())
    }

    pub async fn list(&self, username: &str) -> StoreResult<Vec<Task>> {
        match &self.backend {
            Backend::Postgres(pool) => Ok(sqlx::query_as::<_, Task>(
                "SELECT id, title, description, username FROM tasks WHERE username = $1 ORDER BY id",
            )
            .bind(username)
            .fetch_all(pool)
            .await?),
            Backend::Memory(tasks) => {
                let tasks = tasks.lock().map_err(|_| StoreError::Poisoned)?;
                Ok(tasks
                    .rows
                    .iter()
                    .filter(|t| t.username == username)
                    .cloned()
                    .collect())
            }
        }
    }

    /// Insert a task and return its id.
    pub async fn create(&self, username: &str, input: &TaskInput) -> StoreResult<i32> {
        match &self.backend {
            Backend::Postgres(pool) => sqlx::query_scalar::<_, i32>(
                "INSERT INTO tasks (username, title, description) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(username)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_one(pool)
            .await
            .map_err(unique_or),
            Backend::Memory(tasks) => {
                let mut tasks = tasks.lock().map_err(|_| StoreError::Poisoned)?;
                if tasks.title_taken(username, &input.title, None) {
                    return Err(StoreError::DuplicateTitle);
                }
                tasks.next_id += 1;
                let id = tasks.next_id;
                tasks.rows.push(Task {
                    id,
                    title: input.title.clone(),
                    description: input.description.clone(),
                    username: username.to_string(),
                });
                Ok(id)
            }
        }
    }

    /// Update the caller's task; `false` when no owned row has that id.
    pub async fn update(&self, username: &str, id: i32, input: &TaskInput) -> StoreResult<bool> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let result = sqlx::query(
                    "UPDATE tasks SET title = $1, description = $2 WHERE id = $3 AND username = $4",
                )
                .bind(&input.title)
                .bind(&input.description)
                .bind(id)
                .bind(username)
                .execute(pool)
                .await
                .map_err(unique_or)?;
                Ok(result.rows_affected() > 0)
            }
            Backend::Memory(tasks) => {
                let mut tasks = tasks.lock().map_err(|_| StoreError::Poisoned)?;
                if !tasks.rows.iter().any(|t| t.id == id && t.username == username) {
                    return Ok(false);
                }
                if tasks.title_taken(username, &input.title, Some(id)) {
                    return Err(StoreError::DuplicateTitle);
                }
                if let Some(task) = tasks.rows.iter_mut().find(|t| t.id == id) {
                    task.title = input.title.clone();
                    task.description = input.description.clone();
                }
                Ok(true)
            }
        }
    }

    /// Delete the caller's task; `false` when no owned row has that id.
    pub async fn delete(&self, username: &str, id: i32) -> StoreResult<bool> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND username = $2")
                    .bind(id)
                    .bind(username)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            Backend::Memory(tasks) => {
                let mut tasks = tasks.lock().map_err(|_| StoreError::Poisoned)?;
                let before = tasks.rows.len();
                tasks.rows.retain(|t| !(t.id == id && t.username == username));
                Ok(tasks.rows.len() < before)
            }
        }
    }
}
