//! tasklane-core — shared building blocks for the Tasklane services and tools.
//!
//! - [`config`]: process configuration for the HTTP services, built once at
//!   startup from environment variables.
//! - [`environment`]: the registry of deployable environments (`db-env`,
//!   `auth-env`, `todo-env`) and their Compose/Kubernetes descriptors.
//! - [`token`]: signed, time-bounded access tokens issued by the auth
//!   service and verified by the todo service.
//! - [`http`]: the JSON error type both services answer with.
//! - [`db`]: the Postgres pool both services persist through.

pub mod config;
pub mod db;
pub mod environment;
pub mod http;
pub mod token;

pub use config::{ConfigError, DatabaseConfig, ServiceConfig};
pub use environment::{EnvironmentDescriptor, EnvironmentRegistry, UnknownEnvironment};
pub use http::ApiError;
pub use token::{Claims, TokenError, TokenKeys};
