//! Environment descriptors: which Compose file, Kubernetes manifest and
//! containers make up each deployable environment.
//!
//! The registry is fixed for the lifetime of a process. It starts from
//! [`EnvironmentRegistry::builtin`] and may be replaced by an
//! `[[environments]]` table in the orchestrator's TOML configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when an environment name is not in the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("environment '{0}' is not defined")]
pub struct UnknownEnvironment(pub String);

/// A named deployable unit and everything needed to run it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    /// Symbolic name, e.g. `auth-env`.
    pub name: String,
    /// Compose file that defines the containers.
    pub compose_file: PathBuf,
    /// Compose services that must be up for the environment to be complete.
    /// The last entry is the environment's own container.
    pub services: Vec<String>,
    /// Kubernetes manifest applied on deploy.
    pub manifest: PathBuf,
    /// Value of the `app` label carried by the environment's pods.
    pub k8s_label: String,
    /// Kubernetes service name used to resolve the external URL.
    pub k8s_service: String,
    /// Directory holding the environment's `.env` file.
    pub env_dir: PathBuf,
}

impl EnvironmentDescriptor {
    /// The container this environment starts and stops on its own.
    pub fn own_service(&self) -> &str {
        self.services.last().map(String::as_str).unwrap_or(&self.name)
    }

    /// Label selector matching the environment's pods.
    pub fn pod_selector(&self) -> String {
        format!("app={}", self.k8s_label)
    }
}

/// Ordered, immutable set of known environments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentRegistry {
    environments: Vec<EnvironmentDescriptor>,
}

impl EnvironmentRegistry {
    pub fn new(environments: Vec<EnvironmentDescriptor>) -> Self {
        Self { environments }
    }

    /// The three environments of the stock deployment.
    pub fn builtin() -> Self {
        Self::new(vec![
            descriptor(
                "db-env",
                "docker-compose.base.yaml",
                &["db"],
                "k8s/db_service.yaml",
                "db",
                "db",
            ),
            descriptor(
                "auth-env",
                "docker-compose.dev.yaml",
                &["db", "auth_service"],
                "k8s/auth_service.yaml",
                "auth-service",
                "src/auth_service",
            ),
            descriptor(
                "todo-env",
                "docker-compose.dev.yaml",
                &["db", "todo_service"],
                "k8s/todo_service.yaml",
                "todo-service",
                "src/todo_service",
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&EnvironmentDescriptor> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Look up an environment, rejecting names that are not registered.
    pub fn resolve(&self, name: &str) -> Result<&EnvironmentDescriptor, UnknownEnvironment> {
        self.get(name)
            .ok_or_else(|| UnknownEnvironment(name.to_string()))
    }

    /// Environment names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.iter().map(|e| e.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvironmentDescriptor> {
        self.environments.iter()
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

impl Default for EnvironmentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn descriptor(
    name: &str,
    compose_file: &str,
    services: &[&str],
    manifest: &str,
    k8s_name: &str,
    env_dir: &str,
) -> EnvironmentDescriptor {
    EnvironmentDescriptor {
        name: name.to_string(),
        compose_file: PathBuf::from(compose_file),
        services: services.iter().map(|s| s.to_string()).collect(),
        manifest: PathBuf::from(manifest),
        k8s_label: k8s_name.to_string(),
        k8s_service: k8s_name.to_string(),
        env_dir: PathBuf::from(env_dir),
    }
}
