//! envctl.toml configuration parser.
//!
//! Every field is optional; an absent file means the built-in defaults.
//!
//! ```toml
//! compose_bin = "docker compose"
//! health_metrics = "metrics/burn_metrics.csv"
//!
//! [readiness]
//! retries = 20
//! delay = "5s"
//!
//! [[environments]]
//! name = "db-env"
//! # ...
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tasklane_core::{EnvironmentDescriptor, EnvironmentRegistry};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::readiness::ReadinessPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Compose front-end; may contain a subcommand, e.g. `docker compose`.
    pub compose_bin: String,
    pub docker_bin: String,
    pub kubectl_bin: String,
    pub minikube_bin: String,
    pub git_bin: String,
    /// Health snapshots CSV.
    pub health_metrics: PathBuf,
    /// Deploy timing CSV.
    pub deploy_metrics: PathBuf,
    pub readiness: ReadinessPolicy,
    /// Replaces the built-in environments when present.
    pub environments: Option<Vec<EnvironmentDescriptor>>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            compose_bin: "docker-compose".to_string(),
            docker_bin: "docker".to_string(),
            kubectl_bin: "kubectl".to_string(),
            minikube_bin: "minikube".to_string(),
            git_bin: "git".to_string(),
            health_metrics: PathBuf::from("burn_metrics.csv"),
            deploy_metrics: PathBuf::from("deploy_metrics.csv"),
            readiness: ReadinessPolicy::default(),
            environments: None,
        }
    }
}

/// File read when no explicit configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "envctl.toml";

impl OrchestratorConfig {
    /// Load `explicit` if given, else `envctl.toml` when it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> OrchestratorResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> OrchestratorResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OrchestratorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> OrchestratorResult<Self> {
        toml::from_str(content).map_err(|e| OrchestratorError::Config(e.to_string()))
    }

    /// The environment registry this configuration describes.
    pub fn registry(&self) -> EnvironmentRegistry {
        match &self.environments {
            Some(envs) => EnvironmentRegistry::new(envs.clone()),
            None => EnvironmentRegistry::builtin(),
        }
    }

    /// Compose front-end split into program and leading arguments.
    pub fn compose_command(&self) -> (String, Vec<String>) {
        let mut parts = self.compose_bin.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "docker-compose".to_string());
        (program, parts.collect())
    }
}
