//! Orchestrator error types.

use std::path::PathBuf;

use tasklane_core::UnknownEnvironment;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    UnknownEnvironment(#[from] UnknownEnvironment),

    #[error("failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("'{command}' exited with {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("metrics file {path}: {source}")]
    Metrics {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unexpected output: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
