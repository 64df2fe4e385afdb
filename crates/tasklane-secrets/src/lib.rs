//! tasklane-secrets — renders `.env` files into Kubernetes manifests.
//!
//! For an environment name the renderer finds the first `*.env` file in the
//! environment's directory, splits its entries by the secret-key prefix and
//! writes two manifests under `<output>/<environment>/`:
//!
//! ```text
//! configmap.yaml   entries without the prefix, values verbatim
//! secret.yaml      entries with the prefix, values base64-encoded
//! ```

pub mod dotenv;
pub mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use tasklane_core::{EnvironmentDescriptor, EnvironmentRegistry, UnknownEnvironment};
use thiserror::Error;
use tracing::{debug, info};

pub use dotenv::{load_env, parse_env, EnvMap};
pub use manifest::{render_config_map, render_secret, Manifest, DEFAULT_SECRET_PREFIX};

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    UnknownEnvironment(#[from] UnknownEnvironment),

    #[error("no .env file found in {0}")]
    NoEnvFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Where the renderer reads from and writes to.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Base directory that environment `env_dir`s are relative to.
    pub root: PathBuf,
    /// Directory receiving `<environment>/configmap.yaml` and `secret.yaml`.
    pub output_dir: PathBuf,
    /// Keys starting with this prefix go into the Secret.
    pub secret_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from("k8s/generated"),
            secret_prefix: DEFAULT_SECRET_PREFIX.to_string(),
        }
    }
}

/// Paths of the two manifests written for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPaths {
    pub config_map: PathBuf,
    pub secret: PathBuf,
}

/// Render the ConfigMap and Secret for `environment` and write them to disk.
pub fn render_environment(
    registry: &EnvironmentRegistry,
    environment: &str,
    options: &RenderOptions,
) -> RenderResult<RenderedPaths> {
    let descriptor = registry.resolve(environment)?;
    let env_dir = options.root.join(&descriptor.env_dir);
    let env_file = find_env_file(&env_dir)?;
    debug!(path = %env_file.display(), "using env file");

    let data = load_env(&env_file).map_err(|source| RenderError::Read {
        path: env_file.clone(),
        source,
    })?;

    let prefix = options.secret_prefix.as_str();
    let config_map = render_config_map(&config_map_name(descriptor), &data, prefix);
    let secret = render_secret(&secret_name(descriptor), &data, prefix);

    let out_dir = options.output_dir.join(&descriptor.name);
    fs::create_dir_all(&out_dir).map_err(|source| RenderError::Write {
        path: out_dir.clone(),
        source,
    })?;

    let paths = RenderedPaths {
        config_map: out_dir.join("configmap.yaml"),
        secret: out_dir.join("secret.yaml"),
    };
    write_manifest(&paths.config_map, &config_map)?;
    write_manifest(&paths.secret, &secret)?;

    info!(
        environment = %descriptor.name,
        config_entries = config_map.data.len(),
        secret_entries = secret.data.len(),
        "manifests rendered"
    );
    Ok(paths)
}

/// First regular file whose name ends in `.env`, in name order.
pub fn find_env_file(dir: &Path) -> RenderResult<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|source| RenderError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".env"))
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| RenderError::NoEnvFile(dir.to_path_buf()))
}

fn config_map_name(descriptor: &EnvironmentDescriptor) -> String {
    format!("{}-config", descriptor.k8s_label)
}

fn secret_name(descriptor: &EnvironmentDescriptor) -> String {
    format!("{}-secret", descriptor.k8s_label)
}

fn write_manifest(path: &Path, manifest: &Manifest) -> RenderResult<()> {
    let yaml = serde_yaml::to_string(manifest)?;
    fs::write(path, yaml).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}
