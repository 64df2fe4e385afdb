//! `envsecrets <env>` — render an environment's `.env` file into a
//! Kubernetes ConfigMap and Secret.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tasklane_orchestrator::OrchestratorConfig;
use tasklane_secrets::{RenderOptions, render_environment, DEFAULT_SECRET_PREFIX};

#[derive(Parser)]
#[command(
    name = "envsecrets",
    about = "Render configmap.yaml and secret.yaml from an environment's .env file",
    version
)]
struct Cli {
    /// Environment name (db-env, auth-env, todo-env, ...)
    env: String,

    /// Base directory the environment directories are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output directory; manifests land in <output>/<env>/
    #[arg(short, long, default_value = "k8s/generated")]
    output: PathBuf,

    /// Keys starting with this prefix go into the Secret
    #[arg(long, default_value = DEFAULT_SECRET_PREFIX)]
    secret_prefix: String,

    /// Orchestrator configuration providing the environment table
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tasklane_secrets=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let registry = OrchestratorConfig::load(cli.config.as_deref())?.registry();

    let options = RenderOptions {
        root: cli.root,
        output_dir: cli.output,
        secret_prefix: cli.secret_prefix,
    };
    let paths = render_environment(&registry, &cli.env, &options)
        .with_context(|| format!("failed to render manifests for {}", cli.env))?;

    println!("✓ Generated {}", paths.config_map.display());
    println!("✓ Generated {}", paths.secret.display());
    Ok(())
}
