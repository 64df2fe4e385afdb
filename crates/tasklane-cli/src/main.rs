use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tasklane_orchestrator::{Orchestrator, OrchestratorConfig, SystemRunner};

mod commands;

#[derive(Parser)]
#[command(
    name = "envctl",
    about = "Tasklane — start, inspect and deploy the service environments",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Orchestrator configuration (default: ./envctl.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
enum Commands {
    /// Start the environment's container with docker-compose
    StartEnv {
        /// Environment name (see list_envs)
        env: String,
    },
    /// Stop and remove the environment's container
    StopEnv { env: String },
    /// Show container health and log a health snapshot
    StatusEnv { env: String },
    /// Show readiness and uptime of the environment's pods
    #[command(name = "status_k8s")]
    StatusK8s { env: String },
    /// List the defined environments
    ListEnvs,
    /// Apply the environment's manifest and wait for readiness.
    ///
    /// Exits with status 2 when the manifest was applied but no pod
    /// reported ready within the retry budget.
    DeployService { env: String },
    /// Delete the environment's Kubernetes resources
    DeleteService { env: String },
    /// Print the burn-up / burn-down series from the health snapshots
    BurnChart,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("envctl=info".parse()?)
                .add_directive("tasklane_orchestrator=info".parse()?),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            e.print()?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            e.print()?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = OrchestratorConfig::load(cli.config.as_deref())?;
    let orchestrator = Orchestrator::new(config, SystemRunner);

    match cli.command {
        Commands::StartEnv { env } => commands::compose::start(&orchestrator, &env),
        Commands::StopEnv { env } => commands::compose::stop(&orchestrator, &env),
        Commands::StatusEnv { env } => commands::compose::status(&orchestrator, &env),
        Commands::StatusK8s { env } => commands::kube::status(&orchestrator, &env),
        Commands::ListEnvs => commands::list(&orchestrator),
        Commands::DeployService { env } => commands::kube::deploy(&orchestrator, &env),
        Commands::DeleteService { env } => commands::kube::delete(&orchestrator, &env),
        Commands::BurnChart => commands::metrics::burn_chart(&orchestrator),
    }
}
