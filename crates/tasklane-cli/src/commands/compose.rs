//! `envctl start_env | stop_env | status_env` — local docker-compose stacks.

use std::process::ExitCode;

use anyhow::Context;
use tasklane_orchestrator::compose::format_uptime;
use tasklane_orchestrator::{CommandRunner, Orchestrator};

pub fn start<R: CommandRunner>(orchestrator: &Orchestrator<R>, env: &str) -> anyhow::Result<ExitCode> {
    let ps = orchestrator
        .start(env)
        .with_context(|| format!("failed to start {env}"))?;
    println!("✓ Started {env}");
    print!("{ps}");
    Ok(ExitCode::SUCCESS)
}

pub fn stop<R: CommandRunner>(orchestrator: &Orchestrator<R>, env: &str) -> anyhow::Result<ExitCode> {
    let ps = orchestrator
        .stop(env)
        .with_context(|| format!("failed to stop {env}"))?;
    println!("✓ Stopped {env}");
    print!("{ps}");
    Ok(ExitCode::SUCCESS)
}

pub fn status<R: CommandRunner>(orchestrator: &Orchestrator<R>, env: &str) -> anyhow::Result<ExitCode> {
    let report = orchestrator
        .status_compose(env)
        .with_context(|| format!("failed to inspect {env}"))?;

    if report.containers.is_empty() {
        println!("No containers running for {env}");
    } else {
        println!("{:<32} {:<16} {:<16} UPTIME", "CONTAINER", "SERVICE", "HEALTH");
        for c in &report.containers {
            println!(
                "{:<32} {:<16} {:<16} {}",
                c.name,
                c.service,
                c.health.to_string(),
                format_uptime(c.uptime)
            );
        }
    }
    println!(
        "{}: {} ({}/{} up, {} remaining)",
        report.environment, report.health, report.row.completed, report.row.total, report.row.remaining
    );
    Ok(ExitCode::SUCCESS)
}
