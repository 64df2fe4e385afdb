//! `envctl status_k8s | deploy_service | delete_service` — minikube deployments.

use std::process::ExitCode;

use anyhow::Context;
use tasklane_orchestrator::compose::format_uptime;
use tasklane_orchestrator::{CommandRunner, DeployOutcome, Orchestrator};
use tracing::warn;

/// Exit status when the manifest was applied but readiness never confirmed.
const APPLIED_NOT_READY: u8 = 2;

pub fn status<R: CommandRunner>(orchestrator: &Orchestrator<R>, env: &str) -> anyhow::Result<ExitCode> {
    let pods = orchestrator
        .status_kubernetes(env)
        .with_context(|| format!("failed to list pods for {env}"))?;

    if pods.is_empty() {
        println!("No pods found for {env}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<40} {:<6} UPTIME", "POD", "READY");
    for pod in &pods {
        println!(
            "{:<40} {:<6} {}",
            pod.name,
            if pod.ready { "yes" } else { "no" },
            pod.uptime.map(format_uptime).unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub fn deploy<R: CommandRunner>(orchestrator: &Orchestrator<R>, env: &str) -> anyhow::Result<ExitCode> {
    let outcome = orchestrator
        .deploy(env)
        .with_context(|| format!("failed to deploy {env}"))?;

    match outcome {
        DeployOutcome::Ready { url, timing, attempts, services } => {
            println!("✓ {env} ready after {attempts} check(s)");
            match url {
                Some(url) => println!("  URL:        {url}"),
                None => println!("  URL:        (unavailable)"),
            }
            println!("  Lead time:  {}s", timing.lead_time_s());
            println!("  Cycle time: {}s", timing.cycle_time_s());
            print!("{services}");
            Ok(ExitCode::SUCCESS)
        }
        DeployOutcome::AppliedNotReady { attempts, services } => {
            warn!(environment = env, attempts, "deployment not confirmed ready");
            println!("✗ {env} applied, but not ready after {attempts} check(s)");
            print!("{services}");
            Ok(ExitCode::from(APPLIED_NOT_READY))
        }
    }
}

pub fn delete<R: CommandRunner>(orchestrator: &Orchestrator<R>, env: &str) -> anyhow::Result<ExitCode> {
    let services = orchestrator
        .delete(env)
        .with_context(|| format!("failed to delete {env}"))?;
    println!("✓ Deleted {env}");
    print!("{services}");
    Ok(ExitCode::SUCCESS)
}
