use std::process::ExitCode;

use anyhow::Context;
use chrono::SecondsFormat;
use tasklane_orchestrator::{CommandRunner, Orchestrator};

pub fn burn_chart<R: CommandRunner>(orchestrator: &Orchestrator<R>) -> anyhow::Result<ExitCode> {
    let path = &orchestrator.config().health_metrics;
    let series = orchestrator
        .burn_chart()
        .with_context(|| format!("failed to read {}", path.display()))?;

    if series.is_empty() {
        println!("No health snapshots in {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<22} {:<10} {:>8} {:>10}", "TIMESTAMP", "ENV", "BURN_UP", "BURN_DOWN");
    for point in &series {
        println!(
            "{:<22} {:<10} {:>8} {:>10}",
            point.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            point.environment,
            point.burn_up,
            point.burn_down
        );
    }
    Ok(ExitCode::SUCCESS)
}
