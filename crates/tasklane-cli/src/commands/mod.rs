pub mod compose;
pub mod kube;
pub mod metrics;

use std::process::ExitCode;

use tasklane_orchestrator::{CommandRunner, Orchestrator};

pub fn list<R: CommandRunner>(orchestrator: &Orchestrator<R>) -> anyhow::Result<ExitCode> {
    for descriptor in orchestrator.registry().iter() {
        println!(
            "{:<10} {:<26} {}",
            descriptor.name,
            descriptor.compose_file.display(),
            descriptor.manifest.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}
