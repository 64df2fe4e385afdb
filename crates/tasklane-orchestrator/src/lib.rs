//! tasklane-orchestrator — drives the local container stacks and the
//! Kubernetes deployments of the Tasklane environments.
//!
//! Every action shells out through a [`CommandRunner`] (`docker-compose`,
//! `docker`, `kubectl`, `minikube`, `git`) and is strictly sequential: one
//! invocation, one action, then exit.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├── EnvironmentRegistry (name → compose file, manifest, targets)
//!   ├── CommandRunner (system processes, scripted in tests)
//!   ├── compose: container inspection → three-valued health
//!   ├── kube: pod listing → Ready condition + uptime
//!   ├── readiness: bounded retry loop with fixed delay
//!   └── metrics: append-only CSV logs (health snapshots, deploy timing)
//! ```
//!
//! # Deploy timing
//!
//! `deploy` stamps the last commit time (lead-time start) and the moment
//! the deploy began (cycle-time start). Once the first pod reports ready it
//! appends `lead_time_s` and `cycle_time_s` to the deploy-metrics CSV. When
//! readiness is never observed the result is [`DeployOutcome::AppliedNotReady`]
//! and no timing row is written.

pub mod burn;
pub mod compose;
pub mod config;
pub mod error;
pub mod kube;
pub mod metrics;
pub mod orchestrator;
pub mod readiness;
pub mod runner;

pub use burn::{BurnPoint, burn_series};
pub use compose::{ComposeReport, ContainerHealth, ContainerStatus, EnvironmentHealth};
pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use kube::PodReport;
pub use metrics::{DeployRow, HealthRow};
pub use orchestrator::{DeployOutcome, Orchestrator};
pub use readiness::{ReadinessOutcome, ReadinessPolicy};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
