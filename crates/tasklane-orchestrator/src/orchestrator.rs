//! The environment orchestrator: one method per `envctl` command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tasklane_core::{EnvironmentDescriptor, EnvironmentRegistry};
use tracing::{debug, info, warn};

use crate::burn::{BurnPoint, burn_series};
use crate::compose::{
    ComposeReport, ContainerStatus, EnvironmentHealth, INSPECT_FORMAT, completed_targets,
};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::kube::{FIRST_CONTAINER_READY, PodReport, parse_pods};
use crate::metrics::{self, DeployRow, HealthRow};
use crate::readiness::{ReadinessOutcome, poll_until_ready};
use crate::runner::{CommandOutput, CommandRunner};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Result of `deploy_service`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The manifest was applied and the first pod reported ready.
    Ready {
        /// External URL from `minikube service --url`, when resolvable.
        url: Option<String>,
        timing: DeployRow,
        attempts: u32,
        services: String,
    },
    /// The manifest was applied but readiness was never observed.
    AppliedNotReady { attempts: u32, services: String },
}

impl DeployOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

pub struct Orchestrator<R> {
    config: OrchestratorConfig,
    registry: EnvironmentRegistry,
    runner: R,
    clock: Clock,
    sleeper: Sleeper,
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(config: OrchestratorConfig, runner: R) -> Self {
        let registry = config.registry();
        Self {
            config,
            registry,
            runner,
            clock: Arc::new(Utc::now),
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    /// Replace the wall clock (tests use a fixed instant).
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the sleep between readiness attempts.
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Names of all defined environments.
    pub fn list(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    // ── Compose ────────────────────────────────────────────────

    /// Bring up the environment's own container; returns `docker ps`.
    pub fn start(&self, env: &str) -> OrchestratorResult<String> {
        let descriptor = self.registry.resolve(env)?;
        info!(environment = %descriptor.name, service = descriptor.own_service(), "starting environment");

        self.compose(descriptor, &["up", "-d", descriptor.own_service()])?;
        self.docker_ps()
    }

    /// Stop and remove the environment's own container; returns `docker ps`.
    pub fn stop(&self, env: &str) -> OrchestratorResult<String> {
        let descriptor = self.registry.resolve(env)?;
        info!(environment = %descriptor.name, service = descriptor.own_service(), "stopping environment");

        self.compose(descriptor, &["stop", descriptor.own_service()])?;
        self.compose(descriptor, &["rm", "-f", descriptor.own_service()])?;
        self.docker_ps()
    }

    /// Inspect the environment's containers and log a health snapshot.
    pub fn status_compose(&self, env: &str) -> OrchestratorResult<ComposeReport> {
        let descriptor = self.registry.resolve(env)?;
        let now = (self.clock)();

        let mut ps_args = vec!["ps", "-q"];
        ps_args.extend(descriptor.services.iter().map(String::as_str));
        let ids = self.compose(descriptor, &ps_args)?;

        let mut containers = Vec::new();
        for id in ids.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let out = self.checked(
                &self.config.docker_bin,
                &args(&["inspect", "--format", INSPECT_FORMAT, id]),
            )?;
            for line in out.stdout.lines().filter(|l| !l.trim().is_empty()) {
                containers.push(ContainerStatus::parse_inspect(line, now)?);
            }
        }

        let total = descriptor.services.len() as u32;
        let completed = completed_targets(&descriptor.services, &containers);
        let row = HealthRow::new(now, &descriptor.name, completed, total);
        metrics::append_health(&self.config.health_metrics, &row)?;

        let health = EnvironmentHealth::evaluate(&descriptor.services, &containers);
        info!(environment = %descriptor.name, %health, completed, total, "compose status");

        Ok(ComposeReport {
            environment: descriptor.name.clone(),
            containers,
            health,
            row,
        })
    }

    // ── Kubernetes ─────────────────────────────────────────────

    /// Readiness and uptime of every pod carrying the environment's label.
    pub fn status_kubernetes(&self, env: &str) -> OrchestratorResult<Vec<PodReport>> {
        let descriptor = self.registry.resolve(env)?;
        let out = self.checked(
            &self.config.kubectl_bin,
            &args(&["get", "pods", "-l", &descriptor.pod_selector(), "-o", "json"]),
        )?;
        parse_pods(&out.stdout, (self.clock)())
    }

    /// Apply the manifest, wait for readiness and record deploy timing.
    pub fn deploy(&self, env: &str) -> OrchestratorResult<DeployOutcome> {
        let descriptor = self.registry.resolve(env)?;
        info!(environment = %descriptor.name, manifest = %descriptor.manifest.display(), "deploying");

        let commit_time = self.last_commit_time();
        let deploy_start = (self.clock)();

        self.kubectl_manifest("apply", &descriptor.manifest)?;

        let selector = descriptor.pod_selector();
        let sleeper = Arc::clone(&self.sleeper);
        let outcome = poll_until_ready(
            &self.config.readiness,
            || self.first_pod_ready(&selector),
            |d| sleeper(d),
        );

        match outcome {
            ReadinessOutcome::Ready { attempts } => {
                let ready_time = (self.clock)();
                let url = self.service_url(descriptor);
                let timing = DeployRow {
                    environment: descriptor.name.clone(),
                    commit_time,
                    deploy_start,
                    ready_time,
                };
                metrics::append_deploy(&self.config.deploy_metrics, &timing)?;
                info!(
                    environment = %descriptor.name,
                    lead_time_s = timing.lead_time_s(),
                    cycle_time_s = timing.cycle_time_s(),
                    "deployment ready"
                );
                Ok(DeployOutcome::Ready {
                    url,
                    timing,
                    attempts,
                    services: self.service_list(),
                })
            }
            ReadinessOutcome::TimedOut { attempts } => {
                warn!(environment = %descriptor.name, attempts, "manifest applied but pods never became ready");
                Ok(DeployOutcome::AppliedNotReady {
                    attempts,
                    services: self.service_list(),
                })
            }
        }
    }

    /// Delete the manifest's resources; returns `minikube service list`.
    pub fn delete(&self, env: &str) -> OrchestratorResult<String> {
        let descriptor = self.registry.resolve(env)?;
        info!(environment = %descriptor.name, "deleting deployment");
        self.kubectl_manifest("delete", &descriptor.manifest)?;
        Ok(self.service_list())
    }

    // ── Metrics ────────────────────────────────────────────────

    /// Burn-up/burn-down series over the health-metrics log.
    pub fn burn_chart(&self) -> OrchestratorResult<Vec<BurnPoint>> {
        let rows = metrics::read_health(&self.config.health_metrics)?;
        Ok(burn_series(&rows))
    }

    // ── Helpers ────────────────────────────────────────────────

    fn run(&self, program: &str, args: &[String]) -> OrchestratorResult<CommandOutput> {
        self.runner
            .run(program, args)
            .map_err(|source| OrchestratorError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    /// Run a command and turn a non-zero exit into an error.
    fn checked(&self, program: &str, args: &[String]) -> OrchestratorResult<CommandOutput> {
        let out = self.run(program, args)?;
        if !out.success() {
            return Err(OrchestratorError::CommandFailed {
                command: format!("{program} {}", args.join(" ")),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out)
    }

    fn compose(
        &self,
        descriptor: &EnvironmentDescriptor,
        tail: &[&str],
    ) -> OrchestratorResult<CommandOutput> {
        let (program, mut full) = self.config.compose_command();
        full.push("-f".to_string());
        full.push(descriptor.compose_file.display().to_string());
        full.extend(tail.iter().map(|s| s.to_string()));
        self.checked(&program, &full)
    }

    fn docker_ps(&self) -> OrchestratorResult<String> {
        Ok(self.checked(&self.config.docker_bin, &args(&["ps"]))?.stdout)
    }

    fn kubectl_manifest(&self, verb: &str, manifest: &Path) -> OrchestratorResult<CommandOutput> {
        let manifest = manifest.display().to_string();
        self.checked(&self.config.kubectl_bin, &args(&[verb, "-f", &manifest]))
    }

    fn first_pod_ready(&self, selector: &str) -> bool {
        let probe = args(&["get", "pods", "-l", selector, "-o", FIRST_CONTAINER_READY]);
        match self.run(&self.config.kubectl_bin, &probe) {
            Ok(out) => out.success() && out.stdout.trim() == "true",
            Err(e) => {
                debug!(error = %e, "readiness probe failed to run");
                false
            }
        }
    }

    /// Time of the last commit, or now when git cannot tell.
    fn last_commit_time(&self) -> DateTime<Utc> {
        let out = self.run(&self.config.git_bin, &args(&["log", "-1", "--format=%ct"]));
        let parsed = out
            .ok()
            .filter(CommandOutput::success)
            .and_then(|o| o.stdout.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        parsed.unwrap_or_else(|| {
            warn!("last commit time unavailable, using now");
            (self.clock)()
        })
    }

    fn service_url(&self, descriptor: &EnvironmentDescriptor) -> Option<String> {
        let out = self.run(
            &self.config.minikube_bin,
            &args(&["service", &descriptor.k8s_service, "--url"]),
        );
        match out {
            Ok(o) if o.success() => o
                .stdout
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string),
            Ok(o) => {
                warn!(service = %descriptor.k8s_service, stderr = %o.stderr.trim(), "service URL unavailable");
                None
            }
            Err(e) => {
                warn!(service = %descriptor.k8s_service, error = %e, "service URL unavailable");
                None
            }
        }
    }

    fn service_list(&self) -> String {
        match self.run(&self.config.minikube_bin, &args(&["service", "list"])) {
            Ok(o) if o.success() => o.stdout,
            _ => String::new(),
        }
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::compose::ContainerHealth;
    use crate::metrics::{DEPLOY_HEADER, HEALTH_HEADER};
    use crate::runner::scripted::ScriptedRunner;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn config(dir: &Path) -> OrchestratorConfig {
        OrchestratorConfig {
            health_metrics: dir.join("burn_metrics.csv"),
            deploy_metrics: dir.join("deploy_metrics.csv"),
            ..OrchestratorConfig::default()
        }
    }

    fn orchestrator(dir: &Path, runner: ScriptedRunner) -> Orchestrator<ScriptedRunner> {
        Orchestrator::new(config(dir), runner)
            .with_clock(fixed_now)
            .with_sleeper(|_| {})
    }

    #[test]
    fn list_returns_builtin_names() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), ScriptedRunner::new());
        assert_eq!(orch.list(), vec!["db-env", "auth-env", "todo-env"]);
    }

    #[test]
    fn unknown_environment_has_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), ScriptedRunner::new());

        assert!(matches!(orch.start("prod-env"), Err(OrchestratorError::UnknownEnvironment(_))));
        assert!(matches!(orch.deploy("prod-env"), Err(OrchestratorError::UnknownEnvironment(_))));
        assert!(matches!(orch.status_compose("prod-env"), Err(OrchestratorError::UnknownEnvironment(_))));
        assert!(orch.runner.calls().is_empty());
        assert!(!dir.path().join("burn_metrics.csv").exists());
    }

    #[test]
    fn start_addresses_own_service_only() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().on("docker ps", vec![CommandOutput::ok("CONTAINER ID\n")]);
        let orch = orchestrator(dir.path(), runner);

        let ps = orch.start("auth-env").unwrap();
        assert_eq!(ps, "CONTAINER ID\n");
        assert_eq!(
            orch.runner.calls(),
            vec![
                "docker-compose -f docker-compose.dev.yaml up -d auth_service",
                "docker ps",
            ]
        );
    }

    #[test]
    fn stop_stops_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), ScriptedRunner::new());

        orch.stop("db-env").unwrap();
        assert_eq!(
            orch.runner.calls(),
            vec![
                "docker-compose -f docker-compose.base.yaml stop db",
                "docker-compose -f docker-compose.base.yaml rm -f db",
                "docker ps",
            ]
        );
    }

    #[test]
    fn failing_compose_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("docker-compose", vec![CommandOutput::failed(1, "no such service")]);
        let orch = orchestrator(dir.path(), runner);

        let err = orch.start("db-env").unwrap_err();
        assert!(matches!(err, OrchestratorError::CommandFailed { code: Some(1), .. }));
    }

    #[test]
    fn status_compose_classifies_and_logs_row() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on(
                "docker-compose -f docker-compose.dev.yaml ps -q db todo_service",
                vec![CommandOutput::ok("abc123\ndef456\n")],
            )
            .on(
                "docker inspect --format",
                vec![
                    CommandOutput::ok("/app-db-1|healthy|2025-03-01T11:00:00Z|db\n"),
                    CommandOutput::ok(
                        "/app-todo_service-1|no-healthcheck|2025-03-01T11:59:00Z|todo_service\n",
                    ),
                ],
            );
        let orch = orchestrator(dir.path(), runner);

        let report = orch.status_compose("todo-env").unwrap();
        assert_eq!(report.containers.len(), 2);
        assert_eq!(report.containers[0].health, ContainerHealth::Healthy);
        assert_eq!(report.containers[1].health, ContainerHealth::NoHealthcheck);
        assert_eq!(report.containers[1].uptime.num_seconds(), 60);
        assert_eq!(report.health, EnvironmentHealth::Unverified);
        assert_eq!((report.row.completed, report.row.remaining, report.row.total), (2, 0, 2));

        let csv = std::fs::read_to_string(dir.path().join("burn_metrics.csv")).unwrap();
        assert_eq!(csv, format!("{HEALTH_HEADER}\n2025-03-01T12:00:00Z,todo-env,2,0,2\n"));
    }

    #[test]
    fn status_compose_with_nothing_running() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), ScriptedRunner::new());

        let report = orch.status_compose("auth-env").unwrap();
        assert!(report.containers.is_empty());
        assert_eq!(report.health, EnvironmentHealth::Incomplete);
        assert_eq!((report.row.completed, report.row.remaining), (0, 2));
    }

    #[test]
    fn status_kubernetes_reads_label() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().on(
            "kubectl get pods -l app=auth-service -o json",
            vec![CommandOutput::ok(
                r#"{"items":[{"metadata":{"name":"auth-service-1","creationTimestamp":"2025-03-01T11:30:00Z"},"status":{"conditions":[{"type":"Ready","status":"True"}]}}]}"#,
            )],
        );
        let orch = orchestrator(dir.path(), runner);

        let pods = orch.status_kubernetes("auth-env").unwrap();
        assert_eq!(pods.len(), 1);
        assert!(pods[0].ready);
        assert_eq!(pods[0].uptime.unwrap().num_minutes(), 30);
    }

    #[test]
    fn deploy_ready_records_timing_and_url() {
        let dir = tempfile::tempdir().unwrap();
        let commit = fixed_now().timestamp() - 600;
        let runner = ScriptedRunner::new()
            .on("git log", vec![CommandOutput::ok(format!("{commit}\n"))])
            .on(
                "kubectl get pods -l app=todo-service",
                vec![CommandOutput::ok(""), CommandOutput::ok("false"), CommandOutput::ok("true")],
            )
            .on(
                "minikube service todo-service --url",
                vec![CommandOutput::ok("http://192.168.49.2:30081\n")],
            )
            .on("minikube service list", vec![CommandOutput::ok("| default | todo-service |\n")]);
        let orch = orchestrator(dir.path(), runner);

        let outcome = orch.deploy("todo-env").unwrap();
        let DeployOutcome::Ready { url, timing, attempts, services } = outcome else {
            panic!("expected ready outcome");
        };
        assert_eq!(url.as_deref(), Some("http://192.168.49.2:30081"));
        assert_eq!(attempts, 3);
        assert_eq!(timing.lead_time_s(), 600);
        assert_eq!(timing.cycle_time_s(), 0);
        assert!(services.contains("todo-service"));
        assert_eq!(orch.runner.count("kubectl apply -f k8s/todo_service.yaml"), 1);

        let csv = std::fs::read_to_string(dir.path().join("deploy_metrics.csv")).unwrap();
        assert!(csv.starts_with(DEPLOY_HEADER));
        assert!(csv.contains("todo-env,2025-03-01T11:50:00Z,2025-03-01T12:00:00Z,2025-03-01T12:00:00Z,600,0"));
    }

    #[test]
    fn deploy_never_ready_is_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("kubectl get pods", vec![CommandOutput::ok("false")]);
        let slept = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&slept);
        let orch = Orchestrator::new(config(dir.path()), runner)
            .with_clock(fixed_now)
            .with_sleeper(move |d| recorder.lock().unwrap().push(d));

        let outcome = orch.deploy("db-env").unwrap();
        assert!(!outcome.is_ready());
        assert!(matches!(outcome, DeployOutcome::AppliedNotReady { attempts: 10, .. }));
        assert_eq!(orch.runner.count("kubectl get pods -l app=db"), 10);

        let slept = slept.lock().unwrap();
        assert_eq!(slept.len(), 10);
        assert_eq!(slept.iter().sum::<Duration>(), Duration::from_secs(30));
        assert!(!dir.path().join("deploy_metrics.csv").exists());
        assert_eq!(orch.runner.count("minikube service db --url"), 0);
    }

    #[test]
    fn deploy_without_git_uses_now() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("git log", vec![CommandOutput::failed(128, "not a git repository")])
            .on("kubectl get pods", vec![CommandOutput::ok("true")]);
        let orch = orchestrator(dir.path(), runner);

        let DeployOutcome::Ready { timing, .. } = orch.deploy("db-env").unwrap() else {
            panic!("expected ready outcome");
        };
        assert_eq!(timing.commit_time, fixed_now());
        assert_eq!(timing.lead_time_s(), 0);
    }

    #[test]
    fn deploy_apply_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("kubectl apply", vec![CommandOutput::failed(1, "connection refused")]);
        let orch = orchestrator(dir.path(), runner);

        assert!(matches!(
            orch.deploy("auth-env"),
            Err(OrchestratorError::CommandFailed { .. })
        ));
        assert_eq!(orch.runner.count("kubectl get pods"), 0);
    }

    #[test]
    fn delete_removes_manifest_and_lists_services() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("minikube service list", vec![CommandOutput::ok("| NAMESPACE |\n")]);
        let orch = orchestrator(dir.path(), runner);

        let services = orch.delete("auth-env").unwrap();
        assert_eq!(services, "| NAMESPACE |\n");
        assert_eq!(
            orch.runner.calls(),
            vec!["kubectl delete -f k8s/auth_service.yaml", "minikube service list"]
        );
    }

    #[test]
    fn burn_chart_reads_logged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("docker-compose", vec![CommandOutput::ok("abc\n")])
            .on("docker inspect", vec![CommandOutput::ok("/app-db-1|healthy|2025-03-01T11:00:00Z|db\n")]);
        let orch = orchestrator(dir.path(), runner);

        orch.status_compose("db-env").unwrap();
        orch.status_compose("db-env").unwrap();

        let series = orch.burn_chart().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].burn_up, 2);
        assert_eq!(series[1].burn_down, -1);
    }
}
