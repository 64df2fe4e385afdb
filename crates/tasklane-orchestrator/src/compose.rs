//! Compose container inspection and health classification.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::metrics::HealthRow;

/// `docker inspect` template producing one `|`-separated line per container.
pub const INSPECT_FORMAT: &str = "{{.Name}}|{{if .State.Health}}{{.State.Health.Status}}{{else}}no-healthcheck{{end}}|{{.State.StartedAt}}|{{index .Config.Labels \"com.docker.compose.service\"}}";

/// Health of one container as reported by Docker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerHealth {
    Healthy,
    /// Failing or still starting.
    Unhealthy,
    /// The container defines no health check.
    NoHealthcheck,
}

impl ContainerHealth {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "healthy" => Self::Healthy,
            "no-healthcheck" | "" => Self::NoHealthcheck,
            _ => Self::Unhealthy,
        }
    }

    /// Whether the container counts as done for burn metrics.
    pub fn is_up(&self) -> bool {
        !matches!(self, Self::Unhealthy)
    }
}

impl fmt::Display for ContainerHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::NoHealthcheck => "no-healthcheck",
        })
    }
}

/// One inspected container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    /// Compose service the container belongs to.
    pub service: String,
    pub health: ContainerHealth,
    pub started_at: DateTime<Utc>,
    pub uptime: TimeDelta,
}

impl ContainerStatus {
    /// Parse one line produced by [`INSPECT_FORMAT`].
    pub fn parse_inspect(line: &str, now: DateTime<Utc>) -> OrchestratorResult<Self> {
        let mut parts = line.trim().splitn(4, '|');
        let (Some(name), Some(health), Some(started), service) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(OrchestratorError::Parse(format!("inspect line: {line:?}")));
        };

        let started_at = DateTime::parse_from_rfc3339(started.trim())
            .map_err(|e| OrchestratorError::Parse(format!("start time {started:?}: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            name: name.trim().trim_start_matches('/').to_string(),
            service: service.unwrap_or_default().trim().to_string(),
            health: ContainerHealth::parse(health),
            started_at,
            uptime: now - started_at,
        })
    }
}

/// Overall state of an environment's containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentHealth {
    /// Every target is running and passes its health check.
    Healthy,
    /// Every target is running, none failing, at least one unchecked.
    Unverified,
    /// At least one target is failing its health check.
    Degraded,
    /// At least one target has no running container.
    Incomplete,
}

impl EnvironmentHealth {
    pub fn evaluate(targets: &[String], containers: &[ContainerStatus]) -> Self {
        let target_health: Vec<Option<ContainerHealth>> = targets
            .iter()
            .map(|t| containers.iter().find(|c| &c.service == t).map(|c| c.health))
            .collect();

        if target_health.contains(&Some(ContainerHealth::Unhealthy)) {
            Self::Degraded
        } else if target_health.contains(&None) {
            Self::Incomplete
        } else if target_health.contains(&Some(ContainerHealth::NoHealthcheck)) {
            Self::Unverified
        } else {
            Self::Healthy
        }
    }
}

impl fmt::Display for EnvironmentHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Unverified => "unverified",
            Self::Degraded => "degraded",
            Self::Incomplete => "incomplete",
        })
    }
}

/// Result of `status_env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeReport {
    pub environment: String,
    pub containers: Vec<ContainerStatus>,
    pub health: EnvironmentHealth,
    /// Row appended to the health-metrics CSV.
    pub row: HealthRow,
}

/// Count target services that have an up container.
pub fn completed_targets(targets: &[String], containers: &[ContainerStatus]) -> u32 {
    targets
        .iter()
        .filter(|t| {
            containers
                .iter()
                .any(|c| &c.service == *t && c.health.is_up())
        })
        .count() as u32
}

/// Render a span as `1h 02m 03s`, `4m 05s` or `6s`.
pub fn format_uptime(span: TimeDelta) -> String {
    let total = span.num_seconds().max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn container(service: &str, health: ContainerHealth) -> ContainerStatus {
        ContainerStatus {
            name: format!("app-{service}-1"),
            service: service.to_string(),
            health,
            started_at: now(),
            uptime: TimeDelta::zero(),
        }
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_inspect_with_health() {
        let line = "/app-db-1|healthy|2025-03-01T11:58:30.123456789Z|db";
        let status = ContainerStatus::parse_inspect(line, now()).unwrap();
        assert_eq!(status.name, "app-db-1");
        assert_eq!(status.service, "db");
        assert_eq!(status.health, ContainerHealth::Healthy);
        assert_eq!(status.uptime.num_seconds(), 89);
    }

    #[test]
    fn parse_inspect_without_healthcheck() {
        let line = "/app-auth_service-1|no-healthcheck|2025-03-01T10:00:00Z|auth_service";
        let status = ContainerStatus::parse_inspect(line, now()).unwrap();
        assert_eq!(status.health, ContainerHealth::NoHealthcheck);
        assert_eq!(format_uptime(status.uptime), "2h 00m 00s");
    }

    #[test]
    fn parse_inspect_rejects_garbage() {
        assert!(ContainerStatus::parse_inspect("nonsense", now()).is_err());
        assert!(ContainerStatus::parse_inspect("/x|healthy|yesterday|db", now()).is_err());
    }

    #[test]
    fn health_parse_is_three_valued() {
        assert_eq!(ContainerHealth::parse("healthy"), ContainerHealth::Healthy);
        assert_eq!(ContainerHealth::parse("unhealthy"), ContainerHealth::Unhealthy);
        assert_eq!(ContainerHealth::parse("starting"), ContainerHealth::Unhealthy);
        assert_eq!(ContainerHealth::parse("no-healthcheck"), ContainerHealth::NoHealthcheck);
    }

    #[test]
    fn environment_health_variants() {
        let t = targets(&["db", "auth_service"]);

        let all_healthy = [
            container("db", ContainerHealth::Healthy),
            container("auth_service", ContainerHealth::Healthy),
        ];
        assert_eq!(EnvironmentHealth::evaluate(&t, &all_healthy), EnvironmentHealth::Healthy);

        let unchecked = [
            container("db", ContainerHealth::Healthy),
            container("auth_service", ContainerHealth::NoHealthcheck),
        ];
        assert_eq!(EnvironmentHealth::evaluate(&t, &unchecked), EnvironmentHealth::Unverified);

        let failing = [
            container("db", ContainerHealth::Unhealthy),
            container("auth_service", ContainerHealth::NoHealthcheck),
        ];
        assert_eq!(EnvironmentHealth::evaluate(&t, &failing), EnvironmentHealth::Degraded);

        let missing = [container("db", ContainerHealth::Healthy)];
        assert_eq!(EnvironmentHealth::evaluate(&t, &missing), EnvironmentHealth::Incomplete);
    }

    #[test]
    fn completed_counts_up_targets_once() {
        let t = targets(&["db", "todo_service"]);
        let containers = [
            container("db", ContainerHealth::Healthy),
            container("db", ContainerHealth::NoHealthcheck),
            container("todo_service", ContainerHealth::Unhealthy),
            container("unrelated", ContainerHealth::Healthy),
        ];
        assert_eq!(completed_targets(&t, &containers), 1);
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(TimeDelta::seconds(6)), "6s");
        assert_eq!(format_uptime(TimeDelta::seconds(245)), "4m 05s");
        assert_eq!(format_uptime(TimeDelta::seconds(3723)), "1h 02m 03s");
        assert_eq!(format_uptime(TimeDelta::seconds(-5)), "0s");
    }
}
