//! Append-only CSV logs for delivery metrics.
//!
//! Two files are maintained:
//!
//! | File | Header |
//! |---|---|
//! | health metrics | `timestamp,environment,completed,remaining,total` |
//! | deploy metrics | `environment,commit_time,deploy_start,ready_time,lead_time_s,cycle_time_s` |
//!
//! The header is written once, when the file is created (or found empty).
//! Rows are never rewritten.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};

pub const HEALTH_HEADER: &str = "timestamp,environment,completed,remaining,total";
pub const DEPLOY_HEADER: &str =
    "environment,commit_time,deploy_start,ready_time,lead_time_s,cycle_time_s";

/// Snapshot of how many target containers of an environment are up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRow {
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub completed: u32,
    pub remaining: u32,
    pub total: u32,
}

impl HealthRow {
    pub fn new(timestamp: DateTime<Utc>, environment: &str, completed: u32, total: u32) -> Self {
        Self {
            timestamp,
            environment: environment.to_string(),
            completed,
            remaining: total.saturating_sub(completed),
            total,
        }
    }

    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{}",
            timestamp(self.timestamp),
            self.environment,
            self.completed,
            self.remaining,
            self.total
        )
    }

    /// Parse one data line of the health CSV.
    pub fn parse_csv(line: &str) -> OrchestratorResult<Self> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        let [ts, env, completed, remaining, total] = *fields.as_slice() else {
            return Err(OrchestratorError::Parse(format!("health row: {line:?}")));
        };
        let number = |raw: &str| {
            raw.trim()
                .parse::<u32>()
                .map_err(|e| OrchestratorError::Parse(format!("health row {line:?}: {e}")))
        };

        Ok(Self {
            timestamp: DateTime::parse_from_rfc3339(ts.trim())
                .map_err(|e| OrchestratorError::Parse(format!("health row {line:?}: {e}")))?
                .with_timezone(&Utc),
            environment: env.trim().to_string(),
            completed: number(completed)?,
            remaining: number(remaining)?,
            total: number(total)?,
        })
    }
}

/// Timing of one deploy that reached readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRow {
    pub environment: String,
    pub commit_time: DateTime<Utc>,
    pub deploy_start: DateTime<Utc>,
    pub ready_time: DateTime<Utc>,
}

impl DeployRow {
    /// Whole seconds from the last commit to readiness.
    pub fn lead_time_s(&self) -> i64 {
        (self.ready_time - self.commit_time).num_seconds()
    }

    /// Whole seconds from the start of the deploy to readiness.
    pub fn cycle_time_s(&self) -> i64 {
        (self.ready_time - self.deploy_start).num_seconds()
    }

    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.environment,
            timestamp(self.commit_time),
            timestamp(self.deploy_start),
            timestamp(self.ready_time),
            self.lead_time_s(),
            self.cycle_time_s()
        )
    }
}

pub fn append_health(path: &Path, row: &HealthRow) -> OrchestratorResult<()> {
    append_row(path, HEALTH_HEADER, &row.to_csv())
}

pub fn append_deploy(path: &Path, row: &DeployRow) -> OrchestratorResult<()> {
    append_row(path, DEPLOY_HEADER, &row.to_csv())
}

/// Read every data row of the health CSV. A missing file reads as empty.
pub fn read_health(path: &Path) -> OrchestratorResult<Vec<HealthRow>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(OrchestratorError::Metrics {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    content
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(HealthRow::parse_csv)
        .collect()
}

fn append_row(path: &Path, header: &str, line: &str) -> OrchestratorResult<()> {
    let io_err = |source| OrchestratorError::Metrics {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;

    let needs_header = file.metadata().map_err(io_err)?.len() == 0;
    if needs_header {
        writeln!(file, "{header}").map_err(io_err)?;
    }
    writeln!(file, "{line}").map_err(io_err)?;

    debug!(path = %path.display(), %line, "metrics row appended");
    Ok(())
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
