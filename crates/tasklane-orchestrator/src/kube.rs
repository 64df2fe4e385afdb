//! Pod listing via `kubectl get pods -o json`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{OrchestratorError, OrchestratorResult};

/// JSONPath reading whether the first pod's first container is ready.
pub const FIRST_CONTAINER_READY: &str = "jsonpath={.items[0].status.containerStatuses[0].ready}";

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: Option<PodStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodMetadata {
    name: String,
    #[serde(default)]
    creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PodStatus {
    #[serde(default)]
    conditions: Vec<PodCondition>,
}

#[derive(Debug, Deserialize)]
struct PodCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

/// Readiness and age of one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodReport {
    pub name: String,
    pub ready: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub uptime: Option<TimeDelta>,
}

/// Parse `kubectl get pods -o json` output.
pub fn parse_pods(json: &str, now: DateTime<Utc>) -> OrchestratorResult<Vec<PodReport>> {
    let list: PodList = serde_json::from_str(json)
        .map_err(|e| OrchestratorError::Parse(format!("pod list: {e}")))?;

    Ok(list
        .items
        .into_iter()
        .map(|pod| {
            let ready = pod
                .status
                .as_ref()
                .and_then(|s| s.conditions.iter().find(|c| c.kind == "Ready"))
                .is_some_and(|c| c.status == "True");
            let created_at = pod.metadata.creation_timestamp;
            PodReport {
                name: pod.metadata.name,
                ready,
                created_at,
                uptime: created_at.map(|t| now - t),
            }
        })
        .collect())
}
