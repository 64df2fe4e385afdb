//! Minimal ConfigMap and Secret documents.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};

/// Keys with this prefix are treated as secrets unless configured otherwise.
pub const DEFAULT_SECRET_PREFIX: &str = "SECRET_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
}

/// A `v1` ConfigMap or Secret with string data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    pub data: BTreeMap<String, String>,
}

/// Secret holding only the prefixed entries, values base64-encoded.
pub fn render_secret(name: &str, data: &BTreeMap<String, String>, prefix: &str) -> Manifest {
    let data = data
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), general_purpose::STANDARD.encode(value)))
        .collect();

    Manifest {
        api_version: "v1".to_string(),
        kind: "Secret".to_string(),
        metadata: Metadata { name: name.to_string() },
        secret_type: Some("Opaque".to_string()),
        data,
    }
}

/// ConfigMap holding every entry without the prefix, values verbatim.
pub fn render_config_map(name: &str, data: &BTreeMap<String, String>, prefix: &str) -> Manifest {
    let data = data
        .iter()
        .filter(|(key, _)| !key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Manifest {
        api_version: "v1".to_string(),
        kind: "ConfigMap".to_string(),
        metadata: Metadata { name: name.to_string() },
        secret_type: None,
        data,
    }
}
