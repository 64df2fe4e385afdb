//! Line-oriented `KEY=VALUE` parsing.
//!
//! Blank lines, `#` comments and lines without `=` are skipped. Each
//! remaining line is split on its first `=`, and key and value are trimmed.
//! Later duplicates overwrite earlier ones.

use std::collections::BTreeMap;
use std::path::Path;

/// Parsed entries, ordered by key.
pub type EnvMap = BTreeMap<String, String>;

/// Read and parse an env file.
pub fn load_env(path: &Path) -> std::io::Result<EnvMap> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_env(&content))
}

pub fn parse_env(content: &str) -> EnvMap {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
