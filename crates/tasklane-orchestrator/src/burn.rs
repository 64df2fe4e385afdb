//! Burn-up / burn-down series from the health-metrics log.
//!
//! Rows are ordered by timestamp. Burn-up is the running sum of
//! `completed`; burn-down is the first row's `total` minus burn-up.

use chrono::{DateTime, Utc};

use crate::metrics::HealthRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnPoint {
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub burn_up: i64,
    pub burn_down: i64,
}

pub fn burn_series(rows: &[HealthRow]) -> Vec<BurnPoint> {
    let mut sorted: Vec<&HealthRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.timestamp);

    let Some(first) = sorted.first() else {
        return Vec::new();
    };
    let total = i64::from(first.total);

    let mut burn_up = 0i64;
    sorted
        .into_iter()
        .map(|row| {
            burn_up += i64::from(row.completed);
            BurnPoint {
                timestamp: row.timestamp,
                environment: row.environment.clone(),
                burn_up,
                burn_down: total - burn_up,
            }
        })
        .collect()
}
