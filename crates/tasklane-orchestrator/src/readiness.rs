//! Bounded readiness polling.
//!
//! A probe is attempted up to `retries` times. After every negative
//! attempt the poller sleeps for `delay`, so a poll that never observes
//! readiness blocks for exactly `retries × delay` and then reports
//! [`ReadinessOutcome::TimedOut`]. There is no cancellation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Retry budget for a readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPolicy {
    pub retries: u32,
    #[serde(with = "duration_str")]
    pub delay: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            retries: 10,
            delay: Duration::from_secs(3),
        }
    }
}

impl ReadinessPolicy {
    /// Longest time a poll can block; saturates at `Duration::MAX`.
    pub fn budget(&self) -> Duration {
        self.delay.checked_mul(self.retries).unwrap_or(Duration::MAX)
    }
}

/// Result of a readiness poll. Never an error: callers must branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The probe succeeded on attempt `attempts` (1-based).
    Ready { attempts: u32 },
    /// Every attempt failed.
    TimedOut { attempts: u32 },
}

impl ReadinessOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Run `probe` until it returns true or the policy is exhausted.
pub fn poll_until_ready<P, S>(policy: &ReadinessPolicy, mut probe: P, mut sleep: S) -> ReadinessOutcome
where
    P: FnMut() -> bool,
    S: FnMut(Duration),
{
    for attempt in 1..=policy.retries {
        if probe() {
            debug!(attempt, "readiness confirmed");
            return ReadinessOutcome::Ready { attempts: attempt };
        }
        debug!(attempt, retries = policy.retries, "not ready yet");
        sleep(policy.delay);
    }

    warn!(
        retries = policy.retries,
        budget_secs = policy.budget().as_secs(),
        "readiness not observed within retry budget"
    );
    ReadinessOutcome::TimedOut {
        attempts: policy.retries,
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.parse().ok().map(Duration::from_millis);
    }
    if let Some(secs) = s.strip_suffix('s') {
        return secs.parse().ok().map(Duration::from_secs);
    }
    if let Some(mins) = s.strip_suffix('m') {
        return mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60));
    }
    s.parse().ok().map(Duration::from_secs)
}

/// Serde adapter storing durations as "3s"-style strings.
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        if d.subsec_millis() == 0 {
            s.serialize_str(&format!("{}s", d.as_secs()))
        } else {
            s.serialize_str(&format!("{}ms", d.as_millis()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_duration(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {raw}")))
    }
}
