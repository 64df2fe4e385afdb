//! Service configuration read from environment variables.
//!
//! Both HTTP services build a single [`ServiceConfig`] at startup and pass
//! it down explicitly; nothing reads the environment after that point.

use std::net::SocketAddr;
use std::ops::RangeInclusive;

use thiserror::Error;

/// Errors raised while assembling a [`ServiceConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Accepted token lifetimes: one minute up to a year.
pub const TOKEN_TTL_RANGE: RangeInclusive<i64> = 1..=525_600;

/// Work factors bcrypt accepts.
pub const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

/// Connection settings for the Postgres database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

/// Everything an HTTP service needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    /// HMAC secret used to sign and verify access tokens.
    pub secret_key: String,
    /// Lifetime of issued tokens, in minutes.
    pub token_ttl_minutes: i64,
    pub bind_addr: SocketAddr,
    pub bcrypt_cost: u32,
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            name: required("DB_NAME")?,
            user: required("DB_USER")?,
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
        };

        Ok(Self {
            database,
            secret_key: required("SECRET_KEY")?,
            token_ttl_minutes: parse_within(&lookup, "TOKEN_TTL_MINUTES", 30, TOKEN_TTL_RANGE)?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            bcrypt_cost: parse_within(&lookup, "BCRYPT_COST", 12, BCRYPT_COST_RANGE)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}

fn parse_within<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd,
{
    let value = parse_or(lookup, key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: lookup(key).unwrap_or_default(),
        })
    }
}
