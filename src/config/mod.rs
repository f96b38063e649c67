//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The Redis URL may carry a password, so it is wrapped in
//! secrecy::SecretString to keep it out of logs.

pub mod secrets;

use std::time::Duration;

use crate::cleaner::CleanerConfig;
use crate::error::{Error, Result};
use crate::keys::{DEFAULT_NAMESPACE, Keyspace};
use crate::worker::HeartbeatConfig;
use secrecy::SecretString;

const DEFAULT_CLEAN_INTERVAL_SECS: u64 = 60;
const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 10;
const DEFAULT_HEARTBEAT_TTL_SECS: u64 = 30;

#[derive(Debug)]
pub struct Config {
    pub redis_url: SecretString,
    pub namespace: String,
    pub clean_interval: Duration,
    pub heartbeat: HeartbeatConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let redis_url = lookup("REDIS_URL").ok_or_else(|| {
            Error::Config("required environment variable REDIS_URL is not set".to_string())
        })?;

        let clean_interval = seconds(
            &lookup,
            "RQ_CLEAN_INTERVAL_SECS",
            DEFAULT_CLEAN_INTERVAL_SECS,
        )?;
        let heartbeat = HeartbeatConfig {
            interval: seconds(
                &lookup,
                "RQ_HEARTBEAT_INTERVAL_SECS",
                DEFAULT_HEARTBEAT_INTERVAL_SECS,
            )?,
            ttl: seconds(&lookup, "RQ_HEARTBEAT_TTL_SECS", DEFAULT_HEARTBEAT_TTL_SECS)?,
        };
        if heartbeat.ttl <= heartbeat.interval {
            return Err(Error::Config(format!(
                "RQ_HEARTBEAT_TTL_SECS ({}) must exceed RQ_HEARTBEAT_INTERVAL_SECS ({})",
                heartbeat.ttl.as_secs(),
                heartbeat.interval.as_secs()
            )));
        }

        let namespace = lookup("RQ_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        if namespace.is_empty() {
            return Err(Error::Config("RQ_NAMESPACE must not be empty".to_string()));
        }

        Ok(Self {
            redis_url: SecretString::from(redis_url),
            namespace,
            clean_interval,
            heartbeat,
            otel_endpoint: lookup("OTEL_ENDPOINT"),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn keyspace(&self) -> Keyspace {
        Keyspace::new(self.namespace.clone())
    }

    pub fn cleaner(&self) -> CleanerConfig {
        CleanerConfig {
            interval: self.clean_interval,
        }
    }
}

/// A positive whole number of seconds, or `default` when unset.
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<Duration> {
    let secs = match lookup(name) {
        None => default,
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::Config(format!("{name} must be a whole number of seconds: {e}")))?,
    };
    if secs == 0 {
        return Err(Error::Config(format!("{name} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}
