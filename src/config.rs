//! Runtime configuration read from the environment.
//!
//! Every setting has a default matching the deployment manifests, so an
//! unconfigured pod serves on 9443 with certificates mounted at
//! `/etc/webhook/certs/`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::client::DEFAULT_NODE_LIST_TIMEOUT;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Default health/metrics server port
pub const HEALTH_PORT: u16 = 8080;

/// Invalid environment configuration
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Webhook process configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    /// PEM certificate served by the webhook
    pub cert_path: String,
    /// PEM private key for `cert_path`
    pub key_path: String,
    /// HTTPS port for admission requests
    pub port: u16,
    /// HTTP port for probes and metrics
    pub health_port: u16,
    /// Deadline for each node inventory read
    pub node_list_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            cert_path: WEBHOOK_CERT_PATH.to_string(),
            key_path: WEBHOOK_KEY_PATH.to_string(),
            port: WEBHOOK_PORT,
            health_port: HEALTH_PORT,
            node_list_timeout: DEFAULT_NODE_LIST_TIMEOUT,
        }
    }
}

impl WebhookConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs = parse_or(
            &lookup,
            "NODE_LIST_TIMEOUT_SECS",
            defaults.node_list_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError {
                var: "NODE_LIST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            cert_path: lookup("WEBHOOK_CERT_PATH").unwrap_or(defaults.cert_path),
            key_path: lookup("WEBHOOK_KEY_PATH").unwrap_or(defaults.key_path),
            port: parse_or(&lookup, "WEBHOOK_PORT", defaults.port)?,
            health_port: parse_or(&lookup, "HEALTH_PORT", defaults.health_port)?,
            node_list_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
