//! Service configuration read from `PDI_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use pdi_observability::LogFormat;
use thiserror::Error;

use crate::submission::NotifyPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdiConfig {
    pub bind_addr: SocketAddr,
    /// JSON catalog document; `None` serves the built-in taxonomy.
    pub catalog_path: Option<PathBuf>,
    pub notify_policy: NotifyPolicy,
    pub log_format: LogFormat,
}

impl Default for PdiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            catalog_path: None,
            notify_policy: NotifyPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl PdiConfig {
    /// Load configuration from the process environment.
    ///
    /// - `PDI_BIND_ADDR`: listen address (default `0.0.0.0:8080`)
    /// - `PDI_CATALOG_PATH`: JSON catalog file (default: built-in taxonomy)
    /// - `PDI_NOTIFY_ON_UPDATE`: notify again on update submissions (default `true`)
    /// - `PDI_LOG_FORMAT`: `json` or `pretty` (default `json`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = non_blank(lookup("PDI_BIND_ADDR")) {
            config.bind_addr = raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "PDI_BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }

        config.catalog_path = non_blank(lookup("PDI_CATALOG_PATH")).map(PathBuf::from);

        if let Some(raw) = non_blank(lookup("PDI_NOTIFY_ON_UPDATE")) {
            let notify_on_update = parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "PDI_NOTIFY_ON_UPDATE",
                value: raw.clone(),
                reason: "expected true/false".to_string(),
            })?;
            config.notify_policy = NotifyPolicy { notify_on_update };
        }

        if let Some(raw) = non_blank(lookup("PDI_LOG_FORMAT")) {
            config.log_format = LogFormat::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "PDI_LOG_FORMAT",
                value: raw.clone(),
                reason: "expected json or pretty".to_string(),
            })?;
        }

        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
