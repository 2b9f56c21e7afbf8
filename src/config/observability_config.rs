//! Observability configuration parsing from environment variables.
//!
//! This module handles loading log output format and metrics toggles.

use super::{Lookup, process_env, parse_bool};
use anyhow::Result;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid LOG_FORMAT: {}. Must be 'pretty' or 'json'", s),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityEnvConfig {
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            metrics_enabled: parse_bool(lookup, "METRICS_ENABLED", true)?,
            log_format: lookup("LOG_FORMAT")
                .map(|f| f.parse())
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::source;

    #[test]
    fn test_observability_config_defaults() {
        let config = ObservabilityEnvConfig::from_source(&source(&[])).unwrap();
        assert!(config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_logs_and_disabled_metrics() {
        let config = ObservabilityEnvConfig::from_source(&source(&[
            ("LOG_FORMAT", "JSON"),
            ("METRICS_ENABLED", "0"),
        ]))
        .unwrap();
        assert!(!config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_log_format() {
        assert!(ObservabilityEnvConfig::from_source(&source(&[("LOG_FORMAT", "xml")])).is_err());
    }
}
