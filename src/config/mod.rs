//! Configuration module for coinforecast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Server, Market Data, Model, and Observability.
//! Every sub-config reads through a [`Lookup`] so tests can supply values
//! without touching the process environment.

mod market_data_config;
mod model_config;
mod observability_config;
mod server_config;

pub use market_data_config::MarketDataEnvConfig;
pub use model_config::ModelEnvConfig;
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use server_config::ServerEnvConfig;

use crate::domain::tokens::TokenRegistry;
use crate::infrastructure::persistence::ArtifactStore;
use crate::infrastructure::registry_file::load_registry;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Variable lookup: `env::var` in production, a map in tests.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub market_data: MarketDataEnvConfig,
    pub model: ModelEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            server: ServerEnvConfig::from_source(lookup).context("Failed to load server config")?,
            market_data: MarketDataEnvConfig::from_source(lookup)
                .context("Failed to load market data config")?,
            model: ModelEnvConfig::from_source(lookup).context("Failed to load model config")?,
            observability: ObservabilityEnvConfig::from_source(lookup)
                .context("Failed to load observability config")?,
        })
    }

    /// Built-in tokens unless `TOKEN_REGISTRY_PATH` points at a TOML override.
    pub fn token_registry(&self) -> Result<TokenRegistry> {
        match &self.model.token_registry_path {
            Some(path) => load_registry(path),
            None => Ok(TokenRegistry::default()),
        }
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(self.model.models_dir.clone())
    }
}

pub(crate) fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

pub(crate) fn parse_or<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        None => Ok(default),
    }
}

pub(crate) fn parse_bool(lookup: Lookup<'_>, key: &str, default: bool) -> Result<bool> {
    match lookup(key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("Failed to parse {}={:?}: expected a boolean", key, raw),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_from_source_defaults() {
        let config = Config::from_source(&source(&[])).expect("Should parse with defaults");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.market_data.vs_currency, "usd");
        assert_eq!(config.model.lookback_days, 30);
        assert_eq!(config.token_registry().unwrap().len(), 10);
        assert_eq!(config.artifact_store().root(), std::path::Path::new("models"));
    }

    #[test]
    fn test_error_names_the_failing_section() {
        let err = Config::from_source(&source(&[("BATCH_SIZE", "big")])).unwrap_err();
        assert!(format!("{:#}", err).contains("model config"));
    }

    #[test]
    fn test_registry_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.toml");
        std::fs::write(
            &path,
            "[[tokens]]\nkey = \"bitcoin\"\nid = \"bitcoin\"\nsymbol = \"btc\"\n",
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = Config::from_source(&source(&[("TOKEN_REGISTRY_PATH", path_str.as_str())])).unwrap();
        assert_eq!(config.token_registry().unwrap().supported_keys(), vec!["bitcoin"]);
    }

    #[test]
    fn test_parse_bool_variants() {
        let lookup = source(&[("A", "yes"), ("B", "OFF"), ("C", "maybe")]);
        assert!(parse_bool(&lookup, "A", false).unwrap());
        assert!(!parse_bool(&lookup, "B", true).unwrap());
        assert!(parse_bool(&lookup, "C", true).is_err());
        assert!(parse_bool(&lookup, "MISSING", true).unwrap());
    }
}
