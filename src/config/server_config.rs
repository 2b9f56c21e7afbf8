//! HTTP server configuration.

use super::{Lookup, process_env, parse_bool, parse_or};
use anyhow::{Context, Result};
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            cors_enabled: true,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parse_or(lookup, "PORT", defaults.port)?,
            cors_enabled: parse_bool(lookup, "CORS_ENABLED", defaults.cors_enabled)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid BIND_ADDRESS {:?}", self.bind_address))
    }
}
