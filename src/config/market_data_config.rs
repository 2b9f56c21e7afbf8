//! Market data provider configuration (CoinGecko).

use super::{Lookup, process_env, parse_or};
use crate::infrastructure::coingecko::{COINGECKO_API_URL, CoinGeckoMarketDataService};
use crate::infrastructure::core::HttpClientSettings;
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDataEnvConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub vs_currency: String,
    /// `None` lets the provider choose granularity.
    pub interval: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for MarketDataEnvConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            interval: Some("daily".to_string()),
            timeout_secs: 30,
            max_retries: 0,
        }
    }
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let interval = match lookup("MARKET_DATA_INTERVAL") {
            Some(value) => {
                let value = value.trim().to_lowercase();
                match value.as_str() {
                    "" | "auto" => None,
                    _ => Some(value),
                }
            }
            None => defaults.interval,
        };

        let timeout_secs = parse_or(lookup, "MARKET_DATA_TIMEOUT_SECS", defaults.timeout_secs)?;
        if timeout_secs == 0 {
            anyhow::bail!("MARKET_DATA_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            base_url: lookup("COINGECKO_BASE_URL").unwrap_or(defaults.base_url),
            api_key: lookup("COINGECKO_API_KEY").filter(|k| !k.trim().is_empty()),
            vs_currency: lookup("VS_CURRENCY")
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.vs_currency),
            interval,
            timeout_secs,
            max_retries: parse_or(lookup, "MARKET_DATA_MAX_RETRIES", defaults.max_retries)?,
        })
    }

    pub fn http_settings(&self) -> HttpClientSettings {
        HttpClientSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            ..HttpClientSettings::default()
        }
    }

    pub fn build_service(&self) -> CoinGeckoMarketDataService {
        CoinGeckoMarketDataService::builder()
            .base_url(self.base_url.clone())
            .api_key(self.api_key.clone())
            .interval(self.interval.clone())
            .http_settings(self.http_settings())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::source;

    #[test]
    fn test_market_data_defaults() {
        let config = MarketDataEnvConfig::from_source(&source(&[])).unwrap();
        assert_eq!(config.base_url, COINGECKO_API_URL);
        assert_eq!(config.vs_currency, "usd");
        assert_eq!(config.interval.as_deref(), Some("daily"));
        assert!(config.api_key.is_none());
        assert_eq!(config.http_settings().max_retries, 0);
    }

    #[test]
    fn test_auto_interval_and_api_key() {
        let config = MarketDataEnvConfig::from_source(&source(&[
            ("MARKET_DATA_INTERVAL", "auto"),
            ("COINGECKO_API_KEY", "demo-key"),
            ("VS_CURRENCY", "EUR"),
            ("MARKET_DATA_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert!(config.interval.is_none());
        assert_eq!(config.api_key.as_deref(), Some("demo-key"));
        assert_eq!(config.vs_currency, "eur");
        assert_eq!(config.http_settings().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(
            MarketDataEnvConfig::from_source(&source(&[("MARKET_DATA_TIMEOUT_SECS", "0")]))
                .is_err()
        );
    }
}
