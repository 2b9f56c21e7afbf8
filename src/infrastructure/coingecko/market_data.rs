//! CoinGecko Market Data Service
//!
//! Fetches trailing price history from the public `market_chart` endpoint:
//! `GET /coins/{id}/market_chart?vs_currency=usd&days=30`.

use crate::domain::errors::MarketDataError;
use crate::domain::ports::MarketDataService;
use crate::domain::types::{PricePoint, PriceSeries};
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, HttpClientSettings, build_url_with_query,
};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info};

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[timestamp_ms, price]` pairs
    prices: Vec<(f64, f64)>,
}

pub struct CoinGeckoMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    interval: Option<String>,
}

impl CoinGeckoMarketDataService {
    pub fn builder() -> CoinGeckoMarketDataServiceBuilder {
        CoinGeckoMarketDataServiceBuilder::default()
    }

    fn market_chart_url(
        &self,
        external_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<String, MarketDataError> {
        let days = days.to_string();
        let mut params = vec![("vs_currency", vs_currency), ("days", days.as_str())];
        if let Some(interval) = self.interval.as_deref() {
            params.push(("interval", interval));
        }

        let base = format!(
            "{}/coins/{}/market_chart",
            self.base_url.trim_end_matches('/'),
            external_id
        );
        build_url_with_query(&base, &params).map_err(|e| MarketDataError::Request {
            id: external_id.to_string(),
            reason: format!("invalid URL {}: {}", base, e),
        })
    }
}

#[derive(Default)]
pub struct CoinGeckoMarketDataServiceBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    interval: Option<String>,
    http: HttpClientSettings,
}

impl CoinGeckoMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Sampling interval passed to the provider (e.g. `daily`). `None` lets
    /// the provider pick granularity from the requested day count.
    pub fn interval(mut self, interval: Option<String>) -> Self {
        self.interval = interval.filter(|i| !i.trim().is_empty());
        self
    }

    pub fn http_settings(mut self, settings: HttpClientSettings) -> Self {
        self.http = settings;
        self
    }

    pub fn build(self) -> CoinGeckoMarketDataService {
        CoinGeckoMarketDataService {
            client: HttpClientFactory::create_client(self.http),
            base_url: self
                .base_url
                .unwrap_or_else(|| COINGECKO_API_URL.to_string()),
            api_key: self.api_key,
            interval: self.interval,
        }
    }
}

/// Converts a `market_chart` body into an ordered series.
pub fn parse_market_chart(external_id: &str, body: &str) -> Result<PriceSeries, MarketDataError> {
    let chart: MarketChartResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::InvalidData {
            id: external_id.to_string(),
            reason: format!("unexpected response shape: {}", e),
        })?;

    let mut points = Vec::with_capacity(chart.prices.len());
    for (timestamp, price) in chart.prices {
        if !timestamp.is_finite() || !price.is_finite() || price < 0.0 {
            return Err(MarketDataError::InvalidData {
                id: external_id.to_string(),
                reason: format!("bad price point [{}, {}]", timestamp, price),
            });
        }
        points.push(PricePoint::new(timestamp as i64, price));
    }

    Ok(PriceSeries::new(points))
}

#[async_trait]
impl MarketDataService for CoinGeckoMarketDataService {
    async fn get_price_history(
        &self,
        external_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<PriceSeries, MarketDataError> {
        let url = self.market_chart_url(external_id, vs_currency, days)?;
        debug!("CoinGeckoMarketDataService: GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| MarketDataError::Request {
            id: external_id.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| MarketDataError::Request {
            id: external_id.to_string(),
            reason: format!("failed to read body: {}", e),
        })?;

        if !status.is_success() {
            return Err(MarketDataError::Status {
                id: external_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let series = parse_market_chart(external_id, &body)?;
        info!(
            "CoinGeckoMarketDataService: Fetched {} prices for {} ({} days, {})",
            series.len(),
            external_id,
            days,
            vs_currency
        );
        Ok(series)
    }

    fn provider(&self) -> &str {
        "coingecko"
    }
}
