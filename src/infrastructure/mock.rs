use crate::domain::errors::MarketDataError;
use crate::domain::ports::MarketDataService;
use crate::domain::types::{PricePoint, PriceSeries};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const DAY_MS: i64 = 86_400_000;

/// A recorded `get_price_history` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    pub external_id: String,
    pub vs_currency: String,
    pub days: u32,
}

/// In-memory market data source for tests and offline runs.
#[derive(Clone, Default)]
pub struct MockMarketDataService {
    series: Arc<RwLock<HashMap<String, PriceSeries>>>,
    requests: Arc<RwLock<Vec<PriceRequest>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_series(&self, external_id: &str, series: PriceSeries) {
        self.series
            .write()
            .await
            .insert(external_id.to_string(), series);
    }

    /// Makes every subsequent request fail as if the provider were down.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn requests(&self) -> Vec<PriceRequest> {
        self.requests.read().await.clone()
    }

    /// Deterministic daily series: a gentle trend with a weekly wobble.
    pub fn daily_series(points: usize, start_price: f64) -> PriceSeries {
        let start_ts = 1_700_000_000_000_i64;
        PriceSeries::new(
            (0..points)
                .map(|i| {
                    let day = i as f64;
                    let price = start_price
                        * (1.0 + 0.002 * day)
                        * (1.0 + 0.03 * (day * std::f64::consts::TAU / 7.0).sin());
                    PricePoint::new(start_ts + i as i64 * DAY_MS, price)
                })
                .collect(),
        )
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn get_price_history(
        &self,
        external_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<PriceSeries, MarketDataError> {
        self.requests.write().await.push(PriceRequest {
            external_id: external_id.to_string(),
            vs_currency: vs_currency.to_string(),
            days,
        });

        if *self.failing.read().await {
            return Err(MarketDataError::Request {
                id: external_id.to_string(),
                reason: "mock provider unavailable".to_string(),
            });
        }

        let series = self.series.read().await;
        match series.get(external_id) {
            Some(found) => {
                debug!(
                    "MockMarketDataService: Serving {} prices for {}",
                    found.len(),
                    external_id
                );
                Ok(found.clone())
            }
            None => Err(MarketDataError::Status {
                id: external_id.to_string(),
                status: 404,
                body: "coin not found".to_string(),
            }),
        }
    }

    fn provider(&self) -> &str {
        "mock"
    }
}
