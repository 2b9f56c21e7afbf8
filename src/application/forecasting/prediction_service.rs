//! Online inference: resolve token, load artifacts, fetch recent prices,
//! predict the next days in price units.

use crate::application::ml::{MinMaxScaler, PricePredictor};
use crate::domain::errors::{ForecastError, PredictionError};
use crate::domain::ports::MarketDataService;
use crate::domain::tokens::TokenRegistry;
use crate::domain::types::{Forecast, round_price};
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::ArtifactStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scales the window, runs the model and maps the output back to prices
/// rounded to cents.
pub fn forecast_prices(
    predictor: &dyn PricePredictor,
    scaler: &MinMaxScaler,
    window: &[f64],
) -> Result<Vec<f64>, ForecastError> {
    let scaled = scaler.transform(window);
    let output = predictor.predict(&scaled)?;
    Ok(scaler
        .inverse_transform(&output)
        .into_iter()
        .map(round_price)
        .collect())
}

pub struct PredictionService {
    registry: Arc<TokenRegistry>,
    market_data: Arc<dyn MarketDataService>,
    store: ArtifactStore,
    vs_currency: String,
    history_days: u32,
    metrics: Option<Metrics>,
}

impl PredictionService {
    pub fn new(
        registry: Arc<TokenRegistry>,
        market_data: Arc<dyn MarketDataService>,
        store: ArtifactStore,
        history_days: u32,
    ) -> Self {
        Self {
            registry,
            market_data,
            store,
            vs_currency: "usd".to_string(),
            history_days,
            metrics: None,
        }
    }

    pub fn with_vs_currency(mut self, vs_currency: impl Into<String>) -> Self {
        self.vs_currency = vs_currency.into();
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub async fn predict(&self, token: &str) -> Result<Forecast, PredictionError> {
        let started = Instant::now();
        let result = self.run(token).await;

        if let Some(metrics) = &self.metrics {
            // Labels are registry keys; unknown tokens share one series.
            let label = match &result {
                Ok(forecast) => forecast.token.as_str(),
                Err(_) => self
                    .registry
                    .resolve(token)
                    .map(|descriptor| descriptor.key.as_str())
                    .unwrap_or("unsupported"),
            };
            metrics.inc_predictions(label, outcome(&result));
            metrics.observe_prediction_latency(label, started.elapsed().as_secs_f64());
        }
        result
    }

    async fn run(&self, token: &str) -> Result<Forecast, PredictionError> {
        let descriptor = self.registry.resolve(token)?;

        let artifacts = self.store.load(&descriptor.external_id).map_err(|e| {
            warn!(
                "PredictionService: No usable model for {}: {}",
                descriptor.key, e
            );
            PredictionError::Unavailable(e)
        })?;
        let model = &artifacts.model.model;
        let lookback = model.lookback();

        let fetch_started = Instant::now();
        let series = self
            .market_data
            .get_price_history(
                &descriptor.external_id,
                &self.vs_currency,
                self.history_days.max(lookback as u32),
            )
            .await?;
        if let Some(metrics) = &self.metrics {
            metrics.observe_market_data_latency(
                self.market_data.provider(),
                fetch_started.elapsed().as_secs_f64(),
            );
        }

        let window = series
            .tail(lookback)
            .ok_or(PredictionError::InsufficientHistory {
                token: descriptor.key.clone(),
                available: series.len(),
                needed: lookback,
            })?;
        debug!(
            "PredictionService: {} window {:.2}..{:.2} over {} points",
            descriptor.key,
            window.first().copied().unwrap_or_default(),
            window.last().copied().unwrap_or_default(),
            window.len()
        );

        let predictions = forecast_prices(model, &artifacts.scaler.scaler, &window)?;
        info!(
            "PredictionService: {} next {} days {:?} ({} run {})",
            descriptor.key,
            predictions.len(),
            predictions,
            model.name(),
            artifacts.run_id()
        );

        Ok(Forecast {
            token: descriptor.key.clone(),
            predictions,
        })
    }
}

fn outcome(result: &Result<Forecast, PredictionError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(PredictionError::Unsupported(_)) => "unsupported",
        Err(PredictionError::Unavailable(_)) => "unavailable",
        Err(PredictionError::MarketData(_)) => "market_data_error",
        Err(PredictionError::InsufficientHistory { .. }) => "insufficient_history",
        Err(PredictionError::Forecast(_)) => "model_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::{
        FitSummary, ForecasterConfig, LstmForecaster, TokenArtifacts,
    };
    use crate::domain::errors::ArtifactError;
    use crate::infrastructure::mock::MockMarketDataService;

    /// Repeats the last scaled value across the horizon.
    struct Persistence {
        lookback: usize,
        horizon: usize,
    }

    impl PricePredictor for Persistence {
        fn predict(&self, window: &[f64]) -> Result<Vec<f64>, ForecastError> {
            if window.len() != self.lookback {
                return Err(ForecastError::WindowLength {
                    expected: self.lookback,
                    actual: window.len(),
                });
            }
            Ok(vec![window[window.len() - 1]; self.horizon])
        }

        fn lookback(&self) -> usize {
            self.lookback
        }

        fn horizon(&self) -> usize {
            self.horizon
        }

        fn name(&self) -> &str {
            "persistence"
        }
    }

    #[test]
    fn test_forecast_prices_inverts_and_rounds() {
        let window = [100.0, 150.0, 200.123];
        let scaler = MinMaxScaler::fit(&window).unwrap();
        let predictor = Persistence {
            lookback: 3,
            horizon: 5,
        };

        let prices = forecast_prices(&predictor, &scaler, &window).unwrap();
        assert_eq!(prices, vec![200.12; 5]);
    }

    #[test]
    fn test_forecast_prices_rejects_wrong_window() {
        let scaler = MinMaxScaler::fit(&[1.0, 2.0]).unwrap();
        let predictor = Persistence {
            lookback: 4,
            horizon: 1,
        };
        assert!(matches!(
            forecast_prices(&predictor, &scaler, &[1.0, 2.0]),
            Err(ForecastError::WindowLength { .. })
        ));
    }

    fn tiny_config() -> ForecasterConfig {
        ForecasterConfig {
            lookback: 5,
            horizon: 3,
            hidden_size: 4,
            num_layers: 2,
            learning_rate: 0.01,
            epochs: 1,
            batch_size: 4,
        }
    }

    fn save_untrained(store: &ArtifactStore, token_id: &str, prices: &[f64]) {
        let model = LstmForecaster::new(tiny_config(), Some(3));
        let scaler = MinMaxScaler::fit(prices).unwrap();
        let summary = FitSummary {
            epochs: 0,
            samples: 0,
            loss_history: vec![],
        };
        store
            .save(&TokenArtifacts::from_training(token_id, model, scaler, &summary))
            .unwrap();
    }

    async fn setup(points: usize) -> (tempfile::TempDir, MockMarketDataService, PredictionService) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let series = MockMarketDataService::daily_series(points, 50.0);
        save_untrained(&store, "matic-network", &series.prices());

        let mock = MockMarketDataService::new();
        mock.set_series("matic-network", series).await;

        let service = PredictionService::new(
            Arc::new(TokenRegistry::default()),
            Arc::new(mock.clone()),
            store,
            30,
        );
        (dir, mock, service)
    }

    #[tokio::test]
    async fn test_predict_returns_rounded_horizon() {
        let (_dir, mock, service) = setup(31).await;

        let forecast = service.predict("Polygon").await.unwrap();
        assert_eq!(forecast.token, "polygon");
        assert_eq!(forecast.predictions.len(), 3);
        for p in &forecast.predictions {
            assert!(p.is_finite());
            assert_eq!(*p, round_price(*p));
        }
        assert_eq!(mock.requests().await[0].days, 30);
    }

    #[tokio::test]
    async fn test_predict_accepts_external_id() {
        let (_dir, _mock, service) = setup(31).await;
        assert_eq!(service.predict("matic-network").await.unwrap().token, "polygon");
    }

    #[tokio::test]
    async fn test_unknown_and_untrained_tokens() {
        let (_dir, _mock, service) = setup(31).await;

        assert!(matches!(
            service.predict("shiba").await,
            Err(PredictionError::Unsupported(_))
        ));
        assert!(matches!(
            service.predict("bitcoin").await,
            Err(PredictionError::Unavailable(ArtifactError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_short_history_and_provider_failure() {
        let (_dir, mock, service) = setup(3).await;
        assert!(matches!(
            service.predict("polygon").await,
            Err(PredictionError::InsufficientHistory {
                available: 3,
                needed: 5,
                ..
            })
        ));

        mock.set_failing(true).await;
        assert!(matches!(
            service.predict("polygon").await,
            Err(PredictionError::MarketData(_))
        ));
    }

    #[tokio::test]
    async fn test_metrics_record_outcomes() {
        let (_dir, _mock, service) = setup(31).await;
        let metrics = Metrics::new().unwrap();
        let service = service.with_metrics(metrics.clone());

        service.predict("polygon").await.unwrap();
        let _ = service.predict("not-a-coin").await;

        let output = metrics.render();
        assert!(output.contains("coinforecast_predictions_total{outcome=\"ok\",token=\"polygon\"} 1"));
        assert!(output.contains("outcome=\"unsupported\",token=\"unsupported\""));
        assert!(output.contains("coinforecast_market_data_latency_seconds_count{provider=\"mock\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_label_failures_by_registry_key() {
        let (_dir, _mock, service) = setup(31).await;
        let metrics = Metrics::new().unwrap();
        let service = service.with_metrics(metrics.clone());

        for spelling in [" ethereum", "ETHEREUM", "Ethereum"] {
            assert!(matches!(
                service.predict(spelling).await,
                Err(PredictionError::Unavailable(_))
            ));
        }

        let output = metrics.render();
        assert!(output.contains(
            "coinforecast_predictions_total{outcome=\"unavailable\",token=\"ethereum\"} 3"
        ));
        assert!(!output.contains("ETHEREUM"));
        assert!(!output.contains("Ethereum"));
        assert!(!output.contains("token=\" ethereum\""));
    }
}
