//! Offline training pipeline: fetch history, scale, window, fit, persist.

use crate::application::ml::{
    ForecasterConfig, LstmForecaster, MinMaxScaler, SequenceWindower, TokenArtifacts,
};
use crate::domain::errors::TrainingError;
use crate::domain::ports::MarketDataService;
use crate::domain::tokens::TokenDescriptor;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::ArtifactStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result of a successful training run for one token.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub token: String,
    pub external_id: String,
    pub run_id: Uuid,
    pub samples: usize,
    pub final_loss: Option<f64>,
}

/// Per-token results of a batch run, in registry order.
#[derive(Debug, Default)]
pub struct TrainingReport {
    pub results: Vec<(String, Result<TrainingOutcome, TrainingError>)>,
}

impl TrainingReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }
}

pub struct TrainingService {
    market_data: Arc<dyn MarketDataService>,
    store: ArtifactStore,
    config: ForecasterConfig,
    vs_currency: String,
    history_days: u32,
    seed: Option<u64>,
    metrics: Option<Metrics>,
}

impl TrainingService {
    pub fn new(
        market_data: Arc<dyn MarketDataService>,
        store: ArtifactStore,
        config: ForecasterConfig,
        history_days: u32,
    ) -> Self {
        Self {
            market_data,
            store,
            config,
            vs_currency: "usd".to_string(),
            history_days,
            seed: None,
            metrics: None,
        }
    }

    pub fn with_vs_currency(mut self, vs_currency: impl Into<String>) -> Self {
        self.vs_currency = vs_currency.into();
        self
    }

    /// Fixes weight initialisation and batch order for reproducible runs.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    /// Minimum history that yields at least one training example.
    pub fn required_points(&self) -> usize {
        self.config.lookback + self.config.horizon + 1
    }

    pub async fn train_token(
        &self,
        token: &TokenDescriptor,
    ) -> Result<TrainingOutcome, TrainingError> {
        let started = Instant::now();
        let result = self.run(token).await;

        match &result {
            Ok(outcome) => {
                info!(
                    "TrainingService: Trained {} ({} samples, final loss {:?}) in {:.1}s, run {}",
                    token.key,
                    outcome.samples,
                    outcome.final_loss,
                    started.elapsed().as_secs_f64(),
                    outcome.run_id
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_training(&token.key, "ok", outcome.final_loss);
                }
            }
            Err(e) => {
                error!("TrainingService: Training failed for {}: {}", token.key, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_training(&token.key, "error", None);
                }
            }
        }
        result
    }

    async fn run(&self, token: &TokenDescriptor) -> Result<TrainingOutcome, TrainingError> {
        info!(
            "TrainingService: Fetching {} days of {} history for {}",
            self.history_days, self.vs_currency, token.external_id
        );
        let series = self
            .market_data
            .get_price_history(&token.external_id, &self.vs_currency, self.history_days)
            .await?;
        let prices = series.prices();

        let windower = SequenceWindower::new(self.config.lookback, self.config.horizon);
        if windower.example_count(prices.len()) == 0 {
            return Err(TrainingError::InsufficientData {
                token_id: token.external_id.clone(),
                available: prices.len(),
                needed: self.required_points(),
            });
        }

        let (scaler, scaled) = MinMaxScaler::fit_transform(&prices)?;
        let examples = windower.windows(&scaled);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut model = LstmForecaster::with_rng(self.config.clone(), &mut rng);
        let summary = model.fit(&examples, &mut rng)?;

        let artifacts = TokenArtifacts::from_training(&token.external_id, model, scaler, &summary);
        self.store.save(&artifacts)?;

        Ok(TrainingOutcome {
            token: token.key.clone(),
            external_id: token.external_id.clone(),
            run_id: artifacts.run_id(),
            samples: summary.samples,
            final_loss: summary.final_loss(),
        })
    }

    /// Trains every token in turn. A failure is recorded and the batch
    /// moves on to the next token.
    pub async fn train_all<'a, I>(&self, tokens: I) -> TrainingReport
    where
        I: IntoIterator<Item = &'a TokenDescriptor>,
    {
        let mut report = TrainingReport::default();
        for token in tokens {
            let result = self.train_token(token).await;
            report.results.push((token.key.clone(), result));
        }

        let failed = report.failed();
        if failed.is_empty() {
            info!(
                "TrainingService: All {} tokens trained",
                report.results.len()
            );
        } else {
            warn!(
                "TrainingService: {}/{} tokens trained, failed: {:?}",
                report.succeeded(),
                report.results.len(),
                failed
            );
        }
        report
    }
}
