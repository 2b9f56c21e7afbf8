//! Prometheus metrics definitions for coinforecast
//!
//! All metrics use the `coinforecast_` prefix.

use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the prediction service and trainer
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Prediction requests by token and outcome
    pub predictions_total: CounterVec,
    /// End-to-end prediction latency in seconds
    pub prediction_latency_seconds: HistogramVec,
    /// Market data fetch latency in seconds
    pub market_data_latency_seconds: HistogramVec,
    /// Training runs by token and outcome
    pub training_runs_total: CounterVec,
    /// Final training loss per token
    pub training_loss: GaugeVec,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new(
                "coinforecast_predictions_total",
                "Prediction requests by token and outcome",
            ),
            &["token", "outcome"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "coinforecast_prediction_latency_seconds",
                "Prediction latency in seconds, including model load and data fetch",
            )
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["token"],
        )?;
        registry.register(Box::new(prediction_latency_seconds.clone()))?;

        let market_data_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "coinforecast_market_data_latency_seconds",
                "Market data request latency in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["provider"],
        )?;
        registry.register(Box::new(market_data_latency_seconds.clone()))?;

        let training_runs_total = CounterVec::new(
            Opts::new(
                "coinforecast_training_runs_total",
                "Training runs by token and outcome",
            ),
            &["token", "outcome"],
        )?;
        registry.register(Box::new(training_runs_total.clone()))?;

        let training_loss = GaugeVec::new(
            Opts::new("coinforecast_training_loss", "Final training MSE per token"),
            &["token"],
        )?;
        registry.register(Box::new(training_loss.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            prediction_latency_seconds,
            market_data_latency_seconds,
            training_runs_total,
            training_loss,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_predictions(&self, token: &str, outcome: &str) {
        self.predictions_total
            .with_label_values(&[token, outcome])
            .inc();
    }

    pub fn observe_prediction_latency(&self, token: &str, seconds: f64) {
        self.prediction_latency_seconds
            .with_label_values(&[token])
            .observe(seconds);
    }

    pub fn observe_market_data_latency(&self, provider: &str, seconds: f64) {
        self.market_data_latency_seconds
            .with_label_values(&[provider])
            .observe(seconds);
    }

    pub fn record_training(&self, token: &str, outcome: &str, final_loss: Option<f64>) {
        self.training_runs_total
            .with_label_values(&[token, outcome])
            .inc();
        if let Some(loss) = final_loss {
            self.training_loss.with_label_values(&[token]).set(loss);
        }
    }
}
