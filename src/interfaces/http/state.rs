use crate::application::forecasting::PredictionService;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub predictions: PredictionService,
    /// `None` when metrics are disabled; `/metrics` then answers 404.
    pub metrics: Option<Metrics>,
}

impl AppState {
    pub fn new(predictions: PredictionService, metrics: Option<Metrics>) -> Arc<Self> {
        Arc::new(Self {
            predictions,
            metrics,
        })
    }
}
