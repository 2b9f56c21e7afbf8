pub mod prediction_service;
pub mod trainer;

pub use prediction_service::{PredictionService, forecast_prices};
pub use trainer::{TrainingOutcome, TrainingReport, TrainingService};
