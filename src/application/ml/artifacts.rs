//! Persisted per-token training output.
//!
//! A training run produces one model and one scaler artifact stamped with
//! the same `run_id`; the pair is only usable together.

use super::forecaster::{FitSummary, LstmForecaster};
use super::scaler::MinMaxScaler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub run_id: Uuid,
    pub token_id: String,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub final_loss: Option<f64>,
    pub model: LstmForecaster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub run_id: Uuid,
    pub token_id: String,
    pub scaler: MinMaxScaler,
}

/// A matched model/scaler pair for one token.
#[derive(Debug, Clone)]
pub struct TokenArtifacts {
    pub model: ModelArtifact,
    pub scaler: ScalerArtifact,
}

impl TokenArtifacts {
    /// Stamps a freshly trained model and its scaler with a new run id.
    pub fn from_training(
        token_id: &str,
        model: LstmForecaster,
        scaler: MinMaxScaler,
        summary: &FitSummary,
    ) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            model: ModelArtifact {
                run_id,
                token_id: token_id.to_string(),
                trained_at: Utc::now(),
                samples: summary.samples,
                final_loss: summary.final_loss(),
                model,
            },
            scaler: ScalerArtifact {
                run_id,
                token_id: token_id.to_string(),
                scaler,
            },
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.model.run_id
    }
}
