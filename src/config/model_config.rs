//! Model, training and artifact configuration.

use super::{Lookup, process_env, parse_or};
use crate::application::ml::ForecasterConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub models_dir: PathBuf,
    pub lookback_days: usize,
    pub prediction_days: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub learning_rate: f64,
    /// History fetched for training on top of the lookback window.
    pub training_extra_days: usize,
    pub training_seed: Option<u64>,
    pub token_registry_path: Option<PathBuf>,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        let forecaster = ForecasterConfig::default();
        Self {
            models_dir: PathBuf::from("models"),
            lookback_days: forecaster.lookback,
            prediction_days: forecaster.horizon,
            epochs: forecaster.epochs,
            batch_size: forecaster.batch_size,
            hidden_size: forecaster.hidden_size,
            num_layers: forecaster.num_layers,
            learning_rate: forecaster.learning_rate,
            training_extra_days: 90,
            training_seed: None,
            token_registry_path: None,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&process_env)
    }

    pub fn from_source(lookup: Lookup<'_>) -> Result<Self> {
        let d = Self::default();

        let config = Self {
            models_dir: lookup("MODELS_DIR")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.models_dir),
            lookback_days: parse_or(lookup, "LOOKBACK_DAYS", d.lookback_days)?,
            prediction_days: parse_or(lookup, "PREDICTION_DAYS", d.prediction_days)?,
            epochs: parse_or(lookup, "EPOCHS", d.epochs)?,
            batch_size: parse_or(lookup, "BATCH_SIZE", d.batch_size)?,
            hidden_size: parse_or(lookup, "HIDDEN_SIZE", d.hidden_size)?,
            num_layers: parse_or(lookup, "NUM_LAYERS", d.num_layers)?,
            learning_rate: parse_or(lookup, "LEARNING_RATE", d.learning_rate)?,
            training_extra_days: parse_or(lookup, "TRAINING_EXTRA_DAYS", d.training_extra_days)?,
            training_seed: lookup("TRAINING_SEED")
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .context("Failed to parse TRAINING_SEED")?,
            token_registry_path: lookup("TOKEN_REGISTRY_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("LOOKBACK_DAYS", self.lookback_days),
            ("PREDICTION_DAYS", self.prediction_days),
            ("EPOCHS", self.epochs),
            ("BATCH_SIZE", self.batch_size),
            ("HIDDEN_SIZE", self.hidden_size),
            ("NUM_LAYERS", self.num_layers),
        ];
        for (name, value) in positive {
            if value == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            anyhow::bail!("LEARNING_RATE must be a positive number, got {}", self.learning_rate);
        }
        Ok(())
    }

    pub fn forecaster_config(&self) -> ForecasterConfig {
        ForecasterConfig {
            lookback: self.lookback_days,
            horizon: self.prediction_days,
            hidden_size: self.hidden_size,
            num_layers: self.num_layers,
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            batch_size: self.batch_size,
        }
    }

    /// Days of history requested when training a token.
    pub fn training_days(&self) -> usize {
        self.lookback_days + self.training_extra_days
    }
}
