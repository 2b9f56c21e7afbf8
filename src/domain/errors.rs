use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the token registry
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Unsupported token. Try: {supported:?}")]
    UnsupportedToken {
        token: String,
        supported: Vec<String>,
    },

    #[error("Duplicate token key in registry: {key}")]
    DuplicateKey { key: String },

    #[error("Invalid token descriptor: {reason}")]
    InvalidDescriptor { reason: String },
}

/// Errors related to market data retrieval
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Market data request failed for {id}: {reason}")]
    Request { id: String, reason: String },

    #[error("Market data provider returned {status} for {id}: {body}")]
    Status { id: String, status: u16, body: String },

    #[error("Invalid market data for {id}: {reason}")]
    InvalidData { id: String, reason: String },
}

/// Errors loading or saving per-token model and scaler artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("Corrupt artifact at {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error(
        "Model and scaler for {token_id} come from different training runs (model {model_run}, scaler {scaler_run})"
    )]
    Mismatch {
        token_id: String,
        model_run: String,
        scaler_run: String,
    },

    #[error("Artifact I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the numeric forecasting pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Input window has length {actual}, model expects {expected}")]
    WindowLength { expected: usize, actual: usize },

    #[error("Training targets have width {actual}, model horizon is {expected}")]
    HorizonMismatch { expected: usize, actual: usize },

    #[error("Cannot fit on an empty series")]
    EmptySeries,

    #[error("No training examples supplied")]
    NoExamples,

    #[error("Non-finite value encountered: {context}")]
    NonFinite { context: String },

    #[error("Inconsistent model structure: {reason}")]
    InvalidStructure { reason: String },
}

/// Errors from an offline training run for a single token
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(
        "Insufficient history for {token_id}: {available} points, need more than {needed}"
    )]
    InsufficientData {
        token_id: String,
        available: usize,
        needed: usize,
    },

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Errors surfaced by the prediction service to its callers
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Unsupported(#[from] RegistryError),

    #[error("Model not trained for this token")]
    Unavailable(#[source] ArtifactError),

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("Not enough recent prices for {token}: got {available}, need {needed}")]
    InsufficientHistory {
        token: String,
        available: usize,
        needed: usize,
    },

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_token_lists_keys() {
        let err = RegistryError::UnsupportedToken {
            token: "shib".to_string(),
            supported: vec!["bitcoin".to_string(), "ethereum".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.starts_with("Unsupported token. Try:"));
        assert!(msg.contains("bitcoin"));
        assert!(msg.contains("ethereum"));
    }

    #[test]
    fn test_unavailable_message_hides_path() {
        let err = PredictionError::Unavailable(ArtifactError::NotFound {
            path: PathBuf::from("models/bitcoin/model.json"),
        });
        assert_eq!(err.to_string(), "Model not trained for this token");
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let err = TrainingError::InsufficientData {
            token_id: "solana".to_string(),
            available: 20,
            needed: 35,
        };
        let msg = err.to_string();
        assert!(msg.contains("solana"));
        assert!(msg.contains("20"));
        assert!(msg.contains("35"));
    }
}
