pub mod artifacts;
pub mod forecaster;
pub mod lstm;
pub mod optimizer;
pub mod predictor;
pub mod scaler;
pub mod windowing;

pub use artifacts::{ModelArtifact, ScalerArtifact, TokenArtifacts};
pub use forecaster::{FitSummary, ForecasterConfig, LstmForecaster};
pub use predictor::PricePredictor;
pub use scaler::MinMaxScaler;
pub use windowing::{SequenceWindower, TrainingExample};
