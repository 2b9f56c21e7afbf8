// Forecasting use cases: offline training and online prediction
pub mod forecasting;

// Model, scaling and windowing primitives
pub mod ml;
