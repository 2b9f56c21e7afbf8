use crate::domain::errors::ForecastError;

/// Interface for models that map a scaled price window to scaled future
/// prices.
pub trait PricePredictor: Send + Sync {
    /// Predict the next `horizon()` scaled values from exactly `lookback()`
    /// scaled inputs, oldest first.
    fn predict(&self, window: &[f64]) -> Result<Vec<f64>, ForecastError>;

    /// Number of input steps the model consumes
    fn lookback(&self) -> usize;

    /// Number of future steps the model produces
    fn horizon(&self) -> usize;

    /// Get model name/type
    fn name(&self) -> &str;
}
