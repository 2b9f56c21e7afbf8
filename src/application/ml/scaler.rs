use crate::domain::errors::ForecastError;
use serde::{Deserialize, Serialize};

/// Min-max scaler mapping the fitted price range onto `[0, 1]`.
///
/// Values outside the fitted range extrapolate linearly. A constant series
/// is treated as having unit range so the transform stays invertible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: f64,
    data_max: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite {
                context: "scaler fit input".to_string(),
            });
        }

        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { data_min, data_max })
    }

    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    fn range(&self) -> f64 {
        let range = self.data_max - self.data_min;
        if range == 0.0 { 1.0 } else { range }
    }

    pub fn transform_one(&self, value: f64) -> f64 {
        (value - self.data_min) / self.range()
    }

    pub fn inverse_one(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.data_min
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_one(v)).collect()
    }

    pub fn inverse_transform(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&v| self.inverse_one(v)).collect()
    }

    /// Fits on `values` and returns the scaled series in one pass.
    pub fn fit_transform(values: &[f64]) -> Result<(Self, Vec<f64>), ForecastError> {
        let scaler = Self::fit(values)?;
        let scaled = scaler.transform(values);
        Ok((scaler, scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_maps_range_to_unit_interval() {
        let (scaler, scaled) = MinMaxScaler::fit_transform(&[10.0, 15.0, 20.0]).unwrap();
        assert_eq!(scaler.data_min(), 10.0);
        assert_eq!(scaler.data_max(), 20.0);
        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_round_trip_inside_range() {
        let prices = [43_012.55, 42_870.1, 44_100.9, 43_555.0, 42_001.37];
        let scaler = MinMaxScaler::fit(&prices).unwrap();
        let restored = scaler.inverse_transform(&scaler.transform(&prices));

        for (original, back) in prices.iter().zip(restored.iter()) {
            assert!((original - back).abs() < 1e-9, "{} vs {}", original, back);
        }
    }

    #[test]
    fn test_out_of_range_extrapolates_linearly() {
        let scaler = MinMaxScaler::fit(&[100.0, 200.0]).unwrap();
        assert!((scaler.transform_one(250.0) - 1.5).abs() < 1e-12);
        assert!((scaler.transform_one(50.0) + 0.5).abs() < 1e-12);
        assert!((scaler.inverse_one(1.5) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_series_is_invertible() {
        let scaler = MinMaxScaler::fit(&[7.0, 7.0, 7.0]).unwrap();
        assert_eq!(scaler.transform(&[7.0]), vec![0.0]);
        assert_eq!(scaler.inverse_one(0.0), 7.0);
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        assert_eq!(MinMaxScaler::fit(&[]), Err(ForecastError::EmptySeries));
        assert!(matches!(
            MinMaxScaler::fit(&[1.0, f64::NAN]),
            Err(ForecastError::NonFinite { .. })
        ));
    }
}
