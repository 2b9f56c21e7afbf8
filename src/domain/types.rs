use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single observed price, timestamp in unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Time-ordered price history for one token over a trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, sorting points by timestamp.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// The most recent `n` prices, oldest first. Returns `None` when the
    /// series is shorter than `n`.
    pub fn tail(&self, n: usize) -> Option<Vec<f64>> {
        if self.points.len() < n {
            return None;
        }
        Some(
            self.points[self.points.len() - n..]
                .iter()
                .map(|p| p.price)
                .collect(),
        )
    }
}

/// Forecast returned to API clients.
///
/// Serialized as `{"token": .., "next_<H>_days": [..]}` where `H` is the
/// number of predicted values.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub token: String,
    pub predictions: Vec<f64>,
}

impl Forecast {
    pub fn horizon_key(&self) -> String {
        format!("next_{}_days", self.predictions.len())
    }
}

impl Serialize for Forecast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("token", &self.token)?;
        map.serialize_entry(&self.horizon_key(), &self.predictions)?;
        map.end()
    }
}

/// Rounds to two decimal places, the precision prices are reported at.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
