use super::lstm::{Dense, DenseMoments, LstmLayer, LstmMoments, StepCache};
use super::optimizer::Adam;
use super::predictor::PricePredictor;
use super::windowing::{SequenceWindower, TrainingExample};
use crate::domain::errors::ForecastError;
use ndarray::{Array2, Array3, Axis, s};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Topology and training schedule of the forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecasterConfig {
    pub lookback: usize,
    pub horizon: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            lookback: 30,
            horizon: 5,
            hidden_size: 64,
            num_layers: 2,
            learning_rate: 0.001,
            epochs: 20,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub epochs: usize,
    pub samples: usize,
    pub loss_history: Vec<f64>,
}

impl FitSummary {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

struct ForecasterMoments {
    layers: Vec<LstmMoments>,
    head: DenseMoments,
}

/// Stacked LSTM regressor mapping a scaled price window to the next
/// `horizon` scaled prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmForecaster {
    config: ForecasterConfig,
    layers: Vec<LstmLayer>,
    head: Dense,
}

impl LstmForecaster {
    /// Creates an untrained model. A seed makes initialisation reproducible.
    pub fn new(config: ForecasterConfig, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, &mut rng)
    }

    pub fn with_rng<R: Rng>(config: ForecasterConfig, rng: &mut R) -> Self {
        let num_layers = config.num_layers.max(1);
        let mut layers = Vec::with_capacity(num_layers);
        layers.push(LstmLayer::new(1, config.hidden_size, rng));
        for _ in 1..num_layers {
            layers.push(LstmLayer::new(config.hidden_size, config.hidden_size, rng));
        }
        let head = Dense::new(config.hidden_size, config.horizon, rng);

        Self {
            config,
            layers,
            head,
        }
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    /// Verifies that a deserialized model is internally consistent: the
    /// layers chain from a single input feature and the head maps the last
    /// hidden state onto the horizon.
    pub fn validate(&self) -> Result<(), ForecastError> {
        let invalid = |reason: String| ForecastError::InvalidStructure { reason };

        if self.config.lookback == 0 {
            return Err(invalid("lookback is 0".to_string()));
        }
        if self.config.horizon == 0 {
            return Err(invalid("horizon is 0".to_string()));
        }
        if self.layers.is_empty() {
            return Err(invalid("no recurrent layers".to_string()));
        }
        if self.layers.len() != self.config.num_layers.max(1) {
            return Err(invalid(format!(
                "{} layers stored, config declares {}",
                self.layers.len(),
                self.config.num_layers
            )));
        }

        let mut expected_input = 1;
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.input_size != expected_input {
                return Err(invalid(format!(
                    "layer {} takes {} inputs, previous layer provides {}",
                    index, layer.input_size, expected_input
                )));
            }
            layer
                .check_shapes()
                .map_err(|reason| invalid(format!("layer {}: {}", index, reason)))?;
            expected_input = layer.hidden_size;
        }

        self.head
            .check_shapes(expected_input, self.config.horizon)
            .map_err(invalid)
    }

    /// Trains on `examples` for the configured number of epochs with
    /// mini-batch Adam on mean squared error. Batches are reshuffled every
    /// epoch using `rng`.
    pub fn fit<R: Rng>(
        &mut self,
        examples: &[TrainingExample],
        rng: &mut R,
    ) -> Result<FitSummary, ForecastError> {
        if examples.is_empty() {
            return Err(ForecastError::NoExamples);
        }
        for example in examples {
            if example.input.len() != self.config.lookback {
                return Err(ForecastError::WindowLength {
                    expected: self.config.lookback,
                    actual: example.input.len(),
                });
            }
            if example.target.len() != self.config.horizon {
                return Err(ForecastError::HorizonMismatch {
                    expected: self.config.horizon,
                    actual: example.target.len(),
                });
            }
        }

        let n = examples.len();
        let (x, y) =
            SequenceWindower::new(self.config.lookback, self.config.horizon).to_tensors(examples);

        let mut adam = Adam::new(self.config.learning_rate);
        let mut moments = ForecasterMoments {
            layers: self.layers.iter().map(LstmLayer::moments).collect(),
            head: self.head.moments(),
        };
        let batch_size = self.config.batch_size.max(1);
        let mut order: Vec<usize> = (0..n).collect();
        let mut loss_history = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            order.shuffle(rng);
            let mut weighted_loss = 0.0;

            for chunk in order.chunks(batch_size) {
                let xb = x.select(Axis(0), chunk);
                let yb = y.select(Axis(0), chunk);
                let loss = self.train_batch(&xb, &yb, &mut adam, &mut moments);
                weighted_loss += loss * chunk.len() as f64;
            }

            let epoch_loss = weighted_loss / n as f64;
            if !epoch_loss.is_finite() {
                return Err(ForecastError::NonFinite {
                    context: format!("training loss at epoch {}", epoch + 1),
                });
            }
            info!(
                "LstmForecaster: epoch {}/{} loss={:.6}",
                epoch + 1,
                self.config.epochs,
                epoch_loss
            );
            loss_history.push(epoch_loss);
        }

        Ok(FitSummary {
            epochs: self.config.epochs,
            samples: n,
            loss_history,
        })
    }

    /// Mean squared error of the model on `examples`.
    pub fn evaluate(&self, examples: &[TrainingExample]) -> Result<f64, ForecastError> {
        if examples.is_empty() {
            return Err(ForecastError::NoExamples);
        }
        let mut total = 0.0;
        let mut count = 0usize;
        for example in examples {
            let predicted = self.predict(&example.input)?;
            for (p, t) in predicted.iter().zip(example.target.iter()) {
                total += (p - t).powi(2);
                count += 1;
            }
        }
        Ok(total / count.max(1) as f64)
    }

    fn steps(x: &Array3<f64>) -> Vec<Array2<f64>> {
        (0..x.shape()[1])
            .map(|t| x.slice(s![.., t, ..]).to_owned())
            .collect()
    }

    fn train_batch(
        &mut self,
        x: &Array3<f64>,
        y: &Array2<f64>,
        adam: &mut Adam,
        moments: &mut ForecasterMoments,
    ) -> f64 {
        let steps = x.shape()[1];
        let mut seq = Self::steps(x);
        let mut caches: Vec<Vec<StepCache>> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut layer_cache = Vec::with_capacity(steps);
            seq = layer.forward(&seq, Some(&mut layer_cache));
            caches.push(layer_cache);
        }

        let Some(last_hidden) = seq.last() else {
            return 0.0;
        };
        let predictions = self.head.forward(last_hidden);
        let diff = &predictions - y;
        let loss = diff.mapv(|v| v * v).mean().unwrap_or(0.0);
        let dy = diff * (2.0 / y.len() as f64);

        let (head_grads, dh_last) = self.head.backward(last_hidden, &dy);

        let mut dh_out: Vec<Array2<f64>> = seq.iter().map(|h| Array2::zeros(h.raw_dim())).collect();
        if let Some(last) = dh_out.last_mut() {
            *last = dh_last;
        }

        let mut layer_grads = Vec::with_capacity(self.layers.len());
        for (layer, cache) in self.layers.iter().zip(caches.iter()).rev() {
            let (grads, dx) = layer.backward(cache, &dh_out);
            layer_grads.push(grads);
            dh_out = dx;
        }
        layer_grads.reverse();

        adam.tick();
        self.head.apply(&head_grads, adam, &mut moments.head);
        for ((layer, grads), layer_moments) in self
            .layers
            .iter_mut()
            .zip(layer_grads.iter())
            .zip(moments.layers.iter_mut())
        {
            layer.apply(grads, adam, layer_moments);
        }

        debug!("LstmForecaster: batch of {} loss={:.6}", y.nrows(), loss);
        loss
    }
}

impl PricePredictor for LstmForecaster {
    fn predict(&self, window: &[f64]) -> Result<Vec<f64>, ForecastError> {
        if window.len() != self.config.lookback {
            return Err(ForecastError::WindowLength {
                expected: self.config.lookback,
                actual: window.len(),
            });
        }
        if window.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite {
                context: "prediction window".to_string(),
            });
        }

        let mut seq: Vec<Array2<f64>> = window
            .iter()
            .map(|&v| Array2::from_elem((1, 1), v))
            .collect();
        for layer in &self.layers {
            seq = layer.forward(&seq, None);
        }

        let last_hidden = seq.last().ok_or(ForecastError::WindowLength {
            expected: self.config.lookback,
            actual: 0,
        })?;
        Ok(self.head.forward(last_hidden).row(0).to_vec())
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn horizon(&self) -> usize {
        self.head.outputs()
    }

    fn name(&self) -> &str {
        "Stacked LSTM"
    }
}
