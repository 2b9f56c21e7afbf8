//! LSTM and dense layers with full backpropagation through time.
//!
//! Gate order in the packed weight matrices is input, forget, cell
//! candidate, output. All tensors are batch-major: `[batch, features]`.

use super::optimizer::{Adam, Moments};
use ndarray::{Array1, Array2, Axis, Ix1, Ix2, s};
use rand::Rng;
use serde::{Deserialize, Serialize};

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot/Xavier uniform initialisation.
pub(crate) fn glorot_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..limit))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub input_size: usize,
    pub hidden_size: usize,
    /// Input kernel `[input, 4 * hidden]`
    w: Array2<f64>,
    /// Recurrent kernel `[hidden, 4 * hidden]`
    u: Array2<f64>,
    /// Bias `[4 * hidden]`
    b: Array1<f64>,
}

/// Per-timestep activations kept for the backward pass.
pub struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    tanh_c: Array2<f64>,
}

pub struct LstmGrads {
    pub w: Array2<f64>,
    pub u: Array2<f64>,
    pub b: Array1<f64>,
}

pub struct LstmMoments {
    w: Moments<Ix2>,
    u: Moments<Ix2>,
    b: Moments<Ix1>,
}

impl LstmLayer {
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let mut b = Array1::zeros(4 * hidden_size);
        // Unit forget-gate bias
        b.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            input_size,
            hidden_size,
            w: glorot_uniform(input_size, 4 * hidden_size, rng),
            u: glorot_uniform(hidden_size, 4 * hidden_size, rng),
            b,
        }
    }

    /// Checks that the packed tensors agree with the declared sizes.
    pub fn check_shapes(&self) -> Result<(), String> {
        let (n, h) = (self.input_size, self.hidden_size);
        if h == 0 {
            return Err("hidden size is 0".to_string());
        }
        if self.w.dim() != (n, 4 * h) {
            return Err(format!("w is {:?}, expected [{}, {}]", self.w.shape(), n, 4 * h));
        }
        if self.u.dim() != (h, 4 * h) {
            return Err(format!("u is {:?}, expected [{}, {}]", self.u.shape(), h, 4 * h));
        }
        if self.b.len() != 4 * h {
            return Err(format!("b has {} entries, expected {}", self.b.len(), 4 * h));
        }
        Ok(())
    }

    /// Runs the layer over a sequence of `[batch, input]` steps, returning
    /// the hidden state at every step. When `caches` is given, the
    /// activations needed by [`backward`](Self::backward) are recorded.
    pub fn forward(
        &self,
        inputs: &[Array2<f64>],
        mut caches: Option<&mut Vec<StepCache>>,
    ) -> Vec<Array2<f64>> {
        let n = self.hidden_size;
        let batch = inputs.first().map(|x| x.nrows()).unwrap_or(0);
        let mut h = Array2::<f64>::zeros((batch, n));
        let mut c = Array2::<f64>::zeros((batch, n));
        let mut outputs = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = x.dot(&self.w) + h.dot(&self.u) + &self.b;
            let i = z.slice(s![.., 0..n]).mapv(sigmoid);
            let f = z.slice(s![.., n..2 * n]).mapv(sigmoid);
            let g = z.slice(s![.., 2 * n..3 * n]).mapv(f64::tanh);
            let o = z.slice(s![.., 3 * n..4 * n]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            if let Some(caches) = caches.as_mut() {
                caches.push(StepCache {
                    x: x.clone(),
                    h_prev: h.clone(),
                    c_prev: c.clone(),
                    i,
                    f,
                    g,
                    o,
                    tanh_c,
                });
            }

            outputs.push(h_next.clone());
            h = h_next;
            c = c_next;
        }

        outputs
    }

    /// Backpropagates `dh_out` (the loss gradient w.r.t. each step's hidden
    /// output) through time. Returns the parameter gradients and the
    /// gradient w.r.t. each step's input.
    pub fn backward(
        &self,
        caches: &[StepCache],
        dh_out: &[Array2<f64>],
    ) -> (LstmGrads, Vec<Array2<f64>>) {
        let n = self.hidden_size;
        let batch = caches.first().map(|c| c.x.nrows()).unwrap_or(0);

        let mut grads = LstmGrads {
            w: Array2::zeros(self.w.raw_dim()),
            u: Array2::zeros(self.u.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        };
        let mut dx_seq = vec![Array2::zeros((batch, self.input_size)); caches.len()];
        let mut dh_next = Array2::<f64>::zeros((batch, n));
        let mut dc_next = Array2::<f64>::zeros((batch, n));
        let mut dz = Array2::<f64>::zeros((batch, 4 * n));

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let dh = &dh_out[t] + &dh_next;

            let d_o = &dh * &cache.tanh_c;
            let dc = &dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let di = &dc * &cache.g;
            let dg = &dc * &cache.i;
            let df = &dc * &cache.c_prev;
            dc_next = &dc * &cache.f;

            dz.slice_mut(s![.., 0..n])
                .assign(&(&di * &cache.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., n..2 * n])
                .assign(&(&df * &cache.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * n..3 * n])
                .assign(&(&dg * &cache.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * n..4 * n])
                .assign(&(&d_o * &cache.o.mapv(|v| v * (1.0 - v))));

            grads.w += &cache.x.t().dot(&dz);
            grads.u += &cache.h_prev.t().dot(&dz);
            grads.b += &dz.sum_axis(Axis(0));

            dx_seq[t] = dz.dot(&self.w.t());
            dh_next = dz.dot(&self.u.t());
        }

        (grads, dx_seq)
    }

    pub fn moments(&self) -> LstmMoments {
        LstmMoments {
            w: Moments::like(&self.w),
            u: Moments::like(&self.u),
            b: Moments::like(&self.b),
        }
    }

    pub fn apply(&mut self, grads: &LstmGrads, adam: &Adam, moments: &mut LstmMoments) {
        adam.update(&mut self.w, &grads.w, &mut moments.w);
        adam.update(&mut self.u, &grads.u, &mut moments.u);
        adam.update(&mut self.b, &grads.b, &mut moments.b);
    }
}

/// Fully connected linear projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// `[inputs, outputs]`
    weights: Array2<f64>,
    bias: Array1<f64>,
}

pub struct DenseGrads {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

pub struct DenseMoments {
    weights: Moments<Ix2>,
    bias: Moments<Ix1>,
}

impl Dense {
    pub fn new<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        Self {
            weights: glorot_uniform(inputs, outputs, rng),
            bias: Array1::zeros(outputs),
        }
    }

    pub fn outputs(&self) -> usize {
        self.bias.len()
    }

    pub fn check_shapes(&self, inputs: usize, outputs: usize) -> Result<(), String> {
        if self.weights.dim() != (inputs, outputs) || self.bias.len() != outputs {
            return Err(format!(
                "dense weights {:?} and bias [{}], expected [{}, {}] and [{}]",
                self.weights.shape(),
                self.bias.len(),
                inputs,
                outputs,
                outputs
            ));
        }
        Ok(())
    }

    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.weights) + &self.bias
    }

    /// Returns parameter gradients and the gradient w.r.t. the input.
    pub fn backward(&self, x: &Array2<f64>, dy: &Array2<f64>) -> (DenseGrads, Array2<f64>) {
        let grads = DenseGrads {
            weights: x.t().dot(dy),
            bias: dy.sum_axis(Axis(0)),
        };
        (grads, dy.dot(&self.weights.t()))
    }

    pub fn moments(&self) -> DenseMoments {
        DenseMoments {
            weights: Moments::like(&self.weights),
            bias: Moments::like(&self.bias),
        }
    }

    pub fn apply(&mut self, grads: &DenseGrads, adam: &Adam, moments: &mut DenseMoments) {
        adam.update(&mut self.weights, &grads.weights, &mut moments.weights);
        adam.update(&mut self.bias, &grads.bias, &mut moments.bias);
    }
}
