use ndarray::{Array2, Array3};

/// One supervised example: `lookback` inputs followed by `horizon` targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

/// Slices a flat series into overlapping (input, target) windows.
#[derive(Debug, Clone, Copy)]
pub struct SequenceWindower {
    pub lookback: usize,
    pub horizon: usize,
}

impl SequenceWindower {
    pub fn new(lookback: usize, horizon: usize) -> Self {
        Self { lookback, horizon }
    }

    /// Number of examples `windows` yields for a series of length `n`.
    pub fn example_count(&self, n: usize) -> usize {
        n.saturating_sub(self.horizon)
            .saturating_sub(self.lookback)
    }

    /// Builds `(series[i-L..i], series[i..i+H])` for every `i` in `[L, N-H)`,
    /// in series order. Series shorter than `L + H` produce no examples.
    pub fn windows(&self, series: &[f64]) -> Vec<TrainingExample> {
        let end = series.len().saturating_sub(self.horizon);
        (self.lookback..end)
            .map(|i| TrainingExample {
                input: series[i - self.lookback..i].to_vec(),
                target: series[i..i + self.horizon].to_vec(),
            })
            .collect()
    }

    /// Packs examples into `[samples, lookback, 1]` inputs and
    /// `[samples, horizon]` targets.
    pub fn to_tensors(&self, examples: &[TrainingExample]) -> (Array3<f64>, Array2<f64>) {
        let n = examples.len();
        let x = Array3::from_shape_fn((n, self.lookback, 1), |(s, t, _)| examples[s].input[t]);
        let y = Array2::from_shape_fn((n, self.horizon), |(s, h)| examples[s].target[h]);
        (x, y)
    }
}
