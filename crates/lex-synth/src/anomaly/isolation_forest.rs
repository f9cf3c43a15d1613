//! Isolation forest over a single numeric feature.

use rand::prelude::*;
use rand::seq::index;

/// Isolation tree node.
#[derive(Debug, Clone)]
pub enum IsolationTree {
    /// Internal node with split
    Internal {
        /// Values below the threshold go left
        threshold: f64,
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
    /// External (leaf) node
    External {
        /// Number of samples in this node
        size: usize,
    },
}

impl IsolationTree {
    /// Build an isolation tree over `values[indices]`.
    pub fn build(
        values: &[f64],
        indices: &[usize],
        height: usize,
        max_height: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n_samples = indices.len();
        if height >= max_height || n_samples <= 1 {
            return IsolationTree::External { size: n_samples };
        }

        let (min_val, max_val) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
            (lo.min(values[i]), hi.max(values[i]))
        });
        if !min_val.is_finite() || !max_val.is_finite() || max_val - min_val < 1e-10 {
            return IsolationTree::External { size: n_samples };
        }

        // Convex combination; `max_val - min_val` can overflow for wide ranges.
        let u: f64 = rng.r#gen();
        let threshold = min_val * (1.0 - u) + max_val * u;
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| values[i] < threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return IsolationTree::External { size: n_samples };
        }

        IsolationTree::Internal {
            threshold,
            left: Box::new(Self::build(values, &left_indices, height + 1, max_height, rng)),
            right: Box::new(Self::build(values, &right_indices, height + 1, max_height, rng)),
        }
    }

    /// Path length of `value`, with the expected remaining depth added at
    /// the leaf.
    pub fn path_length(&self, value: f64, current_height: usize) -> f64 {
        match self {
            IsolationTree::External { size } => current_height as f64 + average_path_length(*size),
            IsolationTree::Internal {
                threshold,
                left,
                right,
            } => {
                if value < *threshold {
                    left.path_length(value, current_height + 1)
                } else {
                    right.path_length(value, current_height + 1)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree
/// of `n` nodes: c(n) = 2 * H(n-1) - 2(n-1)/n.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else if n == 2 {
        1.0
    } else {
        let n_f = n as f64;
        2.0 * ((n_f - 1.0).ln() + 0.5772156649) - 2.0 * (n_f - 1.0) / n_f
    }
}

/// Isolation forest anomaly detector.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    pub fn new(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed,
        }
    }

    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c.clamp(0.0, 0.5);
        self
    }

    /// Anomaly score of every value, in (0, 1]; higher is more anomalous.
    pub fn score(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n == 0 {
            return Vec::new();
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let samples_per_tree = self.max_samples.min(n);
        let max_height = (samples_per_tree as f64).log2().ceil() as usize;

        let trees: Vec<IsolationTree> = (0..self.n_estimators)
            .map(|_| {
                let indices = index::sample(&mut rng, n, samples_per_tree).into_vec();
                IsolationTree::build(values, &indices, 0, max_height, &mut rng)
            })
            .collect();

        let c_n = average_path_length(samples_per_tree).max(f64::MIN_POSITIVE);
        values
            .iter()
            .map(|&v| {
                let avg = trees.iter().map(|t| t.path_length(v, 0)).sum::<f64>() / trees.len() as f64;
                2.0_f64.powf(-avg / c_n)
            })
            .collect()
    }

    /// Flag the `floor(contamination * n)` highest-scoring values as
    /// anomalies. Returns one flag per value, `true` meaning normal.
    pub fn fit_predict(&self, values: &[f64]) -> Vec<bool> {
        let scores = self.score(values);
        let n_anomalies = (self.contamination * values.len() as f64).floor() as usize;

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let mut normal = vec![true; values.len()];
        for &i in order.iter().take(n_anomalies) {
            normal[i] = false;
        }
        normal
    }
}
