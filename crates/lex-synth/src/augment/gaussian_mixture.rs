//! Gaussian mixture with full covariance matrices, fitted by
//! expectation-maximization.

use crate::error::{Result, SynthError};
use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::StandardNormal;
use std::f64::consts::PI;
use tracing::debug;

/// Added to covariance diagonals to keep them positive definite.
const REG_COVAR: f64 = 1e-6;
const MAX_ITER: usize = 100;
/// Convergence threshold on the change of the mean log-likelihood.
const TOL: f64 = 1e-3;
const KMEANS_ITER: usize = 10;

/// A fitted Gaussian mixture.
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    weights: Array1<f64>,
    /// One row per component.
    means: Array2<f64>,
    /// Lower Cholesky factor of each component's covariance.
    cholesky: Vec<Array2<f64>>,
    converged: bool,
    n_iter: usize,
}

impl GaussianMixture {
    /// Fit `n_components` components to the rows of `data`.
    ///
    /// Components are initialised from a k-means++ seeded k-means
    /// clustering. Fails if `data` is empty or a covariance matrix stops
    /// being positive definite.
    pub fn fit(data: &Array2<f64>, n_components: usize, rng: &mut StdRng) -> Result<Self> {
        let n = data.nrows();
        if n == 0 {
            return Err(SynthError::Internal("cannot fit a mixture to zero rows".to_string()));
        }
        let k = n_components.clamp(1, n);

        let labels = kmeans_labels(data, k, rng);
        let mut resp: Array2<f64> = Array2::zeros((n, k));
        for (i, &label) in labels.iter().enumerate() {
            resp[[i, label]] = 1.0;
        }

        let mut model = Self::m_step(data, &resp)?;
        let mut prev_lower_bound = f64::NEG_INFINITY;

        for iter in 1..=MAX_ITER {
            let lower_bound = model.e_step(data, &mut resp);
            model = Self::m_step(data, &resp)?;
            model.n_iter = iter;

            if (lower_bound - prev_lower_bound).abs() < TOL {
                model.converged = true;
                break;
            }
            prev_lower_bound = lower_bound;
        }

        debug!(
            "Gaussian mixture: {} components, {} iterations, converged: {}",
            k, model.n_iter, model.converged
        );
        Ok(model)
    }

    pub fn n_components(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn means(&self) -> &Array2<f64> {
        &self.means
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Draw `n` samples, one per row.
    pub fn sample(&self, n: usize, rng: &mut StdRng) -> Result<Array2<f64>> {
        let chooser = WeightedIndex::new(self.weights.iter())
            .map_err(|e| SynthError::Internal(format!("invalid mixture weights: {e}")))?;

        let dim = self.means.ncols();
        let mut out: Array2<f64> = Array2::zeros((n, dim));
        for mut row in out.rows_mut() {
            let c = chooser.sample(rng);
            let z: Array1<f64> = Array1::from_shape_fn(dim, |_| rng.sample(StandardNormal));
            row.assign(&(&self.means.row(c) + &self.cholesky[c].dot(&z)));
        }
        Ok(out)
    }

    /// Mean log-likelihood of the rows of `data`.
    pub fn score(&self, data: &Array2<f64>) -> f64 {
        let mut resp: Array2<f64> = Array2::zeros((data.nrows(), self.n_components()));
        self.e_step(data, &mut resp)
    }

    /// Update responsibilities in place; returns the mean log-likelihood.
    fn e_step(&self, data: &Array2<f64>, resp: &mut Array2<f64>) -> f64 {
        let log_weights = self.weights.mapv(f64::ln);
        let mut total = 0.0;
        for (x, mut r) in data.rows().into_iter().zip(resp.rows_mut()) {
            for (c, slot) in r.iter_mut().enumerate() {
                *slot = log_weights[c] + log_gaussian(x, self.means.row(c), &self.cholesky[c]);
            }
            let max = r.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            let lse = max + r.mapv(|v| (v - max).exp()).sum().ln();
            r.mapv_inplace(|v| (v - lse).exp());
            total += lse;
        }
        total / data.nrows() as f64
    }

    fn m_step(data: &Array2<f64>, resp: &Array2<f64>) -> Result<Self> {
        let n = data.nrows();
        let nk = resp.sum_axis(Axis(0)) + 10.0 * f64::EPSILON;
        let means = resp.t().dot(data) / &nk.view().insert_axis(Axis(1));

        let mut cholesky = Vec::with_capacity(nk.len());
        for (c, mean) in means.rows().into_iter().enumerate() {
            let diff = data - &mean;
            let weighted = &diff * &resp.column(c).insert_axis(Axis(1));
            let mut cov = weighted.t().dot(&diff) / nk[c];
            cov.diag_mut().mapv_inplace(|v| v + REG_COVAR);

            let l = cholesky_lower(&cov).ok_or_else(|| {
                SynthError::Internal(format!(
                    "covariance of mixture component {c} is not positive definite"
                ))
            })?;
            cholesky.push(l);
        }

        Ok(Self {
            weights: nk / n as f64,
            means,
            cholesky,
            converged: false,
            n_iter: 0,
        })
    }
}

/// Log density of `x` under N(mean, L L^T).
fn log_gaussian(x: ArrayView1<f64>, mean: ArrayView1<f64>, l: &Array2<f64>) -> f64 {
    let d = x.len();
    let y = solve_lower_triangular(l, &(&x - &mean));
    let log_det = 2.0 * l.diag().mapv(f64::ln).sum();
    -0.5 * (d as f64 * (2.0 * PI).ln() + log_det + y.dot(&y))
}

/// Solve L @ y = b by forward substitution.
fn solve_lower_triangular(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut y: Array1<f64> = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[[i, j]] * y[j];
        }
        y[i] = sum / l[[i, i]];
    }
    y
}

/// Lower Cholesky factor of a symmetric matrix, or `None` if it is not
/// positive definite.
fn cholesky_lower(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l: Array2<f64> = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            let v = a[[i, j]] - sum;
            if i == j {
                if v <= 0.0 || !v.is_finite() {
                    return None;
                }
                l[[j, j]] = v.sqrt();
            } else {
                l[[i, j]] = v / l[[j, j]];
            }
        }
    }
    Some(l)
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    (&a - &b).mapv(|v| v * v).sum()
}

/// Cluster labels from k-means with k-means++ seeding.
fn kmeans_labels(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = data.nrows();
    let mut centroids: Array2<f64> = Array2::zeros((k, data.ncols()));
    centroids.row_mut(0).assign(&data.row(rng.gen_range(0..n)));

    for c in 1..k {
        let seeded = centroids.slice(s![..c, ..]);
        let dists: Vec<f64> = data
            .rows()
            .into_iter()
            .map(|x| {
                seeded
                    .rows()
                    .into_iter()
                    .map(|m| squared_distance(x, m))
                    .fold(f64::MAX, f64::min)
            })
            .collect();
        let chosen = match WeightedIndex::new(&dists) {
            Ok(dist) => dist.sample(rng),
            // All points coincide with a centroid.
            Err(_) => rng.gen_range(0..n),
        };
        centroids.row_mut(c).assign(&data.row(chosen));
    }

    let mut labels = vec![0; n];
    for _ in 0..KMEANS_ITER {
        let mut changed = false;
        for (x, label) in data.rows().into_iter().zip(labels.iter_mut()) {
            let nearest = centroids
                .rows()
                .into_iter()
                .enumerate()
                .map(|(c, centroid)| (c, squared_distance(x, centroid)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map_or(0, |(c, _)| c);
            if nearest != *label {
                *label = nearest;
                changed = true;
            }
        }

        for (c, mut centroid) in centroids.rows_mut().into_iter().enumerate() {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == c)
                .map(|(i, _)| i)
                .collect();
            if let Some(m) = data.select(Axis(0), &members).mean_axis(Axis(0)) {
                centroid.assign(&m);
            }
        }

        if !changed {
            break;
        }
    }
    labels
}
