//! Outlier handling module.
//!
//! Bounds are learned per numeric column and out-of-bound values are clamped
//! to the nearest bound. Rows are never removed.

use crate::anomaly::IsolationForest;
use crate::config::OutlierStrategy;
use crate::types::ClampBounds;
use crate::utils::{is_numeric_dtype, mean, present_values, quantile_sorted, sorted, std_dev};
use anyhow::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Multiplier applied to the interquartile range.
const IQR_FACTOR: f64 = 1.5;

/// Number of standard deviations allowed by the z-score strategy.
const ZSCORE_THRESHOLD: f64 = 3.0;

/// Detects outliers in numeric columns and clamps them.
pub struct OutlierClamper {
    strategy: OutlierStrategy,
    seed: u64,
}

impl OutlierClamper {
    pub fn new(strategy: OutlierStrategy, seed: u64) -> Self {
        Self { strategy, seed }
    }

    /// Learn bounds for every numeric column, record them in `bounds`, and
    /// clamp `df`.
    pub fn fit_transform(
        &self,
        df: DataFrame,
        bounds: &mut BTreeMap<String, ClampBounds>,
    ) -> Result<DataFrame> {
        if self.strategy == OutlierStrategy::None {
            return Ok(df);
        }

        let mut df = df;
        let numeric: Vec<PlSmallStr> = df
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.name().clone())
            .collect();

        for name in numeric {
            let series = df.column(&name)?.as_materialized_series().clone();
            let values = present_values(&series)?;

            let Some(learned) = self.compute_bounds(&values) else {
                debug!("Not enough values in '{}' to learn outlier bounds", name);
                continue;
            };

            let clamped_count = values
                .iter()
                .filter(|&&v| v < learned.lower || v > learned.upper)
                .count();
            debug!(
                "'{}': bounds [{:.4}, {:.4}], clamping {} values",
                name, learned.lower, learned.upper, clamped_count
            );

            df.with_column(clamp_series(&series, &learned)?)?;
            bounds.insert(name.to_string(), learned);
        }

        Ok(df)
    }

    /// Clamp with previously learned bounds. Columns that are absent or no
    /// longer numeric are skipped.
    pub fn transform(df: DataFrame, bounds: &BTreeMap<String, ClampBounds>) -> Result<DataFrame> {
        let mut df = df;
        for (name, b) in bounds {
            let Ok(column) = df.column(name) else {
                continue;
            };
            if !is_numeric_dtype(column.dtype()) {
                continue;
            }
            let clamped = clamp_series(column.as_materialized_series(), b)?;
            df.with_column(clamped)?;
        }
        Ok(df)
    }

    /// Compute bounds for the present values of one column.
    pub fn compute_bounds(&self, values: &[f64]) -> Option<ClampBounds> {
        match self.strategy {
            OutlierStrategy::None => None,
            OutlierStrategy::Iqr => {
                let sorted = sorted(values);
                let q1 = quantile_sorted(&sorted, 0.25)?;
                let q3 = quantile_sorted(&sorted, 0.75)?;
                let iqr = q3 - q1;
                Some(ClampBounds::new(q1 - IQR_FACTOR * iqr, q3 + IQR_FACTOR * iqr))
            }
            OutlierStrategy::Zscore => {
                let m = mean(values)?;
                let sd = std_dev(values, 1)?;
                Some(ClampBounds::new(
                    m - ZSCORE_THRESHOLD * sd,
                    m + ZSCORE_THRESHOLD * sd,
                ))
            }
            OutlierStrategy::IsolationForest => {
                let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
                if finite.len() < 2 {
                    return None;
                }
                let normal = IsolationForest::new(self.seed).fit_predict(&finite);
                let (lower, upper) = finite
                    .iter()
                    .zip(&normal)
                    .filter(|(_, keep)| **keep)
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (&v, _)| {
                        (lo.min(v), hi.max(v))
                    });
                (lower <= upper).then(|| ClampBounds::new(lower, upper))
            }
        }
    }
}

/// Clamp a numeric series into `bounds`, keeping nulls. The result is Float64.
fn clamp_series(series: &Series, bounds: &ClampBounds) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let clamped = float_series
        .f64()?
        .apply(|v| v.map(|val| bounds.clamp(val)));
    Ok(clamped.into_series())
}
