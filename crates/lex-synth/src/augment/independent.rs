//! Independent per-column sampling.
//!
//! Each column is summarized on its own (normal parameters and range for
//! numeric columns, observed frequencies for the rest) and sampled on its
//! own. Correlations between columns are not preserved.

use crate::augment::{Synthesizer, append_rows, resolve_amount};
use crate::config::{AugmentationAmount, MethodKind};
use crate::error::{Result, SynthError};
use crate::types::ProcessingWarning;
use crate::utils::{
    is_numeric_dtype, mean, numeric_series_like, present_values, std_dev, take_rows,
    value_counts_first_seen,
};
use polars::prelude::*;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::Normal;
use tracing::{debug, info, warn};

const STAGE: &str = "independent augmentation";

#[derive(Debug, Clone)]
enum ColumnModel {
    Numeric {
        normal: Normal<f64>,
        min: f64,
        max: f64,
    },
    /// Rows holding each observed value, weighted by frequency.
    Categorical {
        rows: Vec<usize>,
        weights: WeightedIndex<usize>,
    },
    /// No value was observed.
    Empty,
}

impl ColumnModel {
    fn fit(series: &Series, warnings: &mut Vec<ProcessingWarning>) -> Result<Self> {
        if !is_numeric_dtype(series.dtype()) {
            return Self::observed(series);
        }

        let present = present_values(series)?;
        let values: Vec<f64> = present.iter().copied().filter(|v| v.is_finite()).collect();
        if values.len() < present.len() {
            let reason = format!(
                "column '{}': {} non-finite values left out of the fit",
                series.name(),
                present.len() - values.len()
            );
            warn!("{}", reason);
            warnings.push(ProcessingWarning::degenerate(STAGE, reason));
        }

        let Some(m) = mean(&values) else {
            return Ok(ColumnModel::Empty);
        };
        let sd = std_dev(&values, 1).unwrap_or(0.0);
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        match Normal::new(m, sd) {
            Ok(normal) if m.is_finite() && sd.is_finite() => {
                Ok(ColumnModel::Numeric { normal, min, max })
            }
            _ => {
                let reason = format!(
                    "column '{}': mean or spread is not finite; observed values are resampled",
                    series.name()
                );
                warn!("{}", reason);
                warnings.push(ProcessingWarning::degenerate(STAGE, reason));
                Self::observed(series)
            }
        }
    }

    /// Resample the observed values by frequency.
    fn observed(series: &Series) -> Result<Self> {
        let counts = value_counts_first_seen(series)?;
        if counts.is_empty() {
            return Ok(ColumnModel::Empty);
        }
        let weights = WeightedIndex::new(counts.iter().map(|&(_, c)| c)).map_err(|e| {
            SynthError::Internal(format!("column '{}': {e}", series.name()))
        })?;
        Ok(ColumnModel::Categorical {
            rows: counts.into_iter().map(|(row, _)| row).collect(),
            weights,
        })
    }
}

#[derive(Debug)]
struct FittedColumns {
    models: Vec<ColumnModel>,
    source: DataFrame,
}

/// Samples every column independently from its own marginal distribution.
pub struct IndependentSampler {
    amount: AugmentationAmount,
    rng: StdRng,
    fitted: Option<FittedColumns>,
}

impl IndependentSampler {
    pub fn new(amount: AugmentationAmount, seed: u64) -> Self {
        Self {
            amount,
            rng: StdRng::seed_from_u64(seed),
            fitted: None,
        }
    }

    fn draw(&mut self, n: usize) -> Result<DataFrame> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(SynthError::NotFitted("IndependentSampler"))?;

        let mut columns = Vec::with_capacity(fitted.source.width());
        for (column, model) in fitted.source.get_columns().iter().zip(&fitted.models) {
            let series = column.as_materialized_series();
            let out = match model {
                ColumnModel::Numeric { normal, min, max } => {
                    let values = (0..n)
                        .map(|_| Some(normal.sample(&mut self.rng).clamp(*min, *max)))
                        .collect();
                    numeric_series_like(series.name().clone(), values, series.dtype())?
                }
                ColumnModel::Categorical { rows, weights } => {
                    let picks: Vec<usize> =
                        (0..n).map(|_| rows[weights.sample(&mut self.rng)]).collect();
                    take_rows(series, &picks)?
                }
                ColumnModel::Empty => Series::full_null(series.name().clone(), n, series.dtype()),
            };
            columns.push(out.into_column());
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl Synthesizer for IndependentSampler {
    fn method(&self) -> MethodKind {
        MethodKind::Independent
    }

    fn fit_transform(
        &mut self,
        df: &DataFrame,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<DataFrame> {
        self.fitted = None;
        if df.height() == 0 {
            warn!("Independent augmentation skipped: the dataset has no rows");
            warnings.push(ProcessingWarning::degenerate(STAGE, "the dataset has no rows"));
            return Ok(df.clone());
        }
        let resolved = resolve_amount(self.amount, df.height(), STAGE, warnings)?;

        let models = df
            .get_columns()
            .iter()
            .map(|c| ColumnModel::fit(c.as_materialized_series(), warnings))
            .collect::<Result<Vec<_>>>()?;
        debug!("Summarized {} columns", models.len());

        self.fitted = Some(FittedColumns {
            models,
            source: df.clone(),
        });

        let synthetic = self.draw(resolved.num_new)?;
        info!("Independent augmentation: {} synthetic rows", synthetic.height());
        append_rows(df, synthetic)
    }

    fn sample(&mut self, n: usize) -> Result<DataFrame> {
        self.draw(n)
    }
}
