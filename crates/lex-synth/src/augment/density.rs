//! Density-based augmentation.
//!
//! Numeric columns are standardized and modelled jointly by a Gaussian
//! mixture. Non-numeric columns are resampled together from the original
//! rows, independently of the numeric draw.

use crate::augment::gaussian_mixture::GaussianMixture;
use crate::augment::{Synthesizer, append_rows, resolve_amount};
use crate::config::{AugmentationAmount, MethodKind};
use crate::error::{Result, SynthError};
use crate::types::ProcessingWarning;
use crate::utils::{numeric_column_names, numeric_series_like, numeric_values, take_rows};
use ndarray::{Array2, Axis};
use polars::prelude::*;
use rand::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const STAGE: &str = "density augmentation";

/// Upper limit on mixture components.
const MAX_COMPONENTS: usize = 5;

/// Rows per mixture component.
const ROWS_PER_COMPONENT: usize = 10;

/// Standardization of one numeric column.
#[derive(Debug, Clone)]
struct Standardizer {
    name: PlSmallStr,
    dtype: DataType,
    mean: f64,
    scale: f64,
}

#[derive(Debug)]
struct FittedDensity {
    mixture: GaussianMixture,
    numeric: Vec<Standardizer>,
    source: DataFrame,
}

/// Gaussian mixture synthesizer.
pub struct DensitySynthesizer {
    amount: AugmentationAmount,
    rng: StdRng,
    fitted: Option<FittedDensity>,
}

impl DensitySynthesizer {
    pub fn new(amount: AugmentationAmount, seed: u64) -> Self {
        Self {
            amount,
            rng: StdRng::seed_from_u64(seed),
            fitted: None,
        }
    }

    /// Component count for `rows` complete rows: `rows / 10`, between 1 and 5.
    pub fn component_count(rows: usize) -> usize {
        (rows / ROWS_PER_COMPONENT).clamp(1, MAX_COMPONENTS)
    }

    /// Fitted mixture, if any.
    pub fn mixture(&self) -> Option<&GaussianMixture> {
        self.fitted.as_ref().map(|f| &f.mixture)
    }

    /// Fit the mixture. Returns `None` after recording a degenerate warning
    /// when there is nothing to fit.
    fn fit(
        &mut self,
        df: &DataFrame,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<Option<FittedDensity>> {
        let skip = |reason: String,
                    warnings: &mut Vec<ProcessingWarning>|
         -> Result<Option<FittedDensity>> {
            warn!("Density augmentation skipped: {}", reason);
            warnings.push(ProcessingWarning::degenerate(STAGE, reason));
            Ok(None)
        };

        if df.height() == 0 {
            return skip("the dataset has no rows".to_string(), warnings);
        }
        let names = numeric_column_names(df);
        if names.is_empty() {
            return skip("the dataset has no numeric columns".to_string(), warnings);
        }

        let columns: Vec<Vec<Option<f64>>> = names
            .iter()
            .map(|name| numeric_values(df.column(name)?.as_materialized_series()))
            .collect::<PolarsResult<_>>()?;

        // Rows with a missing or non-finite numeric value stay out of the fit.
        let mut flat = Vec::with_capacity(df.height() * names.len());
        let mut complete_rows = 0;
        for row in 0..df.height() {
            let values: Option<Vec<f64>> = columns
                .iter()
                .map(|c| c[row].filter(|v| v.is_finite()))
                .collect();
            if let Some(values) = values {
                flat.extend(values);
                complete_rows += 1;
            }
        }
        if complete_rows == 0 {
            return skip("no row has every numeric value present".to_string(), warnings);
        }
        if complete_rows < df.height() {
            debug!(
                "{} rows with missing numeric values excluded from the mixture fit",
                df.height() - complete_rows
            );
        }
        let data = Array2::from_shape_vec((complete_rows, names.len()), flat)
            .map_err(|e| SynthError::Internal(format!("numeric matrix: {e}")))?;

        let means = data
            .mean_axis(Axis(0))
            .ok_or_else(|| SynthError::Internal("numeric matrix has no rows".to_string()))?;
        let scales = data
            .std_axis(Axis(0), 0.0)
            .mapv(|sd| if sd > 0.0 && sd.is_finite() { sd } else { 1.0 });
        let standardized = (&data - &means) / &scales;

        let mut numeric = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let column = df.column(name)?;
            numeric.push(Standardizer {
                name: column.name().clone(),
                dtype: column.dtype().clone(),
                mean: means[i],
                scale: scales[i],
            });
        }

        let k = Self::component_count(standardized.nrows());
        let mixture = match GaussianMixture::fit(&standardized, k, &mut self.rng) {
            Ok(m) => m,
            Err(e) => return skip(format!("mixture fit failed: {e}"), warnings),
        };
        debug!(
            "Fitted {} components on {} rows x {} numeric columns",
            mixture.n_components(),
            standardized.nrows(),
            numeric.len()
        );

        Ok(Some(FittedDensity {
            mixture,
            numeric,
            source: df.clone(),
        }))
    }

    fn draw(&mut self, n: usize) -> Result<DataFrame> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(SynthError::NotFitted("DensitySynthesizer"))?;

        let points = fitted.mixture.sample(n, &mut self.rng)?;
        let source_rows = fitted.source.height();
        let rows: Vec<usize> = (0..n).map(|_| self.rng.gen_range(0..source_rows)).collect();

        let mut columns = Vec::with_capacity(fitted.source.width());
        for column in fitted.source.get_columns() {
            let out = match fitted.numeric.iter().position(|s| s.name == *column.name()) {
                Some(i) => {
                    let s = &fitted.numeric[i];
                    let values = points
                        .column(i)
                        .iter()
                        .map(|v| Some(v * s.scale + s.mean))
                        .collect();
                    numeric_series_like(s.name.clone(), values, &s.dtype)?
                }
                None => take_rows(column.as_materialized_series(), &rows)?,
            };
            columns.push(out.into_column());
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl Synthesizer for DensitySynthesizer {
    fn method(&self) -> MethodKind {
        MethodKind::Density
    }

    fn fit_transform(
        &mut self,
        df: &DataFrame,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<DataFrame> {
        self.fitted = None;
        let resolved = resolve_amount(self.amount, df.height(), STAGE, warnings)?;

        self.fitted = self.fit(df, warnings)?;
        if self.fitted.is_none() {
            return Ok(df.clone());
        }

        let synthetic = self.draw(resolved.num_new)?;
        info!("Density augmentation: {} synthetic rows", synthetic.height());
        append_rows(df, synthetic)
    }

    fn sample(&mut self, n: usize) -> Result<DataFrame> {
        self.draw(n)
    }

    fn extra_params(&self) -> BTreeMap<String, serde_json::Value> {
        let mut params = BTreeMap::new();
        if let Some(fitted) = &self.fitted {
            params.insert(
                "n_components".to_string(),
                fitted.mixture.n_components().into(),
            );
            params.insert(
                "numeric_columns".to_string(),
                fitted
                    .numeric
                    .iter()
                    .map(|s| s.name.to_string())
                    .collect::<Vec<_>>()
                    .into(),
            );
        }
        params
    }
}
