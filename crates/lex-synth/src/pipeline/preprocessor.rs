//! Fit/transform orchestration of coercion, imputation and outlier clamping.

use crate::cleaner::TypeCoercer;
use crate::config::PreprocessConfig;
use crate::error::{Result, SynthError};
use crate::imputers::MissingValueImputer;
use crate::pipeline::outliers::OutlierClamper;
use crate::types::{
    FitState, PreprocessingSummary, ProcessingWarning, SemanticType, effective_column_types,
};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Cleans a dataset and remembers what it learned so the same cleaning can
/// be reapplied to new data with the same schema.
///
/// One instance serves one request: fit once with
/// [`Preprocessor::fit_transform`], then optionally call
/// [`Preprocessor::transform`] any number of times.
///
/// # Example
///
/// ```rust,ignore
/// use lex_synth::{Preprocessor, PreprocessConfig, MissingStrategy, OutlierStrategy};
///
/// let config = PreprocessConfig::builder()
///     .missing_strategy(MissingStrategy::Median)
///     .outlier_strategy(OutlierStrategy::Iqr)
///     .build()?;
///
/// let mut preprocessor = Preprocessor::new(config);
/// let cleaned = preprocessor.fit_transform(&raw)?;
/// let cleaned_later = preprocessor.transform(&new_batch)?;
/// ```
#[derive(Debug)]
pub struct Preprocessor {
    config: PreprocessConfig,
    state: Option<FitState>,
    warnings: Vec<ProcessingWarning>,
    rows_before: usize,
    rows_after: usize,
    column_types: BTreeMap<String, SemanticType>,
}

static_assertions::assert_impl_all!(Preprocessor: Send);

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            state: None,
            warnings: Vec::new(),
            rows_before: 0,
            rows_after: 0,
            column_types: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Learned artifacts, if the instance has been fitted.
    pub fn fit_state(&self) -> Option<&FitState> {
        self.state.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Non-fatal conditions met during the fit.
    pub fn warnings(&self) -> &[ProcessingWarning] {
        &self.warnings
    }

    /// Coerce types, handle missing values, then clamp outliers, learning
    /// fill values and bounds along the way.
    ///
    /// On failure the instance is left unfitted.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.state = None;
        self.warnings.clear();

        match self.run_fit(df) {
            Ok((out, state)) => {
                self.rows_before = df.height();
                self.rows_after = out.height();
                self.column_types = effective_column_types(&out, &self.config.column_types);
                self.state = Some(state);
                info!(
                    "Preprocessing complete: {} -> {} rows, {} fill values, {} clamp bounds",
                    self.rows_before,
                    self.rows_after,
                    self.state.as_ref().map_or(0, |s| s.fill_values.len()),
                    self.state.as_ref().map_or(0, |s| s.clamp_bounds.len()),
                );
                Ok(out)
            }
            Err(e) => {
                error!("Preprocessing failed: {}", e);
                Err(e)
            }
        }
    }

    fn run_fit(&mut self, df: &DataFrame) -> Result<(DataFrame, FitState)> {
        let mut state = FitState::default();

        info!(
            "Preprocessing {} rows x {} columns (missing: {}, outliers: {})",
            df.height(),
            df.width(),
            self.config.missing_strategy.as_str(),
            self.config.outlier_strategy.as_str()
        );

        let out = TypeCoercer
            .coerce(df.clone(), &self.config.column_types, &mut self.warnings)
            .map_err(|e| stage_error("type coercion", e))?;

        let out = MissingValueImputer::new(self.config.missing_strategy)
            .fit_transform(out, &mut state.fill_values)
            .map_err(|e| stage_error("missing value handling", e))?;

        let out = OutlierClamper::new(self.config.outlier_strategy, self.config.random_seed)
            .fit_transform(out, &mut state.clamp_bounds)
            .map_err(|e| stage_error("outlier handling", e))?;

        Ok((out, state))
    }

    /// Reapply the fitted cleaning to `df`: coerce types, fill gaps with the
    /// stored fill values, clamp with the stored bounds.
    ///
    /// Conditions that would be warnings during fit are logged.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let state = self.state.as_ref().ok_or(SynthError::NotFitted("Preprocessor"))?;
        let mut warnings = Vec::new();

        let out = TypeCoercer
            .coerce(df.clone(), &self.config.column_types, &mut warnings)
            .map_err(|e| stage_error("type coercion", e))?;
        let out = MissingValueImputer::transform(out, &state.fill_values, &mut warnings)
            .map_err(|e| stage_error("missing value handling", e))?;
        let out = OutlierClamper::transform(out, &state.clamp_bounds)
            .map_err(|e| stage_error("outlier handling", e))?;

        for w in &warnings {
            warn!("transform: {}", w);
        }
        Ok(out)
    }

    /// Summary of the strategies used and the learned artifacts.
    pub fn summary(&self) -> PreprocessingSummary {
        let state = self.state.clone().unwrap_or_default();
        PreprocessingSummary {
            missing_strategy: self.config.missing_strategy,
            outlier_strategy: self.config.outlier_strategy,
            column_types: self.column_types.clone(),
            fill_values: state.fill_values,
            clamp_bounds: state.clamp_bounds,
            rows_before: self.rows_before,
            rows_after: self.rows_after,
            warnings: self.warnings.clone(),
        }
    }
}

/// Polars failures inside a stage surface as typed errors; anything else
/// is an internal error.
fn stage_error(stage: &str, err: anyhow::Error) -> SynthError {
    match err.downcast::<PolarsError>() {
        Ok(polars_err) => SynthError::Polars(polars_err).with_context(stage),
        Err(other) => SynthError::Internal(format!("{stage}: {other:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MissingStrategy, OutlierStrategy};
    use crate::types::{ClampBounds, FillValue};
    use pretty_assertions::assert_eq;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_fit_transform_runs_all_stages() {
        let df = df!(
            "amount" => ["1", "2", "bad", "4", "100"],
            "city" => [Some("a"), None, Some("a"), Some("b"), Some("a")]
        )
        .unwrap();
        let config = PreprocessConfig::builder()
            .column_type("amount", SemanticType::Numeric)
            .missing_strategy(MissingStrategy::Median)
            .outlier_strategy(OutlierStrategy::Iqr)
            .build()
            .unwrap();

        let mut pre = Preprocessor::new(config);
        let out = pre.fit_transform(&df).unwrap();

        // median of [1, 2, 4, 100] = 3; IQR of [1, 2, 3, 4, 100] -> upper 7
        assert_eq!(
            f64_values(&out, "amount"),
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(7.0)]
        );
        assert_eq!(out.column("city").unwrap().null_count(), 0);

        let state = pre.fit_state().unwrap();
        assert_eq!(state.fill_values["amount"], FillValue::Number(3.0));
        assert_eq!(state.fill_values["city"], FillValue::Text("a".to_string()));
        assert_eq!(state.clamp_bounds["amount"], ClampBounds::new(-1.0, 7.0));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let pre = Preprocessor::new(PreprocessConfig::default());
        let err = pre.transform(&df!("x" => [1.0]).unwrap()).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FITTED");
    }

    #[test]
    fn test_unknown_declared_column_is_soft() {
        let config = PreprocessConfig::builder()
            .column_type("ghost", SemanticType::Datetime)
            .build()
            .unwrap();
        let mut pre = Preprocessor::new(config);
        let out = pre.fit_transform(&df!("x" => [1.0, 2.0]).unwrap()).unwrap();

        assert_eq!(out.height(), 2);
        assert_eq!(pre.warnings().len(), 1);
        assert!(matches!(
            &pre.warnings()[0],
            ProcessingWarning::MissingColumn { column, .. } if column == "ghost"
        ));
    }

    #[test]
    fn test_drop_then_clamp() {
        let df = df!("x" => [Some(1.0), None, Some(2.0), Some(3.0), Some(4.0), Some(100.0)]).unwrap();
        let config = PreprocessConfig::builder()
            .missing_strategy(MissingStrategy::Drop)
            .outlier_strategy(OutlierStrategy::Iqr)
            .build()
            .unwrap();
        let mut pre = Preprocessor::new(config);
        let out = pre.fit_transform(&df).unwrap();

        assert_eq!(out.height(), 5);
        assert_eq!(f64_values(&out, "x")[4], Some(7.0));
        let summary = pre.summary();
        assert_eq!(summary.rows_before, 6);
        assert_eq!(summary.rows_after, 5);
        assert!(summary.fill_values.is_empty());
    }

    #[test]
    fn test_summary_serializes() {
        let mut pre = Preprocessor::new(PreprocessConfig::default());
        pre.fit_transform(&df!("x" => [Some(1.0), None, Some(3.0)]).unwrap())
            .unwrap();
        let json = serde_json::to_value(pre.summary()).unwrap();
        assert_eq!(json["missing_strategy"], "mean");
        assert_eq!(json["outlier_strategy"], "none");
        assert_eq!(json["fill_values"]["x"]["value"], 2.0);
        assert_eq!(json["column_types"]["x"], "numeric");
    }
}
