//! Synthetic row generation.
//!
//! Three self-contained algorithms share the [`Synthesizer`] contract:
//! - [`NeighborSynthesizer`]: interpolates between same-class neighbors to
//!   balance a label column
//! - [`DensitySynthesizer`]: Gaussian mixture over standardized numeric
//!   columns, categorical columns resampled from the original rows
//! - [`IndependentSampler`]: every column sampled on its own
//!
//! [`Augmentor`] picks one from an [`AugmentationConfig`] and records what it
//! did. Every method returns the original rows first, followed by the
//! synthetic rows.

mod density;
mod gaussian_mixture;
mod independent;
mod neighbor;

pub use density::DensitySynthesizer;
pub use gaussian_mixture::GaussianMixture;
pub use independent::IndependentSampler;
pub use neighbor::NeighborSynthesizer;

use crate::config::{
    AugmentationAmount, AugmentationConfig, AugmentationMethod, AugmentationRequest, MethodKind,
    ResolvedAmount,
};
use crate::error::{Result, SynthError};
use crate::types::{AugmentationSummary, ProcessingWarning};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Common contract of the augmentation algorithms.
pub trait Synthesizer: Send {
    fn method(&self) -> MethodKind;

    /// Learn from `df` and return it followed by the synthetic rows.
    /// Degenerate inputs push a warning and return `df` unchanged.
    fn fit_transform(
        &mut self,
        df: &DataFrame,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<DataFrame>;

    /// Draw `n` synthetic rows from the fitted model without refitting.
    fn sample(&mut self, _n: usize) -> Result<DataFrame> {
        Err(SynthError::UnsupportedMethod(format!(
            "the {} method has no standalone generative model",
            self.method()
        )))
    }

    /// Method-specific parameters for the audit summary.
    fn extra_params(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }
}

/// Append `synthetic` below `df`. Both frames must share a schema.
pub(crate) fn append_rows(df: &DataFrame, synthetic: DataFrame) -> Result<DataFrame> {
    if synthetic.height() == 0 {
        return Ok(df.clone());
    }
    Ok(df.vstack(&synthetic)?)
}

/// Resolve the number of rows to add. A target at or below the current row
/// count adds nothing and is reported as degenerate. A ratio whose row count
/// does not fit in `usize` is an invalid parameter.
pub(crate) fn resolve_amount(
    amount: AugmentationAmount,
    current_rows: usize,
    stage: &str,
    warnings: &mut Vec<ProcessingWarning>,
) -> Result<ResolvedAmount> {
    let resolved = amount.resolve(current_rows);
    if let AugmentationAmount::Ratio(ratio) = amount {
        if current_rows as f64 * ratio >= usize::MAX as f64 {
            return Err(SynthError::invalid_parameter(
                "ratio",
                format!("{ratio} times {current_rows} rows is not a representable row count"),
            ));
        }
    }
    if let AugmentationAmount::TargetRows(target) = amount {
        if target <= current_rows {
            warn!(
                "{}: target of {} rows does not exceed the {} input rows",
                stage, target, current_rows
            );
            warnings.push(ProcessingWarning::degenerate(
                stage,
                format!("target_rows {target} does not exceed the {current_rows} input rows"),
            ));
        }
    }
    Ok(resolved)
}

/// Runs one augmentation method and keeps an audit trail of it.
///
/// # Example
///
/// ```rust,ignore
/// use lex_synth::{Augmentor, AugmentationConfig};
///
/// let config = AugmentationConfig::builder()
///     .method("independent")
///     .target_rows(500)
///     .build()?;
///
/// let mut augmentor = Augmentor::new(config)?;
/// let augmented = augmentor.fit_transform(&cleaned)?;
/// println!("{}", serde_json::to_string_pretty(&augmentor.summary())?);
/// ```
pub struct Augmentor {
    config: AugmentationConfig,
    synthesizer: Box<dyn Synthesizer>,
    warnings: Vec<ProcessingWarning>,
    fitted: bool,
    original_rows: usize,
    synthetic_rows: usize,
    /// Amount applied by the last fit.
    applied: ResolvedAmount,
}

static_assertions::assert_impl_all!(Augmentor: Send);

impl Augmentor {
    /// Validate `config` and prepare the selected method.
    pub fn new(config: AugmentationConfig) -> Result<Self> {
        config.validate()?;

        let synthesizer: Box<dyn Synthesizer> = match &config.method {
            AugmentationMethod::Neighbor {
                target_column,
                neighbor_count,
                sampling_strategy,
            } => Box::new(NeighborSynthesizer::new(
                target_column.clone(),
                *neighbor_count,
                *sampling_strategy,
                config.random_seed,
            )),
            AugmentationMethod::Density { amount } => {
                Box::new(DensitySynthesizer::new(*amount, config.random_seed))
            }
            AugmentationMethod::Independent { amount } => {
                Box::new(IndependentSampler::new(*amount, config.random_seed))
            }
        };

        Ok(Self {
            config,
            synthesizer,
            warnings: Vec::new(),
            fitted: false,
            original_rows: 0,
            synthetic_rows: 0,
            applied: ResolvedAmount::observed(0, 0),
        })
    }

    /// Build from the flat request form.
    pub fn from_request(request: AugmentationRequest) -> Result<Self> {
        Self::new(AugmentationConfig::try_from(request)?)
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Non-fatal conditions met during the last fit.
    pub fn warnings(&self) -> &[ProcessingWarning] {
        &self.warnings
    }

    /// Fit the configured method on `df` and return the augmented frame.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fitted = false;
        self.warnings.clear();

        info!(
            "Augmenting {} rows x {} columns with the {} method (seed {})",
            df.height(),
            df.width(),
            self.synthesizer.method(),
            self.config.random_seed
        );

        let out = match self.synthesizer.fit_transform(df, &mut self.warnings) {
            Ok(out) => out,
            Err(e) => {
                error!("Augmentation failed: {}", e);
                return Err(e);
            }
        };

        self.original_rows = df.height();
        self.synthetic_rows = out.height().saturating_sub(df.height());
        self.applied = self.applied_amount();
        self.fitted = true;

        info!(
            "Augmentation complete: {} original + {} synthetic = {} rows",
            self.original_rows,
            self.synthetic_rows,
            out.height()
        );
        Ok(out)
    }

    /// Draw `n` fresh synthetic rows from the fitted model.
    pub fn generate_samples(&mut self, n: usize) -> Result<DataFrame> {
        if !self.fitted {
            return Err(SynthError::NotFitted("Augmentor"));
        }
        self.synthesizer.sample(n)
    }

    /// The configured amount when the fit produced it, otherwise the amount
    /// observed in the output (degenerate pass-through, neighbor balancing).
    fn applied_amount(&self) -> ResolvedAmount {
        let observed = ResolvedAmount::observed(self.original_rows, self.synthetic_rows);
        match &self.config.method {
            AugmentationMethod::Density { amount } | AugmentationMethod::Independent { amount } => {
                let planned = amount.resolve(self.original_rows);
                if planned.num_new == self.synthetic_rows {
                    planned
                } else {
                    observed
                }
            }
            AugmentationMethod::Neighbor { .. } => observed,
        }
    }

    /// Effective parameters of the last fit.
    pub fn summary(&self) -> AugmentationSummary {
        let ResolvedAmount {
            ratio, target_rows, ..
        } = self.applied;

        let target_column = match &self.config.method {
            AugmentationMethod::Neighbor { target_column, .. } => Some(target_column.clone()),
            _ => None,
        };

        AugmentationSummary {
            method: self.synthesizer.method().to_string(),
            target_column,
            ratio,
            target_rows,
            random_seed: self.config.random_seed,
            original_rows: self.original_rows,
            synthetic_rows: self.synthetic_rows,
            total_rows: self.original_rows + self.synthetic_rows,
            additional_params: self.synthesizer.extra_params(),
        }
    }
}

/// One-shot augmentation of `df` with `config`.
pub fn augment(df: &DataFrame, config: &AugmentationConfig) -> Result<DataFrame> {
    Augmentor::new(config.clone())?.fit_transform(df)
}
