//! Configuration types for preprocessing and augmentation.
//!
//! Both configurations use the builder pattern and are validated when built,
//! so an invalid combination never reaches a fit. The augmentation method is a
//! sum type: each variant carries exactly the settings its algorithm needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::SynthError;
use crate::types::{ColumnTypeMap, SemanticType};

/// Seed used when none is configured.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default neighbor count for the neighbor method.
pub const DEFAULT_NEIGHBOR_COUNT: usize = 5;

// ============================================================================
// Preprocessing
// ============================================================================

/// Strategy for handling missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Fill numeric columns with their mean (mode for non-numeric columns)
    #[default]
    Mean,
    /// Fill numeric columns with their median (mode for non-numeric columns)
    Median,
    /// Fill every column with its most frequent value
    Mode,
    /// Drop every row that has at least one missing value
    Drop,
    /// Linear interpolation by position for numeric columns (mode otherwise)
    Interpolate,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingStrategy::Mean => "mean",
            MissingStrategy::Median => "median",
            MissingStrategy::Mode => "mode",
            MissingStrategy::Drop => "drop",
            MissingStrategy::Interpolate => "interpolate",
        }
    }
}

/// Strategy for handling outliers in numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierStrategy {
    /// Keep outliers as-is
    #[default]
    None,
    /// Clamp to [Q1 - 1.5*IQR, Q3 + 1.5*IQR]
    Iqr,
    /// Clamp to mean +/- 3 standard deviations
    Zscore,
    /// Clamp to the range of values an isolation forest considers normal
    IsolationForest,
}

impl OutlierStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierStrategy::None => "none",
            OutlierStrategy::Iqr => "iqr",
            OutlierStrategy::Zscore => "zscore",
            OutlierStrategy::IsolationForest => "isolation_forest",
        }
    }
}

/// Configuration for the [`crate::Preprocessor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Default: Mean
    #[serde(default)]
    pub missing_strategy: MissingStrategy,

    /// Default: None
    #[serde(default)]
    pub outlier_strategy: OutlierStrategy,

    /// Declared semantic types. Columns not listed keep their storage type.
    #[serde(default)]
    pub column_types: ColumnTypeMap,

    /// Seed for randomized outlier detection.
    /// Default: 42
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

fn default_seed() -> u64 {
    DEFAULT_RANDOM_SEED
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            missing_strategy: MissingStrategy::default(),
            outlier_strategy: OutlierStrategy::default(),
            column_types: ColumnTypeMap::new(),
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl PreprocessConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.column_types.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyColumnName);
        }
        Ok(())
    }
}

/// Builder for [`PreprocessConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PreprocessConfigBuilder {
    missing_strategy: Option<MissingStrategy>,
    outlier_strategy: Option<OutlierStrategy>,
    column_types: ColumnTypeMap,
    random_seed: Option<u64>,
}

impl PreprocessConfigBuilder {
    pub fn missing_strategy(mut self, strategy: MissingStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    pub fn outlier_strategy(mut self, strategy: OutlierStrategy) -> Self {
        self.outlier_strategy = Some(strategy);
        self
    }

    /// Declare the semantic type of one column.
    pub fn column_type(mut self, column: impl Into<String>, ty: SemanticType) -> Self {
        self.column_types.insert(column.into(), ty);
        self
    }

    /// Replace all declared column types.
    pub fn column_types(mut self, types: ColumnTypeMap) -> Self {
        self.column_types = types;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<PreprocessConfig, ConfigValidationError> {
        let config = PreprocessConfig {
            missing_strategy: self.missing_strategy.unwrap_or_default(),
            outlier_strategy: self.outlier_strategy.unwrap_or_default(),
            column_types: self.column_types,
            random_seed: self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED),
        };

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Augmentation
// ============================================================================

/// Names of the three augmentation algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Neighbor,
    Density,
    Independent,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Neighbor => "neighbor",
            MethodKind::Density => "density",
            MethodKind::Independent => "independent",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses method names. The legacy names `smote`, `gaussian_copula` and
/// `bayesian_network` are accepted as aliases; the last one never built a
/// network and maps to independent per-column sampling.
impl FromStr for MethodKind {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neighbor" | "smote" => Ok(MethodKind::Neighbor),
            "density" | "gaussian_copula" => Ok(MethodKind::Density),
            "independent" | "bayesian_network" => Ok(MethodKind::Independent),
            _ => Err(ConfigValidationError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Which classes the neighbor method oversamples. Every selected class is
/// raised to the majority class count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Balance every class to the majority count
    #[default]
    Auto,
    /// Oversample only the smallest class
    Minority,
    /// Oversample every class except the majority
    NotMajority,
    /// Oversample every class
    All,
}

impl SamplingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingStrategy::Auto => "auto",
            SamplingStrategy::Minority => "minority",
            SamplingStrategy::NotMajority => "not_majority",
            SamplingStrategy::All => "all",
        }
    }
}

impl FromStr for SamplingStrategy {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "auto" => Ok(SamplingStrategy::Auto),
            "minority" => Ok(SamplingStrategy::Minority),
            "not_majority" => Ok(SamplingStrategy::NotMajority),
            "all" => Ok(SamplingStrategy::All),
            _ => Err(ConfigValidationError::UnknownSamplingStrategy(s.to_string())),
        }
    }
}

/// How many synthetic rows the density and independent methods produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentationAmount {
    /// Synthetic rows relative to the original row count.
    Ratio(f64),
    /// Total rows wanted after augmentation.
    TargetRows(usize),
}

/// An [`AugmentationAmount`] resolved against a concrete row count. The
/// parameter that was not given is derived from the one that was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedAmount {
    pub num_new: usize,
    pub ratio: f64,
    pub target_rows: usize,
}

impl ResolvedAmount {
    /// The amount a fit actually produced: `synthetic` rows on top of
    /// `original`.
    pub fn observed(original: usize, synthetic: usize) -> Self {
        let ratio = if original == 0 {
            0.0
        } else {
            synthetic as f64 / original as f64
        };
        Self {
            num_new: synthetic,
            ratio,
            target_rows: original + synthetic,
        }
    }
}

impl AugmentationAmount {
    pub fn resolve(&self, current_rows: usize) -> ResolvedAmount {
        match *self {
            AugmentationAmount::Ratio(ratio) => {
                // `as` saturates at usize::MAX for huge products.
                let num_new = (current_rows as f64 * ratio).round().max(0.0) as usize;
                ResolvedAmount {
                    num_new,
                    ratio,
                    target_rows: current_rows.saturating_add(num_new),
                }
            }
            AugmentationAmount::TargetRows(target) => {
                let num_new = target.saturating_sub(current_rows);
                let ratio = if current_rows == 0 {
                    0.0
                } else {
                    num_new as f64 / current_rows as f64
                };
                ResolvedAmount {
                    num_new,
                    ratio,
                    target_rows: current_rows + num_new,
                }
            }
        }
    }
}

/// The augmentation algorithm and the settings it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AugmentationMethod {
    /// Nearest-neighbor interpolation inside each class of a label column.
    Neighbor {
        target_column: String,
        neighbor_count: usize,
        sampling_strategy: SamplingStrategy,
    },
    /// Gaussian mixture over standardized numeric columns.
    Density { amount: AugmentationAmount },
    /// Independent per-column sampling.
    Independent { amount: AugmentationAmount },
}

impl AugmentationMethod {
    pub fn kind(&self) -> MethodKind {
        match self {
            AugmentationMethod::Neighbor { .. } => MethodKind::Neighbor,
            AugmentationMethod::Density { .. } => MethodKind::Density,
            AugmentationMethod::Independent { .. } => MethodKind::Independent,
        }
    }
}

/// Configuration for the [`crate::Augmentor`].
///
/// # Example
///
/// ```rust,ignore
/// use lex_synth::AugmentationConfig;
///
/// let config = AugmentationConfig::builder()
///     .method("density")
///     .ratio(0.5)
///     .random_seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    #[serde(flatten)]
    pub method: AugmentationMethod,

    /// Default: 42
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

impl AugmentationConfig {
    pub fn builder() -> AugmentationConfigBuilder {
        AugmentationConfigBuilder::default()
    }

    /// Validate settings that can be checked without data.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        match &self.method {
            AugmentationMethod::Neighbor {
                target_column,
                neighbor_count,
                ..
            } => {
                if target_column.trim().is_empty() {
                    return Err(ConfigValidationError::MissingTargetColumn);
                }
                if *neighbor_count == 0 {
                    return Err(ConfigValidationError::InvalidNeighborCount(*neighbor_count));
                }
            }
            AugmentationMethod::Density { amount } | AugmentationMethod::Independent { amount } => {
                match *amount {
                    AugmentationAmount::Ratio(r) if !r.is_finite() || r < 0.0 => {
                        return Err(ConfigValidationError::InvalidRatio(r));
                    }
                    AugmentationAmount::TargetRows(0) => {
                        return Err(ConfigValidationError::InvalidTargetRows(0));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Unsupported augmentation method '{0}' (expected neighbor, density or independent)")]
    UnsupportedMethod(String),

    #[error("The neighbor method requires a target column")]
    MissingTargetColumn,

    #[error("Specify exactly one of ratio or target_rows, not both")]
    AmountConflict,

    #[error("Specify one of ratio or target_rows")]
    AmountMissing,

    #[error("Invalid augmentation ratio: {0} (must be a finite number >= 0)")]
    InvalidRatio(f64),

    #[error("Invalid target row count: {0} (must be at least 1)")]
    InvalidTargetRows(usize),

    #[error("Invalid neighbor count: {0} (must be at least 1)")]
    InvalidNeighborCount(usize),

    #[error("Unknown sampling strategy '{0}' (expected auto, minority, not_majority or all)")]
    UnknownSamplingStrategy(String),

    #[error("Column names in column_types must not be empty")]
    EmptyColumnName,
}

impl From<ConfigValidationError> for SynthError {
    fn from(err: ConfigValidationError) -> Self {
        let message = err.to_string();
        match err {
            ConfigValidationError::UnsupportedMethod(_) => SynthError::UnsupportedMethod(message),
            ConfigValidationError::MissingTargetColumn => SynthError::MissingConfig(message),
            ConfigValidationError::InvalidRatio(_) => SynthError::invalid_parameter("ratio", message),
            ConfigValidationError::InvalidTargetRows(_) => {
                SynthError::invalid_parameter("target_rows", message)
            }
            ConfigValidationError::InvalidNeighborCount(_) => {
                SynthError::invalid_parameter("neighbor_count", message)
            }
            ConfigValidationError::AmountConflict
            | ConfigValidationError::AmountMissing
            | ConfigValidationError::UnknownSamplingStrategy(_)
            | ConfigValidationError::EmptyColumnName => SynthError::InvalidConfig(message),
        }
    }
}

/// Builder for [`AugmentationConfig`] with fluent API.
///
/// Settings that do not apply to the selected method are ignored.
#[derive(Debug, Default)]
pub struct AugmentationConfigBuilder {
    method: Option<String>,
    target_column: Option<String>,
    neighbor_count: Option<usize>,
    sampling_strategy: Option<String>,
    ratio: Option<f64>,
    target_rows: Option<usize>,
    random_seed: Option<u64>,
}

impl AugmentationConfigBuilder {
    /// Set the method by name. Unknown names fail at [`Self::build`].
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn method_kind(mut self, kind: MethodKind) -> Self {
        self.method = Some(kind.as_str().to_string());
        self
    }

    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    pub fn neighbor_count(mut self, k: usize) -> Self {
        self.neighbor_count = Some(k);
        self
    }

    pub fn sampling_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.sampling_strategy = Some(strategy.into());
        self
    }

    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    pub fn target_rows(mut self, rows: usize) -> Self {
        self.target_rows = Some(rows);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build and validate the configuration. The method defaults to density.
    pub fn build(self) -> Result<AugmentationConfig, ConfigValidationError> {
        let kind = match self.method.as_deref() {
            Some(name) => name.parse::<MethodKind>()?,
            None => MethodKind::Density,
        };

        let method = match kind {
            MethodKind::Neighbor => {
                if self.ratio.is_some() || self.target_rows.is_some() {
                    debug!("ratio/target_rows are ignored by the neighbor method");
                }
                let sampling_strategy = match self.sampling_strategy.as_deref() {
                    Some(s) => s.parse()?,
                    None => SamplingStrategy::default(),
                };
                AugmentationMethod::Neighbor {
                    target_column: self
                        .target_column
                        .ok_or(ConfigValidationError::MissingTargetColumn)?,
                    neighbor_count: self.neighbor_count.unwrap_or(DEFAULT_NEIGHBOR_COUNT),
                    sampling_strategy,
                }
            }
            MethodKind::Density | MethodKind::Independent => {
                let amount = match (self.ratio, self.target_rows) {
                    (Some(_), Some(_)) => return Err(ConfigValidationError::AmountConflict),
                    (None, None) => return Err(ConfigValidationError::AmountMissing),
                    (Some(r), None) => AugmentationAmount::Ratio(r),
                    (None, Some(t)) => AugmentationAmount::TargetRows(t),
                };
                if kind == MethodKind::Density {
                    AugmentationMethod::Density { amount }
                } else {
                    AugmentationMethod::Independent { amount }
                }
            }
        };

        let config = AugmentationConfig {
            method,
            random_seed: self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Flat request form of an augmentation configuration, as submitted by a
/// form-based client. Converted with `TryFrom`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AugmentationRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub target_column: Option<String>,
    #[serde(default, alias = "k_neighbors")]
    pub neighbor_count: Option<usize>,
    #[serde(default)]
    pub sampling_strategy: Option<String>,
    #[serde(default, alias = "augmentation_ratio")]
    pub ratio: Option<f64>,
    #[serde(default)]
    pub target_rows: Option<usize>,
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl TryFrom<AugmentationRequest> for AugmentationConfig {
    type Error = ConfigValidationError;

    fn try_from(req: AugmentationRequest) -> Result<Self, Self::Error> {
        let mut builder = AugmentationConfig::builder();
        if let Some(method) = req.method {
            builder = builder.method(method);
        }
        if let Some(column) = req.target_column.filter(|c| !c.trim().is_empty()) {
            builder = builder.target_column(column);
        }
        if let Some(k) = req.neighbor_count {
            builder = builder.neighbor_count(k);
        }
        if let Some(strategy) = req.sampling_strategy {
            builder = builder.sampling_strategy(strategy);
        }
        if let Some(ratio) = req.ratio {
            builder = builder.ratio(ratio);
        }
        if let Some(rows) = req.target_rows {
            builder = builder.target_rows(rows);
        }
        if let Some(seed) = req.random_seed {
            builder = builder.random_seed(seed);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preprocess_config() {
        let config = PreprocessConfig::default();
        assert_eq!(config.missing_strategy, MissingStrategy::Mean);
        assert_eq!(config.outlier_strategy, OutlierStrategy::None);
        assert!(config.column_types.is_empty());
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_preprocess_builder() {
        let config = PreprocessConfig::builder()
            .missing_strategy(MissingStrategy::Median)
            .outlier_strategy(OutlierStrategy::Iqr)
            .column_type("age", SemanticType::Numeric)
            .build()
            .unwrap();

        assert_eq!(config.missing_strategy, MissingStrategy::Median);
        assert_eq!(config.outlier_strategy, OutlierStrategy::Iqr);
        assert_eq!(config.column_types["age"], SemanticType::Numeric);
    }

    #[test]
    fn test_preprocess_config_from_json() {
        let json = r#"{
            "missing_strategy": "interpolate",
            "outlier_strategy": "isolation_forest",
            "column_types": {"price": "numeric", "city": "categorical"}
        }"#;
        let config: PreprocessConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.missing_strategy, MissingStrategy::Interpolate);
        assert_eq!(config.outlier_strategy, OutlierStrategy::IsolationForest);
        assert_eq!(config.column_types["city"], SemanticType::Categorical);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_method_aliases() {
        assert_eq!("smote".parse::<MethodKind>().unwrap(), MethodKind::Neighbor);
        assert_eq!("gaussian_copula".parse::<MethodKind>().unwrap(), MethodKind::Density);
        assert_eq!(
            "bayesian_network".parse::<MethodKind>().unwrap(),
            MethodKind::Independent
        );
        assert_eq!("Density".parse::<MethodKind>().unwrap(), MethodKind::Density);
    }

    #[test]
    fn test_unsupported_method() {
        let err = AugmentationConfig::builder()
            .method("gan")
            .ratio(1.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigValidationError::UnsupportedMethod("gan".to_string()));
        assert!(SynthError::from(err).is_configuration_error());
    }

    #[test]
    fn test_neighbor_requires_target() {
        let err = AugmentationConfig::builder()
            .method("neighbor")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigValidationError::MissingTargetColumn);

        let err = SynthError::from(err);
        assert_eq!(err.error_code(), "MISSING_CONFIG");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_neighbor_defaults() {
        let config = AugmentationConfig::builder()
            .method("smote")
            .target_column("label")
            .build()
            .unwrap();
        assert_eq!(
            config.method,
            AugmentationMethod::Neighbor {
                target_column: "label".to_string(),
                neighbor_count: 5,
                sampling_strategy: SamplingStrategy::Auto,
            }
        );
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_ratio_and_target_rows_are_exclusive() {
        let both = AugmentationConfig::builder()
            .method("density")
            .ratio(0.5)
            .target_rows(100)
            .build();
        assert_eq!(both.unwrap_err(), ConfigValidationError::AmountConflict);

        let neither = AugmentationConfig::builder().method("independent").build();
        assert_eq!(neither.unwrap_err(), ConfigValidationError::AmountMissing);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = AugmentationConfig::builder().ratio(-0.5).build().unwrap_err();
        assert_eq!(err, ConfigValidationError::InvalidRatio(-0.5));
        assert!(SynthError::from(err).is_invalid_parameter());

        let err = AugmentationConfig::builder()
            .method("neighbor")
            .target_column("y")
            .neighbor_count(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigValidationError::InvalidNeighborCount(0));
    }

    #[test]
    fn test_sampling_strategy_spellings() {
        for s in ["not_majority", "not majority", "Not-Majority"] {
            assert_eq!(s.parse::<SamplingStrategy>().unwrap(), SamplingStrategy::NotMajority);
        }
        assert!("most".parse::<SamplingStrategy>().is_err());
    }

    #[test]
    fn test_amount_resolution() {
        let by_ratio = AugmentationAmount::Ratio(0.5).resolve(5);
        assert_eq!(by_ratio.num_new, 3); // round(2.5) away from zero
        assert_eq!(by_ratio.target_rows, 8);

        let by_target = AugmentationAmount::TargetRows(15).resolve(10);
        assert_eq!(by_target.num_new, 5);
        assert!((by_target.ratio - 0.5).abs() < 1e-12);

        let below = AugmentationAmount::TargetRows(4).resolve(10);
        assert_eq!(below.num_new, 0);
        assert_eq!(below.target_rows, 10);
    }

    #[test]
    fn test_request_conversion() {
        let json = r#"{
            "method": "smote",
            "target_column": "label",
            "k_neighbors": 3,
            "sampling_strategy": "minority"
        }"#;
        let req: AugmentationRequest = serde_json::from_str(json).unwrap();
        let config = AugmentationConfig::try_from(req).unwrap();
        assert_eq!(
            config.method,
            AugmentationMethod::Neighbor {
                target_column: "label".to_string(),
                neighbor_count: 3,
                sampling_strategy: SamplingStrategy::Minority,
            }
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = AugmentationConfig::builder()
            .method("independent")
            .target_rows(50)
            .build()
            .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["method"], "independent");
        assert_eq!(json["amount"]["target_rows"], 50);

        let back: AugmentationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
