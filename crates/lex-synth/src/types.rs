use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::{MissingStrategy, OutlierStrategy};
use crate::utils::is_numeric_dtype;

// ============================================================================
// Column semantics
// ============================================================================

/// Declared semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numeric,
    Categorical,
    Datetime,
    Text,
}

impl SemanticType {
    /// Default semantic type for a native storage type: numeric-like storage
    /// is numeric, everything else is categorical.
    pub fn infer(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            SemanticType::Numeric
        } else {
            SemanticType::Categorical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Categorical => "categorical",
            SemanticType::Datetime => "datetime",
            SemanticType::Text => "text",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(SemanticType::Numeric),
            "categorical" => Ok(SemanticType::Categorical),
            "datetime" => Ok(SemanticType::Datetime),
            "text" => Ok(SemanticType::Text),
            other => Err(format!("unknown column type '{other}'")),
        }
    }
}

/// Mapping from column name to declared semantic type.
pub type ColumnTypeMap = HashMap<String, SemanticType>;

/// Resolve the effective semantic type of every column in `df`: declared
/// types win, the rest are inferred from storage.
pub fn effective_column_types(df: &DataFrame, declared: &ColumnTypeMap) -> BTreeMap<String, SemanticType> {
    df.get_columns()
        .iter()
        .map(|col| {
            let name = col.name().to_string();
            let ty = declared
                .get(&name)
                .copied()
                .unwrap_or_else(|| SemanticType::infer(col.dtype()));
            (name, ty)
        })
        .collect()
}

// ============================================================================
// Learned state
// ============================================================================

/// A learned per-column fill value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FillValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl FillValue {
    /// Convert a polars scalar into a fill value. Returns `None` for nulls
    /// and types that have no fill representation.
    pub fn from_any_value(value: &AnyValue<'_>) -> Option<Self> {
        match value {
            AnyValue::Null => None,
            AnyValue::Boolean(b) => Some(FillValue::Boolean(*b)),
            AnyValue::String(s) => Some(FillValue::Text(s.to_string())),
            AnyValue::StringOwned(s) => Some(FillValue::Text(s.to_string())),
            AnyValue::Datetime(v, unit, _) => Some(FillValue::Timestamp(to_millis(*v, *unit))),
            AnyValue::Date(days) => Some(FillValue::Timestamp(*days as i64 * 86_400_000)),
            other => other.extract::<f64>().map(FillValue::Number),
        }
    }

    /// Build a one-element series holding this value, cast to `dtype`.
    pub fn to_series(&self, name: PlSmallStr, dtype: &DataType) -> PolarsResult<Series> {
        let single = match self {
            FillValue::Number(v) => Series::new(name, &[*v]),
            FillValue::Boolean(b) => Series::new(name, &[*b]),
            FillValue::Text(s) => Series::new(name, &[s.as_str()]),
            FillValue::Timestamp(ms) => Series::new(name, &[*ms])
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        };
        single.strict_cast(dtype)
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Number(v) => write!(f, "{v}"),
            FillValue::Boolean(b) => write!(f, "{b}"),
            FillValue::Text(s) => f.write_str(s),
            FillValue::Timestamp(ms) => match chrono::DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.naive_utc()),
                None => write!(f, "{ms}ms"),
            },
        }
    }
}

fn to_millis(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value / 1_000_000,
        TimeUnit::Microseconds => value / 1_000,
        TimeUnit::Milliseconds => value,
    }
}

/// Inclusive clamp bounds learned for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ClampBounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

/// Artifacts learned by a preprocessing fit and reused by `transform`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitState {
    pub fill_values: BTreeMap<String, FillValue>,
    pub clamp_bounds: BTreeMap<String, ClampBounds>,
}

// ============================================================================
// Warnings
// ============================================================================

/// A non-fatal condition met while processing. The affected step degrades
/// to a no-op and processing continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingWarning {
    /// A column could not be converted to its declared type and was left as-is.
    Conversion {
        column: String,
        target_type: SemanticType,
        reason: String,
    },
    /// The input gives a step nothing to work with.
    DegenerateInput { stage: String, reason: String },
    /// A configured column does not exist in the input.
    MissingColumn { column: String, context: String },
}

impl ProcessingWarning {
    pub fn degenerate(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessingWarning::DegenerateInput {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProcessingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingWarning::Conversion {
                column,
                target_type,
                reason,
            } => write!(f, "could not convert column '{column}' to {target_type}: {reason}"),
            ProcessingWarning::DegenerateInput { stage, reason } => write!(f, "{stage}: {reason}"),
            ProcessingWarning::MissingColumn { column, context } => {
                write!(f, "column '{column}' referenced by {context} is not in the dataset")
            }
        }
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Audit summary of a preprocessing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    pub missing_strategy: MissingStrategy,
    pub outlier_strategy: OutlierStrategy,
    pub column_types: BTreeMap<String, SemanticType>,
    pub fill_values: BTreeMap<String, FillValue>,
    pub clamp_bounds: BTreeMap<String, ClampBounds>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub warnings: Vec<ProcessingWarning>,
}

/// Audit summary of the effective augmentation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentationSummary {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_column: Option<String>,
    pub ratio: f64,
    pub target_rows: usize,
    pub random_seed: u64,
    pub original_rows: usize,
    pub synthetic_rows: usize,
    pub total_rows: usize,
    pub additional_params: BTreeMap<String, serde_json::Value>,
}
