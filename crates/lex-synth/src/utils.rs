//! Shared utilities for cleaning and synthesis.
//!
//! This module contains dtype checks, string parsing helpers and the small
//! statistics kernels used by several pipeline stages.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Names of the numeric columns of `df`, in column order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a",
];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a finite numeric value.
///
/// Handles currency symbols, percentages and thousands separators. Empty
/// strings and error markers yield `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || is_error_marker(trimmed) {
        return None;
    }
    let cleaned = clean_numeric_string(trimmed);
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Series Access Utilities
// =============================================================================

/// Read a numeric series as `f64` values, keeping nulls. NaN reads as null.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Read only the present values of a numeric series.
pub fn present_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(numeric_values(series)?.into_iter().flatten().collect())
}

/// Build a series of `dtype` from synthetic `f64` values. Integer dtypes are
/// rounded first so the cast does not truncate.
pub fn numeric_series_like(
    name: PlSmallStr,
    values: Vec<Option<f64>>,
    dtype: &DataType,
) -> PolarsResult<Series> {
    let values = if is_integer_dtype(dtype) {
        values.into_iter().map(|v| v.map(f64::round)).collect()
    } else {
        values
    };
    Series::new(name, values).cast(dtype)
}

/// Gather rows of `series` by position.
pub fn take_rows(series: &Series, rows: &[usize]) -> PolarsResult<Series> {
    let idx: Vec<IdxSize> = rows.iter().map(|&r| r as IdxSize).collect();
    series.take(&IdxCa::from_vec(PlSmallStr::from_static("idx"), idx))
}

/// Distinct values of a series with their counts and the position of their
/// first occurrence, ordered by first occurrence. Nulls are skipped; values
/// are compared through their string form so any dtype works.
pub fn value_counts_first_seen(series: &Series) -> PolarsResult<Vec<(usize, usize)>> {
    let as_str = series.cast(&DataType::String)?;
    let ca = as_str.str()?;

    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for (row, value) in ca.into_iter().enumerate() {
        let Some(value) = value else { continue };
        match slot_of.get(value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slot_of.insert(value, counts.len());
                counts.push((row, 1));
            }
        }
    }
    Ok(counts)
}

/// Row index of the mode of a series. Ties go to the value seen first.
pub fn mode_row(series: &Series) -> PolarsResult<Option<usize>> {
    let counts = value_counts_first_seen(series)?;
    let mut best: Option<(usize, usize)> = None;
    for (row, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((row, count));
        }
    }
    Ok(best.map(|(row, _)| row))
}

// =============================================================================
// Statistics
// =============================================================================

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Standard deviation with `ddof` delta degrees of freedom (0 = population,
/// 1 = sample). `None` when fewer than `ddof + 1` values exist.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    let n = values.len();
    if n <= ddof {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (n - ddof) as f64).sqrt())
}

/// Quantile of already sorted values using linear interpolation between
/// the closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort a copy of `values` ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

// =============================================================================
// Tests
// =============================================================================
