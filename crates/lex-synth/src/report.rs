//! Before/after comparison of an augmented dataset.
//!
//! Produces the numbers a distribution chart needs; rendering is left to
//! the caller.

use crate::error::Result;
use crate::utils::{is_numeric_dtype, mean, present_values, quantile_sorted, sorted, std_dev};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Most frequent categories kept per column.
const TOP_CATEGORIES: usize = 10;

/// Summary statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric {
        count: usize,
        null_count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        q25: Option<f64>,
        median: Option<f64>,
        q75: Option<f64>,
        max: Option<f64>,
    },
    Categorical {
        count: usize,
        null_count: usize,
        unique: usize,
        /// Most frequent values with their counts, most frequent first.
        top_values: Vec<(String, usize)>,
    },
}

impl ColumnStats {
    pub fn from_series(series: &Series) -> Result<Self> {
        let null_count = series.null_count();
        let count = series.len() - null_count;

        if is_numeric_dtype(series.dtype()) {
            let values = sorted(&present_values(series)?);
            return Ok(ColumnStats::Numeric {
                count,
                null_count,
                mean: mean(&values),
                std: std_dev(&values, 1),
                min: values.first().copied(),
                q25: quantile_sorted(&values, 0.25),
                median: quantile_sorted(&values, 0.5),
                q75: quantile_sorted(&values, 0.75),
                max: values.last().copied(),
            });
        }

        let as_str = series.cast(&DataType::String)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in as_str.str()?.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }
        let unique = counts.len();
        let mut top_values: Vec<(String, usize)> =
            counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect();
        top_values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_values.truncate(TOP_CATEGORIES);

        Ok(ColumnStats::Categorical {
            count,
            null_count,
            unique,
            top_values,
        })
    }
}

/// Statistics of one column in both datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnComparison {
    pub name: String,
    pub original: ColumnStats,
    /// `None` when the column is absent from the augmented dataset.
    pub augmented: Option<ColumnStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub original_rows: usize,
    pub augmented_rows: usize,
    /// Row increase in percent of the original row count.
    pub increase_ratio: f64,
    pub columns: Vec<ColumnComparison>,
}

/// Compare every column of `original` with the same column in `augmented`.
pub fn compare_datasets(original: &DataFrame, augmented: &DataFrame) -> Result<ComparisonReport> {
    let original_rows = original.height();
    let augmented_rows = augmented.height();
    let increase_ratio = if original_rows == 0 {
        0.0
    } else {
        (augmented_rows as f64 - original_rows as f64) / original_rows as f64 * 100.0
    };

    let mut columns = Vec::with_capacity(original.width());
    for column in original.get_columns() {
        let name = column.name().to_string();
        let augmented_stats = match augmented.column(&name) {
            Ok(c) => Some(ColumnStats::from_series(c.as_materialized_series())?),
            Err(_) => None,
        };
        columns.push(ColumnComparison {
            original: ColumnStats::from_series(column.as_materialized_series())?,
            augmented: augmented_stats,
            name,
        });
    }

    Ok(ComparisonReport {
        original_rows,
        augmented_rows,
        increase_ratio,
        columns,
    })
}
