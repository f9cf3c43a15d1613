//! Missing value handling.
//!
//! [`MissingValueImputer`] learns one fill value per column during fit and
//! reapplies the stored values on transform. Strategies:
//! - `drop`: remove every row with a missing value, nothing is learned
//! - `mean` / `median`: numeric columns only, other columns use the mode
//! - `mode`: most frequent value of any column
//! - `interpolate`: linear by position for numeric columns (not stored),
//!   mode for the rest

mod interpolate;
mod statistical;

pub use interpolate::interpolate_linear;
pub use statistical::StatisticalImputer;

use crate::config::MissingStrategy;
use crate::types::{FillValue, ProcessingWarning};
use crate::utils::is_numeric_dtype;
use anyhow::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Fills or drops missing values according to a [`MissingStrategy`].
pub struct MissingValueImputer {
    strategy: MissingStrategy,
}

impl MissingValueImputer {
    pub fn new(strategy: MissingStrategy) -> Self {
        Self { strategy }
    }

    /// Learn fill values from `df`, record them in `fill_values` and fill
    /// the gaps of `df` with them.
    pub fn fit_transform(
        &self,
        df: DataFrame,
        fill_values: &mut BTreeMap<String, FillValue>,
    ) -> Result<DataFrame> {
        if self.strategy == MissingStrategy::Drop {
            return drop_incomplete_rows(df);
        }

        let mut df = df;
        let names: Vec<PlSmallStr> = df.get_column_names_owned();

        for name in names {
            let series = df.column(&name)?.as_materialized_series().clone();
            let numeric = is_numeric_dtype(series.dtype());

            let fill = match (self.strategy, numeric) {
                (MissingStrategy::Interpolate, true) => {
                    if series.null_count() > 0 {
                        debug!("Interpolating {} gaps in '{}'", series.null_count(), name);
                        df.with_column(interpolate_linear(&series)?)?;
                    }
                    continue;
                }
                (MissingStrategy::Mean, true) => StatisticalImputer::mean_fill(&series)?,
                (MissingStrategy::Median, true) => StatisticalImputer::median_fill(&series)?,
                _ => StatisticalImputer::mode_fill(&series)?,
            };

            let Some(fill) = fill else {
                if series.null_count() > 0 {
                    debug!("Column '{}' has no present values, leaving gaps", name);
                }
                continue;
            };

            if series.null_count() > 0 {
                debug!(
                    "Filling {} gaps in '{}' with {}",
                    series.null_count(),
                    name,
                    fill
                );
                df.with_column(StatisticalImputer::fill_nulls(&series, &fill)?)?;
            }
            fill_values.insert(name.to_string(), fill);
        }

        Ok(df)
    }

    /// Fill gaps using previously learned values. Columns without a stored
    /// value, or absent from `df`, are left untouched. A stored value that
    /// no longer fits the column's dtype is skipped with a warning.
    pub fn transform(
        df: DataFrame,
        fill_values: &BTreeMap<String, FillValue>,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<DataFrame> {
        let mut df = df;
        for (name, fill) in fill_values {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();
            if series.null_count() == 0 {
                continue;
            }
            match StatisticalImputer::fill_nulls(series, fill) {
                Ok(filled) => {
                    df.with_column(filled)?;
                }
                Err(e) => {
                    warn!("Stored fill value for '{}' does not fit: {}", name, e);
                    warnings.push(ProcessingWarning::degenerate(
                        "missing values",
                        format!("stored fill value for '{name}' does not fit the column: {e}"),
                    ));
                }
            }
        }
        Ok(df)
    }
}

/// Remove every row that has a missing value in any column.
fn drop_incomplete_rows(df: DataFrame) -> Result<DataFrame> {
    let mut mask: Option<BooleanChunked> = None;
    for column in df.get_columns() {
        let present = column.as_materialized_series().is_not_null();
        mask = Some(match mask {
            Some(m) => &m & &present,
            None => present,
        });
    }

    let Some(mask) = mask else {
        return Ok(df);
    };
    let before = df.height();
    let out = df.filter(&mask)?;
    debug!("Dropped {} incomplete rows", before - out.height());
    Ok(out)
}
