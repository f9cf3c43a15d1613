//! Statistical fill values: mean, median and mode.

use crate::types::FillValue;
use crate::utils::{is_integer_dtype, is_numeric_dtype, mean, median, mode_row, present_values};
use anyhow::Result;
use polars::prelude::*;

/// Computes and applies per-column fill values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Mean of the present values of a numeric column.
    pub fn mean_fill(series: &Series) -> Result<Option<FillValue>> {
        Ok(mean(&present_values(series)?).map(FillValue::Number))
    }

    /// Median of the present values of a numeric column.
    pub fn median_fill(series: &Series) -> Result<Option<FillValue>> {
        Ok(median(&present_values(series)?).map(FillValue::Number))
    }

    /// Most frequent present value of any column. Ties go to the value that
    /// appears first; a column with no present values has no mode.
    pub fn mode_fill(series: &Series) -> Result<Option<FillValue>> {
        let Some(row) = mode_row(series)? else {
            return Ok(None);
        };
        Ok(FillValue::from_any_value(&series.get(row)?))
    }

    /// Replace the nulls of `series` with `fill`.
    ///
    /// A fractional numeric fill promotes an integer column to Float64;
    /// otherwise the column keeps its dtype. Fails if the fill value cannot
    /// be represented in the column's dtype.
    pub fn fill_nulls(series: &Series, fill: &FillValue) -> PolarsResult<Series> {
        if series.null_count() == 0 {
            return Ok(series.clone());
        }

        let base = match fill {
            FillValue::Number(v) if is_numeric_dtype(series.dtype()) => {
                if is_integer_dtype(series.dtype()) && v.fract() != 0.0 {
                    series.cast(&DataType::Float64)?
                } else {
                    series.clone()
                }
            }
            _ => series.clone(),
        };

        let single = fill.to_series(base.name().clone(), base.dtype())?;
        let broadcast = single.new_from_index(0, base.len());
        base.zip_with(&base.is_not_null(), &broadcast)
    }
}
