//! Column converters used by the type coercer.
//!
//! Every converter is best-effort per cell: values that cannot be parsed
//! become null, the conversion itself only fails when the column's storage
//! type cannot be read at all.

use crate::utils::{is_datetime_dtype, is_numeric_dtype, parse_numeric_string};
use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

const DATETIME_MS: DataType = DataType::Datetime(TimeUnit::Milliseconds, None);

/// Date-time layouts tried in order, before date-only layouts.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y",
];

/// Convert a column to numeric. Numeric columns pass through; strings are
/// parsed to Float64 with unparseable cells set to null.
pub(crate) fn to_numeric(series: &Series) -> Result<Series> {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) {
        return Ok(series.clone());
    }

    match dtype {
        DataType::String => {
            let str_series = series.str()?;
            let values: Vec<Option<f64>> = str_series
                .into_iter()
                .map(|v| v.and_then(parse_numeric_string))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        DataType::Boolean => Ok(series.cast(&DataType::Float64)?),
        DataType::Null => Ok(series.cast(&DataType::Float64)?),
        other if is_datetime_dtype(other) => {
            bail!("refusing to reinterpret {other} values as numbers")
        }
        _ => Ok(series.cast(&DataType::Float64)?),
    }
}

/// Convert a column to a finite label set, stored as strings.
pub(crate) fn to_categorical(series: &Series) -> Result<Series> {
    if series.dtype() == &DataType::String {
        return Ok(series.clone());
    }
    Ok(series.cast(&DataType::String)?)
}

/// Convert a column to its string representation. Missing values stay missing.
pub(crate) fn to_text(series: &Series) -> Result<Series> {
    to_categorical(series)
}

/// Convert a column to `Datetime(ms)`.
///
/// Strings are tried as RFC 3339, then common date-time and date layouts,
/// then Unix timestamps in seconds or milliseconds.
pub(crate) fn to_datetime(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Datetime(TimeUnit::Milliseconds, _) => Ok(series.clone()),
        DataType::Datetime(_, _) | DataType::Date => Ok(series.cast(&DATETIME_MS)?),
        DataType::String => {
            let str_series = series.str()?;
            let millis: Vec<Option<i64>> =
                str_series.into_iter().map(|v| v.and_then(parse_datetime_millis)).collect();
            Ok(Series::new(series.name().clone(), millis).cast(&DATETIME_MS)?)
        }
        dtype if is_numeric_dtype(dtype) => {
            let ints = series.cast(&DataType::Int64)?;
            let millis: Vec<Option<i64>> =
                ints.i64()?.into_iter().map(|v| v.and_then(timestamp_millis)).collect();
            Ok(Series::new(series.name().clone(), millis).cast(&DATETIME_MS)?)
        }
        other => bail!("cannot interpret {other} values as datetimes"),
    }
}

fn parse_datetime_millis(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    s.parse::<i64>().ok().and_then(timestamp_millis)
}

/// Interpret an integer as a Unix timestamp in seconds or milliseconds.
fn timestamp_millis(ts: i64) -> Option<i64> {
    if ts > 1_000_000_000 && ts < 2_000_000_000 {
        Some(ts * 1000)
    } else if ts > 1_000_000_000_000 && ts < 2_000_000_000_000 {
        Some(ts)
    } else {
        None
    }
}
