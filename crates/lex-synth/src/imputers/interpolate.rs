//! Position-based linear interpolation for numeric columns.

use crate::utils::numeric_values;
use polars::prelude::*;

/// Fill gaps by linear interpolation between the nearest known values on
/// each side. Gaps before the first known value stay missing; gaps after the
/// last known value take that value. The result is Float64.
pub fn interpolate_linear(series: &Series) -> PolarsResult<Series> {
    let mut values = numeric_values(series)?;
    let known: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();

    for pair in known.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a < 2 {
            continue;
        }
        let (Some(va), Some(vb)) = (values[a], values[b]) else {
            continue;
        };
        let span = (b - a) as f64;
        for (offset, slot) in values[a + 1..b].iter_mut().enumerate() {
            let t = (offset + 1) as f64 / span;
            *slot = Some(va + (vb - va) * t);
        }
    }

    if let Some(&last) = known.last() {
        let tail = values[last];
        for slot in values[last + 1..].iter_mut() {
            *slot = tail;
        }
    }

    Ok(Series::new(series.name().clone(), values))
}
