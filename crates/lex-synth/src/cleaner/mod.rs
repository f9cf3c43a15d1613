//! Type coercion: converts raw columns to their declared semantic types.
//!
//! Coercion is best-effort. A column that cannot be converted is left as it
//! was and reported as a [`ProcessingWarning::Conversion`]; the rest of the
//! dataset is still processed.

mod converters;

use crate::types::{ColumnTypeMap, ProcessingWarning, SemanticType};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Converts columns to the types declared in a [`ColumnTypeMap`].
pub struct TypeCoercer;

impl TypeCoercer {
    /// Coerce every mapped column of `df`. Unmapped columns pass through.
    ///
    /// Mapped columns that are absent from `df` produce a
    /// [`ProcessingWarning::MissingColumn`].
    pub fn coerce(
        &self,
        mut df: DataFrame,
        column_types: &ColumnTypeMap,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<DataFrame> {
        // Deterministic order so warnings come out the same way every run.
        let mut mapped: Vec<(&String, &SemanticType)> = column_types.iter().collect();
        mapped.sort_by(|a, b| a.0.cmp(b.0));

        for (name, ty) in mapped {
            let Ok(column) = df.column(name) else {
                warn!("Column '{}' declared as {} is not in the dataset", name, ty);
                warnings.push(ProcessingWarning::MissingColumn {
                    column: name.clone(),
                    context: "column_types".to_string(),
                });
                continue;
            };
            let series = column.as_materialized_series();

            match self.convert(series, *ty) {
                Ok(converted) => {
                    debug!(
                        "Coerced '{}' to {} ({} -> {})",
                        name,
                        ty,
                        series.dtype(),
                        converted.dtype()
                    );
                    df.with_column(converted)?;
                }
                Err(e) => {
                    warn!("Could not convert column '{}' to {}: {}", name, ty, e);
                    warnings.push(ProcessingWarning::Conversion {
                        column: name.clone(),
                        target_type: *ty,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(df)
    }

    fn convert(&self, series: &Series, ty: SemanticType) -> Result<Series> {
        match ty {
            SemanticType::Numeric => converters::to_numeric(series),
            SemanticType::Categorical => converters::to_categorical(series),
            SemanticType::Datetime => converters::to_datetime(series),
            SemanticType::Text => converters::to_text(series),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_coerce_declared_columns() {
        let df = df!(
            "price" => ["10", "x", "30"],
            "zip" => [1001i64, 1002, 1003],
            "untouched" => ["a", "b", "c"]
        )
        .unwrap();
        let mut types = ColumnTypeMap::new();
        types.insert("price".to_string(), SemanticType::Numeric);
        types.insert("zip".to_string(), SemanticType::Categorical);

        let mut warnings = Vec::new();
        let out = TypeCoercer.coerce(df, &types, &mut warnings).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(out.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(out.column("price").unwrap().null_count(), 1);
        assert_eq!(out.column("zip").unwrap().dtype(), &DataType::String);
        assert_eq!(out.column("untouched").unwrap().dtype(), &DataType::String);
        assert_eq!(
            out.get_column_names_str(),
            vec!["price", "zip", "untouched"]
        );
    }

    #[test]
    fn test_missing_column_is_a_warning() {
        let df = df!("a" => [1, 2]).unwrap();
        let mut types = ColumnTypeMap::new();
        types.insert("ghost".to_string(), SemanticType::Numeric);

        let mut warnings = Vec::new();
        let out = TypeCoercer.coerce(df.clone(), &types, &mut warnings).unwrap();

        assert!(out.equals_missing(&df));
        assert_eq!(
            warnings,
            vec![ProcessingWarning::MissingColumn {
                column: "ghost".to_string(),
                context: "column_types".to_string(),
            }]
        );
    }

    #[test]
    fn test_failed_conversion_leaves_column() {
        let when = Series::new("when".into(), &[1_700_000_000_000i64])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let df = DataFrame::new(vec![when.into_column()]).unwrap();
        let mut types = ColumnTypeMap::new();
        types.insert("when".to_string(), SemanticType::Numeric);

        let mut warnings = Vec::new();
        let out = TypeCoercer.coerce(df, &types, &mut warnings).unwrap();

        assert!(matches!(out.column("when").unwrap().dtype(), DataType::Datetime(_, _)));
        assert!(matches!(
            &warnings[0],
            ProcessingWarning::Conversion { column, target_type: SemanticType::Numeric, .. }
                if column == "when"
        ));
    }
}
