//! Nearest-neighbor oversampling of labeled data.
//!
//! New rows are placed at a random point on the segment between a class
//! member and one of its nearest same-class neighbors. Non-numeric features
//! are label-encoded for the distance computation and decoded afterwards.
//! Synthetic rows are appended after all original rows.

use crate::augment::{Synthesizer, append_rows};
use crate::config::{MethodKind, SamplingStrategy};
use crate::error::{Result, SynthError};
use crate::types::ProcessingWarning;
use crate::utils::{is_numeric_dtype, mean, numeric_series_like, numeric_values, take_rows};
use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;
use rand::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::{debug, info, warn};

/// Distance to a candidate neighbor. Ties order by index so the search is
/// deterministic.
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    (&a - &b).mapv(|d| d * d).sum().sqrt()
}

/// Row indices of the `k` nearest rows to row `of`, excluding itself.
fn nearest_neighbors(points: &Array2<f64>, of: usize, k: usize) -> Vec<usize> {
    let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);
    let origin = points.row(of);
    for (i, p) in points.rows().into_iter().enumerate() {
        if i == of {
            continue;
        }
        let candidate = DistIdx(euclidean(origin, p), i);
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|top| candidate < *top) {
            heap.pop();
            heap.push(candidate);
        }
    }
    heap.into_sorted_vec().into_iter().map(|DistIdx(_, i)| i).collect()
}

/// How one feature column is represented in the distance space.
enum FeatureEncoding {
    /// Numeric values; gaps hold the column mean. A column without any
    /// value decodes to nulls.
    Numeric { values: Vec<f64>, observed: bool },
    /// Label codes over the sorted distinct values. `representatives[code]`
    /// is a row holding that value.
    Labels {
        codes: Vec<f64>,
        representatives: Vec<usize>,
    },
}

impl FeatureEncoding {
    fn encode(series: &Series) -> PolarsResult<Self> {
        if is_numeric_dtype(series.dtype()) {
            let raw = numeric_values(series)?;
            let present: Vec<f64> = raw.iter().flatten().copied().collect();
            let fill = mean(&present);
            return Ok(FeatureEncoding::Numeric {
                values: raw
                    .into_iter()
                    .map(|v| v.or(fill).unwrap_or(0.0))
                    .collect(),
                observed: fill.is_some(),
            });
        }

        let as_str = series.cast(&DataType::String)?;
        let labels: Vec<Option<&str>> = as_str.str()?.into_iter().collect();

        let mut first_row: BTreeMap<Option<&str>, usize> = BTreeMap::new();
        for (row, label) in labels.iter().enumerate() {
            first_row.entry(*label).or_insert(row);
        }
        let code_of: BTreeMap<Option<&str>, usize> =
            first_row.keys().enumerate().map(|(code, key)| (*key, code)).collect();

        Ok(FeatureEncoding::Labels {
            codes: labels.iter().map(|l| code_of[l] as f64).collect(),
            representatives: first_row.into_values().collect(),
        })
    }

    fn value(&self, row: usize) -> f64 {
        match self {
            FeatureEncoding::Numeric { values, .. } => values[row],
            FeatureEncoding::Labels { codes, .. } => codes[row],
        }
    }

    /// Build the output column for synthetic `values` of this feature.
    fn decode(&self, original: &Series, values: Vec<f64>) -> PolarsResult<Series> {
        match self {
            FeatureEncoding::Numeric { observed: false, .. } => Ok(Series::full_null(
                original.name().clone(),
                values.len(),
                original.dtype(),
            )),
            FeatureEncoding::Numeric { .. } => numeric_series_like(
                original.name().clone(),
                values.into_iter().map(Some).collect(),
                original.dtype(),
            ),
            FeatureEncoding::Labels {
                representatives, ..
            } => {
                let max_code = representatives.len().saturating_sub(1);
                let rows: Vec<usize> = values
                    .into_iter()
                    .map(|v| representatives[(v.trunc().max(0.0) as usize).min(max_code)])
                    .collect();
                take_rows(original, &rows)
            }
        }
    }
}

/// Nearest-neighbor oversampler for a labeled dataset.
pub struct NeighborSynthesizer {
    target_column: String,
    neighbor_count: usize,
    sampling_strategy: SamplingStrategy,
    rng: StdRng,
    class_counts: BTreeMap<String, usize>,
}

impl NeighborSynthesizer {
    pub fn new(
        target_column: impl Into<String>,
        neighbor_count: usize,
        sampling_strategy: SamplingStrategy,
        seed: u64,
    ) -> Self {
        Self {
            target_column: target_column.into(),
            neighbor_count,
            sampling_strategy,
            rng: StdRng::seed_from_u64(seed),
            class_counts: BTreeMap::new(),
        }
    }

    /// Class sizes after the last fit.
    pub fn class_counts(&self) -> &BTreeMap<String, usize> {
        &self.class_counts
    }

    /// Number of rows to add to each class, keyed by label.
    fn plan(&self, classes: &BTreeMap<String, Vec<usize>>) -> BTreeMap<String, usize> {
        let count = |label: &String| classes[label].len();
        // First label in sorted order wins ties.
        let majority = classes
            .keys()
            .fold(None::<&String>, |best, l| match best {
                Some(b) if count(b) >= count(l) => Some(b),
                _ => Some(l),
            });
        let minority = classes
            .keys()
            .fold(None::<&String>, |best, l| match best {
                Some(b) if count(b) <= count(l) => Some(b),
                _ => Some(l),
            });
        let (Some(majority), Some(minority)) = (majority, minority) else {
            return BTreeMap::new();
        };
        let majority_count = count(majority);

        classes
            .keys()
            .filter(|label| match self.sampling_strategy {
                SamplingStrategy::Auto | SamplingStrategy::NotMajority => *label != majority,
                SamplingStrategy::Minority => *label == minority,
                SamplingStrategy::All => true,
            })
            .map(|label| (label.clone(), majority_count - count(label)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

impl Synthesizer for NeighborSynthesizer {
    fn method(&self) -> MethodKind {
        MethodKind::Neighbor
    }

    fn fit_transform(
        &mut self,
        df: &DataFrame,
        warnings: &mut Vec<ProcessingWarning>,
    ) -> Result<DataFrame> {
        let target = df.column(&self.target_column).map_err(|_| {
            SynthError::MissingConfig(format!(
                "target column '{}' is not in the dataset",
                self.target_column
            ))
        })?;

        let labels_series = target.as_materialized_series().cast(&DataType::String)?;
        let mut classes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, label) in labels_series.str()?.into_iter().enumerate() {
            if let Some(label) = label {
                classes.entry(label.to_string()).or_default().push(row);
            }
        }
        self.class_counts = classes.iter().map(|(l, rows)| (l.clone(), rows.len())).collect();

        if classes.len() < 2 {
            warn!(
                "Neighbor augmentation needs at least two classes in '{}', found {}",
                self.target_column,
                classes.len()
            );
            warnings.push(ProcessingWarning::degenerate(
                "neighbor augmentation",
                format!(
                    "target column '{}' has {} class(es); nothing to balance",
                    self.target_column,
                    classes.len()
                ),
            ));
            return Ok(df.clone());
        }

        let plan = self.plan(&classes);
        if plan.is_empty() {
            info!("Classes of '{}' are already balanced", self.target_column);
            warnings.push(ProcessingWarning::degenerate(
                "neighbor augmentation",
                "no class needs oversampling",
            ));
            return Ok(df.clone());
        }

        for label in plan.keys() {
            let size = classes[label].len();
            if self.neighbor_count >= size {
                return Err(SynthError::invalid_parameter(
                    "neighbor_count",
                    format!(
                        "{} must be smaller than the size of class '{}' ({})",
                        self.neighbor_count, label, size
                    ),
                ));
            }
        }

        // Encode features.
        let feature_columns: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != self.target_column)
            .collect();
        let encodings: Vec<FeatureEncoding> = feature_columns
            .iter()
            .map(|c| FeatureEncoding::encode(c.as_materialized_series()))
            .collect::<PolarsResult<_>>()?;
        let matrix = Array2::from_shape_fn((df.height(), encodings.len()), |(row, f)| {
            encodings[f].value(row)
        });

        // Generate.
        let total_new: usize = plan.values().sum();
        let mut synthetic: Array2<f64> = Array2::zeros((total_new, encodings.len()));
        let mut synthetic_label_rows: Vec<usize> = Vec::with_capacity(total_new);

        for (label, &n_new) in &plan {
            let members = &classes[label];
            let points = matrix.select(Axis(0), members);
            let neighbors: Vec<Vec<usize>> = (0..points.nrows())
                .map(|i| nearest_neighbors(&points, i, self.neighbor_count))
                .collect();

            debug!(
                "Class '{}': {} members, generating {} rows",
                label,
                members.len(),
                n_new
            );

            for _ in 0..n_new {
                let i = self.rng.gen_range(0..points.nrows());
                let j = neighbors[i][self.rng.gen_range(0..neighbors[i].len())];
                let gap: f64 = self.rng.r#gen();
                let (p, q) = (points.row(i), points.row(j));
                synthetic
                    .row_mut(synthetic_label_rows.len())
                    .assign(&(&p + &((&q - &p) * gap)));
                synthetic_label_rows.push(members[0]);
            }

            if let Some(count) = self.class_counts.get_mut(label) {
                *count += n_new;
            }
        }

        // Decode in original column order.
        let mut features = encodings.iter().enumerate();
        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let out = if column.name().as_str() == self.target_column {
                take_rows(series, &synthetic_label_rows)?
            } else {
                let (f, encoding) = features
                    .next()
                    .ok_or_else(|| SynthError::Internal("feature columns out of sync".to_string()))?;
                encoding.decode(series, synthetic.column(f).to_vec())?
            };
            columns.push(out.into_column());
        }

        let synthetic = DataFrame::new(columns)?;
        info!(
            "Neighbor augmentation on '{}': {} synthetic rows",
            self.target_column,
            synthetic.height()
        );
        append_rows(df, synthetic)
    }

    fn extra_params(&self) -> BTreeMap<String, serde_json::Value> {
        let mut params = BTreeMap::new();
        params.insert("target_column".to_string(), self.target_column.clone().into());
        params.insert("neighbor_count".to_string(), self.neighbor_count.into());
        params.insert(
            "sampling_strategy".to_string(),
            self.sampling_strategy.as_str().into(),
        );
        params.insert(
            "class_counts".to_string(),
            serde_json::to_value(&self.class_counts).unwrap_or_default(),
        );
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn imbalanced() -> DataFrame {
        let n_major = 80;
        let n_minor = 20;
        let x: Vec<f64> = (0..n_major)
            .map(|i| i as f64)
            .chain((0..n_minor).map(|i| 1000.0 + i as f64))
            .collect();
        let y: Vec<i64> = (0..n_major).map(|i| (i % 7) as i64).chain((0..n_minor).map(|_| 50)).collect();
        let color: Vec<&str> = (0..n_major)
            .map(|_| "red")
            .chain((0..n_minor).map(|i| if i % 2 == 0 { "blue" } else { "green" }))
            .collect();
        let label: Vec<&str> = (0..n_major).map(|_| "no").chain((0..n_minor).map(|_| "yes")).collect();
        df!("x" => x, "y" => y, "color" => color, "label" => label).unwrap()
    }

    fn label_counts(df: &DataFrame) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for l in df.column("label").unwrap().str().unwrap().into_iter().flatten() {
            *counts.entry(l.to_string()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_auto_balances_to_majority() {
        let df = imbalanced();
        let mut synth = NeighborSynthesizer::new("label", 5, SamplingStrategy::Auto, 42);
        let mut warnings = Vec::new();
        let out = synth.fit_transform(&df, &mut warnings).unwrap();

        assert_eq!(out.height(), 160);
        assert_eq!(label_counts(&out)["no"], 80);
        assert_eq!(label_counts(&out)["yes"], 80);
        assert!(warnings.is_empty());
        assert_eq!(out.get_column_names_str(), df.get_column_names_str());
        assert_eq!(out.schema(), df.schema());
    }

    #[test]
    fn test_originals_are_a_prefix() {
        let df = imbalanced();
        let mut synth = NeighborSynthesizer::new("label", 3, SamplingStrategy::Auto, 1);
        let out = synth.fit_transform(&df, &mut Vec::new()).unwrap();
        assert!(out.slice(0, df.height()).equals_missing(&df));
    }

    #[test]
    fn test_synthetic_rows_stay_inside_class_hull() {
        let df = imbalanced();
        let mut synth = NeighborSynthesizer::new("label", 5, SamplingStrategy::Auto, 7);
        let out = synth.fit_transform(&df, &mut Vec::new()).unwrap();
        let tail = out.slice(100, 60);

        let x = tail.column("x").unwrap().f64().unwrap();
        assert!(x.into_iter().flatten().all(|v| (1000.0..=1019.0).contains(&v)));

        let y = tail.column("y").unwrap().i64().unwrap();
        assert!(y.into_iter().flatten().all(|v| v == 50));

        let colors = tail.column("color").unwrap().str().unwrap();
        assert!(colors.into_iter().flatten().all(|c| c == "blue" || c == "green"));
    }

    #[test]
    fn test_neighbor_count_must_be_below_class_size() {
        let df = imbalanced();
        let mut synth = NeighborSynthesizer::new("label", 20, SamplingStrategy::Auto, 42);
        let err = synth.fit_transform(&df, &mut Vec::new()).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_missing_target_column() {
        let df = imbalanced();
        let mut synth = NeighborSynthesizer::new("nope", 5, SamplingStrategy::Auto, 42);
        let err = synth.fit_transform(&df, &mut Vec::new()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let df = df!("x" => [1.0, 2.0, 3.0], "label" => ["a", "a", "a"]).unwrap();
        let mut synth = NeighborSynthesizer::new("label", 1, SamplingStrategy::Auto, 42);
        let mut warnings = Vec::new();
        let out = synth.fit_transform(&df, &mut warnings).unwrap();
        assert!(out.equals_missing(&df));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_sampling_strategies() {
        let df = df!(
            "x" => (0..18).map(|i| i as f64).collect::<Vec<_>>(),
            "label" => ["a"; 10].into_iter().chain(["b"; 5]).chain(["c"; 3]).collect::<Vec<_>>()
        )
        .unwrap();

        let run = |strategy| {
            let mut synth = NeighborSynthesizer::new("label", 2, strategy, 42);
            label_counts(&synth.fit_transform(&df, &mut Vec::new()).unwrap())
        };

        let minority = run(SamplingStrategy::Minority);
        assert_eq!((minority["a"], minority["b"], minority["c"]), (10, 5, 10));

        let not_majority = run(SamplingStrategy::NotMajority);
        assert_eq!((not_majority["a"], not_majority["b"], not_majority["c"]), (10, 10, 10));

        let all = run(SamplingStrategy::All);
        assert_eq!((all["a"], all["b"], all["c"]), (10, 10, 10));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let df = imbalanced();
        let a = NeighborSynthesizer::new("label", 5, SamplingStrategy::Auto, 9)
            .fit_transform(&df, &mut Vec::new())
            .unwrap();
        let b = NeighborSynthesizer::new("label", 5, SamplingStrategy::Auto, 9)
            .fit_transform(&df, &mut Vec::new())
            .unwrap();
        assert!(a.equals_missing(&b));
    }

    #[test]
    fn test_all_null_feature_stays_null() {
        let df = df!(
            "x" => [1.0, 2.0, 3.0, 4.0, 10.0, 11.0],
            "gap" => [None::<f64>; 6],
            "label" => ["a", "a", "a", "a", "b", "b"]
        )
        .unwrap();
        let mut synth = NeighborSynthesizer::new("label", 1, SamplingStrategy::Auto, 42);
        let out = synth.fit_transform(&df, &mut Vec::new()).unwrap();

        assert_eq!(out.height(), 8);
        assert_eq!(out.column("gap").unwrap().null_count(), 8);
        assert_eq!(out.schema(), df.schema());
    }

    #[test]
    fn test_nearest_neighbors() {
        let pts = ndarray::array![[0.0], [1.0], [5.0], [1.5]];
        assert_eq!(nearest_neighbors(&pts, 0, 2), vec![1, 3]);
    }
}
