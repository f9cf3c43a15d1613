//! CLI entry point: clean a CSV file and append synthetic rows.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use lex_synth::{
    AugmentationConfig, Augmentor, MethodKind, MissingStrategy, OutlierStrategy, PreprocessConfig,
    Preprocessor, SemanticType, compare_datasets, io,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// CLI-compatible missing value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Fill numeric gaps with the column mean
    Mean,
    /// Fill numeric gaps with the column median
    Median,
    /// Fill gaps with the most frequent value
    Mode,
    /// Remove rows with any missing value
    Drop,
    /// Linear interpolation by row position
    Interpolate,
}

impl From<CliMissingStrategy> for MissingStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::Mean => MissingStrategy::Mean,
            CliMissingStrategy::Median => MissingStrategy::Median,
            CliMissingStrategy::Mode => MissingStrategy::Mode,
            CliMissingStrategy::Drop => MissingStrategy::Drop,
            CliMissingStrategy::Interpolate => MissingStrategy::Interpolate,
        }
    }
}

/// CLI-compatible outlier strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierStrategy {
    /// Keep outliers as-is
    None,
    /// Clamp to Q1 - 1.5 IQR and Q3 + 1.5 IQR
    Iqr,
    /// Clamp to mean +/- 3 standard deviations
    Zscore,
    /// Clamp to the range of values an isolation forest considers normal
    IsolationForest,
}

impl From<CliOutlierStrategy> for OutlierStrategy {
    fn from(cli: CliOutlierStrategy) -> Self {
        match cli {
            CliOutlierStrategy::None => OutlierStrategy::None,
            CliOutlierStrategy::Iqr => OutlierStrategy::Iqr,
            CliOutlierStrategy::Zscore => OutlierStrategy::Zscore,
            CliOutlierStrategy::IsolationForest => OutlierStrategy::IsolationForest,
        }
    }
}

/// CLI-compatible augmentation method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMethod {
    /// Interpolate between same-class nearest neighbors (needs --target-column)
    Neighbor,
    /// Sample from a Gaussian mixture fitted to the numeric columns
    Density,
    /// Sample every column independently
    Independent,
}

impl From<CliMethod> for MethodKind {
    fn from(cli: CliMethod) -> Self {
        match cli {
            CliMethod::Neighbor => MethodKind::Neighbor,
            CliMethod::Density => MethodKind::Density,
            CliMethod::Independent => MethodKind::Independent,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Tabular data cleaning and synthetic row generation",
    long_about = "Cleans a CSV dataset and appends synthetic rows.\n\n\
                  EXAMPLES:\n  \
                  # Add 50% more rows from a Gaussian mixture\n  \
                  lex-synth -i data.csv -o augmented.csv --method density --ratio 0.5\n\n  \
                  # Balance the classes of a label column\n  \
                  lex-synth -i data.csv --method neighbor --target-column label\n\n  \
                  # Clean first, then grow to 10000 rows\n  \
                  lex-synth -i data.csv --missing-strategy median --outlier-strategy iqr \\\n    \
                  --method independent --target-rows 10000"
)]
struct Args {
    /// Path to the CSV file to augment
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the augmented CSV
    ///
    /// Defaults to <input>_augmented.csv next to the input file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Strategy for missing values
    #[arg(long, value_enum, default_value = "mean")]
    missing_strategy: CliMissingStrategy,

    /// Strategy for outliers in numeric columns
    #[arg(long, value_enum, default_value = "none")]
    outlier_strategy: CliOutlierStrategy,

    /// Declare a column type, e.g. `--column-type price=numeric` (repeatable)
    #[arg(long = "column-type", value_name = "COLUMN=TYPE")]
    column_types: Vec<String>,

    /// Skip cleaning and augment the input as loaded
    #[arg(long)]
    no_preprocess: bool,

    /// Augmentation method
    #[arg(short, long, value_enum, default_value = "density")]
    method: CliMethod,

    /// Label column balanced by the neighbor method
    #[arg(short, long)]
    target_column: Option<String>,

    /// Nearest neighbors considered by the neighbor method
    #[arg(short = 'k', long, default_value = "5")]
    neighbor_count: usize,

    /// Classes oversampled by the neighbor method (auto, minority, not_majority, all)
    #[arg(long, default_value = "auto")]
    sampling_strategy: String,

    /// Synthetic rows relative to the input row count
    #[arg(long, conflicts_with = "target_rows")]
    ratio: Option<f64>,

    /// Total row count wanted after augmentation
    #[arg(long)]
    target_rows: Option<usize>,

    /// Random seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON summary.
    #[arg(long)]
    json: bool,

    /// Write a before/after comparison report (JSON) to this path
    #[arg(short, long)]
    report: Option<PathBuf>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    info!("Loading dataset from: {}", args.input.display());
    let raw = io::read_csv_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    info!("Dataset loaded successfully: {:?}", raw.shape());

    let (cleaned, preprocessing) = if args.no_preprocess {
        (raw, None)
    } else {
        let mut preprocessor = Preprocessor::new(build_preprocess_config(&args)?);
        let cleaned = preprocessor.fit_transform(&raw)?;
        (cleaned, Some(preprocessor.summary()))
    };

    let mut augmentor = Augmentor::new(build_augmentation_config(&args)?)?;
    let mut augmented = match augmentor.fit_transform(&cleaned) {
        Ok(df) => df,
        Err(e) => {
            error!("Augmentation failed: {}", e);
            return Err(anyhow!("Augmentation failed: {}", e));
        }
    };
    for w in augmentor.warnings() {
        warn!("{}", w);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let file = std::fs::File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    io::write_csv(&mut augmented, file)?;
    info!("Augmented dataset saved: {}", output.display());

    if let Some(report_path) = &args.report {
        let report = compare_datasets(&cleaned, &augmented)?;
        std::fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
        info!("Comparison report saved: {}", report_path.display());
    }

    let summary = augmentor.summary();
    if args.json {
        let out = serde_json::json!({
            "output": output.display().to_string(),
            "preprocessing": preprocessing,
            "augmentation": summary,
            "warnings": augmentor.warnings(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&augmented, &summary, preprocessing.as_ref(), &output);
    }

    Ok(())
}

fn build_preprocess_config(args: &Args) -> Result<PreprocessConfig> {
    let mut builder = PreprocessConfig::builder()
        .missing_strategy(args.missing_strategy.into())
        .outlier_strategy(args.outlier_strategy.into())
        .random_seed(args.seed);

    for entry in &args.column_types {
        let (column, ty) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("--column-type expects COLUMN=TYPE, got '{}'", entry))?;
        let ty: SemanticType = ty.parse().map_err(|e: String| anyhow!(e))?;
        builder = builder.column_type(column.trim(), ty);
    }

    Ok(builder.build()?)
}

fn build_augmentation_config(args: &Args) -> Result<AugmentationConfig> {
    let method: MethodKind = args.method.into();
    let mut builder = AugmentationConfig::builder()
        .method_kind(method)
        .neighbor_count(args.neighbor_count)
        .sampling_strategy(args.sampling_strategy.clone())
        .random_seed(args.seed);

    if let Some(target) = &args.target_column {
        builder = builder.target_column(target);
    }
    if method != MethodKind::Neighbor {
        if let Some(ratio) = args.ratio {
            builder = builder.ratio(ratio);
        }
        if let Some(rows) = args.target_rows {
            builder = builder.target_rows(rows);
        }
    }

    Ok(builder.build()?)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    input.with_file_name(format!("{stem}_augmented.csv"))
}

/// Human-readable summary.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn print_summary(
    augmented: &DataFrame,
    summary: &lex_synth::AugmentationSummary,
    preprocessing: Option<&lex_synth::PreprocessingSummary>,
    output: &Path,
) {
    println!("\n{}", "=".repeat(60));
    println!("AUGMENTATION COMPLETE");
    println!("{}\n", "=".repeat(60));

    if let Some(pre) = preprocessing {
        println!("PREPROCESSING");
        println!("{}", "-".repeat(40));
        println!("  Missing values: {}", pre.missing_strategy.as_str());
        println!("  Outliers:       {}", pre.outlier_strategy.as_str());
        println!("  Rows:           {} -> {}", pre.rows_before, pre.rows_after);
        println!("  Fill values:    {}", pre.fill_values.len());
        println!("  Clamp bounds:   {}", pre.clamp_bounds.len());
        for w in &pre.warnings {
            println!("  ! {}", w);
        }
        println!();
    }

    println!("AUGMENTATION");
    println!("{}", "-".repeat(40));
    println!("  Method:         {}", summary.method);
    if let Some(target) = &summary.target_column {
        println!("  Target column:  {}", target);
    }
    println!("  Seed:           {}", summary.random_seed);
    println!("  Original rows:  {}", summary.original_rows);
    println!("  Synthetic rows: {}", summary.synthetic_rows);
    println!("  Total rows:     {}", summary.total_rows);
    println!("  Ratio:          {:.3}", summary.ratio);
    for (key, value) in &summary.additional_params {
        println!("  {:<15} {}", format!("{key}:"), value);
    }
    println!();

    println!("Columns: {}", augmented.width());
    println!("Saved to: {}", output.display());
}
