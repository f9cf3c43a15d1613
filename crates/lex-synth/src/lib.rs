//! Tabular Data Cleaning and Synthetic Row Generation
//!
//! A data augmentation library built with Rust and Polars.
//!
//! # Overview
//!
//! Two stages, each fitted once per dataset and owned by a single instance:
//!
//! - **Preprocessing** ([`Preprocessor`]): type coercion, missing value
//!   handling (mean, median, mode, drop, interpolate) and outlier clamping
//!   (IQR, z-score, isolation forest). Fill values and clamp bounds learned
//!   during the fit are reused by [`Preprocessor::transform`].
//! - **Augmentation** ([`Augmentor`]): appends synthetic rows using one of
//!   three methods:
//!   - `neighbor`: interpolation between same-class nearest neighbors to
//!     balance a label column
//!   - `density`: Gaussian mixture over standardized numeric columns
//!   - `independent`: each column sampled from its own distribution
//!
//! Every run is seeded; the same input, configuration and seed give the same
//! output.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_synth::{
//!     AugmentationConfig, Augmentor, MissingStrategy, OutlierStrategy, PreprocessConfig,
//!     Preprocessor, io,
//! };
//!
//! let raw = io::read_csv_bytes(&std::fs::read("data.csv")?)?;
//!
//! let mut preprocessor = Preprocessor::new(
//!     PreprocessConfig::builder()
//!         .missing_strategy(MissingStrategy::Median)
//!         .outlier_strategy(OutlierStrategy::Iqr)
//!         .build()?,
//! );
//! let cleaned = preprocessor.fit_transform(&raw)?;
//!
//! let mut augmentor = Augmentor::new(
//!     AugmentationConfig::builder()
//!         .method("neighbor")
//!         .target_column("label")
//!         .neighbor_count(5)
//!         .build()?,
//! )?;
//! let augmented = augmentor.fit_transform(&cleaned)?;
//!
//! println!("{}", serde_json::to_string_pretty(&augmentor.summary())?);
//! ```
//!
//! # Errors and warnings
//!
//! Configuration problems and infeasible parameters fail with a
//! [`SynthError`]. Inputs that give a step nothing to do (no numeric columns
//! for the density method, a single class for the neighbor method, a column
//! that cannot be converted) are reported as [`ProcessingWarning`]s and the
//! data passes through unchanged.

pub mod anomaly;
pub mod augment;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use augment::{
    Augmentor, DensitySynthesizer, IndependentSampler, NeighborSynthesizer, Synthesizer, augment,
};
pub use cleaner::TypeCoercer;
pub use config::{
    AugmentationAmount, AugmentationConfig, AugmentationConfigBuilder, AugmentationMethod,
    AugmentationRequest, ConfigValidationError, MethodKind, MissingStrategy, OutlierStrategy,
    PreprocessConfig, PreprocessConfigBuilder, SamplingStrategy,
};
pub use error::{Result as SynthResult, ResultExt, SynthError};
pub use imputers::{MissingValueImputer, StatisticalImputer};
pub use pipeline::{OutlierClamper, Preprocessor};
pub use report::{ComparisonReport, compare_datasets};
pub use types::{
    AugmentationSummary, ClampBounds, ColumnTypeMap, FillValue, FitState, PreprocessingSummary,
    ProcessingWarning, SemanticType,
};
