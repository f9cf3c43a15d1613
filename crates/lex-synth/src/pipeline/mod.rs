//! Preprocessing pipeline.
//!
//! [`Preprocessor`] runs type coercion, missing value handling and outlier
//! clamping in that fixed order.

pub mod outliers;
mod preprocessor;

pub use outliers::OutlierClamper;
pub use preprocessor::Preprocessor;
