//! Error types for the cleaning and synthesis pipeline.
//!
//! Structural and configuration problems surface as [`SynthError`] and abort
//! the fit that raised them. Numeric and statistical edge cases never become
//! errors; they are reported as [`crate::types::ProcessingWarning`] values and
//! the affected step degrades to a no-op.
//!
//! Errors are serializable so a request-serving layer can forward them to a
//! client as `{ "code", "message" }` pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for preprocessing and augmentation.
#[derive(Error, Debug)]
pub enum SynthError {
    /// Configuration is malformed (e.g. ratio and target rows both given).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A setting required by the selected method is absent.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// The requested augmentation method is not recognized, or does not
    /// support the requested operation.
    #[error("Unsupported augmentation method: {0}")]
    UnsupportedMethod(String),

    /// A parameter is numerically infeasible for the data at hand.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// `transform` or sampling was called before a successful fit.
    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    /// Internal error (a broken invariant inside the crate).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SynthError>,
    },
}

impl SynthError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SynthError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`SynthError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SynthError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable error code for clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::MissingConfig(_) => "MISSING_CONFIG",
            Self::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::NotFitted(_) => "NOT_FITTED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error belongs to the configuration family
    /// (malformed, missing or unsupported settings).
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::MissingConfig(_) | Self::UnsupportedMethod(_) => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }

    /// Check if this error is a numerically infeasible parameter.
    pub fn is_invalid_parameter(&self) -> bool {
        match self {
            Self::InvalidParameter { .. } => true,
            Self::WithContext { source, .. } => source.is_invalid_parameter(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for SynthError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("SynthError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SynthError::Polars(e).with_context(context))
    }
}
