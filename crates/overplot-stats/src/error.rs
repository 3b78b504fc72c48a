//! Error types for overplot-stats

use thiserror::Error;

/// Errors raised by the numeric kernels
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// A parameter failed eager validation
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// No finite points to work with
    #[error("Input contains no finite points")]
    EmptyInput,

    /// All points share one coordinate along an axis
    #[error("Degenerate input: zero variance along the {axis} axis")]
    Degenerate { axis: &'static str },
}

impl StatsError {
    /// Shorthand for an [`StatsError::InvalidParameter`]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        StatsError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for stats operations
pub type StatsResult<T> = Result<T, StatsError>;
