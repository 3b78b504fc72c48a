//! Error types for overplot-core
//!
//! Provides error handling for:
//! - Parameter validation (sampling, binning, contours)
//! - Numeric kernel failures
//! - Configuration loading
//! - Raster output

use std::path::PathBuf;

use overplot_stats::StatsError;
use thiserror::Error;

/// Main error type for overplot operations
#[derive(Error, Debug)]
pub enum OverplotError {
    /// Eager parameter validation failed
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Numeric kernel errors
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Raster encoding or writing failed
    #[error("Failed to write raster to {}: {message}", .path.display())]
    Raster { path: PathBuf, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OverplotError {
    /// Shorthand for an [`OverplotError::InvalidParameter`]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        OverplotError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a parameter error, from either layer
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            OverplotError::InvalidParameter { .. }
                | OverplotError::Stats(StatsError::InvalidParameter { .. })
        )
    }
}

impl From<toml::de::Error> for OverplotError {
    fn from(err: toml::de::Error) -> Self {
        OverplotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OverplotError {
    fn from(err: serde_json::Error) -> Self {
        OverplotError::Config(err.to_string())
    }
}

/// Result type alias for overplot operations
pub type OverplotResult<T> = Result<T, OverplotError>;

/// Validation utilities
pub mod validation {
    use super::*;

    /// Require a strictly positive count
    pub fn validate_count(name: &str, count: usize) -> OverplotResult<()> {
        if count == 0 {
            return Err(OverplotError::invalid(name, "must be positive"));
        }
        Ok(())
    }

    /// Require a strictly positive, finite value
    pub fn validate_positive(name: &str, value: f64) -> OverplotResult<()> {
        if !(value.is_finite() && value > 0.0) {
            return Err(OverplotError::invalid(
                name,
                format!("must be positive and finite, got {}", value),
            ));
        }
        Ok(())
    }

    /// Require a finite value
    pub fn validate_finite(name: &str, value: f64) -> OverplotResult<()> {
        if !value.is_finite() {
            return Err(OverplotError::invalid(
                name,
                format!("must be finite, got {}", value),
            ));
        }
        Ok(())
    }
}
