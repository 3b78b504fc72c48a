//! Configuration for the overplot walkthrough
//!
//! Centralized configuration for sampling sizes, grid resolutions, contour
//! settings and output, plus the `IS_NOT_BINDER` switch that gates the
//! memory-heavy examples.

use std::path::{Path, PathBuf};

use overplot_stats::Bandwidth;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::colormap::{get_colormap, ColorScale};
use crate::error::{OverplotError, OverplotResult};
use crate::sampler::{default_mixture, GaussianSpec};

/// Environment variable enabling the examples with >= 10 million points
pub const LARGE_EXAMPLES_ENV: &str = "IS_NOT_BINDER";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Run the memory-heavy examples
    pub large_examples: bool,
    pub sampling: SamplingConfig,
    pub binning: BinningConfig,
    pub contour: ContourConfig,
    pub output: OutputConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            large_examples: false,
            sampling: SamplingConfig::default(),
            binning: BinningConfig::default(),
            contour: ContourConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Synthetic data settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub seed: u64,
    /// Points per cluster for the regular examples
    pub points_per_cluster: usize,
    /// Points per cluster for the large examples
    pub large_points_per_cluster: usize,
    /// Mixture components
    pub clusters: Vec<GaussianSpec>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            points_per_cluster: 10_000,
            large_points_per_cluster: 2_000_000,
            clusters: default_mixture(),
        }
    }
}

/// Binned aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    pub bins_x: usize,
    pub bins_y: usize,
    /// Built-in colormap name
    pub colormap: String,
    pub scale: ColorScale,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            bins_x: 200,
            bins_y: 200,
            colormap: "fire".to_string(),
            scale: ColorScale::Log,
        }
    }
}

/// Density contour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub resolution: usize,
    pub bandwidth: Bandwidth,
    /// Points drawn from the shuffled data to feed the estimator
    pub sample_size: usize,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            resolution: 100,
            bandwidth: Bandwidth::Scott,
            sample_size: 5_000,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the long-form tables and rasters
    pub dir: PathBuf,
    /// Write PNG rasters when the raster capability is compiled in
    pub write_raster: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("overplot-out"),
            write_raster: true,
        }
    }
}

/// Parse a boolean switch value (`1/true/yes/on`, `0/false/no/off`)
///
/// Anything else, including an empty string, is `None`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl DemoConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> OverplotResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> OverplotResult<String> {
        toml::to_string_pretty(self).map_err(|e| OverplotError::Config(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> OverplotResult<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> OverplotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a TOML file
    pub fn load(path: &Path) -> OverplotResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply the `IS_NOT_BINDER` environment switch
    pub fn apply_env(&mut self) {
        self.apply_large_examples_flag(std::env::var(LARGE_EXAMPLES_ENV).ok().as_deref());
    }

    /// Apply a raw value of the large-examples switch; unparsable values are ignored
    pub fn apply_large_examples_flag(&mut self, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };
        match parse_flag(raw) {
            Some(enabled) => self.large_examples = enabled,
            None => warn!(
                variable = LARGE_EXAMPLES_ENV,
                value = raw,
                "ignoring unrecognised value"
            ),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> OverplotResult<()> {
        if self.sampling.points_per_cluster == 0 || self.sampling.large_points_per_cluster == 0 {
            return Err(OverplotError::Config(
                "points per cluster must be positive".to_string(),
            ));
        }
        if self.sampling.clusters.is_empty() {
            return Err(OverplotError::Config(
                "at least one cluster is required".to_string(),
            ));
        }
        if self.binning.bins_x == 0 || self.binning.bins_y == 0 {
            return Err(OverplotError::Config("bins must be positive".to_string()));
        }
        if get_colormap(&self.binning.colormap).is_none() {
            return Err(OverplotError::Config(format!(
                "unknown colormap '{}'",
                self.binning.colormap
            )));
        }
        if self.contour.resolution < 2 {
            return Err(OverplotError::Config(
                "contour resolution must be at least 2".to_string(),
            ));
        }
        if let Bandwidth::Factor(f) = self.contour.bandwidth {
            if !(f.is_finite() && f > 0.0) {
                return Err(OverplotError::Config(
                    "contour bandwidth must be positive".to_string(),
                ));
            }
        }
        if self.contour.sample_size == 0 {
            return Err(OverplotError::Config(
                "contour sample size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
