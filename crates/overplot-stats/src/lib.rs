//! overplot-stats - Numeric kernels for overplot-safe scatter visualization
//!
//! This crate works on plain column slices (`&[f64]`) so it can be fed from
//! any columnar point store:
//!
//! - **Binning**: single-pass 2D aggregation into a fixed grid of cells
//!   (count, sum, mean, min, max, or one selected member per cell)
//! - **KDE**: 2D Gaussian kernel density estimate evaluated on a regular grid
//! - **Summary**: per-axis summary statistics used for extents and bandwidths
//!
//! # Design Philosophy
//!
//! Binning is preferred over drawing every point because it:
//! - Runs in time linear in the number of points
//! - Produces output whose size depends only on the grid resolution
//! - Shows true density where raw markers would saturate

pub mod binning;
pub mod bounds;
pub mod error;
pub mod kde;
pub mod summary;

pub use binning::*;
pub use bounds::*;
pub use error::*;
pub use kde::*;
pub use summary::*;
