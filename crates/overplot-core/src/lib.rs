//! overplot-core - Overplot-safe preparation of large 2D scatter datasets
//!
//! This crate turns point clouds into tables a charting library can draw
//! without the distortion of densely stacked markers.
//!
//! # Key Components
//!
//! - **PointSet**: columnar labelled points with an explicit shuffle state
//! - **Sampler**: seeded Gaussian mixtures for synthetic data
//! - **Aggregate**: linear-time binned aggregation, optionally faceted by group
//! - **Contour**: KDE grids flattened into long-form `(x, y, density)` tables
//! - **Colormap**: color scales over present cells (linear, log, eq-hist)
//! - **Raster**: RGBA/PNG handoff of a shaded grid (PNG behind the `raster` feature)
//! - **Config**: walkthrough settings and the `IS_NOT_BINDER` switch
//!
//! # Data flow
//!
//! Sampler → {raw scatter | aggregate → colormap/raster | contour}. Every
//! operation is a pure function of its inputs; nothing is cached.

pub mod aggregate;
pub mod colormap;
pub mod config;
pub mod contour;
pub mod error;
pub mod point;
pub mod raster;
pub mod sampler;

pub use aggregate::*;
pub use colormap::*;
pub use config::*;
pub use contour::*;
pub use error::*;
pub use point::*;
pub use sampler::*;

// Kernel types that appear in this crate's signatures
pub use overplot_stats::{Bandwidth, BinnedGrid, Bins, Bounds, Cell, Reduction};

// raster module is accessed via the raster:: prefix
