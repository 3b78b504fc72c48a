//! 2D Gaussian kernel density estimation on a regular grid
//!
//! The estimate at `(gx, gy)` is
//!
//! ```text
//! f(gx, gy) = 1 / (n * 2π * hx * hy) * Σ exp(-½((gx - xi)/hx)² - ½((gy - yi)/hy)²)
//! ```
//!
//! with per-axis kernel widths `hx = factor * std(x)` and
//! `hy = factor * std(y)`. The factor comes from a [`Bandwidth`] rule.
//!
//! Evaluation is exact (no binning of the input), costing
//! O(resolution² * n). Feed a thinned sample when n is large.

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{StatsError, StatsResult};
use crate::summary::SummaryStats;

/// Dimensionality used by the bandwidth rules
const DIMS: f64 = 2.0;

/// Kernel bandwidth selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Bandwidth {
    /// Scott's rule: `n^(-1/(d+4))`
    #[default]
    Scott,
    /// Silverman's rule: `(n(d+2)/4)^(-1/(d+4))`
    Silverman,
    /// Fixed multiple of each axis' standard deviation
    Factor(f64),
}

impl Bandwidth {
    /// Scale factor applied to the per-axis standard deviation
    pub fn factor(&self, n: usize) -> StatsResult<f64> {
        let n = n.max(1) as f64;
        match *self {
            Bandwidth::Scott => Ok(n.powf(-1.0 / (DIMS + 4.0))),
            Bandwidth::Silverman => Ok((n * (DIMS + 2.0) / 4.0).powf(-1.0 / (DIMS + 4.0))),
            Bandwidth::Factor(f) if f.is_finite() && f > 0.0 => Ok(f),
            Bandwidth::Factor(f) => Err(StatsError::invalid(
                "bandwidth",
                format!("must be positive and finite, got {}", f),
            )),
        }
    }
}

/// Density values on a `resolution x resolution` grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityGrid {
    /// Grid x coordinates (endpoints inclusive)
    pub xs: Vec<f64>,
    /// Grid y coordinates (endpoints inclusive)
    pub ys: Vec<f64>,
    /// Kernel standard deviation along x and y
    pub kernel_std: (f64, f64),
    /// Number of points the estimate was built from
    pub sample_size: usize,
    /// Row-major densities (y outer, x inner)
    density: Vec<f64>,
}

impl DensityGrid {
    /// Points per axis
    pub fn resolution(&self) -> usize {
        self.xs.len()
    }

    /// Density at grid row `row` (y index) and column `col` (x index)
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.ys.len() || col >= self.xs.len() {
            return None;
        }
        Some(self.density[row * self.xs.len() + col])
    }

    /// Raw row-major densities
    pub fn densities(&self) -> &[f64] {
        &self.density
    }

    pub fn max_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0, f64::max)
    }

    /// Riemann-sum approximation of the integral over the grid
    pub fn integral(&self) -> f64 {
        let dx = grid_step(&self.xs);
        let dy = grid_step(&self.ys);
        self.density.iter().sum::<f64>() * dx * dy
    }

    /// `(x, y, density)` triples in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        let nx = self.xs.len();
        self.density
            .iter()
            .enumerate()
            .map(move |(i, &d)| (self.xs[i % nx], self.ys[i / nx], d))
    }
}

fn grid_step(coords: &[f64]) -> f64 {
    match (coords.first(), coords.last()) {
        (Some(lo), Some(hi)) if coords.len() > 1 => (hi - lo) / (coords.len() - 1) as f64,
        _ => 0.0,
    }
}

/// `n` evenly spaced values from `lo` to `hi` inclusive
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            // Interpolate instead of stepping so hi - lo may exceed f64::MAX
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    let f = i as f64 / last;
                    lo * (1.0 - f) + hi * f
                })
                .collect()
        }
    }
}

/// Densities along one grid row
fn evaluate_row(gy: f64, xs: &[f64], px: &[f64], py: &[f64], hx: f64, hy: f64, norm: f64) -> Vec<f64> {
    let wy: Vec<f64> = py
        .iter()
        .map(|&v| {
            let u = (gy - v) / hy;
            (-0.5 * u * u).exp()
        })
        .collect();

    xs.iter()
        .map(|&gx| {
            px.iter()
                .zip(wy.iter())
                .map(|(&v, &w)| {
                    let u = (gx - v) / hx;
                    w * (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Evaluate a 2D Gaussian KDE of `x`/`y` on a regular grid
///
/// The grid spans `bounds`, or the extent of the finite points when `None`.
/// Points with a non-finite coordinate are ignored.
///
/// # Errors
///
/// - [`StatsError::InvalidParameter`] if `resolution < 2`, the bandwidth
///   factor is not positive, lengths differ, or bounds are invalid
/// - [`StatsError::EmptyInput`] if no finite point remains
/// - [`StatsError::Degenerate`] if an axis has zero or non-finite variance
pub fn kde2d(
    x: &[f64],
    y: &[f64],
    resolution: usize,
    bandwidth: Bandwidth,
    bounds: Option<Bounds>,
) -> StatsResult<DensityGrid> {
    if resolution < 2 {
        return Err(StatsError::invalid(
            "resolution",
            format!("must be at least 2, got {}", resolution),
        ));
    }
    if x.len() != y.len() {
        return Err(StatsError::invalid(
            "y",
            format!("length {} does not match x length {}", y.len(), x.len()),
        ));
    }
    if let Some(bounds) = &bounds {
        bounds.validate()?;
    }

    let (px, py): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .unzip();

    let factor = bandwidth.factor(px.len())?;
    if px.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let sx = SummaryStats::from_data(&px);
    let sy = SummaryStats::from_data(&py);
    // Spreads beyond f64::MAX overflow the variance; no kernel width fits them
    if !(sx.std_dev.is_finite() && sx.std_dev > 0.0) {
        return Err(StatsError::Degenerate { axis: "x" });
    }
    if !(sy.std_dev.is_finite() && sy.std_dev > 0.0) {
        return Err(StatsError::Degenerate { axis: "y" });
    }

    let hx = factor * sx.std_dev;
    let hy = factor * sy.std_dev;
    let extent = bounds.unwrap_or_else(|| Bounds::new(sx.min, sx.max, sy.min, sy.max));
    let xs = linspace(extent.x_min, extent.x_max, resolution);
    let ys = linspace(extent.y_min, extent.y_max, resolution);
    let norm = 1.0 / (px.len() as f64 * 2.0 * std::f64::consts::PI * hx * hy);

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = {
        use rayon::prelude::*;
        ys.par_iter()
            .map(|&gy| evaluate_row(gy, &xs, &px, &py, hx, hy, norm))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = ys
        .iter()
        .map(|&gy| evaluate_row(gy, &xs, &px, &py, hx, hy, norm))
        .collect();

    Ok(DensityGrid {
        xs,
        ys,
        kernel_std: (hx, hy),
        sample_size: px.len(),
        density: rows.into_iter().flatten().collect(),
    })
}
