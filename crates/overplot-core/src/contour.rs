//! Density contour precomputation
//!
//! Evaluates a kernel density estimate of a point set on a regular grid and
//! flattens it into a long-form `(x, y, density)` table that a charting
//! library can contour directly. The table can be replicated once per group
//! so that every facet of a grouped chart overlays the same whole-population
//! contour.

use overplot_stats::{kde2d, Bandwidth, Bounds, DensityGrid};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OverplotResult;
use crate::point::{GroupLabel, PointSet};

/// Grid and kernel settings for [`density_contours`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSpec {
    /// Grid points per axis (at least 2)
    pub resolution: usize,
    pub bandwidth: Bandwidth,
    /// Grid extent; defaults to the extent of the data
    pub bounds: Option<Bounds>,
}

impl ContourSpec {
    pub fn new(resolution: usize, bandwidth: Bandwidth) -> Self {
        Self {
            resolution,
            bandwidth,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl Default for ContourSpec {
    fn default() -> Self {
        Self::new(100, Bandwidth::Scott)
    }
}

/// One row of the long-form table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourRow {
    pub x: f64,
    pub y: f64,
    pub density: f64,
    /// Facet the row is replicated for, if any
    pub group: Option<GroupLabel>,
}

/// Long-form density table, rows in grid row-major order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContourTable {
    pub resolution: usize,
    pub rows: Vec<ContourRow>,
}

impl ContourTable {
    /// Flatten a density grid into untagged rows
    pub fn from_grid(grid: &DensityGrid) -> Self {
        Self {
            resolution: grid.resolution(),
            rows: grid
                .iter()
                .map(|(x, y, density)| ContourRow {
                    x,
                    y,
                    density,
                    group: None,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy every row once per label, tagging each copy with its label
    pub fn replicate_for_groups(&self, labels: &[GroupLabel]) -> ContourTable {
        let rows = labels
            .iter()
            .flat_map(|&label| {
                self.rows.iter().map(move |row| ContourRow {
                    group: Some(label),
                    ..*row
                })
            })
            .collect();
        ContourTable {
            resolution: self.resolution,
            rows,
        }
    }

    /// Rows tagged with one label
    pub fn rows_for(&self, label: GroupLabel) -> impl Iterator<Item = &ContourRow> + '_ {
        self.rows.iter().filter(move |row| row.group == Some(label))
    }

    pub fn max_density(&self) -> f64 {
        self.rows.iter().map(|r| r.density).fold(0.0, f64::max)
    }
}

/// KDE of the whole point set as a long-form table
///
/// # Errors
///
/// InvalidParameter if `resolution < 2` or the bandwidth factor is not
/// positive; EmptyInput or Degenerate from the estimator.
pub fn density_contours(points: &PointSet, spec: &ContourSpec) -> OverplotResult<ContourTable> {
    let grid = kde2d(
        points.xs(),
        points.ys(),
        spec.resolution,
        spec.bandwidth,
        spec.bounds,
    )?;
    debug!(
        resolution = spec.resolution,
        sample_size = grid.sample_size,
        kernel_std_x = grid.kernel_std.0,
        kernel_std_y = grid.kernel_std.1,
        "estimated density grid"
    );
    Ok(ContourTable::from_grid(&grid))
}

/// Whole-population KDE replicated once per group label of the point set
pub fn density_contours_faceted(
    points: &PointSet,
    spec: &ContourSpec,
) -> OverplotResult<ContourTable> {
    let table = density_contours(points, spec)?;
    Ok(table.replicate_for_groups(&points.groups()))
}
