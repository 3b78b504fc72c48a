//! Binned aggregation over point sets
//!
//! Thin layer over [`overplot_stats::bin2d`] that feeds it the columns of a
//! [`PointSet`], checks the value and ordering preconditions up front, and
//! builds per-group facets on shared bounds.

use overplot_stats::{bin2d, BinParams, BinnedGrid, Bins, Bounds, Reduction};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{OverplotError, OverplotResult};
use crate::point::{GroupLabel, PointSet};

/// What to bin and how to reduce it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    pub bins: Bins,
    /// Explicit bounds; defaults to the extent of the point set
    pub bounds: Option<Bounds>,
    pub reduction: Reduction,
}

impl BinSpec {
    /// Count points on a `bins x bins` grid
    pub fn count(bins: usize) -> Self {
        Self {
            bins: Bins::Uniform(bins),
            bounds: None,
            reduction: Reduction::Count,
        }
    }

    pub fn with_bins(mut self, bins_x: usize, bins_y: usize) -> Self {
        self.bins = Bins::Axes {
            x: bins_x,
            y: bins_y,
        };
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    fn params(&self) -> BinParams {
        BinParams {
            bins: self.bins,
            bounds: self.bounds,
            reduction: self.reduction,
        }
    }
}

/// One facet of a grouped aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub group: GroupLabel,
    pub grid: BinnedGrid,
}

fn check_values(points: &PointSet, spec: &BinSpec) -> OverplotResult<()> {
    if !spec.reduction.needs_values() {
        return Ok(());
    }
    let missing = points.missing_values();
    if missing > 0 {
        return Err(OverplotError::invalid(
            "value",
            format!(
                "{} reduction needs a value on every point, {} of {} have none",
                spec.reduction.name(),
                missing,
                points.len()
            ),
        ));
    }
    Ok(())
}

/// Bin a point set and reduce every non-empty cell
///
/// # Errors
///
/// InvalidParameter for a zero-sized grid, invalid bounds, a value reduction
/// on points lacking values, or [`Reduction::ShuffledFirst`] on a point set
/// that was not produced by [`PointSet::shuffled`].
pub fn aggregate(points: &PointSet, spec: &BinSpec) -> OverplotResult<BinnedGrid> {
    // Parameter errors take precedence over data errors
    spec.bins.resolve()?;
    check_values(points, spec)?;

    let values = spec.reduction.needs_values().then(|| points.values());
    let grid = bin2d(
        points.xs(),
        points.ys(),
        values,
        points.order().input_order(),
        &spec.params(),
    )?;

    if grid.dropped > 0 {
        warn!(
            dropped = grid.dropped,
            total = points.len(),
            "points fell outside the grid bounds or had non-finite coordinates"
        );
    }
    debug!(
        reduction = spec.reduction.name(),
        bins_x = grid.bins_x,
        bins_y = grid.bins_y,
        cells = grid.len(),
        assigned = grid.assigned,
        "aggregated point set"
    );
    Ok(grid)
}

/// One grid per group label, all on the same bounds
///
/// Bounds are the explicit ones from `spec`, or else the extent of the whole
/// point set, so the facets line up cell for cell.
pub fn aggregate_by_group(points: &PointSet, spec: &BinSpec) -> OverplotResult<Vec<Facet>> {
    spec.bins.resolve()?;
    check_values(points, spec)?;

    let Some(bounds) = spec.bounds.or_else(|| points.bounds()) else {
        return Ok(Vec::new());
    };
    let shared = spec.with_bounds(bounds);

    points
        .groups()
        .into_iter()
        .map(|group| {
            let grid = aggregate(&points.filter_group(group), &shared)?;
            Ok(Facet { group, grid })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    fn scenario() -> PointSet {
        [(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (9.0, 9.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(x, y, (i / 2) as u32).with_value(i as f64))
            .collect()
    }

    #[test]
    fn test_scenario() {
        let spec = BinSpec::count(2).with_bounds(Bounds::square(0.0, 10.0));
        let grid = aggregate(&scenario(), &spec).unwrap();

        assert_eq!(grid.get(0, 0).unwrap().count, 3);
        assert_eq!(grid.get(1, 1).unwrap().count, 1);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_zero_bins_is_invalid_parameter() {
        let err = aggregate(&scenario(), &BinSpec::count(0)).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_empty_point_set() {
        let grid = aggregate(&PointSet::new(), &BinSpec::count(8)).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_missing_values_rejected() {
        let mut points = scenario();
        points.push(Point::new(2.0, 2.0, 0));
        let spec = BinSpec::count(2).with_reduction(Reduction::Mean);
        let err = aggregate(&points, &spec).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("1 of 5"));

        // Count does not read values
        assert!(aggregate(&points, &BinSpec::count(2)).is_ok());
    }

    #[test]
    fn test_shuffled_first_checks_order() {
        let points = scenario();
        let spec = BinSpec::count(2).with_reduction(Reduction::ShuffledFirst);

        assert!(aggregate(&points, &spec).unwrap_err().is_invalid_parameter());
        let grid = aggregate(&points.shuffled(4), &spec).unwrap();
        assert_eq!(grid.total_count(), 4);
    }

    #[test]
    fn test_facets_share_bounds() {
        let points = scenario();
        let facets = aggregate_by_group(&points, &BinSpec::count(3)).unwrap();

        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].group, GroupLabel(0));
        assert_eq!(facets[0].grid.bounds, facets[1].grid.bounds);
        assert_eq!(facets[0].grid.bounds, points.bounds().unwrap());
        let total: u64 = facets.iter().map(|f| f.grid.total_count()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_facets_of_empty_set() {
        assert!(aggregate_by_group(&PointSet::new(), &BinSpec::count(3))
            .unwrap()
            .is_empty());
    }
}
