//! 2D binned aggregation
//!
//! Partitions the plane spanned by a point set into `bins_x x bins_y` equal
//! cells and reduces the points of every non-empty cell to one value.
//!
//! # Cell assignment
//!
//! Cell width on each axis is `(max - min) / bins`. Intervals are half-open
//! `[lo, hi)` except the last cell on each axis, which also takes points
//! lying exactly on the upper bound. Points with a non-finite coordinate or
//! outside the bounds are not assigned and are reported as `dropped`.
//! When an axis has zero span every point lands in index 0 on that axis.
//!
//! # Complexity
//!
//! One pass over the points, so O(n) time. Accumulation is array-indexed
//! while the grid is small relative to the input, and hashed by cell
//! otherwise, so memory stays O(min(bins_x * bins_y, n)) for any grid
//! size [`Bins::resolve`] accepts.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{StatsError, StatsResult};

/// Largest grid that can be expanded into a dense per-cell buffer
/// ([`BinnedGrid::to_dense`], rasters)
pub const MAX_DENSE_CELLS: usize = 1 << 26;

/// Dense accumulation stops paying off beyond this many cells per point
const DENSE_CELLS_PER_POINT: usize = 8;
/// Grids this small are always accumulated densely
const MIN_DENSE_CELLS: usize = 1 << 12;
/// Upper bound on a dense accumulator array (40 bytes per cell)
const MAX_DENSE_ACCUMULATORS: usize = 1 << 22;

/// Grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bins {
    /// Same number of bins on both axes
    Uniform(usize),
    /// Separate resolutions per axis
    Axes { x: usize, y: usize },
}

impl Bins {
    /// Resolve to `(bins_x, bins_y)`, rejecting zero-sized grids
    pub fn resolve(&self) -> StatsResult<(usize, usize)> {
        let (x, y) = match *self {
            Bins::Uniform(n) => (n, n),
            Bins::Axes { x, y } => (x, y),
        };
        if x == 0 {
            return Err(StatsError::invalid("bins_x", "must be positive"));
        }
        if y == 0 {
            return Err(StatsError::invalid("bins_y", "must be positive"));
        }
        if x.checked_mul(y).is_none() {
            return Err(StatsError::invalid("bins", "grid size overflows"));
        }
        Ok((x, y))
    }
}

impl From<usize> for Bins {
    fn from(n: usize) -> Self {
        Bins::Uniform(n)
    }
}

/// How the points of one cell are reduced to a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reduction {
    /// Number of points in the cell
    Count,
    /// Sum of the value column
    Sum,
    /// Arithmetic mean of the value column
    Mean,
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Value of the first member in input order
    First,
    /// Value of a uniformly random member, drawn from a seeded source
    Sample { seed: u64 },
    /// Value of the first member of input that is known to be shuffled.
    ///
    /// Equivalent in distribution to [`Reduction::Sample`], but only when the
    /// input order is itself a uniform permutation. The caller must assert
    /// this with [`InputOrder::Shuffled`].
    ShuffledFirst,
}

impl Reduction {
    /// Whether this reduction reads the value column
    pub fn needs_values(&self) -> bool {
        !matches!(self, Reduction::Count)
    }

    /// Whether the result depends on the order of the input points
    pub fn is_order_dependent(&self) -> bool {
        matches!(
            self,
            Reduction::First | Reduction::Sample { .. } | Reduction::ShuffledFirst
        )
    }

    /// Short name for logs and table headers
    pub fn name(&self) -> &'static str {
        match self {
            Reduction::Count => "count",
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::First => "first",
            Reduction::Sample { .. } => "sample",
            Reduction::ShuffledFirst => "shuffled_first",
        }
    }
}

/// What the caller guarantees about the order of the input points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputOrder {
    /// No guarantee
    #[default]
    Arbitrary,
    /// Input is a uniform random permutation
    Shuffled,
}

/// Parameters for [`bin2d`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinParams {
    pub bins: Bins,
    /// Explicit bounds; defaults to the extent of the data
    pub bounds: Option<Bounds>,
    pub reduction: Reduction,
}

impl BinParams {
    /// Count reduction over the data extent
    pub fn new(bins: impl Into<Bins>) -> Self {
        Self {
            bins: bins.into(),
            bounds: None,
            reduction: Reduction::Count,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }
}

/// One present (non-empty) cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Index along y
    pub row: usize,
    /// Index along x
    pub col: usize,
    /// Number of points assigned to the cell (always >= 1)
    pub count: u64,
    /// Reduced value
    pub value: f64,
}

/// Maps coordinates on one axis to bin indices
///
/// Positions are computed from the half-span so bounds wider than
/// `f64::MAX` (e.g. `[-1e308, 1e308]`) still partition correctly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBinner {
    min: f64,
    max: f64,
    bins: usize,
    half_span: f64,
}

impl AxisBinner {
    pub fn new(min: f64, max: f64, bins: usize) -> Self {
        Self {
            min,
            max,
            bins,
            half_span: max * 0.5 - min * 0.5,
        }
    }

    /// Bin index of `v`, or `None` if it is outside `[min, max]` or NaN
    #[inline]
    pub fn index(&self, v: f64) -> Option<usize> {
        if !(v >= self.min && v <= self.max) {
            return None;
        }
        if self.half_span == 0.0 {
            return Some(0);
        }
        if v == self.max {
            return Some(self.bins - 1);
        }
        // Fraction of the span in [0, 1); rounding can still push it onto `bins`
        let t = (v * 0.5 - self.min * 0.5) / self.half_span;
        let idx = (t * self.bins as f64) as usize;
        Some(idx.min(self.bins - 1))
    }

    /// Lower edge of bin `i` (`i == bins` gives the upper bound)
    pub fn edge(&self, i: usize) -> f64 {
        if i >= self.bins {
            return self.max;
        }
        let f = i as f64 / self.bins as f64;
        self.min * (1.0 - f) + self.max * f
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Bin width; infinite when the span itself exceeds `f64::MAX`
    pub fn width(&self) -> f64 {
        self.half_span / self.bins as f64 * 2.0
    }
}

/// Maps points to `(row, col)` cells of a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBinner {
    x: AxisBinner,
    y: AxisBinner,
}

impl GridBinner {
    pub fn new(bounds: &Bounds, bins_x: usize, bins_y: usize) -> Self {
        Self {
            x: AxisBinner::new(bounds.x_min, bounds.x_max, bins_x),
            y: AxisBinner::new(bounds.y_min, bounds.y_max, bins_y),
        }
    }

    /// `(row, col)` of the cell containing the point
    #[inline]
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = self.x.index(x)?;
        let row = self.y.index(y)?;
        Some((row, col))
    }

    /// Rectangle covered by a cell
    pub fn cell_bounds(&self, row: usize, col: usize) -> Bounds {
        Bounds::new(
            self.x.edge(col),
            self.x.edge(col + 1),
            self.y.edge(row),
            self.y.edge(row + 1),
        )
    }

    pub fn x_axis(&self) -> &AxisBinner {
        &self.x
    }

    pub fn y_axis(&self) -> &AxisBinner {
        &self.y
    }
}

/// Result of a binned aggregation. Only non-empty cells are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedGrid {
    pub bins_x: usize,
    pub bins_y: usize,
    /// Bounds the grid partitions (all zero for empty input without explicit bounds)
    pub bounds: Bounds,
    pub reduction: Reduction,
    /// Points that landed in a cell
    pub assigned: usize,
    /// Points skipped: non-finite coordinates or value, or outside the bounds
    pub dropped: usize,
    /// Present cells sorted by `(row, col)`
    cells: Vec<Cell>,
}

impl BinnedGrid {
    fn empty(bins_x: usize, bins_y: usize, bounds: Bounds, reduction: Reduction, dropped: usize) -> Self {
        Self {
            bins_x,
            bins_y,
            bounds,
            reduction,
            assigned: 0,
            dropped,
            cells: Vec::new(),
        }
    }

    /// Present cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Look up a cell; `None` means the cell is absent (no points)
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&(row, col), |c| (c.row, c.col))
            .ok()
            .map(|i| &self.cells[i])
    }

    /// Number of present cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cell is present
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sum of per-cell counts (equals `assigned`)
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }

    /// Smallest and largest value over present cells
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.cells.iter().map(|c| c.value).filter(|v| v.is_finite());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Binner matching this grid's geometry
    pub fn binner(&self) -> GridBinner {
        GridBinner::new(&self.bounds, self.bins_x, self.bins_y)
    }

    /// Centre coordinates of a cell
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let b = self.binner().cell_bounds(row, col);
        (b.x_min * 0.5 + b.x_max * 0.5, b.y_min * 0.5 + b.y_max * 0.5)
    }

    /// Dense row-major copy; absent cells are `None`
    ///
    /// # Errors
    ///
    /// [`StatsError::InvalidParameter`] when the grid has more than
    /// [`MAX_DENSE_CELLS`] cells.
    pub fn to_dense(&self) -> StatsResult<Vec<Option<f64>>> {
        let n_cells = check_dense_size(self.bins_x, self.bins_y)?;
        let mut dense = vec![None; n_cells];
        for cell in &self.cells {
            dense[cell.row * self.bins_x + cell.col] = Some(cell.value);
        }
        Ok(dense)
    }
}

/// Cell count of a `bins_x x bins_y` grid, if it may be expanded densely
pub fn check_dense_size(bins_x: usize, bins_y: usize) -> StatsResult<usize> {
    match bins_x.checked_mul(bins_y) {
        Some(n) if n <= MAX_DENSE_CELLS => Ok(n),
        _ => Err(StatsError::invalid(
            "bins",
            format!(
                "{} x {} grid exceeds the dense limit of {} cells",
                bins_x, bins_y, MAX_DENSE_CELLS
            ),
        )),
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    pick: f64,
}

impl Accumulator {
    const EMPTY: Accumulator = Accumulator {
        count: 0,
        sum: 0.0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        pick: f64::NAN,
    };

    #[inline]
    fn add(&mut self, v: f64) {
        if self.count == 0 {
            self.pick = v;
        }
        self.count += 1;
        self.sum += v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// Fold in an accumulator covering later input
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    fn merge(&mut self, later: &Accumulator) {
        if later.count == 0 {
            return;
        }
        if self.count == 0 {
            self.pick = later.pick;
        }
        self.count += later.count;
        self.sum += later.sum;
        self.min = self.min.min(later.min);
        self.max = self.max.max(later.max);
    }

    fn finish(&self, reduction: Reduction) -> f64 {
        match reduction {
            Reduction::Count => self.count as f64,
            Reduction::Sum => self.sum,
            Reduction::Mean => self.sum / self.count as f64,
            Reduction::Min => self.min,
            Reduction::Max => self.max,
            Reduction::First | Reduction::Sample { .. } | Reduction::ShuffledFirst => self.pick,
        }
    }
}

/// Per-cell accumulators
///
/// Dense grids index a flat array. Grids with far more cells than points,
/// or too many cells to allocate, accumulate into a map keyed by flat
/// index so memory follows the number of points.
#[derive(Debug, Clone)]
enum CellStore {
    Dense(Vec<Accumulator>),
    Sparse(HashMap<usize, Accumulator>),
}

impl CellStore {
    /// Choose a layout for `n_cells` cells receiving about `n_points` points
    fn for_grid(n_cells: usize, n_points: usize) -> Self {
        let dense_limit = n_points
            .saturating_mul(DENSE_CELLS_PER_POINT)
            .clamp(MIN_DENSE_CELLS, MAX_DENSE_ACCUMULATORS);
        if n_cells <= dense_limit {
            CellStore::Dense(vec![Accumulator::EMPTY; n_cells])
        } else {
            CellStore::Sparse(HashMap::new())
        }
    }

    #[inline]
    fn cell_mut(&mut self, idx: usize) -> &mut Accumulator {
        match self {
            CellStore::Dense(cells) => &mut cells[idx],
            CellStore::Sparse(cells) => cells.entry(idx).or_insert(Accumulator::EMPTY),
        }
    }

    /// Fold in a store covering later input
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    fn merge(&mut self, later: CellStore) {
        match later {
            CellStore::Dense(cells) => {
                for (idx, acc) in cells.iter().enumerate().filter(|(_, acc)| acc.count > 0) {
                    self.cell_mut(idx).merge(acc);
                }
            }
            CellStore::Sparse(cells) => {
                for (idx, acc) in cells {
                    self.cell_mut(idx).merge(&acc);
                }
            }
        }
    }

    /// Non-empty cells in ascending flat index
    fn into_present(self) -> Vec<(usize, Accumulator)> {
        match self {
            CellStore::Dense(cells) => cells
                .into_iter()
                .enumerate()
                .filter(|(_, acc)| acc.count > 0)
                .collect(),
            CellStore::Sparse(cells) => {
                let mut present: Vec<(usize, Accumulator)> = cells.into_iter().collect();
                present.sort_unstable_by_key(|(idx, _)| *idx);
                present
            }
        }
    }
}

/// Accumulate point `i`; returns the flat index of the cell it entered
#[inline]
fn accumulate_one(
    binner: &GridBinner,
    x: &[f64],
    y: &[f64],
    values: Option<&[f64]>,
    i: usize,
    cells: &mut CellStore,
) -> Option<usize> {
    let v = match values {
        Some(values) if !values[i].is_finite() => return None,
        Some(values) => values[i],
        None => 0.0,
    };
    let (row, col) = binner.cell_of(x[i], y[i])?;
    let idx = row * binner.x_axis().bins() + col;
    cells.cell_mut(idx).add(v);
    Some(idx)
}

fn accumulate_sequential(
    binner: &GridBinner,
    x: &[f64],
    y: &[f64],
    values: Option<&[f64]>,
    reduction: Reduction,
    n_cells: usize,
) -> (CellStore, usize) {
    let mut cells = CellStore::for_grid(n_cells, x.len());
    let mut assigned = 0;
    let mut rng = match reduction {
        Reduction::Sample { seed } => Some(StdRng::seed_from_u64(seed)),
        _ => None,
    };

    for i in 0..x.len() {
        let Some(idx) = accumulate_one(binner, x, y, values, i, &mut cells) else {
            continue;
        };
        assigned += 1;

        // Reservoir of size one: the k-th member replaces the pick with probability 1/k
        if let Some(rng) = rng.as_mut() {
            let acc = cells.cell_mut(idx);
            if acc.count > 1 && rng.random_range(0..acc.count) == 0 {
                if let Some(values) = values {
                    acc.pick = values[i];
                }
            }
        }
    }

    (cells, assigned)
}

/// Inputs smaller than this are always accumulated sequentially
#[cfg(feature = "parallel")]
const PARALLEL_MIN_LEN: usize = 1 << 16;

#[cfg(feature = "parallel")]
fn accumulate_parallel(
    binner: &GridBinner,
    x: &[f64],
    y: &[f64],
    values: Option<&[f64]>,
    n_cells: usize,
) -> (CellStore, usize) {
    use rayon::prelude::*;

    // Each fold sees at least PARALLEL_MIN_LEN points, so size its store for that
    (0..x.len())
        .into_par_iter()
        .with_min_len(PARALLEL_MIN_LEN)
        .fold(
            || (CellStore::for_grid(n_cells, PARALLEL_MIN_LEN), 0usize),
            |(mut cells, assigned), i| {
                let added = accumulate_one(binner, x, y, values, i, &mut cells).is_some();
                (cells, assigned + added as usize)
            },
        )
        .reduce_with(|(mut left, a), (right, b)| {
            left.merge(right);
            (left, a + b)
        })
        .unwrap_or_else(|| (CellStore::for_grid(n_cells, 0), 0))
}

fn collect_cells(store: CellStore, reduction: Reduction, bins_x: usize) -> Vec<Cell> {
    store
        .into_present()
        .into_iter()
        .map(|(idx, acc)| Cell {
            row: idx / bins_x,
            col: idx % bins_x,
            count: acc.count,
            value: acc.finish(reduction),
        })
        .collect()
}

/// Bin `x`/`y` into a grid and reduce each non-empty cell
///
/// `values` is the per-point scalar column; it is required by every reduction
/// except [`Reduction::Count`]. Points whose value is not finite are skipped
/// by value reductions.
///
/// # Errors
///
/// [`StatsError::InvalidParameter`] for a zero-sized grid, mismatched column
/// lengths, a missing value column, invalid explicit bounds, or
/// [`Reduction::ShuffledFirst`] on input not marked [`InputOrder::Shuffled`].
/// Nothing is computed when validation fails.
pub fn bin2d(
    x: &[f64],
    y: &[f64],
    values: Option<&[f64]>,
    order: InputOrder,
    params: &BinParams,
) -> StatsResult<BinnedGrid> {
    let (bins_x, bins_y) = params.bins.resolve()?;
    let reduction = params.reduction;

    if x.len() != y.len() {
        return Err(StatsError::invalid(
            "y",
            format!("length {} does not match x length {}", y.len(), x.len()),
        ));
    }
    if let Some(values) = values {
        if values.len() != x.len() {
            return Err(StatsError::invalid(
                "values",
                format!("length {} does not match x length {}", values.len(), x.len()),
            ));
        }
    }
    if reduction.needs_values() && values.is_none() {
        return Err(StatsError::invalid(
            "values",
            format!("{} reduction requires a value column", reduction.name()),
        ));
    }
    if reduction == Reduction::ShuffledFirst && order != InputOrder::Shuffled {
        return Err(StatsError::invalid(
            "order",
            "shuffled_first reduction requires input marked as shuffled",
        ));
    }
    if let Some(bounds) = &params.bounds {
        bounds.validate()?;
    }

    let Some(bounds) = params.bounds.or_else(|| Bounds::from_data(x, y)) else {
        return Ok(BinnedGrid::empty(bins_x, bins_y, Bounds::default(), reduction, x.len()));
    };

    // Count must not lose points to NaN values it never reads
    let values = if reduction.needs_values() { values } else { None };
    let binner = GridBinner::new(&bounds, bins_x, bins_y);
    let n_cells = bins_x * bins_y;

    #[cfg(feature = "parallel")]
    let (store, assigned) = if reduction.is_order_dependent() || x.len() < PARALLEL_MIN_LEN {
        accumulate_sequential(&binner, x, y, values, reduction, n_cells)
    } else {
        accumulate_parallel(&binner, x, y, values, n_cells)
    };

    #[cfg(not(feature = "parallel"))]
    let (store, assigned) = accumulate_sequential(&binner, x, y, values, reduction, n_cells);

    let cells = collect_cells(store, reduction, bins_x);

    Ok(BinnedGrid {
        bins_x,
        bins_y,
        bounds,
        reduction,
        assigned,
        dropped: x.len() - assigned,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (Vec<f64>, Vec<f64>) {
        (vec![0.0, 0.5, 1.0, 9.0], vec![0.0, 0.5, 1.0, 9.0])
    }

    #[test]
    fn test_scenario_counts() {
        let (x, y) = scenario();
        let params = BinParams::new(2).with_bounds(Bounds::square(0.0, 10.0));
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.get(0, 0).unwrap().count, 3);
        assert_eq!(grid.get(1, 1).unwrap().count, 1);
        assert!(grid.get(0, 1).is_none());
        assert!(grid.get(1, 0).is_none());
        assert_eq!(grid.total_count(), 4);
        assert_eq!(grid.dropped, 0);
    }

    #[test]
    fn test_empty_input() {
        let grid = bin2d(&[], &[], None, InputOrder::Arbitrary, &BinParams::new(10)).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.assigned, 0);
    }

    #[test]
    fn test_zero_bins_rejected() {
        let (x, y) = scenario();
        let err = bin2d(&x, &y, None, InputOrder::Arbitrary, &BinParams::new(0)).unwrap_err();
        assert!(matches!(err, StatsError::InvalidParameter { .. }));

        let params = BinParams::new(Bins::Axes { x: 4, y: 0 });
        assert!(bin2d(&x, &y, None, InputOrder::Arbitrary, &params).is_err());
    }

    #[test]
    fn test_upper_boundary_goes_to_last_cell() {
        let x = [0.0, 10.0];
        let y = [10.0, 0.0];
        let params = BinParams::new(5).with_bounds(Bounds::square(0.0, 10.0));
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        assert_eq!(grid.get(4, 0).unwrap().count, 1);
        assert_eq!(grid.get(0, 4).unwrap().count, 1);
    }

    #[test]
    fn test_default_bounds_use_extent() {
        let x = [-1.0, 3.0, 1.0];
        let y = [2.0, 4.0, 3.0];
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &BinParams::new(2)).unwrap();

        assert_eq!(grid.bounds, Bounds::new(-1.0, 3.0, 2.0, 4.0));
        assert_eq!(grid.assigned, 3);
        // The maximum point lands in the last cell on both axes
        assert_eq!(grid.get(1, 1).unwrap().count, 2);
        assert_eq!(grid.get(0, 0).unwrap().count, 1);
    }

    #[test]
    fn test_points_outside_bounds_are_dropped() {
        let x = [0.5, 2.0, f64::NAN];
        let y = [0.5, 0.5, 0.5];
        let params = BinParams::new(2).with_bounds(Bounds::square(0.0, 1.0));
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        assert_eq!(grid.assigned, 1);
        assert_eq!(grid.dropped, 2);
    }

    #[test]
    fn test_zero_span_axis() {
        let x = [2.0, 2.0, 2.0];
        let y = [0.0, 1.0, 2.0];
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &BinParams::new(4)).unwrap();

        assert_eq!(grid.total_count(), 3);
        assert!(grid.cells().iter().all(|c| c.col == 0));
    }

    #[test]
    fn test_mean_and_extremes() {
        let x = [0.1, 0.2, 0.9];
        let y = [0.1, 0.2, 0.9];
        let v = [1.0, 3.0, 10.0];
        let bounds = Bounds::square(0.0, 1.0);

        let mean = bin2d(
            &x,
            &y,
            Some(&v),
            InputOrder::Arbitrary,
            &BinParams::new(2).with_bounds(bounds).with_reduction(Reduction::Mean),
        )
        .unwrap();
        assert_eq!(mean.get(0, 0).unwrap().value, 2.0);
        assert_eq!(mean.get(1, 1).unwrap().value, 10.0);

        let max = bin2d(
            &x,
            &y,
            Some(&v),
            InputOrder::Arbitrary,
            &BinParams::new(2).with_bounds(bounds).with_reduction(Reduction::Max),
        )
        .unwrap();
        assert_eq!(max.get(0, 0).unwrap().value, 3.0);
        assert_eq!(max.value_range(), Some((3.0, 10.0)));
    }

    #[test]
    fn test_value_reduction_requires_values() {
        let (x, y) = scenario();
        let params = BinParams::new(2).with_reduction(Reduction::Mean);
        let err = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap_err();
        assert!(err.to_string().contains("mean"));
    }

    #[test]
    fn test_count_ignores_nan_values() {
        let x = [0.0, 1.0];
        let y = [0.0, 1.0];
        let v = [f64::NAN, 1.0];
        let grid = bin2d(&x, &y, Some(&v), InputOrder::Arbitrary, &BinParams::new(1)).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().count, 2);

        let mean = bin2d(
            &x,
            &y,
            Some(&v),
            InputOrder::Arbitrary,
            &BinParams::new(1).with_reduction(Reduction::Mean),
        )
        .unwrap();
        assert_eq!(mean.get(0, 0).unwrap().value, 1.0);
        assert_eq!(mean.dropped, 1);
    }

    #[test]
    fn test_first_takes_input_order() {
        let x = [0.1, 0.2, 0.3];
        let y = [0.1, 0.2, 0.3];
        let v = [7.0, 8.0, 9.0];
        let params = BinParams::new(1).with_reduction(Reduction::First);
        let grid = bin2d(&x, &y, Some(&v), InputOrder::Arbitrary, &params).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().value, 7.0);
    }

    #[test]
    fn test_shuffled_first_requires_shuffled_order() {
        let x = [0.1, 0.2];
        let y = [0.1, 0.2];
        let v = [1.0, 2.0];
        let params = BinParams::new(1).with_reduction(Reduction::ShuffledFirst);

        assert!(bin2d(&x, &y, Some(&v), InputOrder::Arbitrary, &params).is_err());
        let grid = bin2d(&x, &y, Some(&v), InputOrder::Shuffled, &params).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().value, 1.0);
    }

    #[test]
    fn test_sample_is_reproducible_member() {
        let x: Vec<f64> = (0..200).map(|i| (i % 10) as f64).collect();
        let y: Vec<f64> = (0..200).map(|i| (i / 20) as f64).collect();
        let v: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let params = BinParams::new(3).with_reduction(Reduction::Sample { seed: 9 });

        let a = bin2d(&x, &y, Some(&v), InputOrder::Arbitrary, &params).unwrap();
        let b = bin2d(&x, &y, Some(&v), InputOrder::Arbitrary, &params).unwrap();
        assert_eq!(a, b);

        let binner = a.binner();
        for cell in a.cells() {
            let members: Vec<f64> = (0..x.len())
                .filter(|&i| binner.cell_of(x[i], y[i]) == Some((cell.row, cell.col)))
                .map(|i| v[i])
                .collect();
            assert!(members.contains(&cell.value));
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = bin2d(&[1.0, 2.0], &[1.0], None, InputOrder::Arbitrary, &BinParams::new(2));
        assert!(err.is_err());
    }

    #[test]
    fn test_cell_center_and_dense() {
        let (x, y) = scenario();
        let params = BinParams::new(2).with_bounds(Bounds::square(0.0, 10.0));
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        assert_eq!(grid.cell_center(0, 0), (2.5, 2.5));
        assert_eq!(grid.to_dense().unwrap(), vec![Some(3.0), None, None, Some(1.0)]);
    }

    #[test]
    fn test_bounds_wider_than_f64_max() {
        let x = [0.0, 9e307, -9e307, 1e308];
        let y = [0.0, 0.0, 0.0, 1e308];
        let bounds = Bounds::square(-1e308, 1e308);
        let params = BinParams::new(2).with_bounds(bounds);
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        let binner = grid.binner();
        assert_eq!(binner.cell_of(9e307, 0.0), Some((1, 1)));
        assert_eq!(binner.cell_of(-9e307, 0.0), Some((1, 0)));
        assert_eq!(binner.cell_of(1e308, 1e308), Some((1, 1)));
        assert_eq!(grid.get(1, 0).unwrap().count, 1);
        assert_eq!(grid.get(1, 1).unwrap().count, 3);
        assert_eq!(grid.total_count(), 4);

        assert_eq!(binner.x_axis().edge(1), 0.0);
        assert_eq!(grid.cell_center(1, 1), (5e307, 5e307));
        assert!(binner.x_axis().width().is_finite());
    }

    #[test]
    fn test_data_extent_wider_than_f64_max() {
        let x = [-1.5e308, 1.5e308, 1.0e308];
        let y = [0.0, 1.0, 0.5];
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &BinParams::new(4)).unwrap();

        assert_eq!(grid.get(0, 0).unwrap().count, 1);
        assert_eq!(grid.get(3, 3).unwrap().count, 1);
        assert_eq!(grid.get(2, 3).unwrap().count, 1);
    }

    #[test]
    fn test_huge_grid_accumulates_sparsely() {
        let (x, y) = scenario();
        let params = BinParams::new(Bins::Uniform(1 << 31)).with_bounds(Bounds::square(0.0, 10.0));
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        assert_eq!(grid.total_count(), 4);
        assert_eq!(grid.len(), 4);
        let last = (1usize << 31) - 1;
        assert!(grid.get(last, last).is_none());
        let keys: Vec<(usize, usize)> = grid.cells().iter().map(|c| (c.row, c.col)).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));

        let err = grid.to_dense().unwrap_err();
        assert!(matches!(err, StatsError::InvalidParameter { .. }));
    }

    #[test]
    fn test_sparse_and_dense_layouts_agree() {
        let x: Vec<f64> = (0..50).map(|i| (i * 37 % 101) as f64).collect();
        let y: Vec<f64> = (0..50).map(|i| (i * 53 % 97) as f64).collect();
        let v: Vec<f64> = (0..50).map(|i| i as f64 * 0.5).collect();
        let bins = 300;
        let binner = GridBinner::new(&Bounds::square(0.0, 101.0), bins, bins);

        for reduction in [Reduction::Count, Reduction::Mean, Reduction::Max, Reduction::First] {
            let values = reduction.needs_values().then_some(v.as_slice());
            let mut dense = CellStore::Dense(vec![Accumulator::EMPTY; bins * bins]);
            let mut sparse = CellStore::Sparse(HashMap::new());
            for i in 0..x.len() {
                accumulate_one(&binner, &x, &y, values, i, &mut dense);
                accumulate_one(&binner, &x, &y, values, i, &mut sparse);
            }
            assert_eq!(
                collect_cells(dense, reduction, bins),
                collect_cells(sparse, reduction, bins)
            );
        }
        assert!(matches!(CellStore::for_grid(bins * bins, x.len()), CellStore::Sparse(_)));
        assert!(matches!(CellStore::for_grid(64, x.len()), CellStore::Dense(_)));
    }

    #[test]
    fn test_check_dense_size() {
        assert_eq!(check_dense_size(200, 100).unwrap(), 20_000);
        assert!(check_dense_size(1 << 14, 1 << 14).is_err());
        assert!(check_dense_size(usize::MAX, 2).is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let n = 2 * PARALLEL_MIN_LEN + 4_321;
        let mut rng = StdRng::seed_from_u64(17);
        let x: Vec<f64> = (0..n).map(|_| rng.random::<f64>() * 10.0).collect();
        let y: Vec<f64> = (0..n).map(|_| rng.random::<f64>() * 10.0 - 5.0).collect();
        let v: Vec<f64> = (0..n).map(|_| rng.random::<f64>() * 100.0 - 50.0).collect();
        let bins = 37;

        for reduction in [
            Reduction::Count,
            Reduction::Sum,
            Reduction::Mean,
            Reduction::Min,
            Reduction::Max,
        ] {
            let values = reduction.needs_values().then_some(v.as_slice());
            let params = BinParams::new(bins).with_reduction(reduction);
            let parallel = bin2d(&x, &y, values, InputOrder::Arbitrary, &params).unwrap();

            let binner = parallel.binner();
            let (store, assigned) =
                accumulate_sequential(&binner, &x, &y, values, reduction, bins * bins);
            let sequential = collect_cells(store, reduction, bins);

            assert_eq!(parallel.assigned, assigned);
            assert_eq!(parallel.total_count() as usize, n);
            assert_eq!(parallel.cells().len(), sequential.len());
            for (p, s) in parallel.cells().iter().zip(&sequential) {
                assert_eq!((p.row, p.col, p.count), (s.row, s.col, s.count));
                match reduction {
                    Reduction::Sum | Reduction::Mean => {
                        let tol = 1e-9 * s.value.abs().max(1.0);
                        assert!((p.value - s.value).abs() <= tol, "{:?}: {} vs {}", reduction, p.value, s.value);
                    }
                    _ => assert_eq!(p.value, s.value, "{:?}", reduction),
                }
            }
        }
    }
}
