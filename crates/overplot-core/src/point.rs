//! Point sets
//!
//! A [`PointSet`] stores its points column-wise (x, y, group, value) so the
//! numeric kernels can read each column as a contiguous slice. It also
//! records whether its order is a seeded uniform shuffle, which some
//! per-cell selections depend on.

use std::collections::BTreeSet;
use std::fmt;

use overplot_stats::{Bounds, InputOrder, SummaryStats};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Categorical group label (e.g. the index of the generating cluster)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupLabel(pub u32);

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroupLabel {
    fn from(v: u32) -> Self {
        GroupLabel(v)
    }
}

/// A single labelled point with an optional scalar value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub group: GroupLabel,
    pub value: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64, group: impl Into<GroupLabel>) -> Self {
        Self {
            x,
            y,
            group: group.into(),
            value: None,
        }
    }

    /// Attach a value. A NaN value is stored as missing once the point
    /// enters a [`PointSet`].
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// Ordering state of a point set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointOrder {
    /// Order of generation or loading, no randomness guarantee
    #[default]
    AsGenerated,
    /// Uniform random permutation produced by [`PointSet::shuffled`]
    Shuffled { seed: u64 },
}

impl PointOrder {
    /// Order guarantee handed to the binning kernel
    pub fn input_order(&self) -> InputOrder {
        match self {
            PointOrder::AsGenerated => InputOrder::Arbitrary,
            PointOrder::Shuffled { .. } => InputOrder::Shuffled,
        }
    }
}

/// Ordered, columnar collection of points
///
/// Duplicates are allowed. Missing values are stored as NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    x: Vec<f64>,
    y: Vec<f64>,
    group: Vec<GroupLabel>,
    value: Vec<f64>,
    order: PointOrder,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            group: Vec::with_capacity(capacity),
            value: Vec::with_capacity(capacity),
            order: PointOrder::AsGenerated,
        }
    }

    /// Append a point. Appending invalidates a previous shuffle.
    ///
    /// `Some(NaN)` and `None` share the missing-value encoding and both read
    /// back as `None`.
    pub fn push(&mut self, point: Point) {
        self.x.push(point.x);
        self.y.push(point.y);
        self.group.push(point.group);
        self.value.push(point.value.unwrap_or(f64::NAN));
        self.order = PointOrder::AsGenerated;
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Point at index `i`
    pub fn get(&self, i: usize) -> Option<Point> {
        if i >= self.len() {
            return None;
        }
        let value = self.value[i];
        Some(Point {
            x: self.x[i],
            y: self.y[i],
            group: self.group[i],
            value: (!value.is_nan()).then_some(value),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    pub fn labels(&self) -> &[GroupLabel] {
        &self.group
    }

    /// Value column, NaN where a point has no value
    pub fn values(&self) -> &[f64] {
        &self.value
    }

    /// Number of points without a value
    pub fn missing_values(&self) -> usize {
        self.value.iter().filter(|v| v.is_nan()).count()
    }

    pub fn order(&self) -> PointOrder {
        self.order
    }

    pub fn is_shuffled(&self) -> bool {
        matches!(self.order, PointOrder::Shuffled { .. })
    }

    /// Seeded uniform permutation of this set
    pub fn shuffled(&self, seed: u64) -> PointSet {
        let mut perm: Vec<usize> = (0..self.len()).collect();
        perm.shuffle(&mut StdRng::seed_from_u64(seed));

        PointSet {
            x: perm.iter().map(|&i| self.x[i]).collect(),
            y: perm.iter().map(|&i| self.y[i]).collect(),
            group: perm.iter().map(|&i| self.group[i]).collect(),
            value: perm.iter().map(|&i| self.value[i]).collect(),
            order: PointOrder::Shuffled { seed },
        }
    }

    /// Distinct group labels, ascending
    pub fn groups(&self) -> Vec<GroupLabel> {
        self.group
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Points of one group, relative order and order state preserved
    pub fn filter_group(&self, label: GroupLabel) -> PointSet {
        let mut subset = PointSet::new();
        for (i, _) in self.group.iter().enumerate().filter(|(_, g)| **g == label) {
            subset.x.push(self.x[i]);
            subset.y.push(self.y[i]);
            subset.group.push(self.group[i]);
            subset.value.push(self.value[i]);
        }
        subset.order = self.order;
        subset
    }

    /// Extent of the finite points
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_data(&self.x, &self.y)
    }

    pub fn summary_x(&self) -> SummaryStats {
        SummaryStats::from_data(&self.x)
    }

    pub fn summary_y(&self) -> SummaryStats {
        SummaryStats::from_data(&self.y)
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = PointSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Point> for PointSet {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        for point in iter {
            self.push(point);
        }
    }
}
