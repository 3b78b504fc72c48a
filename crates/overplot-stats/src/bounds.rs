//! Axis-aligned 2D bounds

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Closed rectangle `[x_min, x_max] x [y_min, y_max]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Square bounds `[min, max]` on both axes
    pub fn square(min: f64, max: f64) -> Self {
        Self::new(min, max, min, max)
    }

    /// Extent of the finite points in `x`/`y`
    ///
    /// A point participates only if both coordinates are finite. Returns
    /// `None` when no such point exists.
    pub fn from_data(x: &[f64], y: &[f64]) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for (&px, &py) in x.iter().zip(y.iter()) {
            if !(px.is_finite() && py.is_finite()) {
                continue;
            }
            bounds = Some(match bounds {
                None => Bounds::new(px, px, py, py),
                Some(b) => Bounds::new(
                    b.x_min.min(px),
                    b.x_max.max(px),
                    b.y_min.min(py),
                    b.y_max.max(py),
                ),
            });
        }
        bounds
    }

    /// Check that all edges are finite and ordered
    pub fn validate(&self) -> StatsResult<()> {
        let edges = [self.x_min, self.x_max, self.y_min, self.y_max];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::invalid("bounds", "edges must be finite"));
        }
        if self.x_min > self.x_max {
            return Err(StatsError::invalid(
                "bounds",
                format!("x_min {} exceeds x_max {}", self.x_min, self.x_max),
            ));
        }
        if self.y_min > self.y_max {
            return Err(StatsError::invalid(
                "bounds",
                format!("y_min {} exceeds y_max {}", self.y_min, self.y_max),
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Whether the point lies inside the closed rectangle
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}
