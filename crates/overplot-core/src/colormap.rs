//! Colormaps and color scales for binned grids
//!
//! A [`ColorScale`] turns the values of the *present* cells of a
//! [`BinnedGrid`] into positions in `[0, 1]`; a [`Colormap`] turns those
//! positions into colors. Absent cells are never mapped, so they stay
//! transparent and a log scale never sees an empty cell.
//!
//! Built-in colormaps:
//! - viridis (perceptually uniform, colorblind-safe)
//! - fire (black through red and yellow to white, for counts on dark backgrounds)
//! - greys (white to black)

use overplot_stats::BinnedGrid;
use serde::{Deserialize, Serialize};

/// A color in RGBA format (0.0 to 1.0)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a color from RGB (alpha = 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Fully transparent black, used for absent cells
    pub fn transparent() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        }
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// 8-bit RGBA channels
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// A colormap for mapping scalar positions to colors
#[derive(Clone, Debug)]
pub struct Colormap {
    /// Name of the colormap
    pub name: String,
    /// Evenly spaced color stops
    colors: Vec<Color>,
    reversed: bool,
}

impl Colormap {
    /// Create a new colormap from a list of colors (evenly spaced)
    pub fn from_colors(name: impl Into<String>, colors: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            colors,
            reversed: false,
        }
    }

    /// Reverse the colormap
    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Sample the colormap at a position (0.0 to 1.0)
    pub fn sample(&self, t: f32) -> Color {
        let mut t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if self.reversed {
            t = 1.0 - t;
        }

        match self.colors.len() {
            0 => Color::rgb(0.5, 0.5, 0.5),
            1 => self.colors[0],
            n => {
                let scaled = t * (n - 1) as f32;
                let i = (scaled.floor() as usize).min(n - 2);
                Color::lerp(&self.colors[i], &self.colors[i + 1], scaled - i as f32)
            }
        }
    }

    /// Generate a lookup table of the specified size
    pub fn generate_lut(&self, size: usize) -> Vec<Color> {
        (0..size)
            .map(|i| self.sample(i as f32 / (size - 1).max(1) as f32))
            .collect()
    }
}

// MARK: - Built-in Colormaps

/// Get the viridis colormap (perceptually uniform, colorblind-safe)
pub fn viridis() -> Colormap {
    Colormap::from_colors(
        "viridis",
        vec![
            Color::rgb(0.267, 0.005, 0.329),
            Color::rgb(0.282, 0.141, 0.458),
            Color::rgb(0.254, 0.265, 0.530),
            Color::rgb(0.207, 0.372, 0.553),
            Color::rgb(0.164, 0.471, 0.558),
            Color::rgb(0.128, 0.567, 0.551),
            Color::rgb(0.135, 0.659, 0.518),
            Color::rgb(0.267, 0.749, 0.441),
            Color::rgb(0.478, 0.821, 0.318),
            Color::rgb(0.741, 0.873, 0.150),
            Color::rgb(0.993, 0.906, 0.144),
        ],
    )
}

/// Get the fire colormap
pub fn fire() -> Colormap {
    Colormap::from_colors(
        "fire",
        vec![
            Color::rgb(0.000, 0.000, 0.000),
            Color::rgb(0.329, 0.047, 0.024),
            Color::rgb(0.612, 0.090, 0.027),
            Color::rgb(0.863, 0.239, 0.012),
            Color::rgb(0.984, 0.490, 0.035),
            Color::rgb(1.000, 0.710, 0.125),
            Color::rgb(1.000, 0.890, 0.439),
            Color::rgb(1.000, 1.000, 1.000),
        ],
    )
}

/// Get the greys colormap
pub fn greys() -> Colormap {
    Colormap::from_colors(
        "greys",
        vec![Color::rgb(1.0, 1.0, 1.0), Color::rgb(0.0, 0.0, 0.0)],
    )
}

/// Get a list of all built-in colormap names
pub fn builtin_colormap_names() -> Vec<&'static str> {
    vec!["viridis", "fire", "greys"]
}

/// Get a built-in colormap by name
pub fn get_colormap(name: &str) -> Option<Colormap> {
    match name.to_lowercase().as_str() {
        "viridis" => Some(viridis()),
        "fire" => Some(fire()),
        "greys" | "grays" => Some(greys()),
        _ => None,
    }
}

/// How cell values are spread over the colormap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScale {
    /// Proportional to the value
    Linear,
    /// Proportional to `ln(1 + v - min)`
    #[default]
    Log,
    /// Histogram equalization: proportional to the rank among distinct values
    EqHist,
}

impl ColorScale {
    /// Fit the scale to a set of present-cell values
    ///
    /// Returns `None` when no finite value is given.
    pub fn fit(&self, values: &[f64]) -> Option<FittedScale> {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        finite.sort_by(f64::total_cmp);
        finite.dedup();
        Some(FittedScale {
            scale: *self,
            min: finite[0],
            max: finite[finite.len() - 1],
            distinct: if *self == ColorScale::EqHist {
                finite
            } else {
                Vec::new()
            },
        })
    }

    /// Fit the scale to the present cells of a grid
    pub fn fit_grid(&self, grid: &BinnedGrid) -> Option<FittedScale> {
        let values: Vec<f64> = grid.cells().iter().map(|c| c.value).collect();
        self.fit(&values)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorScale::Linear => "linear",
            ColorScale::Log => "log",
            ColorScale::EqHist => "eq_hist",
        }
    }
}

/// A [`ColorScale`] fitted to observed values
#[derive(Clone, Debug, PartialEq)]
pub struct FittedScale {
    scale: ColorScale,
    min: f64,
    max: f64,
    distinct: Vec<f64>,
}

impl FittedScale {
    /// Position of `value` in `[0, 1]`; 0.5 when all values are equal
    pub fn normalize(&self, value: f64) -> f32 {
        if self.max <= self.min {
            return 0.5;
        }
        let value = value.clamp(self.min, self.max);
        let t = match self.scale {
            ColorScale::Linear => (value - self.min) / (self.max - self.min),
            ColorScale::Log => (value - self.min).ln_1p() / (self.max - self.min).ln_1p(),
            ColorScale::EqHist => {
                let rank = self.distinct.partition_point(|&d| d < value);
                rank as f64 / (self.distinct.len() - 1) as f64
            }
        };
        t as f32
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// A present cell with its color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedCell {
    pub row: usize,
    pub col: usize,
    pub color: Color,
}

/// Color every present cell of a grid; absent cells are omitted
pub fn shade(grid: &BinnedGrid, colormap: &Colormap, scale: ColorScale) -> Vec<ShadedCell> {
    let Some(fitted) = scale.fit_grid(grid) else {
        return Vec::new();
    };
    grid.cells()
        .iter()
        .map(|cell| ShadedCell {
            row: cell.row,
            col: cell.col,
            color: colormap.sample(fitted.normalize(cell.value)),
        })
        .collect()
}
