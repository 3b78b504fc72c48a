//! Raster handoff for binned grids
//!
//! Turns a [`BinnedGrid`] into an RGBA pixel buffer, one pixel per cell, with
//! absent cells left transparent. Writing PNG files needs the optional
//! `raster` feature; callers check [`is_available`] and skip the output
//! instead of failing when it is not compiled in.

use std::path::Path;

use overplot_stats::{check_dense_size, BinnedGrid};

use crate::colormap::{shade, ColorScale, Colormap};
use crate::error::{OverplotError, OverplotResult};

/// Whether PNG output is compiled in
pub fn is_available() -> bool {
    cfg!(feature = "raster")
}

/// Row-major RGBA8 pixels, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    /// RGBA of pixel `(px, py)`, `py` counted from the top
    pub fn pixel(&self, px: u32, py: u32) -> Option<[u8; 4]> {
        if px >= self.width || py >= self.height {
            return None;
        }
        let i = (py as usize)
            .checked_mul(self.width as usize)?
            .checked_add(px as usize)?
            .checked_mul(4)?;
        let rgba = self.pixels.get(i..i.checked_add(4)?)?;
        Some([rgba[0], rgba[1], rgba[2], rgba[3]])
    }
}

/// Shade a grid into pixels; cell row 0 (lowest y) becomes the bottom row
///
/// # Errors
///
/// InvalidParameter when the grid has more than
/// [`MAX_DENSE_CELLS`](overplot_stats::MAX_DENSE_CELLS) cells
/// or a side does not fit in `u32`.
pub fn rasterize(grid: &BinnedGrid, colormap: &Colormap, scale: ColorScale) -> OverplotResult<RgbaBuffer> {
    let n_cells = check_dense_size(grid.bins_x, grid.bins_y)?;
    let width = u32::try_from(grid.bins_x)
        .map_err(|_| OverplotError::invalid("bins_x", "too wide for a raster"))?;
    let height = u32::try_from(grid.bins_y)
        .map_err(|_| OverplotError::invalid("bins_y", "too tall for a raster"))?;

    let mut pixels = vec![0u8; n_cells * 4];
    for cell in shade(grid, colormap, scale) {
        let py = grid.bins_y - 1 - cell.row;
        let i = (py * grid.bins_x + cell.col) * 4;
        pixels[i..i + 4].copy_from_slice(&cell.color.to_rgba8());
    }

    Ok(RgbaBuffer {
        width,
        height,
        pixels,
    })
}

/// Write a shaded grid as PNG
#[cfg(feature = "raster")]
pub fn save_png(
    grid: &BinnedGrid,
    colormap: &Colormap,
    scale: ColorScale,
    path: &Path,
) -> OverplotResult<()> {
    let buffer = rasterize(grid, colormap, scale)?;
    let image = image::RgbaImage::from_raw(buffer.width, buffer.height, buffer.pixels).ok_or_else(
        || OverplotError::Raster {
            path: path.to_path_buf(),
            message: "pixel buffer does not match dimensions".to_string(),
        },
    )?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| OverplotError::Raster {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::debug!(path = %path.display(), width = buffer.width, height = buffer.height, "wrote raster");
    Ok(())
}

/// Write a shaded grid as PNG
#[cfg(not(feature = "raster"))]
pub fn save_png(
    _grid: &BinnedGrid,
    _colormap: &Colormap,
    _scale: ColorScale,
    path: &Path,
) -> OverplotResult<()> {
    Err(OverplotError::Raster {
        path: path.to_path_buf(),
        message: "built without the `raster` feature".to_string(),
    })
}
