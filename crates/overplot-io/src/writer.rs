//! Writing long-form tables
//!
//! Every table starts with a header row, even when it has no data rows, so
//! downstream readers always see the schema. Missing values and absent
//! group labels are written as empty fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use overplot_core::{BinnedGrid, ContourTable, PointSet};
use serde::Serialize;
use tracing::debug;

use crate::reader::{delimiter_for, IoResult};

pub const POINT_COLUMNS: [&str; 4] = ["x", "y", "group", "value"];
pub const CELL_COLUMNS: [&str; 6] = ["row", "col", "x_center", "y_center", "count", "value"];
pub const CONTOUR_COLUMNS: [&str; 4] = ["x", "y", "density", "group"];

#[derive(Debug, Serialize)]
struct CellRecord {
    row: usize,
    col: usize,
    x_center: f64,
    y_center: f64,
    count: u64,
    value: f64,
}

fn table_writer<W: Write>(writer: W, delimiter: u8, columns: &[&str]) -> IoResult<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(columns)?;
    Ok(writer)
}

fn create(path: &Path) -> IoResult<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Write points as `x,y,group,value` rows; returns the number of data rows
pub fn write_points<W: Write>(points: &PointSet, writer: W, delimiter: u8) -> IoResult<usize> {
    let mut writer = table_writer(writer, delimiter, &POINT_COLUMNS)?;
    for point in points.iter() {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(points.len())
}

/// Write binned cells as `row,col,x_center,y_center,count,value` rows
///
/// Only present cells are written, in row-major order.
pub fn write_cells<W: Write>(grid: &BinnedGrid, writer: W, delimiter: u8) -> IoResult<usize> {
    let mut writer = table_writer(writer, delimiter, &CELL_COLUMNS)?;
    for cell in grid.cells() {
        let (x_center, y_center) = grid.cell_center(cell.row, cell.col);
        writer.serialize(CellRecord {
            row: cell.row,
            col: cell.col,
            x_center,
            y_center,
            count: cell.count,
            value: cell.value,
        })?;
    }
    writer.flush()?;
    Ok(grid.len())
}

/// Write a contour table as `x,y,density,group` rows
pub fn write_contours<W: Write>(table: &ContourTable, writer: W, delimiter: u8) -> IoResult<usize> {
    let mut writer = table_writer(writer, delimiter, &CONTOUR_COLUMNS)?;
    for row in &table.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(table.len())
}

/// Write a point set to a file
pub fn write_points_csv(points: &PointSet, path: impl AsRef<Path>) -> IoResult<usize> {
    let path = path.as_ref();
    let rows = write_points(points, create(path)?, delimiter_for(path))?;
    debug!(path = %path.display(), rows, "wrote points");
    Ok(rows)
}

/// Write the present cells of a binned grid to a file
pub fn write_cells_csv(grid: &BinnedGrid, path: impl AsRef<Path>) -> IoResult<usize> {
    let path = path.as_ref();
    let rows = write_cells(grid, create(path)?, delimiter_for(path))?;
    debug!(path = %path.display(), rows, reduction = grid.reduction.name(), "wrote cells");
    Ok(rows)
}

/// Write a contour table to a file
pub fn write_contours_csv(table: &ContourTable, path: impl AsRef<Path>) -> IoResult<usize> {
    let path = path.as_ref();
    let rows = write_contours(table, create(path)?, delimiter_for(path))?;
    debug!(path = %path.display(), rows, "wrote contours");
    Ok(rows)
}
