//! Reading point sets from delimited text
//!
//! The expected header is `x,y,group` with an optional `value` column. An
//! empty `value` field is a missing value. Extra columns are ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use overplot_core::{OverplotError, Point, PointSet};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during I/O operations
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Overplot(#[from] OverplotError),
}

/// Result type for I/O operations
pub type IoResult<T> = Result<T, IoError>;

/// Columns every point file must carry
pub const REQUIRED_POINT_COLUMNS: [&str; 3] = ["x", "y", "group"];

#[derive(Debug, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    group: u32,
    #[serde(default)]
    value: Option<f64>,
}

impl From<PointRecord> for Point {
    fn from(record: PointRecord) -> Self {
        let point = Point::new(record.x, record.y, record.group);
        match record.value {
            Some(v) => point.with_value(v),
            None => point,
        }
    }
}

/// Field delimiter implied by a file extension (`.tsv` is tab-separated)
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

/// File extensions understood by the readers and writers
pub fn supported_extensions() -> Vec<&'static str> {
    vec!["csv", "tsv"]
}

/// Read a point set, inferring the delimiter from the extension
pub fn read_points_csv(path: impl AsRef<Path>) -> IoResult<PointSet> {
    let path = path.as_ref();
    read_points_csv_with_options(path, delimiter_for(path))
}

/// Read a point set with an explicit delimiter
pub fn read_points_csv_with_options(path: &Path, delimiter: u8) -> IoResult<PointSet> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let points = read_points(BufReader::new(file), delimiter)?;
    debug!(path = %path.display(), points = points.len(), "read point set");
    Ok(points)
}

/// Read a point set from any reader
pub fn read_points<R: Read>(reader: R, delimiter: u8) -> IoResult<PointSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(PointSet::new());
    }
    for column in REQUIRED_POINT_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(IoError::InvalidFormat(format!(
                "missing column '{}' (found: {})",
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            )));
        }
    }

    let mut points = PointSet::new();
    for record in reader.deserialize::<PointRecord>() {
        points.push(record?.into());
    }
    Ok(points)
}
