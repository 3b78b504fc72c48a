//! overplot-io - CSV handoff for overplot
//!
//! Long-form tables are the boundary between this workspace and whatever
//! charting library draws the result:
//!
//! - **Points**: `x,y,group,value` rows of a [`PointSet`](overplot_core::PointSet)
//! - **Cells**: `row,col,x_center,y_center,count,value` rows of a binned grid
//! - **Contours**: `x,y,density,group` rows of a density table
//!
//! Tab-separated files are recognised by their `.tsv` extension.

pub mod reader;
pub mod writer;

pub use reader::*;
pub use writer::*;
