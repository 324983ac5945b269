//! Sparse grid model for uploaded spreadsheets
//!
//! A [`SheetGrid`] is an addressable map of cells over a declared bounding
//! range. It is sparse by design: real inventory sheets have large declared
//! ranges with mostly-empty rows, and a dense 2D array would be pathological
//! under the forced scan ceiling used by extraction.

mod loader;
mod model;

pub use loader::{load_grid, validate_extension, VALID_EXTENSIONS};
pub use model::{Cell, CellAddress, CellValue, GridRange, SheetGrid};
