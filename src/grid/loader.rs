//! Grid loaders: workbook (.xlsx / .xls) via calamine, .csv via the csv crate
//!
//! Loaders parse from the uploaded bytes, never from a second disk read, so
//! the byte-for-byte original retained for reconciliation is exactly what was
//! parsed.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::error::{RepricerError, RepricerResult};
use crate::grid::model::{CellAddress, CellValue, GridRange, SheetGrid};

/// Accepted upload extensions, checked before any parsing is attempted.
pub const VALID_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".csv"];

/// Reject uploads that are not spreadsheet files, pre-parse.
pub fn validate_extension(file_name: &str) -> RepricerResult<()> {
    let lowered = file_name.to_lowercase();
    if VALID_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
        Ok(())
    } else {
        Err(RepricerError::Validation(format!(
            "only Excel (.xlsx, .xls) or CSV files can be uploaded, got: {}",
            file_name
        )))
    }
}

/// Load the uploaded bytes into a [`SheetGrid`], dispatching on extension.
///
/// Workbooks use the first sheet only, matching the upload contract.
pub fn load_grid(file_name: &str, bytes: &[u8]) -> RepricerResult<SheetGrid> {
    validate_extension(file_name)?;

    if file_name.to_lowercase().ends_with(".csv") {
        load_csv_grid(bytes)
    } else {
        load_workbook_grid(bytes)
    }
}

fn load_workbook_grid(bytes: &[u8]) -> RepricerResult<SheetGrid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| RepricerError::Parse(format!("failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first_sheet) = sheet_names.first() else {
        debug!("workbook has no sheets");
        return Ok(SheetGrid::new());
    };

    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| RepricerError::Parse(format!("failed to read sheet '{}': {}", first_sheet, e)))?;

    let mut grid = SheetGrid::new();
    if range.is_empty() {
        return Ok(grid);
    }

    // calamine ranges are relative to their start offset; restore absolute
    // addresses so source_row_index matches the real sheet row.
    let start = range.start().unwrap_or((0, 0));
    for (row_offset, row) in range.rows().enumerate() {
        for (col_offset, data) in row.iter().enumerate() {
            let value = cell_value_from(data);
            if value.is_empty() {
                continue;
            }
            let addr = CellAddress::new(start.0 + row_offset as u32, start.1 + col_offset as u32);
            grid.set_value(addr, value);
        }
    }

    // Keep the declared bounding range even where trailing cells are empty;
    // the extraction ceiling policy depends on it.
    if let (Some(range_start), Some(range_end)) = (range.start(), range.end()) {
        grid.declare_range(GridRange {
            min_row: range_start.0,
            max_row: range_end.0,
            min_col: range_start.1,
            max_col: range_end.1,
        });
    }

    debug!(cells = grid.cell_count(), "workbook grid loaded");
    Ok(grid)
}

fn load_csv_grid(bytes: &[u8]) -> RepricerResult<SheetGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = SheetGrid::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RepricerError::Parse(format!("bad CSV row {}: {}", row + 1, e)))?;
        for (col, field) in record.iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            let value = match field.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(field.to_string()),
            };
            grid.set_value(CellAddress::new(row as u32, col as u32), value);
        }
    }

    debug!(cells = grid.cell_count(), "csv grid loaded");
    Ok(grid)
}

fn cell_value_from(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        // Error cells carry no usable value for extraction
        Data::Error(_) => CellValue::Empty,
    }
}
