//! Heuristic extraction of product records from a sheet grid
//!
//! Inventory exports keep a reserved legend/header block above the data and
//! populate only a handful of columns, with blank spacer rows in between.
//! Extraction therefore scans a fixed column layout from a fixed start row,
//! stops after a run of consecutive empty rows, and distrusts the declared
//! sheet range when it is implausibly small (trailing rows that carry only
//! formatting are invisible to the declared range).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{CellValue, GridRange, SheetGrid};
use crate::types::ProductRecord;

/// Declared ranges below this row count are considered untrustworthy.
const SMALL_RANGE_ROWS: u32 = 100;
/// Ceiling used when the declared range is untrustworthy.
const FORCED_CEILING: u32 = 1000;
/// Safety margin scanned past a trusted declared range.
const SCAN_MARGIN: u32 = 100;
/// Absolute scan ceiling, regardless of the declared range.
const ABSOLUTE_CEILING: u32 = 5000;

/// Fixed column layout and scan policy for one upload format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Column holding the product name (default: D).
    pub name_column: u32,
    /// Column holding the price (default: F).
    pub price_column: u32,
    /// Column holding the stock count (default: H).
    pub stock_column: u32,
    /// Column holding the image reference (default: U).
    pub image_column: u32,
    /// First data row; everything above is the reserved legend block and is
    /// never scanned as data.
    pub start_row: u32,
    /// Consecutive empty rows that terminate the scan.
    pub max_empty_rows: u32,
    /// Hard cap on the scan ceiling, whatever the range policy computes.
    pub max_scan_rows: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            name_column: 3,
            price_column: 5,
            stock_column: 7,
            image_column: 20,
            start_row: 5,
            max_empty_rows: 20,
            max_scan_rows: 50_000,
        }
    }
}

/// Scan `grid` under `config` and return product records in row order.
///
/// A row is a hit when its name cell is non-empty after trimming; missing
/// price/stock default to 0 and a missing image to an empty string. A grid
/// with no declared range yields an empty list, not an error — "no data" is
/// the caller's state to surface.
pub fn extract(grid: &SheetGrid, config: &ExtractionConfig) -> Vec<ProductRecord> {
    let Some(range) = grid.range() else {
        debug!("grid has no declared range, nothing to extract");
        return Vec::new();
    };

    let ceiling = scan_ceiling(&range).min(config.max_scan_rows);
    debug!(
        start_row = config.start_row,
        ceiling,
        declared_max_row = range.max_row,
        "scanning for product rows"
    );

    let mut records = Vec::new();
    let mut consecutive_empty = 0u32;
    let mut last_scanned = config.start_row;

    for row in config.start_row..=ceiling {
        last_scanned = row;

        let name = grid
            .value(row, config.name_column)
            .map(CellValue::as_display_text)
            .unwrap_or_default();
        let name = name.trim();

        if name.is_empty() {
            consecutive_empty += 1;
            if consecutive_empty >= config.max_empty_rows {
                debug!(row, "empty-row threshold reached, stopping scan");
                break;
            }
            continue;
        }

        consecutive_empty = 0;

        let price = grid
            .value(row, config.price_column)
            .and_then(CellValue::as_number)
            .unwrap_or(0.0);
        let stock = grid
            .value(row, config.stock_column)
            .and_then(CellValue::as_number)
            .unwrap_or(0.0);
        let image = grid
            .value(row, config.image_column)
            .map(CellValue::as_display_text)
            .unwrap_or_default();

        records.push(ProductRecord::new(name, price, stock, image, row));
    }

    info!(
        records = records.len(),
        rows_scanned = last_scanned - config.start_row + 1,
        "extraction complete"
    );
    records
}

/// Ceiling policy: distrust implausibly small declared ranges and force a
/// deep scan; otherwise scan to the declared end plus a margin, capped.
fn scan_ceiling(range: &GridRange) -> u32 {
    if range.max_row < SMALL_RANGE_ROWS {
        FORCED_CEILING
    } else {
        (range.max_row + SCAN_MARGIN).min(ABSOLUTE_CEILING)
    }
}
