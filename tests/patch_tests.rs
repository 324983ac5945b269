//! Change-set and reconciliation contract tests
//!
//! The reconciliation service itself is remote; its cell-patching contract is
//! exercised here against an in-process stub that applies a change-set to a
//! grid the way the service is required to: touch only the listed price and
//! stock cells, preserve everything else bit-identically, never shrink the
//! declared range.

use repricer::extract::ExtractionConfig;
use repricer::grid::{Cell, CellAddress, CellValue, SheetGrid};
use repricer::patch::{fallback_download_name, ChangeSet};
use repricer::types::ProductRecord;
use repricer::RepricerError;

fn modified(name: &str, row: u32, price: f64, stock: f64) -> ProductRecord {
    let mut record = ProductRecord::new(name, price, stock, "", row);
    record.is_modified = true;
    record
}

/// In-process stand-in for the reconciliation service's patch step.
fn apply_change_set(grid: &SheetGrid, changes: &ChangeSet, config: &ExtractionConfig) -> SheetGrid {
    let mut patched = grid.clone();
    for entry in changes.entries() {
        let price_addr = CellAddress::new(entry.original_row_index, config.price_column);
        let stock_addr = CellAddress::new(entry.original_row_index, config.stock_column);
        // Keep the original cell's formatting, change only the value
        let price_format = grid.cell(price_addr).and_then(|c| c.format.clone());
        let stock_format = grid.cell(stock_addr).and_then(|c| c.format.clone());
        patched.insert(
            price_addr,
            Cell {
                value: CellValue::Number(entry.price),
                format: price_format,
            },
        );
        patched.insert(
            stock_addr,
            Cell {
                value: CellValue::Number(entry.stock),
                format: stock_format,
            },
        );
    }
    patched
}

fn formatted_grid(config: &ExtractionConfig) -> SheetGrid {
    let mut grid = SheetGrid::new();
    for row in 9..=11u32 {
        grid.insert(
            CellAddress::new(row, config.name_column),
            Cell {
                value: CellValue::Text(format!("Product {row}")),
                format: Some("font:bold".to_string()),
            },
        );
        grid.insert(
            CellAddress::new(row, config.price_column),
            Cell {
                value: CellValue::Number(100.0 * row as f64),
                format: Some("numfmt:#,##0".to_string()),
            },
        );
        grid.insert(
            CellAddress::new(row, config.stock_column),
            Cell {
                value: CellValue::Number(row as f64),
                format: Some("numfmt:0".to_string()),
            },
        );
    }
    grid
}

// ═══════════════════════════════════════════════════════════════════════════
// CHANGE-SET PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_change_set_length_equals_modified_count() {
    let records = vec![
        ProductRecord::new("A", 100.0, 1.0, "", 5),
        modified("B", 6, 250.0, 2.0),
        ProductRecord::new("C", 300.0, 3.0, "", 7),
        modified("D", 9, 50.0, 4.0),
    ];

    let modified_count = records.iter().filter(|r| r.is_modified).count();
    let changes = ChangeSet::from_records(&records).unwrap();
    assert_eq!(changes.len(), modified_count);
}

#[test]
fn test_change_set_rows_are_unique() {
    let records = vec![
        modified("A", 5, 100.0, 1.0),
        modified("B", 6, 200.0, 2.0),
        modified("C", 7, 300.0, 3.0),
    ];
    let changes = ChangeSet::from_records(&records).unwrap();

    let mut rows: Vec<u32> = changes
        .entries()
        .iter()
        .map(|e| e.original_row_index)
        .collect();
    let total = rows.len();
    rows.sort_unstable();
    rows.dedup();
    assert_eq!(rows.len(), total);
}

#[test]
fn test_excel_row_mapping_is_documented_plus_one() {
    let changes = ChangeSet::from_records(&[modified("B", 6, 250.0, 2.0)]).unwrap();
    let entry = &changes.entries()[0];
    assert_eq!(entry.excel_row, entry.original_row_index + 1);
}

#[test]
fn test_unmodified_dataset_is_nothing_to_patch() {
    let records = vec![
        ProductRecord::new("A", 100.0, 1.0, "", 5),
        ProductRecord::new("B", 200.0, 2.0, "", 6),
    ];
    assert!(matches!(
        ChangeSet::from_records(&records),
        Err(RepricerError::NothingToPatch)
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMATTING PRESERVATION (service contract, in-process stub)
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_patching_one_row_leaves_neighbors_bit_identical() {
    let config = ExtractionConfig::default();
    let grid = formatted_grid(&config);

    let changes = ChangeSet::from_records(&[modified("Product 10", 10, 777.0, 9.0)]).unwrap();
    let patched = apply_change_set(&grid, &changes, &config);

    // Rows 9 and 11 are untouched in full
    for row in [9u32, 11] {
        for col in [config.name_column, config.price_column, config.stock_column] {
            let addr = CellAddress::new(row, col);
            assert_eq!(grid.cell(addr), patched.cell(addr), "cell {addr:?} changed");
        }
    }

    // Row 10: name cell untouched, price/stock changed in value only
    let name_addr = CellAddress::new(10, config.name_column);
    assert_eq!(grid.cell(name_addr), patched.cell(name_addr));

    let price_cell = patched.cell(CellAddress::new(10, config.price_column)).unwrap();
    assert_eq!(price_cell.value, CellValue::Number(777.0));
    assert_eq!(price_cell.format.as_deref(), Some("numfmt:#,##0"));

    let stock_cell = patched.cell(CellAddress::new(10, config.stock_column)).unwrap();
    assert_eq!(stock_cell.value, CellValue::Number(9.0));
    assert_eq!(stock_cell.format.as_deref(), Some("numfmt:0"));
}

#[test]
fn test_patching_never_shrinks_the_declared_range() {
    let config = ExtractionConfig::default();
    let grid = formatted_grid(&config);
    let before = grid.range().unwrap();

    let changes = ChangeSet::from_records(&[modified("Product 9", 9, 1.0, 1.0)]).unwrap();
    let patched = apply_change_set(&grid, &changes, &config);
    let after = patched.range().unwrap();

    assert!(after.min_row <= before.min_row);
    assert!(after.max_row >= before.max_row);
    assert!(after.min_col <= before.min_col);
    assert!(after.max_col >= before.max_col);
}

// ═══════════════════════════════════════════════════════════════════════════
// DOWNLOAD NAMING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_fallback_name_derives_from_original() {
    assert_eq!(
        fallback_download_name("store-2026-08.xlsx"),
        "store-2026-08_modified.xlsx"
    );
    assert_eq!(fallback_download_name("export.csv"), "export_modified.xlsx");
}
