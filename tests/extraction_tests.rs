//! Extraction tests over real workbook fixtures
//!
//! Fixtures are generated with the sample writer, round-tripped through the
//! calamine-backed loader, so these tests exercise the same path an upload
//! takes.

use repricer::extract::{extract, ExtractionConfig};
use repricer::grid::{load_grid, CellAddress, CellValue, SheetGrid};
use repricer::sample::write_sample_workbook;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

fn write_rows(path: &std::path::Path, rows: &[(u32, &str, f64, f64)]) {
    let config = ExtractionConfig::default();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (row, name, price, stock) in rows {
        worksheet
            .write_string(*row, config.name_column as u16, *name)
            .unwrap();
        worksheet
            .write_number(*row, config.price_column as u16, *price)
            .unwrap();
        worksheet
            .write_number(*row, config.stock_column as u16, *stock)
            .unwrap();
    }
    workbook.save(path).unwrap();
}

fn load(path: &std::path::Path) -> SheetGrid {
    let bytes = std::fs::read(path).unwrap();
    load_grid("fixture.xlsx", &bytes).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// WORKBOOK ROUND TRIP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_workbook_rows_keep_absolute_addresses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.xlsx");
    // No content above row 5: calamine's range starts mid-sheet, and the
    // loader must restore absolute row numbers
    write_rows(&path, &[(5, "A", 100.0, 1.0), (7, "B", 200.0, 2.0)]);

    let grid = load(&path);
    let records = extract(&grid, &ExtractionConfig::default());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_row_index, 5);
    assert_eq!(records[1].source_row_index, 7);
}

#[test]
fn test_sample_workbook_extracts_all_products() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.xlsx");
    let config = ExtractionConfig::default();
    write_sample_workbook(&path, &config).unwrap();

    let records = extract(&load(&path), &config);
    assert_eq!(records.len(), 8);
    assert!(records
        .windows(2)
        .all(|pair| pair[0].source_row_index < pair[1].source_row_index));
}

#[test]
fn test_extraction_is_idempotent_over_workbook() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("idempotent.xlsx");
    write_rows(
        &path,
        &[(5, "A", 100.0, 1.0), (6, "B", 200.0, 2.0), (9, "C", 300.0, 3.0)],
    );

    let grid = load(&path);
    let config = ExtractionConfig::default();
    let first = extract(&grid, &config);
    let second = extract(&grid, &config);

    assert_eq!(first, second);
}

// ═══════════════════════════════════════════════════════════════════════════
// SCAN TERMINATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_row_threshold_over_workbook() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("threshold.xlsx");
    let config = ExtractionConfig {
        max_empty_rows: 4,
        ..ExtractionConfig::default()
    };
    // Row 5 has data, rows 6..=9 are exactly max_empty_rows blanks, row 10
    // has data again and must not be reached
    write_rows(&path, &[(5, "First", 100.0, 1.0), (10, "Beyond", 500.0, 5.0)]);

    let records = extract(&load(&path), &config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product_name, "First");
}

#[test]
fn test_legend_block_never_scanned() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legend.xlsx");
    write_rows(
        &path,
        &[
            (0, "LEGEND: do not touch", 0.0, 0.0),
            (3, "Product", 0.0, 0.0),
            (5, "Real product", 100.0, 1.0),
        ],
    );

    let records = extract(&load(&path), &ExtractionConfig::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product_name, "Real product");
}

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULTS AND EDGE CASES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_blank_price_and_stock_yield_zeros_not_skips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blanks.xlsx");
    let config = ExtractionConfig::default();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .write_string(5, config.name_column as u16, "Name only")
        .unwrap();
    workbook.save(&path).unwrap();

    let records = extract(&load(&path), &config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].price, 0.0);
    assert_eq!(records[0].stock, 0.0);
    assert_eq!(records[0].image, "");
}

#[test]
fn test_grid_without_range_yields_empty_list() {
    let grid = SheetGrid::new();
    assert!(extract(&grid, &ExtractionConfig::default()).is_empty());
}

#[test]
fn test_custom_column_layout() {
    let config = ExtractionConfig {
        name_column: 0,
        price_column: 1,
        stock_column: 2,
        image_column: 3,
        start_row: 1,
        ..ExtractionConfig::default()
    };
    let mut grid = SheetGrid::new();
    grid.set_value(CellAddress::new(0, 0), CellValue::Text("header".to_string()));
    grid.set_value(CellAddress::new(1, 0), CellValue::Text("Widget".to_string()));
    grid.set_value(CellAddress::new(1, 1), CellValue::Number(9.5));
    grid.set_value(CellAddress::new(1, 2), CellValue::Number(4.0));
    grid.set_value(
        CellAddress::new(1, 3),
        CellValue::Text("https://img.example.com/w.png".to_string()),
    );

    let records = extract(&grid, &config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product_name, "Widget");
    assert_eq!(records[0].price, 9.5);
    assert_eq!(records[0].image, "https://img.example.com/w.png");
}
