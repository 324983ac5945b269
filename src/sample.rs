//! Demo inventory workbook generator
//!
//! Writes a small store-inventory sheet in the layout the extractor expects:
//! a reserved legend block up top, then sparse product rows with name, price,
//! stock, and image reference in their fixed columns. Used by the `sample`
//! CLI command and as a fixture source in tests.

use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::{RepricerError, RepricerResult};
use crate::extract::ExtractionConfig;

/// (name, price, stock, rows skipped before this entry)
const SAMPLE_PRODUCTS: [(&str, f64, f64, u32); 8] = [
    ("Charizard EX SV3-125", 45000.0, 3.0, 0),
    ("Pikachu V SWSH-062", 8000.0, 12.0, 0),
    ("Mewtwo GX SM-039", 15000.0, 5.0, 0),
    ("Monkey D. Luffy OP01-003", 120000.0, 1.0, 1),
    ("Roronoa Zoro OP01-025", 38000.0, 2.0, 0),
    ("Nami OP01-016", 9500.0, 7.0, 0),
    ("Agumon BT1-010", 3000.0, 20.0, 2),
    ("Gabumon BT1-029", 2500.0, 15.0, 0),
];

/// Write the demo workbook to `path` using `config`'s column layout.
pub fn write_sample_workbook(path: &Path, config: &ExtractionConfig) -> RepricerResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // Reserved legend block above the data region
    worksheet
        .write_string(0, 0, "Store inventory export")
        .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
    worksheet
        .write_string(1, 0, "Generated by repricer sample")
        .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
    if config.start_row >= 2 {
        worksheet
            .write_string(config.start_row - 1, config.name_column as u16, "Product")
            .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
    }

    let mut row = config.start_row;
    for (name, price, stock, gap) in SAMPLE_PRODUCTS {
        row += gap;
        worksheet
            .write_string(row, config.name_column as u16, name)
            .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
        worksheet
            .write_number(row, config.price_column as u16, price)
            .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
        worksheet
            .write_number(row, config.stock_column as u16, stock)
            .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
        worksheet
            .write_string(
                row,
                config.image_column as u16,
                format!("https://img.example.com/{}.jpg", row),
            )
            .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
        row += 1;
    }

    workbook
        .save(path)
        .map_err(|e| RepricerError::WorkbookWrite(e.to_string()))?;
    Ok(())
}
