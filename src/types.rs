use serde::{Deserialize, Serialize};

//==============================================================================
// Product records
//==============================================================================

/// A single product extracted from one spreadsheet row.
///
/// `source_row_index` is the 0-based row the record came from and is the sole
/// key used to write changes back to the file. The 1-based Excel row shown to
/// users and sent to the reconciliation service is always
/// `source_row_index + 1` (see [`ProductRecord::excel_row`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub product_name: String,
    pub price: f64,
    pub stock: f64,
    /// Image URL or reference; empty when the row has none.
    pub image: String,
    pub source_row_index: u32,
    pub is_modified: bool,
    /// Price at the time of the last bulk lookup, if one has been applied.
    pub original_price: Option<f64>,
    /// Signed human-readable delta ("+1000", "-500") from the last bulk lookup.
    pub price_change_label: Option<String>,
    pub filter_info: Option<String>,
    pub search_keyword: Option<String>,
    pub valid_items_count: Option<u32>,
    /// Bumped on every mutation; used to detect manual edits made while a
    /// bulk job was in flight.
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl ProductRecord {
    pub fn new(
        product_name: impl Into<String>,
        price: f64,
        stock: f64,
        image: impl Into<String>,
        source_row_index: u32,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            price,
            stock,
            image: image.into(),
            source_row_index,
            is_modified: false,
            original_price: None,
            price_change_label: None,
            filter_info: None,
            search_keyword: None,
            valid_items_count: None,
            revision: 0,
        }
    }

    /// 1-based Excel row number for this record.
    pub fn excel_row(&self) -> u32 {
        self.source_row_index + 1
    }

    /// Signed price change since the last bulk lookup, if one was applied.
    pub fn price_delta(&self) -> Option<f64> {
        self.original_price.map(|original| self.price - original)
    }
}

/// The original uploaded file, held byte-for-byte as received.
///
/// These bytes are never mutated client-side; the reconciliation service is
/// the only party that rewrites the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

//==============================================================================
// Price-search wire types
//==============================================================================

/// One item submitted to the bulk price-search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSearchItem {
    pub product_name: String,
    pub current_price: f64,
}

/// One result returned by the price-search service.
///
/// `row` is an optional 1-based Excel row echoed by backends that support
/// row-keyed matching; when absent, results are matched by product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSearchResult {
    pub product_name: String,
    pub current_price: f64,
    pub new_price: f64,
    #[serde(default)]
    pub price_diff: f64,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub filter_info: Option<String>,
    #[serde(default)]
    pub search_keyword: Option<String>,
    #[serde(default)]
    pub valid_items_count: Option<u32>,
}

impl PriceSearchResult {
    /// A result whose new price equals the price at search time changes
    /// nothing and is dropped before merging.
    pub fn is_noop(&self) -> bool {
        self.new_price == self.current_price
    }
}

/// Lifecycle stage of a bulk price-search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Initializing,
    Processing,
    Completed,
    Error,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Error)
    }
}

/// Snapshot of a job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub stage: JobStage,
    /// Percent complete, 0-100.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub processed_items: u64,
    #[serde(default)]
    pub total_items: u64,
    /// Estimated seconds remaining, when the backend reports one.
    #[serde(default)]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub current_item: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<PriceSearchResult>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response body of the job-start endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StartJobResponse {
    pub job_id: String,
}

//==============================================================================
// Formatting helpers
//==============================================================================

/// Format a number for display, removing unnecessary decimal places
pub fn format_amount(n: f64) -> String {
    // Round to 6 decimal places for display; also trims f64 artifacts
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Format a signed price delta, e.g. `+1000` or `-500`.
pub fn format_signed_delta(diff: f64) -> String {
    let formatted = format_amount(diff);
    if diff > 0.0 {
        format!("+{formatted}")
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_trims_trailing_zeros() {
        assert_eq!(format_amount(10.0), "10");
        assert_eq!(format_amount(10.5), "10.5");
        assert_eq!(format_amount(-3.25), "-3.25");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn test_format_signed_delta() {
        assert_eq!(format_signed_delta(1000.0), "+1000");
        assert_eq!(format_signed_delta(-10.0), "-10");
        assert_eq!(format_signed_delta(0.5), "+0.5");
    }

    #[test]
    fn test_excel_row_is_one_based() {
        let record = ProductRecord::new("Charizard EX", 100.0, 3.0, "", 5);
        assert_eq!(record.excel_row(), 6);
    }

    #[test]
    fn test_price_delta_requires_bulk_baseline() {
        let mut record = ProductRecord::new("Pikachu V", 100.0, 1.0, "", 5);
        assert_eq!(record.price_delta(), None);

        record.original_price = Some(120.0);
        assert_eq!(record.price_delta(), Some(-20.0));
    }

    #[test]
    fn test_job_stage_serde_forms() {
        let stage: JobStage = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(stage, JobStage::Processing);
        assert!(!stage.is_terminal());

        let stage: JobStage = serde_json::from_str("\"completed\"").unwrap();
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_price_search_item_wire_names_are_camel_case() {
        let item = PriceSearchItem {
            product_name: "Blue-Eyes White Dragon".to_string(),
            current_price: 45000.0,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"productName\""));
        assert!(json.contains("\"currentPrice\""));
    }

    #[test]
    fn test_price_search_result_defaults_optional_fields() {
        let json = r#"{"productName": "A", "currentPrice": 100, "newPrice": 90}"#;
        let result: PriceSearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.new_price, 90.0);
        assert_eq!(result.row, None);
        assert_eq!(result.filter_info, None);
        assert!(!result.is_noop());
    }

    #[test]
    fn test_noop_result_detection() {
        let result = PriceSearchResult {
            product_name: "A".to_string(),
            current_price: 100.0,
            new_price: 100.0,
            price_diff: 0.0,
            row: None,
            filter_info: None,
            search_keyword: None,
            valid_items_count: None,
        };
        assert!(result.is_noop());
    }
}
