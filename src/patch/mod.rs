//! Change-set building and remote reconciliation
//!
//! The client never rewrites the workbook itself: only the reconciliation
//! service can patch cells while keeping every untouched byte of the original
//! file intact. The client's responsibilities are (a) shipping the pristine
//! original bytes, (b) a minimal change-set keyed by row, and (c) validating
//! the returned blob and deriving a safe download filename.
//!
//! External contract the service must honor: only the price and stock cells
//! at the listed rows change value; formatting, merges, and untouched cells
//! are preserved; the declared bounding range is preserved or grown, never
//! shrunk.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{RepricerError, RepricerResult};
use crate::types::{ProductRecord, UploadedFile};

/// One modified row, as sent to the reconciliation service.
///
/// Rows are communicated both ways to rule out off-by-one bugs:
/// `originalRowIndex` is 0-based, `excelRow` is the 1-based row users see,
/// and `excelRow == originalRowIndex + 1` always.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub original_row_index: u32,
    pub excel_row: u32,
    pub product_name: String,
    pub price: f64,
    pub stock: f64,
    pub filter_info: String,
    pub search_keyword: String,
    pub valid_count: u32,
}

/// Minimal list of per-row changes derived from modified records.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    /// Collect the modified subset of `records`, ordered by source row.
    ///
    /// An empty change-set is a defined failure ([`RepricerError::NothingToPatch`]),
    /// not a zero-length download. Each source row appears at most once.
    pub fn from_records(records: &[ProductRecord]) -> RepricerResult<Self> {
        let mut entries: Vec<ChangeEntry> = records
            .iter()
            .filter(|r| r.is_modified)
            .map(|r| ChangeEntry {
                original_row_index: r.source_row_index,
                excel_row: r.excel_row(),
                product_name: r.product_name.clone(),
                price: r.price,
                stock: r.stock,
                filter_info: r.filter_info.clone().unwrap_or_default(),
                search_keyword: r.search_keyword.clone().unwrap_or_default(),
                valid_count: r.valid_items_count.unwrap_or(0),
            })
            .collect();

        if entries.is_empty() {
            return Err(RepricerError::NothingToPatch);
        }

        entries.sort_by_key(|e| e.original_row_index);
        entries.dedup_by_key(|e| e.original_row_index);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> RepricerResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

/// The patched workbook returned by the reconciliation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// HTTP client for the reconciliation/patch service.
pub struct ReconcileClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ReconcileClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the request timeout (files can be large; default 60 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the original bytes plus the change-set and return the patched
    /// workbook. The cached original is cloned into the request body and
    /// never mutated.
    pub async fn reconcile(
        &self,
        original: &UploadedFile,
        changes: &ChangeSet,
    ) -> RepricerResult<PatchedFile> {
        let url = format!("{}/download-excel/", self.base_url.trim_end_matches('/'));
        info!(
            url = %url,
            changes = changes.len(),
            original_bytes = original.bytes.len(),
            "requesting reconciliation"
        );

        let file_part = Part::bytes(original.bytes.clone())
            .file_name(original.name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| RepricerError::PatchRequest(e.to_string()))?;
        let form = Form::new()
            .part("excel_file", file_part)
            .text("modifications", changes.to_json()?)
            .text("original_filename", original.name.clone());

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RepricerError::PatchRequest(
                        "request timed out; the file may be large or the server slow".to_string(),
                    )
                } else {
                    RepricerError::PatchRequest(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let is_json = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("application/json"));
            let body = response.text().await.unwrap_or_default();
            let message = if is_json {
                serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                    .unwrap_or_else(|| format!("server error: {}", status.as_u16()))
            } else if body.is_empty() {
                format!("server error: {}", status.as_u16())
            } else {
                format!("server error: {} {}", status.as_u16(), body)
            };
            return Err(RepricerError::PatchRequest(message));
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| fallback_download_name(&original.name));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RepricerError::PatchRequest(e.to_string()))?;
        if bytes.is_empty() {
            return Err(RepricerError::PatchRequest(
                "received an empty file from the reconciliation service".to_string(),
            ));
        }

        debug!(file = %file_name, bytes = bytes.len(), "patched file received");
        Ok(PatchedFile {
            file_name,
            bytes: bytes.to_vec(),
        })
    }
}

/// Extract a filename from a `Content-Disposition` header value.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    static BARE: OnceLock<Regex> = OnceLock::new();
    let quoted = QUOTED.get_or_init(|| {
        Regex::new(r#"filename\s*=\s*"([^"]+)""#).expect("static regex is valid")
    });
    let bare = BARE.get_or_init(|| {
        Regex::new(r"filename\s*=\s*([^;\s]+)").expect("static regex is valid")
    });

    quoted
        .captures(value)
        .or_else(|| bare.captures(value))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches('\'').to_string())
        .filter(|name| !name.is_empty())
}

/// Derive a download name when the service sends no filename hint:
/// the original stem with a fixed `_modified.xlsx` suffix.
pub fn fallback_download_name(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}_modified.xlsx"),
        _ => format!("{original}_modified.xlsx"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modified_record(name: &str, row: u32, price: f64) -> ProductRecord {
        let mut record = ProductRecord::new(name, price, 10.0, "", row);
        record.is_modified = true;
        record
    }

    #[test]
    fn test_change_set_contains_only_modified_records() {
        let records = vec![
            ProductRecord::new("A", 100.0, 1.0, "", 5),
            modified_record("B", 6, 250.0),
            ProductRecord::new("C", 300.0, 3.0, "", 7),
        ];

        let changes = ChangeSet::from_records(&records).unwrap();
        assert_eq!(changes.len(), 1);
        let entry = &changes.entries()[0];
        assert_eq!(entry.product_name, "B");
        assert_eq!(entry.original_row_index, 6);
        assert_eq!(entry.excel_row, 7);
        assert_eq!(entry.price, 250.0);
    }

    #[test]
    fn test_empty_change_set_is_a_defined_failure() {
        let records = vec![ProductRecord::new("A", 100.0, 1.0, "", 5)];
        let err = ChangeSet::from_records(&records).unwrap_err();
        assert!(matches!(err, RepricerError::NothingToPatch));
    }

    #[test]
    fn test_change_set_never_repeats_a_row() {
        let records = vec![
            modified_record("A", 5, 100.0),
            modified_record("A again", 5, 120.0),
            modified_record("B", 9, 200.0),
        ];

        let changes = ChangeSet::from_records(&records).unwrap();
        let mut rows: Vec<u32> = changes.entries().iter().map(|e| e.original_row_index).collect();
        let before = rows.len();
        rows.dedup();
        assert_eq!(rows.len(), before);
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_change_set_is_ordered_by_row() {
        let records = vec![
            modified_record("Late", 20, 1.0),
            modified_record("Early", 5, 2.0),
        ];
        let changes = ChangeSet::from_records(&records).unwrap();
        assert_eq!(changes.entries()[0].product_name, "Early");
        assert_eq!(changes.entries()[1].product_name, "Late");
    }

    #[test]
    fn test_change_set_json_uses_wire_names() {
        let records = vec![modified_record("B", 6, 250.0)];
        let json = ChangeSet::from_records(&records).unwrap().to_json().unwrap();
        assert!(json.contains("\"originalRowIndex\":6"));
        assert!(json.contains("\"excelRow\":7"));
        assert!(json.contains("\"productName\":\"B\""));
    }

    #[test]
    fn test_filename_from_content_disposition() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="report_modified.xlsx""#),
            Some("report_modified.xlsx".to_string())
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=plain.xlsx"),
            Some("plain.xlsx".to_string())
        );
        assert_eq!(filename_from_content_disposition("attachment"), None);
    }

    #[test]
    fn test_fallback_download_name() {
        assert_eq!(
            fallback_download_name("inventory.xlsx"),
            "inventory_modified.xlsx"
        );
        assert_eq!(fallback_download_name("export.v2.csv"), "export.v2_modified.xlsx");
        assert_eq!(fallback_download_name("noext"), "noext_modified.xlsx");
    }
}
