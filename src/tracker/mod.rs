//! In-memory dataset of extracted product records
//!
//! The tracker records user edits and bulk price-search results as diffs
//! against the values extracted from the upload. Manual edits and bulk
//! results are distinguished: a manual edit never touches the bulk-lookup
//! baseline (`original_price`), so the before/after-search comparison
//! survives later hand corrections.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::{format_signed_delta, PriceSearchItem, PriceSearchResult, ProductRecord};

/// Non-mutating orderings over the tracked records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Original extraction order (by source row).
    Original,
    PriceAscending,
    PriceDescending,
    /// By signed bulk-lookup delta; records without a delta sort last.
    DeltaAscending,
    DeltaDescending,
}

/// Outcome of merging one batch of bulk price-search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Product names updated by the merge.
    pub updated: Vec<String>,
    /// Results dropped because the new price equals the search-time price.
    pub noops: usize,
    /// Records skipped because they were edited while the job was in flight.
    pub conflicts: Vec<String>,
    /// Result names that matched no record (surfaced, never silently lost).
    pub unmatched: Vec<String>,
}

impl MergeReport {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }
}

/// Ordered collection of product records, indexed by position.
///
/// Records are indexed by position rather than by `source_row_index` because
/// source rows may be sparse; the row index is carried on each record and
/// used only when writing patches back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductTracker {
    records: Vec<ProductRecord>,
}

impl ProductTracker {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ProductRecord> {
        self.records.get(index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ProductRecord> {
        self.records.iter().find(|r| r.product_name == name)
    }

    pub fn modified_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_modified).count()
    }

    /// Overwrite price and stock by hand. Marks the record modified and
    /// leaves `original_price`/`price_change_label` untouched so a prior
    /// bulk-lookup comparison is not lost.
    pub fn apply_manual_edit(
        &mut self,
        index: usize,
        new_price: f64,
        new_stock: f64,
    ) -> Option<&ProductRecord> {
        let record = self.records.get_mut(index)?;
        record.price = new_price;
        record.stock = new_stock;
        record.is_modified = true;
        record.revision += 1;
        Some(&self.records[index])
    }

    /// Apply one bulk result to the record at `index`. The baseline becomes
    /// the price at search time, which may already differ from the record's
    /// extraction-time price.
    pub fn apply_bulk_result(&mut self, index: usize, result: &PriceSearchResult) -> Option<&ProductRecord> {
        let record = self.records.get_mut(index)?;
        record.original_price = Some(result.current_price);
        record.price = result.new_price;
        record.price_change_label =
            Some(format_signed_delta(result.new_price - result.current_price));
        record.filter_info = result.filter_info.clone();
        record.search_keyword = result.search_keyword.clone();
        record.valid_items_count = result.valid_items_count;
        record.is_modified = true;
        record.revision += 1;
        Some(&self.records[index])
    }

    /// The full product list, in order, as submitted to the price-search
    /// service.
    pub fn search_items(&self) -> Vec<PriceSearchItem> {
        self.records
            .iter()
            .map(|r| PriceSearchItem {
                product_name: r.product_name.clone(),
                current_price: r.price,
            })
            .collect()
    }

    /// Per-record revisions keyed by source row, captured at job submission
    /// to detect edits made while the job runs.
    pub fn revision_snapshot(&self) -> HashMap<u32, u64> {
        self.records
            .iter()
            .map(|r| (r.source_row_index, r.revision))
            .collect()
    }

    /// Merge one completed batch of bulk results.
    ///
    /// Matching is deterministic: a result carrying a 1-based `row` targets
    /// the record with that source row; a result without one consumes the
    /// first not-yet-claimed record with the same trimmed name. Records whose
    /// revision moved since `snapshot` keep their manual edit and are
    /// reported as conflicts. Targets are resolved for the whole batch before
    /// anything is applied, so a merge is all-or-per-record, never a
    /// half-written batch.
    pub fn merge_bulk_results(
        &mut self,
        results: &[PriceSearchResult],
        snapshot: &HashMap<u32, u64>,
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let mut claimed: HashSet<usize> = HashSet::new();
        let mut planned: Vec<(usize, usize)> = Vec::new(); // (record idx, result idx)

        for (result_idx, result) in results.iter().enumerate() {
            if result.is_noop() {
                report.noops += 1;
                continue;
            }

            let target = match result.row {
                Some(row) => self
                    .records
                    .iter()
                    .position(|r| r.excel_row() == row)
                    .filter(|i| !claimed.contains(i)),
                None => {
                    let wanted = result.product_name.trim();
                    self.records
                        .iter()
                        .enumerate()
                        .position(|(i, r)| !claimed.contains(&i) && r.product_name == wanted)
                }
            };

            let Some(index) = target else {
                debug!(product = %result.product_name, "bulk result matched no record");
                report.unmatched.push(result.product_name.clone());
                continue;
            };

            let record = &self.records[index];
            let untouched = snapshot
                .get(&record.source_row_index)
                .is_some_and(|rev| *rev == record.revision);
            if untouched {
                claimed.insert(index);
                planned.push((index, result_idx));
            } else {
                report.conflicts.push(record.product_name.clone());
            }
        }

        for (index, result_idx) in planned {
            self.apply_bulk_result(index, &results[result_idx]);
            report.updated.push(self.records[index].product_name.clone());
        }

        report
    }

    /// Pure projection of the records under `order`. Never reorders or
    /// mutates the underlying collection.
    pub fn sorted_view(&self, order: SortOrder) -> Vec<&ProductRecord> {
        let mut view: Vec<&ProductRecord> = self.records.iter().collect();
        match order {
            SortOrder::Original => {}
            SortOrder::PriceAscending => view.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortOrder::PriceDescending => view.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortOrder::DeltaAscending => view.sort_by(|a, b| cmp_delta(a, b, false)),
            SortOrder::DeltaDescending => view.sort_by(|a, b| cmp_delta(a, b, true)),
        }
        view
    }
}

fn cmp_delta(a: &ProductRecord, b: &ProductRecord, descending: bool) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.price_delta(), b.price_delta()) {
        (Some(x), Some(y)) => {
            if descending {
                y.total_cmp(&x)
            } else {
                x.total_cmp(&y)
            }
        }
        // Records that never went through a bulk lookup sort last either way
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
