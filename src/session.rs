//! Upload session: the one active document and everything derived from it
//!
//! A session owns the uploaded file bytes, the parsed grid, the tracked
//! records, and the single-active-job slot. The original bytes are retained
//! exactly as received — reconciliation ships them back untouched — and a
//! fresh upload discards every piece of prior state.

use std::path::Path;

use tracing::info;
use uuid::Uuid;

use crate::error::{RepricerError, RepricerResult};
use crate::extract::{extract, ExtractionConfig};
use crate::grid::{load_grid, validate_extension, SheetGrid};
use crate::job::JobSlot;
use crate::patch::ChangeSet;
use crate::tracker::ProductTracker;
use crate::types::UploadedFile;

pub struct UploadSession {
    id: Uuid,
    config: ExtractionConfig,
    original: Option<UploadedFile>,
    grid: Option<SheetGrid>,
    tracker: ProductTracker,
    job_slot: JobSlot,
}

impl UploadSession {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            original: None,
            grid: None,
            tracker: ProductTracker::default(),
            job_slot: JobSlot::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The session's job slot; clones share state, so every coordinator
    /// created for this session observes the same single-active-job lock.
    pub fn job_slot(&self) -> JobSlot {
        self.job_slot.clone()
    }

    /// Validate, parse, and extract an uploaded file. Returns the number of
    /// records extracted — zero is the defined "no data found" state, not an
    /// error.
    ///
    /// The extension is checked before any parsing; a parse failure leaves
    /// the session in the pre-upload state.
    pub fn upload(&mut self, file_name: &str, bytes: Vec<u8>) -> RepricerResult<usize> {
        validate_extension(file_name)?;

        // Fresh upload: prior records, grid, and file state are discarded
        // before parsing, so a parse failure lands in the pre-upload state.
        self.reset();

        let grid = load_grid(file_name, &bytes)?;
        let records = extract(&grid, &self.config);
        info!(
            session = %self.id,
            file = file_name,
            records = records.len(),
            "upload processed"
        );

        self.tracker = ProductTracker::new(records);
        self.grid = Some(grid);
        self.original = Some(UploadedFile {
            name: file_name.to_string(),
            bytes,
        });
        Ok(self.tracker.len())
    }

    /// Upload from a filesystem path.
    pub fn upload_path(&mut self, path: &Path) -> RepricerResult<usize> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RepricerError::Validation(format!("not a readable file path: {}", path.display()))
            })?
            .to_string();
        let bytes = std::fs::read(path)?;
        self.upload(&file_name, bytes)
    }

    pub fn tracker(&self) -> &ProductTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProductTracker {
        &mut self.tracker
    }

    pub fn grid(&self) -> Option<&SheetGrid> {
        self.grid.as_ref()
    }

    pub fn original_file(&self) -> Option<&UploadedFile> {
        self.original.as_ref()
    }

    /// True when a file was uploaded but extraction found nothing — the
    /// "no data" state the caller should explain (expected column layout)
    /// rather than treat as a failure.
    pub fn is_empty_extraction(&self) -> bool {
        self.original.is_some() && self.tracker.is_empty()
    }

    /// Build the change-set for the current edits.
    pub fn change_set(&self) -> RepricerResult<ChangeSet> {
        ChangeSet::from_records(self.tracker.records())
    }

    /// Discard all upload-derived state.
    pub fn reset(&mut self) {
        self.original = None;
        self.grid = None;
        self.tracker = ProductTracker::default();
    }
}
