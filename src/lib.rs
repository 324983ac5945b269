//! Repricer - store inventory spreadsheet repricing
//!
//! This library extracts product records from an uploaded inventory
//! spreadsheet, tracks price/stock edits against the original values, looks
//! up current market prices through a remote bulk price-search job, and asks
//! a reconciliation service to patch the original file so that only the
//! touched cells differ.
//!
//! # Pipeline
//!
//! file → [`grid::SheetGrid`] → [`extract::extract`] → [`tracker::ProductTracker`]
//! → (manual edits | [`job::PriceSearchCoordinator`] results)
//! → [`patch::ChangeSet`] → reconciled file
//!
//! # Example
//!
//! ```no_run
//! use repricer::extract::ExtractionConfig;
//! use repricer::session::UploadSession;
//!
//! let mut session = UploadSession::new(ExtractionConfig::default());
//! let bytes = std::fs::read("inventory.xlsx")?;
//! let count = session.upload("inventory.xlsx", bytes)?;
//!
//! println!("Products: {}", count);
//! for record in session.tracker().records() {
//!     println!("row {}: {} @ {}", record.excel_row(), record.product_name, record.price);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod grid;
pub mod job;
pub mod patch;
pub mod sample;
pub mod session;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use error::{RepricerError, RepricerResult};
pub use session::UploadSession;
pub use tracker::{MergeReport, ProductTracker, SortOrder};
pub use types::{JobStage, JobStatus, PriceSearchItem, PriceSearchResult, ProductRecord, UploadedFile};
