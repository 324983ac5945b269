//! CLI command handlers

pub mod commands;

pub use commands::{extract, reprice, sample, search, watch};
