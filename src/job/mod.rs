//! Bulk price-search job: remote client and polling coordinator
//!
//! The remote lookup runs as a server-side job: the full product list is
//! submitted once, then a status endpoint is polled until the job reaches a
//! terminal stage. A synchronous one-shot variant exists as a degraded mode
//! for backends without job support.

mod client;
mod coordinator;

pub use client::{HttpPriceSearchClient, PriceSearchApi};
pub use coordinator::{JobSlot, PollConfig, PriceSearchCoordinator};
