//! Incremental crawl-and-enrich pipeline for the CB2 retail catalog.
//!
//! The crate is split into three layers:
//! - [`domain`]: catalog records, dedup keys, and the static site tables
//! - [`infrastructure`]: browser session, page extraction, persistence,
//!   configuration
//! - [`application`]: the listing, enrichment, and grouping passes

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
