//! Application module - crawl orchestration over the infrastructure seams.

pub mod enricher;
pub mod grouping;
pub mod navigation;
pub mod pacing;
pub mod scheduler;

// Re-export commonly used items for convenience
pub use enricher::{DetailEnricher, EnrichSummary};
pub use grouping::{assign_groups, GroupingSummary};
pub use pacing::Pacer;
pub use scheduler::{CrawlPhase, CrawlScheduler, CrawlSummary};
