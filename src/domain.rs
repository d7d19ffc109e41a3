//! Domain module - catalog records, dedup keys, and static site tables.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod categories;
pub mod errors;
pub mod identity;
pub mod product;
pub mod product_url;

// Re-export commonly used items for convenience
pub use categories::{CategoryPage, CATEGORY_PAGES};
pub use errors::{HarvestError, HarvestResult};
pub use identity::IdentityAllocator;
pub use product::{PartialDetail, PartialProduct, ProductRecord};
