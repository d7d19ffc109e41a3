//! Infrastructure layer: browser driving, page extraction, persistence,
//! configuration, and logging.

pub mod catalog_store;
pub mod chrome;
pub mod config;
pub mod driver;
pub mod extractor;
pub mod logging;
pub mod progress_store;

// Re-export commonly used items
pub use catalog_store::CatalogStore;
pub use chrome::ChromeDriver;
pub use config::{cb2, ConfigManager, HarvestConfig};
pub use driver::{PageDriver, PageHandle};
pub use extractor::PageExtractor;
pub use progress_store::{ProgressCheckpoint, ProgressStore};
