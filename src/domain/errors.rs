//! Error taxonomy for the harvest pipeline.
//!
//! Per-item failures (blocked pages, navigation errors) are isolated by the
//! schedulers and never abort a run; only `Fatal` escapes the main loop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("access denied at {url} (matched \"{indicator}\")")]
    PageBlocked { url: String, indicator: String },

    #[error("challenge page at {url} (matched \"{indicator}\")")]
    PageChallenged { url: String, indicator: String },

    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("script evaluation failed on {url}: {reason}")]
    ScriptFailed { url: String, reason: String },

    #[error("browser session error: {0}")]
    Session(String),

    #[error("storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("catalog CSV error: {0}")]
    Catalog(#[from] csv::Error),

    #[error("checkpoint serialization error: {0}")]
    Checkpoint(#[from] serde_json::Error),

    #[error("run cancelled")]
    Cancelled,

    #[error("fatal: {0}")]
    Fatal(String),
}

impl HarvestError {
    /// Whether another attempt at the same page can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PageBlocked { .. }
                | Self::PageChallenged { .. }
                | Self::NavigationFailed { .. }
                | Self::ScriptFailed { .. }
        )
    }

    /// Challenge pages get a longer pre-retry wait than plain denials.
    pub fn is_challenge(&self) -> bool {
        matches!(self, Self::PageChallenged { .. })
    }
}

pub type HarvestResult<T> = Result<T, HarvestError>;
