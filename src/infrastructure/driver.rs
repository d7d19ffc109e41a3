//! Browser capability seam.
//!
//! The pipeline talks to the browser exclusively through [`PageDriver`], so
//! the schedulers and extractor are testable against a scripted fake without
//! a real browser process. The production implementation lives in
//! [`crate::infrastructure::chrome`].

use async_trait::async_trait;

use crate::domain::errors::HarvestResult;

/// Opaque handle to one open page/tab. Handles are only meaningful to the
/// driver that issued them and become invalid after `close_page` or a
/// session restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle(pub u64);

/// Browser session capability: lifecycle, navigation, script evaluation,
/// and scrolling.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Launch a fresh browser session. Idempotent when already running.
    async fn start(&self) -> HarvestResult<()>;

    /// Tear the session down, closing every page. Idempotent when stopped.
    async fn stop(&self) -> HarvestResult<()>;

    /// Open a page at `url` and wait for the initial load.
    async fn navigate(&self, url: &str) -> HarvestResult<PageHandle>;

    /// Evaluate a script expression on the page, returning its JSON value.
    async fn evaluate(&self, page: PageHandle, script: &str) -> HarvestResult<serde_json::Value>;

    /// Scroll the page down by `delta_px` pixels.
    async fn scroll_by(&self, page: PageHandle, delta_px: u32) -> HarvestResult<()>;

    /// Scroll to a fraction of the full page height (1.0 = bottom).
    async fn scroll_to_fraction(&self, page: PageHandle, fraction: f64) -> HarvestResult<()>;

    /// Rendered HTML of the page as it currently stands.
    async fn content(&self, page: PageHandle) -> HarvestResult<String>;

    /// Leading `max_chars` characters of the page's visible text, used for
    /// blocking/challenge detection.
    async fn visible_text_head(&self, page: PageHandle, max_chars: usize)
        -> HarvestResult<String>;

    /// Close a page opened by `navigate`.
    async fn close_page(&self, page: PageHandle) -> HarvestResult<()>;

    /// Stop and relaunch the session from scratch, dropping accumulated
    /// fingerprint state.
    async fn restart(&self) -> HarvestResult<()> {
        self.stop().await?;
        self.start().await
    }
}
