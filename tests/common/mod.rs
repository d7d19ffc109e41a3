//! Shared scripted browser driver for pass-level tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cb2_harvester::domain::errors::{HarvestError, HarvestResult};
use cb2_harvester::infrastructure::{HarvestConfig, PageDriver, PageHandle};

/// One canned response for a URL.
#[derive(Debug, Clone)]
pub enum Scripted {
    Page { html: String, visible_text: String },
    NavFail(String),
    /// Serves a blank page and fires the token, simulating an operator
    /// hitting Ctrl+C while this URL loads.
    Cancel(CancellationToken),
}

impl Scripted {
    pub fn page(html: impl Into<String>) -> Self {
        Self::Page {
            html: html.into(),
            visible_text: String::new(),
        }
    }

    pub fn blocked() -> Self {
        Self::Page {
            html: "<html><body>Access Denied</body></html>".to_string(),
            visible_text: "Access Denied: you don't have permission to access this page"
                .to_string(),
        }
    }

    pub fn challenge() -> Self {
        Self::Page {
            html: "<html><body>One moment</body></html>".to_string(),
            visible_text: "Please verify you are a human to continue".to_string(),
        }
    }

    pub fn nav_fail(reason: impl Into<String>) -> Self {
        Self::NavFail(reason.into())
    }

    pub fn cancel(token: &CancellationToken) -> Self {
        Self::Cancel(token.clone())
    }
}

/// What the pass under test did with the driver.
#[derive(Debug, Default, Clone)]
pub struct DriverLog {
    pub starts: u64,
    pub stops: u64,
    pub navigations: Vec<String>,
    pub scroll_bys: u64,
    pub fraction_scrolls: u64,
    pub open_pages: u64,
}

/// In-memory [`PageDriver`]: serves canned responses keyed by URL and
/// records every call. Clones share state, so a test can keep a handle for
/// assertions after the pass consumes the driver. The last response queued
/// for a URL repeats once the queue is otherwise exhausted; unscripted URLs
/// get a blank page.
#[derive(Clone)]
pub struct ScriptedDriver {
    inner: Arc<DriverInner>,
}

struct DriverInner {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    open: Mutex<HashMap<u64, Scripted>>,
    log: Mutex<DriverLog>,
    next: AtomicU64,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DriverInner {
                responses: Mutex::new(HashMap::new()),
                open: Mutex::new(HashMap::new()),
                log: Mutex::new(DriverLog::default()),
                next: AtomicU64::new(1),
            }),
        }
    }

    /// Queue a response for a URL.
    pub fn script(&self, url: &str, response: Scripted) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn log(&self) -> DriverLog {
        self.inner.log.lock().unwrap().clone()
    }

    fn serve(&self, url: &str) -> Scripted {
        let mut responses = self.inner.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Scripted::page("<html><body></body></html>")),
            None => Scripted::page("<html><body></body></html>"),
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn start(&self) -> HarvestResult<()> {
        self.inner.log.lock().unwrap().starts += 1;
        Ok(())
    }

    async fn stop(&self) -> HarvestResult<()> {
        self.inner.log.lock().unwrap().stops += 1;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> HarvestResult<PageHandle> {
        let response = match self.serve(url) {
            Scripted::NavFail(reason) => {
                self.inner.log.lock().unwrap().navigations.push(url.to_string());
                return Err(HarvestError::NavigationFailed {
                    url: url.to_string(),
                    reason,
                });
            }
            Scripted::Cancel(token) => {
                token.cancel();
                Scripted::page("<html><body></body></html>")
            }
            page => page,
        };
        self.inner.log.lock().unwrap().navigations.push(url.to_string());
        let handle = PageHandle(self.inner.next.fetch_add(1, Ordering::Relaxed));
        self.inner.open.lock().unwrap().insert(handle.0, response);
        self.inner.log.lock().unwrap().open_pages += 1;
        Ok(handle)
    }

    async fn evaluate(
        &self,
        _page: PageHandle,
        _script: &str,
    ) -> HarvestResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn scroll_by(&self, _page: PageHandle, _delta_px: u32) -> HarvestResult<()> {
        self.inner.log.lock().unwrap().scroll_bys += 1;
        Ok(())
    }

    async fn scroll_to_fraction(&self, _page: PageHandle, _fraction: f64) -> HarvestResult<()> {
        self.inner.log.lock().unwrap().fraction_scrolls += 1;
        Ok(())
    }

    async fn content(&self, page: PageHandle) -> HarvestResult<String> {
        match self.inner.open.lock().unwrap().get(&page.0) {
            Some(Scripted::Page { html, .. }) => Ok(html.clone()),
            _ => Err(HarvestError::Session(format!("no open page {}", page.0))),
        }
    }

    async fn visible_text_head(
        &self,
        page: PageHandle,
        max_chars: usize,
    ) -> HarvestResult<String> {
        match self.inner.open.lock().unwrap().get(&page.0) {
            Some(Scripted::Page { visible_text, .. }) => {
                Ok(visible_text.chars().take(max_chars).collect())
            }
            _ => Err(HarvestError::Session(format!("no open page {}", page.0))),
        }
    }

    async fn close_page(&self, page: PageHandle) -> HarvestResult<()> {
        if self.inner.open.lock().unwrap().remove(&page.0).is_some() {
            self.inner.log.lock().unwrap().open_pages -= 1;
        }
        Ok(())
    }
}

/// Config with every delay zeroed and storage rooted under `dir`, so pass
/// tests finish in milliseconds.
pub fn fast_config(dir: &Path) -> HarvestConfig {
    let mut config = HarvestConfig::default();
    config.browser.warmup_min_ms = 0;
    config.browser.warmup_max_ms = 0;
    config.listing.page_settle_ms = 0;
    config.listing.scroll_steps = 2;
    config.listing.scroll_pause_ms = 0;
    config.listing.post_scroll_settle_ms = 0;
    config.listing.delay_min_ms = 0;
    config.listing.delay_max_ms = 0;
    config.detail.delay_min_ms = 0;
    config.detail.delay_max_ms = 0;
    config.detail.settle_min_ms = 0;
    config.detail.settle_max_ms = 0;
    config.detail.scroll_stage_pause_ms = 0;
    config.detail.scroll_final_pause_ms = 0;
    config.detail.cooldown_ms = 0;
    config.detail.restart_pause_ms = 0;
    config.blocking.blocked_wait_ms = 0;
    config.blocking.challenge_wait_ms = 0;
    config.storage.catalog_path = dir.join("catalog.csv");
    config.storage.progress_path = dir.join("progress.json");
    config.storage.detail_progress_path = dir.join("details_progress.json");
    config
}
