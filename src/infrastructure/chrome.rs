//! chromiumoxide-backed [`PageDriver`] implementation.
//!
//! Each `start()` launches a fresh Chrome/Chromium process with its own
//! user-data directory, so a restart genuinely discards the fingerprint
//! state accumulated in-session. The CDP event handler is drained by a
//! spawned task for the lifetime of the session.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::errors::{HarvestError, HarvestResult};
use crate::infrastructure::config::BrowserSettings;
use crate::infrastructure::driver::{PageDriver, PageHandle};

/// Kept small on purpose: the headline automation giveaway is the
/// `navigator.webdriver` flag.
const STEALTH_INIT: &str = r"
    Object.defineProperty(navigator, 'webdriver', { get: () => false });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
";

struct OpenPage {
    url: String,
    page: Page,
}

struct Session {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
    pages: HashMap<u64, OpenPage>,
}

/// Production browser driver.
pub struct ChromeDriver {
    settings: BrowserSettings,
    session: Mutex<Option<Session>>,
    next_handle: AtomicU64,
    session_seq: AtomicU64,
}

impl ChromeDriver {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            session: Mutex::new(None),
            next_handle: AtomicU64::new(1),
            session_seq: AtomicU64::new(0),
        }
    }

    /// Locate a Chrome/Chromium binary: explicit setting, then the
    /// `CHROMIUM_PATH` environment variable, then well-known install
    /// locations, then `which`.
    fn find_executable(&self) -> HarvestResult<PathBuf> {
        if let Some(configured) = &self.settings.executable {
            let path = PathBuf::from(configured);
            if path.exists() {
                return Ok(path);
            }
            warn!("Configured browser executable does not exist: {configured}");
        }

        if let Ok(env_path) = std::env::var("CHROMIUM_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                info!("Using browser from CHROMIUM_PATH: {env_path}");
                return Ok(path);
            }
            warn!("CHROMIUM_PATH points to a non-existent file: {env_path}");
        }

        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
                "/opt/homebrew/bin/chromium",
            ]
        } else if cfg!(target_os = "windows") {
            &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files\Chromium\Application\chrome.exe",
            ]
        } else {
            &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
                "/opt/google/chrome/chrome",
            ]
        };

        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                info!("Found browser at {candidate}");
                return Ok(path);
            }
        }

        if !cfg!(target_os = "windows") {
            for name in ["google-chrome", "chromium", "chromium-browser", "chrome"] {
                if let Ok(output) = std::process::Command::new("which").arg(name).output() {
                    if output.status.success() {
                        let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                        if !found.is_empty() {
                            info!("Found browser via which: {found}");
                            return Ok(PathBuf::from(found));
                        }
                    }
                }
            }
        }

        Err(HarvestError::Session(
            "no Chrome/Chromium executable found (set CHROMIUM_PATH or browser.executable)"
                .to_string(),
        ))
    }

    async fn launch(&self) -> HarvestResult<Session> {
        let executable = self.find_executable()?;

        let seq = self.session_seq.fetch_add(1, Ordering::Relaxed);
        let user_data_dir = std::env::temp_dir().join(format!(
            "cb2_harvester_profile_{}_{seq}",
            std::process::id()
        ));
        std::fs::create_dir_all(&user_data_dir)?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(self.settings.window_width, self.settings.window_height)
            .user_data_dir(user_data_dir.clone())
            .chrome_executable(executable);

        builder = if self.settings.headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        builder = builder
            .arg(format!("--user-agent={}", self.settings.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-popup-blocking")
            .arg("--metrics-recording-only")
            .arg("--password-store=basic")
            .arg("--mute-audio");

        let config = builder
            .build()
            .map_err(|e| HarvestError::Session(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Session(format!("browser launch: {e}")))?;

        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    // Chrome emits CDP events chromiumoxide cannot decode;
                    // those are noise, not session failures.
                    let benign = msg.contains("data did not match any variant")
                        || msg.contains("Failed to deserialize WS response");
                    if benign {
                        debug!("Ignored CDP decode error: {msg}");
                    } else {
                        error!("Browser handler error: {msg}");
                    }
                }
            }
            debug!("Browser handler stream ended");
        });

        info!("Browser session started (profile {:?})", user_data_dir);
        Ok(Session {
            browser,
            handler_task,
            user_data_dir,
            pages: HashMap::new(),
        })
    }

    async fn teardown(session: Session) {
        let Session {
            mut browser,
            handler_task,
            user_data_dir,
            pages,
        } = session;

        for (_, open) in pages {
            let _ = open.page.close().await;
        }
        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {e}");
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), browser.wait()).await;
        handler_task.abort();
        if let Err(e) = std::fs::remove_dir_all(&user_data_dir) {
            debug!("Could not remove session profile {:?}: {e}", user_data_dir);
        }
        info!("Browser session stopped");
    }

    fn with_page(session: &Option<Session>, handle: PageHandle) -> HarvestResult<&OpenPage> {
        session
            .as_ref()
            .and_then(|s| s.pages.get(&handle.0))
            .ok_or_else(|| HarvestError::Session(format!("unknown page handle {}", handle.0)))
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn start(&self) -> HarvestResult<()> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }
        Ok(())
    }

    async fn stop(&self) -> HarvestResult<()> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            Self::teardown(session).await;
        }
        Ok(())
    }

    async fn navigate(&self, url: &str) -> HarvestResult<PageHandle> {
        let mut guard = self.session.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| HarvestError::Session("navigate before start".to_string()))?;

        let page = session
            .browser
            .new_page(url)
            .await
            .map_err(|e| HarvestError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let _ = page.wait_for_navigation().await;
        let _ = page.evaluate(STEALTH_INIT).await;

        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        session.pages.insert(
            id,
            OpenPage {
                url: url.to_string(),
                page,
            },
        );
        Ok(PageHandle(id))
    }

    async fn evaluate(&self, page: PageHandle, script: &str) -> HarvestResult<serde_json::Value> {
        let guard = self.session.lock().await;
        let target = Self::with_page(&guard, page)?;
        let result = target
            .page
            .evaluate(script)
            .await
            .map_err(|e| HarvestError::ScriptFailed {
                url: target.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn scroll_by(&self, page: PageHandle, delta_px: u32) -> HarvestResult<()> {
        self.evaluate(page, &format!("window.scrollBy(0, {delta_px})"))
            .await?;
        Ok(())
    }

    async fn scroll_to_fraction(&self, page: PageHandle, fraction: f64) -> HarvestResult<()> {
        self.evaluate(
            page,
            &format!("window.scrollTo(0, document.body.scrollHeight * {fraction})"),
        )
        .await?;
        Ok(())
    }

    async fn content(&self, page: PageHandle) -> HarvestResult<String> {
        let guard = self.session.lock().await;
        let target = Self::with_page(&guard, page)?;
        target
            .page
            .content()
            .await
            .map_err(|e| HarvestError::ScriptFailed {
                url: target.url.clone(),
                reason: e.to_string(),
            })
    }

    async fn visible_text_head(
        &self,
        page: PageHandle,
        max_chars: usize,
    ) -> HarvestResult<String> {
        let script =
            format!("document.body ? document.body.innerText.substring(0, {max_chars}) : ''");
        match self.evaluate(page, &script).await? {
            serde_json::Value::String(text) => Ok(text),
            _ => Ok(String::new()),
        }
    }

    async fn close_page(&self, page: PageHandle) -> HarvestResult<()> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_mut() {
            if let Some(open) = session.pages.remove(&page.0) {
                let _ = open.page.close().await;
            }
        }
        Ok(())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        // Async teardown is unavailable here; at least stop the handler task
        // so the runtime is not kept alive by a dangling stream.
        if let Ok(mut guard) = self.session.try_lock() {
            if let Some(session) = guard.take() {
                session.handler_task.abort();
            }
        }
    }
}
