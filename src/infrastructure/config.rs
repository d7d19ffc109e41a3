//! Configuration infrastructure.
//!
//! One immutable `HarvestConfig` is loaded at startup and passed into the
//! schedulers at construction; nothing here is process-global. The config
//! file lives next to the dataset (JSON, created with defaults on first
//! run); a corrupt file is backed up and replaced rather than aborting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Target site settings.
    pub site: SiteSettings,

    /// Browser session settings.
    pub browser: BrowserSettings,

    /// Listing crawl pass settings.
    pub listing: ListingPassSettings,

    /// Detail enrichment pass settings.
    pub detail: DetailPassSettings,

    /// Blocked/challenge page policy.
    pub blocking: BlockingPolicy,

    /// Dataset and checkpoint locations.
    pub storage: StorageSettings,
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Base origin every relative product path resolves against.
    pub base_url: String,

    /// Path navigated during post-restart warm-up.
    pub warmup_path: String,
}

/// Browser session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,

    /// Explicit chrome/chromium binary; discovered from well-known locations
    /// when unset.
    pub executable: Option<String>,

    /// Randomized wait after a warm-up navigation, in milliseconds.
    pub warmup_min_ms: u64,
    pub warmup_max_ms: u64,
}

/// Listing crawl pass settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingPassSettings {
    /// Settle wait after a listing page load, in milliseconds.
    pub page_settle_ms: u64,

    /// Incremental scroll profile used to trigger lazy-loaded tiles.
    pub scroll_steps: u32,
    pub scroll_step_px: u32,
    pub scroll_pause_ms: u64,

    /// Extra settle after the scroll loop, before the DOM is captured.
    pub post_scroll_settle_ms: u64,

    /// Randomized pacing window between subcategory page loads.
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,

    /// Batch size that triggers a flush + checkpoint.
    pub batch_flush_size: usize,
}

/// Detail enrichment pass settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailPassSettings {
    /// Randomized pacing window between product visits.
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,

    /// Randomized settle wait after a detail page load.
    pub settle_min_ms: u64,
    pub settle_max_ms: u64,

    /// Pauses between the staged scroll stops (33% / 66% / bottom).
    pub scroll_stage_pause_ms: u64,
    pub scroll_final_pause_ms: u64,

    /// Cooldown cadence: after this many productive visits, pause.
    pub cooldown_every: u32,
    pub cooldown_ms: u64,

    /// Session rotation cadence: after this many productive visits, tear the
    /// browser down and start fresh.
    pub restart_every: u32,
    pub restart_pause_ms: u64,

    /// Checkpoint cadence in productive visits.
    pub checkpoint_every: u32,
}

/// Blocked/challenge page policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingPolicy {
    /// Retries after the first blocked attempt (total attempts = retries + 1).
    pub max_retries: u32,

    /// Wait before retrying a plain denial, in milliseconds.
    pub blocked_wait_ms: u64,

    /// Wait before retrying a challenge page, in milliseconds.
    pub challenge_wait_ms: u64,

    /// How much leading visible text the indicator probe examines.
    pub probe_chars: usize,
}

/// Dataset and checkpoint locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub catalog_path: PathBuf,

    /// Listing pass checkpoint.
    pub progress_path: PathBuf,

    /// Detail pass checkpoint; kept separate so the two passes' counters
    /// stay independent.
    pub detail_progress_path: PathBuf,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: cb2::BASE_URL.to_string(),
            warmup_path: cb2::WARMUP_PATH.to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: defaults::HEADLESS,
            window_width: defaults::WINDOW_WIDTH,
            window_height: defaults::WINDOW_HEIGHT,
            user_agent: cb2::DEFAULT_USER_AGENT.to_string(),
            executable: None,
            warmup_min_ms: defaults::WARMUP_MIN_MS,
            warmup_max_ms: defaults::WARMUP_MAX_MS,
        }
    }
}

impl Default for ListingPassSettings {
    fn default() -> Self {
        Self {
            page_settle_ms: defaults::LISTING_SETTLE_MS,
            scroll_steps: defaults::LISTING_SCROLL_STEPS,
            scroll_step_px: defaults::LISTING_SCROLL_STEP_PX,
            scroll_pause_ms: defaults::LISTING_SCROLL_PAUSE_MS,
            post_scroll_settle_ms: defaults::LISTING_POST_SCROLL_SETTLE_MS,
            delay_min_ms: defaults::LISTING_DELAY_MIN_MS,
            delay_max_ms: defaults::LISTING_DELAY_MAX_MS,
            batch_flush_size: defaults::LISTING_BATCH_FLUSH_SIZE,
        }
    }
}

impl Default for DetailPassSettings {
    fn default() -> Self {
        Self {
            delay_min_ms: defaults::DETAIL_DELAY_MIN_MS,
            delay_max_ms: defaults::DETAIL_DELAY_MAX_MS,
            settle_min_ms: defaults::DETAIL_SETTLE_MIN_MS,
            settle_max_ms: defaults::DETAIL_SETTLE_MAX_MS,
            scroll_stage_pause_ms: defaults::DETAIL_SCROLL_STAGE_PAUSE_MS,
            scroll_final_pause_ms: defaults::DETAIL_SCROLL_FINAL_PAUSE_MS,
            cooldown_every: defaults::DETAIL_COOLDOWN_EVERY,
            cooldown_ms: defaults::DETAIL_COOLDOWN_MS,
            restart_every: defaults::DETAIL_RESTART_EVERY,
            restart_pause_ms: defaults::DETAIL_RESTART_PAUSE_MS,
            checkpoint_every: defaults::DETAIL_CHECKPOINT_EVERY,
        }
    }
}

impl Default for BlockingPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::BLOCKING_MAX_RETRIES,
            blocked_wait_ms: defaults::BLOCKED_WAIT_MS,
            challenge_wait_ms: defaults::CHALLENGE_WAIT_MS,
            probe_chars: defaults::BLOCKING_PROBE_CHARS,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(defaults::CATALOG_PATH),
            progress_path: PathBuf::from(defaults::PROGRESS_PATH),
            detail_progress_path: PathBuf::from(defaults::DETAIL_PROGRESS_PATH),
        }
    }
}

/// Loads and saves the configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Path from the `HARVEST_CONFIG` environment variable, falling back to
    /// `harvest_config.json` in the working directory.
    pub fn from_env() -> Self {
        let path = std::env::var("HARVEST_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::CONFIG_PATH));
        Self::new(path)
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the configuration, creating the file with defaults on first run.
    /// A file that no longer parses is backed up and replaced with defaults.
    pub async fn load(&self) -> Result<HarvestConfig> {
        if !self.config_path.exists() {
            info!("No configuration found, writing defaults to {:?}", self.config_path);
            let config = HarvestConfig::default();
            self.save(&config).await?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<HarvestConfig>(&content) {
            Ok(config) => Ok(config),
            Err(parse_error) => {
                warn!("Configuration file unreadable ({parse_error}); resetting to defaults");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Could not back up corrupt config: {e}");
                } else {
                    info!("Backed up corrupt config to {:?}", backup_path);
                }

                let config = HarvestConfig::default();
                self.save(&config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(config)
            }
        }
    }

    /// Save the configuration as pretty-printed JSON.
    pub async fn save(&self, config: &HarvestConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;
        Ok(())
    }
}

/// CB2 site constants.
pub mod cb2 {
    /// Base origin for the storefront.
    pub const BASE_URL: &str = "https://www.cb2.com";

    /// Source tag written into every record's `platform` column.
    pub const PLATFORM: &str = "cb2";

    /// Host serving product imagery; image candidates off this host are
    /// dropped.
    pub const MEDIA_CDN_HOST: &str = "cb2.scene7.com";

    /// Landing page used for post-restart warm-up navigation.
    pub const WARMUP_PATH: &str = "/furniture/";

    /// Desktop Chrome user agent presented by the browser session.
    pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
}

/// Default configuration values.
pub mod defaults {
    /// Default config file name (working directory).
    pub const CONFIG_PATH: &str = "harvest_config.json";

    /// Default catalog dataset file.
    pub const CATALOG_PATH: &str = "cb2_products.csv";

    /// Default progress checkpoint file for the listing pass.
    pub const PROGRESS_PATH: &str = "scrape_progress.json";

    /// Default progress checkpoint file for the detail pass.
    pub const DETAIL_PROGRESS_PATH: &str = "details_progress.json";

    /// Run the browser with a visible window by default; headless sessions
    /// trip the site's bot heuristics more often.
    pub const HEADLESS: bool = false;

    pub const WINDOW_WIDTH: u32 = 1920;
    pub const WINDOW_HEIGHT: u32 = 1080;

    /// Wait after a warm-up navigation (randomized window).
    pub const WARMUP_MIN_MS: u64 = 3_000;
    pub const WARMUP_MAX_MS: u64 = 5_000;

    /// Settle wait after a listing page load.
    pub const LISTING_SETTLE_MS: u64 = 5_000;

    /// Listing scroll profile.
    pub const LISTING_SCROLL_STEPS: u32 = 25;
    pub const LISTING_SCROLL_STEP_PX: u32 = 800;
    pub const LISTING_SCROLL_PAUSE_MS: u64 = 500;

    /// Settle after the scroll loop finishes, before the DOM is captured.
    pub const LISTING_POST_SCROLL_SETTLE_MS: u64 = 1_000;

    /// Pacing window between subcategory page loads.
    pub const LISTING_DELAY_MIN_MS: u64 = 2_000;
    pub const LISTING_DELAY_MAX_MS: u64 = 4_000;

    /// Listing batch size that triggers a flush + checkpoint.
    pub const LISTING_BATCH_FLUSH_SIZE: usize = 50;

    /// Pacing window between product detail visits.
    pub const DETAIL_DELAY_MIN_MS: u64 = 3_000;
    pub const DETAIL_DELAY_MAX_MS: u64 = 5_000;

    /// Settle wait after a detail page load (randomized window).
    pub const DETAIL_SETTLE_MIN_MS: u64 = 800;
    pub const DETAIL_SETTLE_MAX_MS: u64 = 1_200;

    /// Staged scroll pauses on detail pages.
    pub const DETAIL_SCROLL_STAGE_PAUSE_MS: u64 = 300;
    pub const DETAIL_SCROLL_FINAL_PAUSE_MS: u64 = 500;

    /// Cooldown: after this many productive visits, pause this long.
    pub const DETAIL_COOLDOWN_EVERY: u32 = 20;
    pub const DETAIL_COOLDOWN_MS: u64 = 30_000;

    /// Session rotation: after this many productive visits, restart the
    /// browser and warm up again.
    pub const DETAIL_RESTART_EVERY: u32 = 50;
    pub const DETAIL_RESTART_PAUSE_MS: u64 = 10_000;

    /// Checkpoint cadence in productive visits.
    pub const DETAIL_CHECKPOINT_EVERY: u32 = 5;

    /// Retries after the first blocked attempt.
    pub const BLOCKING_MAX_RETRIES: u32 = 2;

    /// Wait before retrying a plain denial.
    pub const BLOCKED_WAIT_MS: u64 = 30_000;

    /// Wait before retrying a challenge page.
    pub const CHALLENGE_WAIT_MS: u64 = 60_000;

    /// Leading visible-text window examined for blocking indicators.
    pub const BLOCKING_PROBE_CHARS: usize = 500;
}
