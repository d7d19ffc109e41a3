//! Guarded navigation: probe every freshly loaded page for anti-bot
//! indicators and retry on a bounded schedule before abandoning it.

use tracing::{debug, info, warn};

use crate::application::pacing::Pacer;
use crate::domain::errors::{HarvestError, HarvestResult};
use crate::infrastructure::config::BlockingPolicy;
use crate::infrastructure::driver::{PageDriver, PageHandle};

/// Checked against the lower-cased head of the page's visible text.
/// Denials are checked before challenges.
const BLOCKED_INDICATORS: &[&str] = &["access denied", "blocked"];
const CHALLENGE_INDICATORS: &[&str] = &["verify", "robot"];

/// What the head of a page's visible text says about our standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSignal {
    /// Outright denial; retried after the shorter wait.
    Blocked(&'static str),
    /// Interactive challenge (captcha and friends); retried after the
    /// longer wait.
    Challenged(&'static str),
}

impl BlockSignal {
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Blocked(marker) | Self::Challenged(marker) => marker,
        }
    }
}

pub fn classify_block(text: &str) -> Option<BlockSignal> {
    let lower = text.to_lowercase();
    for &marker in BLOCKED_INDICATORS {
        if lower.contains(marker) {
            return Some(BlockSignal::Blocked(marker));
        }
    }
    for &marker in CHALLENGE_INDICATORS {
        if lower.contains(marker) {
            return Some(BlockSignal::Challenged(marker));
        }
    }
    None
}

/// Navigate to `url`, wait out the settle window, and probe for blocking.
/// Blocked or challenged pages are closed, waited out, and retried up to
/// `policy.max_retries` times; the handle is returned once a probe comes
/// back clean. Navigation failures are not retried here, the caller decides
/// what a dead page costs.
pub async fn navigate_guarded<D: PageDriver + ?Sized>(
    driver: &D,
    pacer: &Pacer,
    policy: &BlockingPolicy,
    url: &str,
    settle_min_ms: u64,
    settle_max_ms: u64,
) -> HarvestResult<PageHandle> {
    let attempts = policy.max_retries + 1;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let page = driver.navigate(url).await?;
        if !pacer.pause_between_ms(settle_min_ms, settle_max_ms).await {
            let _ = driver.close_page(page).await;
            return Err(HarvestError::Cancelled);
        }

        let probe = driver
            .visible_text_head(page, policy.probe_chars)
            .await
            .unwrap_or_default();
        let Some(signal) = classify_block(&probe) else {
            return Ok(page);
        };

        let _ = driver.close_page(page).await;
        warn!(
            "{} page at {url} (matched \"{}\", attempt {attempt}/{attempts})",
            match signal {
                BlockSignal::Blocked(_) => "Blocked",
                BlockSignal::Challenged(_) => "Challenge",
            },
            signal.indicator()
        );

        if attempt >= attempts {
            return Err(match signal {
                BlockSignal::Blocked(marker) => HarvestError::PageBlocked {
                    url: url.to_string(),
                    indicator: marker.to_string(),
                },
                BlockSignal::Challenged(marker) => HarvestError::PageChallenged {
                    url: url.to_string(),
                    indicator: marker.to_string(),
                },
            });
        }

        let wait_ms = match signal {
            BlockSignal::Blocked(_) => policy.blocked_wait_ms,
            BlockSignal::Challenged(_) => policy.challenge_wait_ms,
        };
        info!("Waiting {}s before retrying {url}", wait_ms / 1000);
        if !pacer.pause_ms(wait_ms).await {
            return Err(HarvestError::Cancelled);
        }
    }
}

/// Scroll distance of the single warm-up scroll pass.
const WARMUP_SCROLL_PX: u32 = 600;

/// Open a throwaway page to pick up cookies and session state before the
/// real work starts: guarded navigation, a randomized settle, one scroll
/// pass. The settle window doubles as the warm-up pause.
pub async fn warm_up<D: PageDriver + ?Sized>(
    driver: &D,
    pacer: &Pacer,
    policy: &BlockingPolicy,
    url: &str,
    warmup_min_ms: u64,
    warmup_max_ms: u64,
) -> HarvestResult<()> {
    info!("Warming up session at {url}");
    let page = navigate_guarded(driver, pacer, policy, url, warmup_min_ms, warmup_max_ms).await?;
    if let Err(e) = driver.scroll_by(page, WARMUP_SCROLL_PX).await {
        debug!("Warm-up scroll failed: {e}");
    }
    driver.close_page(page).await?;
    Ok(())
}
