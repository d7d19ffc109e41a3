//! Detail enrichment pass.
//!
//! Re-visits every catalog row that still has no detail data, runs the
//! detail extractor against the rendered page, and merges newly found
//! fields into the row without overwriting anything already present. Rows
//! that yield nothing stay eligible for a later retry. The merged dataset
//! is rewritten atomically on a checkpoint cadence and on every exit path.

use std::time::Instant;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::application::navigation;
use crate::application::pacing::Pacer;
use crate::application::scheduler::CrawlPhase;
use crate::domain::errors::HarvestError;
use crate::domain::product::ProductRecord;
use crate::domain::product_url;
use crate::infrastructure::{
    CatalogStore, HarvestConfig, PageDriver, PageExtractor, ProgressCheckpoint, ProgressStore,
};

/// Scroll stops on a detail page, as fractions of full page height.
const SCROLL_STOPS: &[f64] = &[0.33, 0.66, 1.0];

/// Rough per-visit cost beyond the configured delay (navigation, settle,
/// staged scroll, extraction), used only for the upfront time estimate.
const PER_VISIT_OVERHEAD_MS: u64 = 8_000;

/// Counters reported at the end of an enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub candidates: usize,
    pub enriched: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub fields_filled: usize,
    pub aborted: bool,
}

pub struct DetailEnricher<D: PageDriver> {
    config: HarvestConfig,
    driver: D,
    extractor: PageExtractor,
    catalog: CatalogStore,
    progress: ProgressStore,
    pacer: Pacer,
    base: Url,
    phase: CrawlPhase,
}

impl<D: PageDriver> DetailEnricher<D> {
    pub fn new(
        config: HarvestConfig,
        driver: D,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let base = Url::parse(&config.site.base_url)
            .with_context(|| format!("invalid base url {}", config.site.base_url))?;
        Ok(Self {
            extractor: PageExtractor::new()?,
            catalog: CatalogStore::new(&config.storage.catalog_path),
            progress: ProgressStore::new(&config.storage.detail_progress_path),
            pacer: Pacer::new(cancel),
            base,
            phase: CrawlPhase::Idle,
            driver,
            config,
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Enrich every row that still needs detail data. An operator interrupt
    /// saves the merged dataset and returns the partial summary; only
    /// non-retryable failures surface as errors.
    pub async fn run(&mut self) -> anyhow::Result<EnrichSummary> {
        let started = Instant::now();
        let mut records = self.catalog.read_all()?;
        let mut checkpoint = self.progress.load()?;
        let candidates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.needs_detail())
            .map(|(index, _)| index)
            .collect();

        let mut summary = EnrichSummary {
            candidates: candidates.len(),
            ..EnrichSummary::default()
        };
        info!(
            "{} of {} records need detail data",
            candidates.len(),
            records.len()
        );
        if candidates.is_empty() {
            self.set_phase(CrawlPhase::Complete);
            return Ok(summary);
        }
        self.log_estimate(candidates.len());

        self.driver.start().await?;

        let outcome = self
            .enrich_all(&mut records, &candidates, &mut checkpoint, &mut summary)
            .await;

        // Persist the merged dataset on every exit path.
        if let Err(e) = self.checkpoint_now(&records, &mut checkpoint) {
            warn!("Final save failed: {e}");
        }
        if let Err(e) = self.driver.stop().await {
            warn!("Browser shutdown failed: {e}");
        }

        match outcome {
            Ok(()) => {
                self.set_phase(CrawlPhase::Complete);
                info!(
                    "Enrichment complete in {:.0?}: {} enriched ({} fields), {} unchanged, \
                     {} failed of {} candidates",
                    started.elapsed(),
                    summary.enriched,
                    summary.fields_filled,
                    summary.unchanged,
                    summary.failed,
                    summary.candidates
                );
                Ok(summary)
            }
            Err(HarvestError::Cancelled) => {
                self.set_phase(CrawlPhase::Aborted);
                summary.aborted = true;
                info!(
                    "Enrichment interrupted after {:.0?}: {} enriched so far, dataset saved",
                    started.elapsed(),
                    summary.enriched
                );
                Ok(summary)
            }
            Err(e) => {
                self.set_phase(CrawlPhase::Aborted);
                Err(e).context("enrichment pass failed")
            }
        }
    }

    async fn enrich_all(
        &mut self,
        records: &mut [ProductRecord],
        candidates: &[usize],
        checkpoint: &mut ProgressCheckpoint,
        summary: &mut EnrichSummary,
    ) -> Result<(), HarvestError> {
        self.set_phase(CrawlPhase::WarmingUp);
        navigation::warm_up(
            &self.driver,
            &self.pacer,
            &self.config.blocking,
            self.base.as_str(),
            self.config.browser.warmup_min_ms,
            self.config.browser.warmup_max_ms,
        )
        .await?;

        let total = candidates.len();
        let checkpoint_every = self.config.detail.checkpoint_every.max(1);
        let cooldown_every = self.config.detail.cooldown_every.max(1);
        let restart_every = self.config.detail.restart_every.max(1);
        let mut productive = 0u32;

        for (position, &index) in candidates.iter().enumerate() {
            let product_url = records[index].product_url.clone();
            if product_url.is_empty() {
                summary.failed += 1;
                warn!("Record {} has no product link, skipping", records[index].id);
                continue;
            }
            let name: String = records[index].name.chars().take(30).collect();
            info!(
                "[{}/{}] {}",
                position + 1,
                total,
                if name.is_empty() { product_url.as_str() } else { name.as_str() }
            );

            let page = match navigation::navigate_guarded(
                &self.driver,
                &self.pacer,
                &self.config.blocking,
                &product_url,
                self.config.detail.settle_min_ms,
                self.config.detail.settle_max_ms,
            )
            .await
            {
                Ok(page) => page,
                Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
                Err(e) if e.is_retryable() => {
                    summary.failed += 1;
                    warn!("Giving up on {product_url}: {e}");
                    self.pace_next(position, total).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.set_phase(CrawlPhase::Scrolling);
            for (stage, &fraction) in SCROLL_STOPS.iter().enumerate() {
                if let Err(e) = self.driver.scroll_to_fraction(page, fraction).await {
                    debug!("Scroll stage {stage} failed: {e}");
                    break;
                }
                let pause_ms = if stage + 1 == SCROLL_STOPS.len() {
                    self.config.detail.scroll_final_pause_ms
                } else {
                    self.config.detail.scroll_stage_pause_ms
                };
                if !self.pacer.pause_ms(pause_ms).await {
                    let _ = self.driver.close_page(page).await;
                    return Err(HarvestError::Cancelled);
                }
            }

            self.set_phase(CrawlPhase::Extracting);
            let html = self.driver.content(page).await;
            let _ = self.driver.close_page(page).await;
            let html = match html {
                Ok(html) => html,
                Err(e) if e.is_retryable() => {
                    summary.failed += 1;
                    warn!("Could not capture {product_url}: {e}");
                    self.pace_next(position, total).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let detail = self.extractor.extract_detail(&html, &product_url);
            let filled = records[index].merge_detail(&detail);

            if filled > 0 {
                productive += 1;
                summary.enriched += 1;
                summary.fields_filled += filled;
                if checkpoint.mark(product_url::dedup_key(&product_url, &self.base)) {
                    checkpoint.record_count += 1;
                }
                info!(
                    "  Filled {filled}: dims={} sku={} desc={} details={} colors={} images={}",
                    flag(!detail.dimensions.is_empty()),
                    flag(!detail.sku.is_empty()),
                    flag(!detail.description.is_empty()),
                    flag(!detail.details.is_empty()),
                    flag(!detail.colors.is_empty()),
                    flag(!detail.images.is_empty()),
                );

                if productive % checkpoint_every == 0 {
                    self.checkpoint_now(records, checkpoint)?;
                    info!(
                        "Progress: {}/{} visited ({:.0}%), {} enriched",
                        position + 1,
                        total,
                        (position + 1) as f64 * 100.0 / total as f64,
                        summary.enriched
                    );
                }
                if productive % cooldown_every == 0 {
                    self.set_phase(CrawlPhase::BatchBreak);
                    info!(
                        "Cooling down {}s after {} productive visits",
                        self.config.detail.cooldown_ms / 1000,
                        productive
                    );
                    if !self.pacer.pause_ms(self.config.detail.cooldown_ms).await {
                        return Err(HarvestError::Cancelled);
                    }
                }
                if productive % restart_every == 0 {
                    self.restart_session().await?;
                }
            } else {
                summary.unchanged += 1;
                warn!("No new data extracted from {product_url}");
            }

            self.pace_next(position, total).await?;
        }
        Ok(())
    }

    /// Tear the browser down, wait out the rotation pause, and bring a
    /// fresh session up behind a warm-up page load.
    async fn restart_session(&mut self) -> Result<(), HarvestError> {
        self.set_phase(CrawlPhase::BrowserRestart);
        info!(
            "Rotating browser session ({}s pause)",
            self.config.detail.restart_pause_ms / 1000
        );
        self.driver.stop().await?;
        if !self.pacer.pause_ms(self.config.detail.restart_pause_ms).await {
            return Err(HarvestError::Cancelled);
        }
        self.driver.start().await?;
        let warmup = self
            .base
            .join(&self.config.site.warmup_path)
            .map_err(|e| HarvestError::Fatal(format!("bad warmup path: {e}")))?;
        navigation::warm_up(
            &self.driver,
            &self.pacer,
            &self.config.blocking,
            warmup.as_str(),
            self.config.browser.warmup_min_ms,
            self.config.browser.warmup_max_ms,
        )
        .await
    }

    /// Delay before the next product, skipped after the last one.
    async fn pace_next(&self, position: usize, total: usize) -> Result<(), HarvestError> {
        if position + 1 < total
            && !self
                .pacer
                .pause_between_ms(
                    self.config.detail.delay_min_ms,
                    self.config.detail.delay_max_ms,
                )
                .await
        {
            return Err(HarvestError::Cancelled);
        }
        Ok(())
    }

    /// Rewrite the whole catalog with merged rows, then persist the
    /// checkpoint.
    fn checkpoint_now(
        &self,
        records: &[ProductRecord],
        checkpoint: &mut ProgressCheckpoint,
    ) -> Result<(), HarvestError> {
        self.catalog.rewrite(records)?;
        self.progress.save(checkpoint)?;
        debug!("Checkpointed {} records", records.len());
        Ok(())
    }

    /// Rough wall-clock estimate logged before the pass starts.
    fn log_estimate(&self, candidates: usize) {
        let detail = &self.config.detail;
        let per_visit_ms = (detail.delay_min_ms + detail.delay_max_ms) / 2 + PER_VISIT_OVERHEAD_MS;
        let cooldowns = candidates as u64 / u64::from(detail.cooldown_every.max(1));
        let restarts = candidates as u64 / u64::from(detail.restart_every.max(1));
        let restart_ms = detail.restart_pause_ms
            + (self.config.browser.warmup_min_ms + self.config.browser.warmup_max_ms) / 2;
        let total_ms = candidates as u64 * per_visit_ms
            + cooldowns * detail.cooldown_ms
            + restarts * restart_ms;
        info!(
            "Estimated time: ~{} min ({:.1} h) for {} products",
            total_ms / 60_000,
            total_ms as f64 / 3_600_000.0,
            candidates
        );
    }

    fn set_phase(&mut self, phase: CrawlPhase) {
        if self.phase != phase {
            debug!("Phase: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

fn flag(present: bool) -> &'static str {
    if present {
        "YES"
    } else {
        "NO"
    }
}
