//! Listing-pass orchestration.
//!
//! Walks the static category table in order, scrolls each listing page to
//! force lazy-loaded tiles, extracts them, dedups against the resume
//! checkpoint, and appends accepted rows in batches. Every exit path flushes
//! the in-memory batch before the process lets go of it.

use std::collections::HashSet;
use std::time::Instant;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::application::navigation;
use crate::application::pacing::Pacer;
use crate::domain::categories::{CategoryPage, CATEGORY_PAGES};
use crate::domain::errors::HarvestError;
use crate::domain::identity::IdentityAllocator;
use crate::domain::product::ProductRecord;
use crate::domain::product_url;
use crate::infrastructure::config::cb2;
use crate::infrastructure::{
    CatalogStore, HarvestConfig, PageDriver, PageExtractor, ProgressCheckpoint, ProgressStore,
};

/// Where a pass currently stands. `Complete` and `Aborted` are terminal.
/// The enrichment pass reuses the same phases for its warm-up, scroll,
/// extraction, cooldown, and session-rotation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    WarmingUp,
    LoadingListing,
    Scrolling,
    Extracting,
    Deduping,
    Appending,
    BetweenSubcategories,
    BatchBreak,
    BrowserRestart,
    Complete,
    Aborted,
}

/// Counters reported at the end of a listing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub subcategories_visited: usize,
    pub subcategories_failed: usize,
    pub new_records: usize,
    pub duplicates_skipped: usize,
    pub total_records: u64,
    pub aborted: bool,
}

pub struct CrawlScheduler<D: PageDriver> {
    config: HarvestConfig,
    driver: D,
    extractor: PageExtractor,
    catalog: CatalogStore,
    progress: ProgressStore,
    identity: IdentityAllocator,
    pacer: Pacer,
    base: Url,
    phase: CrawlPhase,
}

impl<D: PageDriver> CrawlScheduler<D> {
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
            progress: ProgressStore::new(&config.storage.progress_path),
            identity: IdentityAllocator::new(),
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

    /// Run the listing pass over the whole category table, resuming from the
    /// checkpoint on disk. An operator interrupt flushes and returns the
    /// partial summary; only non-retryable failures surface as errors.
    pub async fn run(&mut self) -> anyhow::Result<CrawlSummary> {
        let started = Instant::now();
        let mut checkpoint = self.progress.load()?;
        let mut seen: HashSet<String> = checkpoint.processed_keys.clone();
        info!(
            "Starting listing pass: {} subcategories, {} keys already seen",
            CATEGORY_PAGES.len(),
            seen.len()
        );

        self.driver.start().await?;

        let mut batch: Vec<ProductRecord> = Vec::new();
        let mut summary = CrawlSummary::default();
        let outcome = self
            .traverse(&mut checkpoint, &mut seen, &mut batch, &mut summary)
            .await;

        // Flush whatever is still buffered on every exit path.
        if let Err(e) = self.flush(&mut batch, &mut checkpoint) {
            warn!("Final flush failed: {e}");
        }
        if let Err(e) = self.driver.stop().await {
            warn!("Browser shutdown failed: {e}");
        }

        summary.total_records = checkpoint.record_count;
        match outcome {
            Ok(()) => {
                self.set_phase(CrawlPhase::Complete);
                info!(
                    "Listing pass complete in {:.0?}: {} new records, {} duplicates skipped, \
                     {}/{} subcategories ok, {} records total",
                    started.elapsed(),
                    summary.new_records,
                    summary.duplicates_skipped,
                    summary.subcategories_visited,
                    CATEGORY_PAGES.len(),
                    summary.total_records
                );
                Ok(summary)
            }
            Err(HarvestError::Cancelled) => {
                self.set_phase(CrawlPhase::Aborted);
                summary.aborted = true;
                info!(
                    "Listing pass interrupted after {:.0?}: {} new records flushed, {} total",
                    started.elapsed(),
                    summary.new_records,
                    summary.total_records
                );
                Ok(summary)
            }
            Err(e) => {
                self.set_phase(CrawlPhase::Aborted);
                Err(e).context("listing pass failed")
            }
        }
    }

    async fn traverse(
        &mut self,
        checkpoint: &mut ProgressCheckpoint,
        seen: &mut HashSet<String>,
        batch: &mut Vec<ProductRecord>,
        summary: &mut CrawlSummary,
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

        let total = CATEGORY_PAGES.len();
        let mut current_category = "";
        for (index, entry) in CATEGORY_PAGES.iter().enumerate() {
            if entry.category != current_category {
                current_category = entry.category;
                info!("=== {} ===", entry.category);
            }
            info!("[{}/{}] {} > {}", index + 1, total, entry.category, entry.subcategory);

            match self
                .visit_subcategory(entry, checkpoint, seen, batch, summary)
                .await
            {
                Ok(()) => summary.subcategories_visited += 1,
                Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
                Err(e) if e.is_retryable() => {
                    summary.subcategories_failed += 1;
                    warn!("Giving up on {}: {e}", entry.subcategory);
                }
                Err(e) => return Err(e),
            }

            self.set_phase(CrawlPhase::Appending);
            self.flush(batch, checkpoint)?;

            if index + 1 < total {
                self.set_phase(CrawlPhase::BetweenSubcategories);
                if !self
                    .pacer
                    .pause_between_ms(
                        self.config.listing.delay_min_ms,
                        self.config.listing.delay_max_ms,
                    )
                    .await
                {
                    return Err(HarvestError::Cancelled);
                }
            }
        }
        Ok(())
    }

    async fn visit_subcategory(
        &mut self,
        entry: &CategoryPage,
        checkpoint: &mut ProgressCheckpoint,
        seen: &mut HashSet<String>,
        batch: &mut Vec<ProductRecord>,
        summary: &mut CrawlSummary,
    ) -> Result<(), HarvestError> {
        let url = self
            .base
            .join(entry.path)
            .map_err(|e| HarvestError::Fatal(format!("bad category path {}: {e}", entry.path)))?;

        self.set_phase(CrawlPhase::LoadingListing);
        let settle_ms = self.config.listing.page_settle_ms;
        let page = navigation::navigate_guarded(
            &self.driver,
            &self.pacer,
            &self.config.blocking,
            url.as_str(),
            settle_ms,
            settle_ms,
        )
        .await?;

        self.set_phase(CrawlPhase::Scrolling);
        for step in 0..self.config.listing.scroll_steps {
            if let Err(e) = self
                .driver
                .scroll_by(page, self.config.listing.scroll_step_px)
                .await
            {
                debug!("Scroll step {step} failed: {e}");
                break;
            }
            if !self.pacer.pause_ms(self.config.listing.scroll_pause_ms).await {
                let _ = self.driver.close_page(page).await;
                return Err(HarvestError::Cancelled);
            }
        }
        if !self.pacer.pause_ms(self.config.listing.post_scroll_settle_ms).await {
            let _ = self.driver.close_page(page).await;
            return Err(HarvestError::Cancelled);
        }

        self.set_phase(CrawlPhase::Extracting);
        let html = self.driver.content(page).await;
        let _ = self.driver.close_page(page).await;
        let items = self.extractor.extract_listing(&html?, &self.base);

        self.set_phase(CrawlPhase::Deduping);
        let mut accepted = 0usize;
        for item in &items {
            let key = product_url::dedup_key(&item.url, &self.base);
            if key.is_empty() || !seen.insert(key) {
                summary.duplicates_skipped += 1;
                continue;
            }
            batch.push(ProductRecord::from_listing(
                self.identity.allocate(),
                item,
                cb2::PLATFORM,
                entry.category,
                entry.subcategory,
            ));
            accepted += 1;
            summary.new_records += 1;

            if batch.len() >= self.config.listing.batch_flush_size {
                self.set_phase(CrawlPhase::Appending);
                self.flush(batch, checkpoint)?;
                self.set_phase(CrawlPhase::Deduping);
            }
        }
        info!(
            "{}: {} tiles found, {} new, {} already known",
            entry.subcategory,
            items.len(),
            accepted,
            items.len() - accepted
        );
        Ok(())
    }

    /// Append the buffered batch, fold its keys into the checkpoint, and
    /// persist the checkpoint. Append happens before the checkpoint write so
    /// a crash between the two re-fetches rather than loses rows.
    fn flush(
        &self,
        batch: &mut Vec<ProductRecord>,
        checkpoint: &mut ProgressCheckpoint,
    ) -> Result<(), HarvestError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.catalog.append(batch)?;
        for record in batch.iter() {
            checkpoint.mark(product_url::dedup_key(&record.product_url, &self.base));
        }
        checkpoint.record_count += batch.len() as u64;
        self.progress.save(checkpoint)?;
        info!(
            "[Flushed batch of {} records, total {}]",
            batch.len(),
            checkpoint.record_count
        );
        batch.clear();
        Ok(())
    }

    fn set_phase(&mut self, phase: CrawlPhase) {
        if self.phase != phase {
            debug!("Phase: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}
