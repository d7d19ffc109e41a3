//! End-to-end listing pass against a scripted browser session.

mod common;

use cb2_harvester::application::{CrawlPhase, CrawlScheduler};
use cb2_harvester::domain::CATEGORY_PAGES;
use cb2_harvester::infrastructure::{CatalogStore, ProgressStore};
use common::{fast_config, Scripted, ScriptedDriver};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

const WARMUP_URL: &str = "https://www.cb2.com/";
const SOFAS_URL: &str = "https://www.cb2.com/furniture/sofas/";
const SECTIONALS_URL: &str = "https://www.cb2.com/furniture/sectionals/";

fn sofas_page() -> Scripted {
    Scripted::page(
        r#"<html><body><div class="product-grid">
          <div class="product-tile">
            <a href="/burl-coffee-table/s514973">Burl Coffee Table</a>
            <img src="https://cb2.scene7.com/is/image/CB2/BurlTable3QtrS24"/>
            <span class="price">$799.00</span>
          </div>
          <div class="product-tile">
            <a href="/gwyneth-boucle-chair/s259472">Gwyneth Boucle Chair</a>
            <img src="https://cb2.scene7.com/is/image/CB2/GwynethChairS24"/>
            <span class="price">$1,099.00</span>
          </div>
          <div class="product-tile">
            <a href="/strom-sofa/s662301">Strom Sofa</a>
            <img src="https://cb2.scene7.com/is/image/CB2/StromSofaS24"/>
            <span class="price">$1,899.00</span>
          </div>
        </div></body></html>"#,
    )
}

#[tokio::test]
async fn first_run_discovers_and_persists_products() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let catalog_path = config.storage.catalog_path.clone();
    let progress_path = config.storage.progress_path.clone();

    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, sofas_page());
    let probe = driver.clone();

    let mut scheduler = CrawlScheduler::new(config, driver, CancellationToken::new()).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.new_records, 3);
    assert_eq!(summary.duplicates_skipped, 0);
    assert_eq!(summary.subcategories_visited, CATEGORY_PAGES.len());
    assert_eq!(summary.subcategories_failed, 0);
    assert_eq!(summary.total_records, 3);
    assert!(!summary.aborted);
    assert_eq!(scheduler.phase(), CrawlPhase::Complete);

    let rows = CatalogStore::new(&catalog_path).read_all().unwrap();
    assert_eq!(rows.len(), 3);
    let sofa = &rows[0];
    assert_eq!(sofa.name, "Burl Coffee Table");
    assert_eq!(sofa.price, "$799.00");
    assert_eq!(sofa.platform, "cb2");
    assert_eq!(sofa.category, "Furniture");
    assert_eq!(sofa.sub_category, "Sofas");
    assert!(sofa.product_url.ends_with("/s514973"));
    assert!(sofa.thumbnail_url.contains("cb2.scene7.com"));
    assert!(!sofa.id.is_empty());
    assert!(rows.iter().all(|row| row.needs_detail()));

    let checkpoint = ProgressStore::new(&progress_path).load().unwrap();
    assert!(checkpoint.is_processed("514973"));
    assert!(checkpoint.is_processed("259472"));
    assert!(checkpoint.is_processed("662301"));
    assert_eq!(checkpoint.record_count, 3);

    let log = probe.log();
    assert_eq!(log.starts, 1);
    assert_eq!(log.stops, 1);
    assert_eq!(log.navigations[0], WARMUP_URL);
    assert_eq!(log.open_pages, 0, "every page the pass opened must be closed");
}

#[tokio::test]
async fn rerun_skips_everything_already_checkpointed() {
    let dir = tempdir().unwrap();

    for pass in 0..2 {
        let driver = ScriptedDriver::new();
        driver.script(SOFAS_URL, sofas_page());
        let mut scheduler =
            CrawlScheduler::new(fast_config(dir.path()), driver, CancellationToken::new())
                .unwrap();
        let summary = scheduler.run().await.unwrap();

        if pass == 0 {
            assert_eq!(summary.new_records, 3);
        } else {
            assert_eq!(summary.new_records, 0);
            assert_eq!(summary.duplicates_skipped, 3);
        }
        assert_eq!(summary.total_records, 3);
    }

    let rows = CatalogStore::new(dir.path().join("catalog.csv")).read_all().unwrap();
    assert_eq!(rows.len(), 3, "rerun must not append duplicate rows");
}

#[tokio::test]
async fn same_sku_under_two_urls_creates_one_record() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let catalog_path = config.storage.catalog_path.clone();

    // The same chair listed under two cosmetic URL variants on two
    // different subcategory pages.
    let driver = ScriptedDriver::new();
    driver.script(
        SOFAS_URL,
        Scripted::page(
            r#"<html><body>
              <a href="/strom-lounge-chair/s884120">Strom Lounge Chair</a>
            </body></html>"#,
        ),
    );
    driver.script(
        SECTIONALS_URL,
        Scripted::page(
            r#"<html><body>
              <a href="/strom-lounge-chair-oat/s884120?ref=recommended">Strom Lounge Chair Oat</a>
            </body></html>"#,
        ),
    );

    let mut scheduler = CrawlScheduler::new(config, driver, CancellationToken::new()).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.duplicates_skipped, 1);

    let rows = CatalogStore::new(&catalog_path).read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].product_url, "https://www.cb2.com/strom-lounge-chair/s884120",
        "the first-seen link is the one that sticks"
    );
}

#[tokio::test]
async fn small_batch_threshold_flushes_mid_subcategory_without_duplicates() {
    let dir = tempdir().unwrap();
    let mut config = fast_config(dir.path());
    config.listing.batch_flush_size = 2;
    let catalog_path = config.storage.catalog_path.clone();

    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, sofas_page());
    let mut scheduler = CrawlScheduler::new(config, driver, CancellationToken::new()).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.new_records, 3);
    let rows = CatalogStore::new(&catalog_path).read_all().unwrap();
    assert_eq!(rows.len(), 3, "split flushes must still yield exactly one row per product");
}

#[tokio::test]
async fn persistently_blocked_subcategory_is_abandoned_after_bounded_retries() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let attempts = u64::from(config.blocking.max_retries) + 1;

    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, Scripted::blocked());
    driver.script(SECTIONALS_URL, sofas_page());
    let probe = driver.clone();

    let mut scheduler = CrawlScheduler::new(config, driver, CancellationToken::new()).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.subcategories_failed, 1);
    assert_eq!(summary.subcategories_visited, CATEGORY_PAGES.len() - 1);
    assert_eq!(summary.new_records, 3, "the healthy subcategory still contributes");

    let sofas_attempts = probe
        .log()
        .navigations
        .iter()
        .filter(|url| url.as_str() == SOFAS_URL)
        .count() as u64;
    assert_eq!(sofas_attempts, attempts);
}

#[tokio::test]
async fn challenge_page_is_retried_and_then_crawled() {
    let dir = tempdir().unwrap();
    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, Scripted::challenge());
    driver.script(SOFAS_URL, sofas_page());
    let probe = driver.clone();

    let mut scheduler =
        CrawlScheduler::new(fast_config(dir.path()), driver, CancellationToken::new()).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.subcategories_failed, 0);
    assert_eq!(summary.new_records, 3);

    let sofas_attempts = probe
        .log()
        .navigations
        .iter()
        .filter(|url| url.as_str() == SOFAS_URL)
        .count();
    assert_eq!(sofas_attempts, 2);
}

#[tokio::test]
async fn dead_subcategory_navigation_is_not_fatal() {
    let dir = tempdir().unwrap();
    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, Scripted::nav_fail("net::ERR_CONNECTION_RESET"));
    driver.script(SECTIONALS_URL, sofas_page());

    let mut scheduler =
        CrawlScheduler::new(fast_config(dir.path()), driver, CancellationToken::new()).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.subcategories_failed, 1);
    assert_eq!(summary.new_records, 3);
    assert!(!summary.aborted);
}

fn sectionals_page() -> Scripted {
    Scripted::page(
        r#"<html><body><div class="product-grid">
          <div class="product-tile">
            <a href="/camden-sectional/s731450">Camden Sectional</a>
            <img src="https://cb2.scene7.com/is/image/CB2/CamdenSectionalS24"/>
            <span class="price">$2,499.00</span>
          </div>
          <div class="product-tile">
            <a href="/piazza-sectional/s808221">Piazza Sectional</a>
            <img src="https://cb2.scene7.com/is/image/CB2/PiazzaSectionalS24"/>
            <span class="price">$3,199.00</span>
          </div>
          <div class="product-tile">
            <a href="/lotus-sectional/s905634">Lotus Sectional</a>
            <img src="https://cb2.scene7.com/is/image/CB2/LotusSectionalS24"/>
            <span class="price">$2,899.00</span>
          </div>
        </div></body></html>"#,
    )
}

#[tokio::test]
async fn interruption_mid_run_keeps_flushed_work_and_resumes() {
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();

    // First visit to Sectionals fires the interrupt; the retry serves the page.
    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, sofas_page());
    driver.script(SECTIONALS_URL, Scripted::cancel(&cancel));
    driver.script(SECTIONALS_URL, sectionals_page());

    let mut scheduler =
        CrawlScheduler::new(fast_config(dir.path()), driver.clone(), cancel).unwrap();
    let first = scheduler.run().await.unwrap();

    assert!(first.aborted);
    assert_eq!(first.subcategories_visited, 1);
    assert_eq!(first.new_records, 3);
    assert_eq!(first.total_records, 3, "the completed subcategory must survive the interrupt");
    assert_eq!(scheduler.phase(), CrawlPhase::Aborted);

    let mut scheduler =
        CrawlScheduler::new(fast_config(dir.path()), driver, CancellationToken::new()).unwrap();
    let second = scheduler.run().await.unwrap();

    assert!(!second.aborted);
    assert_eq!(second.duplicates_skipped, 3, "resumed run must skip the flushed products");
    assert_eq!(second.new_records, 3);
    assert_eq!(second.total_records, 6);
    assert_eq!(second.subcategories_visited, CATEGORY_PAGES.len());

    let rows = CatalogStore::new(dir.path().join("catalog.csv")).read_all().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows[..3].iter().all(|row| row.sub_category == "Sofas"));
    assert!(rows[3..].iter().all(|row| row.sub_category == "Sectionals"));

    let checkpoint = ProgressStore::new(dir.path().join("progress.json")).load().unwrap();
    assert_eq!(checkpoint.record_count, 6);
    assert!(checkpoint.is_processed("731450"));
}

#[tokio::test]
async fn cancellation_aborts_promptly_with_partial_summary() {
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let driver = ScriptedDriver::new();
    driver.script(SOFAS_URL, sofas_page());
    let probe = driver.clone();

    let mut scheduler = CrawlScheduler::new(fast_config(dir.path()), driver, cancel).unwrap();
    let summary = scheduler.run().await.unwrap();

    assert!(summary.aborted);
    assert_eq!(summary.new_records, 0);
    assert_eq!(scheduler.phase(), CrawlPhase::Aborted);
    assert_eq!(probe.log().stops, 1, "the browser must be torn down on abort");
}
