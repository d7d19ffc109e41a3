//! Listing-pass binary: walks the category table and appends newly
//! discovered products to the catalog.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cb2_harvester::application::CrawlScheduler;
use cb2_harvester::infrastructure::{logging, ChromeDriver, ConfigManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = ConfigManager::from_env()
        .load()
        .await
        .context("loading configuration")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let driver = ChromeDriver::new(config.browser.clone());
    let mut scheduler = CrawlScheduler::new(config, driver, cancel)?;
    let summary = scheduler.run().await?;

    if summary.aborted {
        info!("Partial results saved; re-run to resume where this left off");
    }
    Ok(())
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing the current step and saving...");
            cancel.cancel();
        }
    });
}
