//! Enrichment-pass binary: fills detail columns on catalog rows that still
//! have none.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cb2_harvester::application::DetailEnricher;
use cb2_harvester::infrastructure::{logging, ChromeDriver, ConfigManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = ConfigManager::from_env()
        .load()
        .await
        .context("loading configuration")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, saving the dataset...");
                cancel.cancel();
            }
        }
    });

    let driver = ChromeDriver::new(config.browser.clone());
    let mut enricher = DetailEnricher::new(config, driver, cancel)?;
    let summary = enricher.run().await?;

    if summary.aborted {
        info!("Partial progress saved; re-run to continue enrichment");
    }
    Ok(())
}
