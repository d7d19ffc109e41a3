//! Backfill binary: assigns the category-group column across the catalog
//! and prints the resulting distribution.

use anyhow::Context;

use cb2_harvester::application::assign_groups;
use cb2_harvester::infrastructure::{logging, ConfigManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = ConfigManager::from_env()
        .load()
        .await
        .context("loading configuration")?;

    assign_groups(&config)?;
    Ok(())
}
