//! Category-group backfill.
//!
//! One-shot pass over the existing catalog: fills the `category_group`
//! column from the subcategory mapping and rewrites the file atomically,
//! then logs the resulting per-group distribution.

use std::collections::BTreeMap;

use anyhow::Context;
use tracing::info;

use crate::infrastructure::{CatalogStore, HarvestConfig};

/// Counters from a grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingSummary {
    pub total: usize,
    pub updated: usize,
}

/// Assign `category_group` on every row and rewrite the catalog in place.
pub fn assign_groups(config: &HarvestConfig) -> anyhow::Result<GroupingSummary> {
    let catalog = CatalogStore::new(&config.storage.catalog_path);
    let mut records = catalog.read_all().context("reading catalog")?;
    if records.is_empty() {
        info!("Catalog is empty, nothing to group");
        return Ok(GroupingSummary::default());
    }

    let mut updated = 0usize;
    for record in &mut records {
        let before = record.category_group.clone();
        record.assign_category_group();
        if record.category_group != before {
            updated += 1;
        }
    }
    catalog.rewrite(&records).context("rewriting catalog")?;

    let mut distribution: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &records {
        *distribution.entry(record.category_group.as_str()).or_default() += 1;
    }
    let mut groups: Vec<(&str, usize)> = distribution.into_iter().collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    info!("Assigned groups on {} records ({} changed)", records.len(), updated);
    for (group, count) in &groups {
        info!("  {count:>5}  {group}");
    }

    Ok(GroupingSummary {
        total: records.len(),
        updated,
    })
}
