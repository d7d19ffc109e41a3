//! Catalog record types and the write-once-if-empty merge.

use serde::{Deserialize, Serialize};

use crate::domain::categories;

/// Bound on the human-readable product name.
pub const NAME_MAX_CHARS: usize = 200;
/// Bound on the collapsed dimensions string.
pub const DIMENSIONS_MAX_CHARS: usize = 200;
/// Bound on the description after whitespace collapsing.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
/// Bound on the joined details blocks.
pub const DETAILS_MAX_CHARS: usize = 1500;
/// Bound on each multi-valued field (colors, images).
pub const LIST_FIELD_MAX_ITEMS: usize = 10;
/// Delimiter for multi-valued fields inside a single CSV cell.
pub const LIST_FIELD_DELIMITER: &str = "|";

/// One catalog row. Field declaration order is CSV column order; empty
/// strings stand for absent values so rows round-trip the dataset losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub price: String,
    #[serde(rename = "product_link")]
    pub product_url: String,
    pub platform: String,
    pub category: String,
    pub sub_category: String,
    #[serde(default)]
    pub category_group: String,
    #[serde(default)]
    pub dimensions: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub colors: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub all_images: String,
}

/// Best-effort fields pulled from one listing-page anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialProduct {
    /// Canonical absolute URL.
    pub url: String,
    pub name: String,
    pub thumbnail_url: String,
    pub price: String,
}

/// Best-effort fields pulled from one detail page. Every field is
/// independently optional; empty means "all strategies missed".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDetail {
    pub dimensions: String,
    pub sku: String,
    pub description: String,
    pub details: String,
    pub colors: Vec<String>,
    pub images: Vec<String>,
}

impl PartialDetail {
    /// True when no strategy produced anything.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
            && self.sku.is_empty()
            && self.description.is_empty()
            && self.details.is_empty()
            && self.colors.is_empty()
            && self.images.is_empty()
    }
}

impl ProductRecord {
    /// Create a record for a newly discovered listing item. Detail columns
    /// start empty and are filled later by the enrichment pass.
    pub fn from_listing(
        id: String,
        item: &PartialProduct,
        platform: &str,
        category: &str,
        subcategory: &str,
    ) -> Self {
        Self {
            id,
            name: truncate_chars(item.name.trim(), NAME_MAX_CHARS),
            thumbnail_url: item.thumbnail_url.clone(),
            price: item.price.clone(),
            product_url: item.url.clone(),
            platform: platform.to_string(),
            category: category.to_string(),
            sub_category: subcategory.to_string(),
            category_group: String::new(),
            dimensions: String::new(),
            sku: String::new(),
            description: String::new(),
            colors: String::new(),
            details: String::new(),
            all_images: String::new(),
        }
    }

    /// True when the enrichment pass should visit this row: none of the key
    /// detail fields has ever been populated.
    pub fn needs_detail(&self) -> bool {
        self.all_images.trim().is_empty()
            && self.dimensions.trim().is_empty()
            && self.sku.trim().is_empty()
            && self.description.trim().is_empty()
    }

    /// Merge extracted detail into this record, filling only fields that are
    /// currently empty. Non-empty values are never overwritten or regressed.
    /// Returns how many fields were newly populated.
    pub fn merge_detail(&mut self, detail: &PartialDetail) -> usize {
        let mut filled = 0;

        filled += fill_if_empty(&mut self.dimensions, &detail.dimensions);
        filled += fill_if_empty(&mut self.sku, &detail.sku);
        filled += fill_if_empty(&mut self.description, &detail.description);
        filled += fill_if_empty(&mut self.details, &detail.details);
        filled += fill_if_empty(&mut self.colors, &join_list(&detail.colors));
        filled += fill_if_empty(&mut self.all_images, &join_list(&detail.images));

        filled
    }

    /// Recompute the derived group column from the static tables.
    pub fn assign_category_group(&mut self) {
        self.category_group = categories::category_group(&self.category, &self.sub_category);
    }

    /// The `colors` cell split back into its items.
    pub fn colors_list(&self) -> Vec<&str> {
        split_list(&self.colors)
    }

    /// The `all_images` cell split back into its items.
    pub fn images_list(&self) -> Vec<&str> {
        split_list(&self.all_images)
    }
}

fn fill_if_empty(slot: &mut String, value: &str) -> usize {
    if slot.trim().is_empty() && !value.trim().is_empty() {
        *slot = value.to_string();
        1
    } else {
        0
    }
}

/// Join up to [`LIST_FIELD_MAX_ITEMS`] values into one delimited cell.
pub fn join_list(items: &[String]) -> String {
    items
        .iter()
        .take(LIST_FIELD_MAX_ITEMS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_FIELD_DELIMITER)
}

fn split_list(cell: &str) -> Vec<&str> {
    if cell.is_empty() {
        Vec::new()
    } else {
        cell.split(LIST_FIELD_DELIMITER).collect()
    }
}

/// Truncate on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProductRecord {
        ProductRecord::from_listing(
            "0192-test-id".to_string(),
            &PartialProduct {
                url: "https://www.cb2.com/foo-chair/s12345".to_string(),
                name: "Foo Chair".to_string(),
                thumbnail_url: "https://cb2.scene7.com/is/image/CB2/foo".to_string(),
                price: "$299.00".to_string(),
            },
            "cb2",
            "Furniture",
            "Accent Chairs",
        )
    }

    #[test]
    fn fresh_record_needs_detail() {
        assert!(record().needs_detail());
    }

    #[test]
    fn merge_fills_only_empty_fields() {
        let mut rec = record();
        rec.dimensions = "5\"W".to_string();

        let detail = PartialDetail {
            dimensions: "7\"W".to_string(),
            sku: "12345".to_string(),
            ..Default::default()
        };

        let filled = rec.merge_detail(&detail);
        assert_eq!(filled, 1);
        assert_eq!(rec.dimensions, "5\"W");
        assert_eq!(rec.sku, "12345");
    }

    #[test]
    fn merge_never_regresses_to_empty() {
        let mut rec = record();
        rec.description = "A fine chair.".repeat(5);

        let filled = rec.merge_detail(&PartialDetail::default());
        assert_eq!(filled, 0);
        assert!(!rec.description.is_empty());
    }

    #[test]
    fn merge_caps_list_fields_at_ten() {
        let mut rec = record();
        let detail = PartialDetail {
            colors: (0..15).map(|i| format!("color-{i}")).collect(),
            images: (0..12)
                .map(|i| format!("https://cb2.scene7.com/is/image/CB2/img{i}"))
                .collect(),
            ..Default::default()
        };

        rec.merge_detail(&detail);
        assert_eq!(rec.colors_list().len(), 10);
        assert_eq!(rec.images_list().len(), 10);
        assert!(rec.colors.starts_with("color-0"));
    }

    #[test]
    fn merge_reports_newly_filled_count() {
        let mut rec = record();
        let detail = PartialDetail {
            dimensions: "24\"W x 20\"D x 30\"H".to_string(),
            sku: "12345".to_string(),
            description: "x".repeat(60),
            ..Default::default()
        };
        assert_eq!(rec.merge_detail(&detail), 3);
        assert!(!rec.needs_detail());
    }

    #[test]
    fn listing_constructor_truncates_name() {
        let long = "n".repeat(400);
        let rec = ProductRecord::from_listing(
            "id".to_string(),
            &PartialProduct {
                url: "https://www.cb2.com/x/s54321".to_string(),
                name: long,
                ..Default::default()
            },
            "cb2",
            "Decor",
            "Wall Art",
        );
        assert_eq!(rec.name.chars().count(), NAME_MAX_CHARS);
    }

    #[test]
    fn immutable_discovery_fields_survive_merge() {
        let mut rec = record();
        let before = (rec.id.clone(), rec.category.clone(), rec.sub_category.clone());
        rec.merge_detail(&PartialDetail {
            sku: "98765".to_string(),
            ..Default::default()
        });
        assert_eq!(before.0, rec.id);
        assert_eq!(before.1, rec.category);
        assert_eq!(before.2, rec.sub_category);
    }

    #[test]
    fn category_group_assignment_is_pure_recompute() {
        let mut rec = record();
        rec.assign_category_group();
        assert_eq!(rec.category_group, "LIVING ROOM FURNITURE");

        rec.sub_category = "Rare Item".to_string();
        rec.assign_category_group();
        assert_eq!(rec.category_group, "FURNITURE");
    }

    #[test]
    fn whitespace_collapse_and_truncate() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("abc", 4), "abc");
    }
}
