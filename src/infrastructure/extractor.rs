//! HTML extraction for listing and detail pages.
//!
//! All heuristics are best-effort: a field whose strategies all miss is
//! returned empty, never as an error. Detail fields run an ordered list of
//! strategies and stop at the first hit.

use anyhow::{anyhow, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::product::{
    collapse_whitespace, truncate_chars, PartialDetail, PartialProduct, DESCRIPTION_MAX_CHARS,
    DETAILS_MAX_CHARS, DIMENSIONS_MAX_CHARS, LIST_FIELD_MAX_ITEMS, NAME_MAX_CHARS,
};
use crate::domain::product_url;
use crate::infrastructure::config::cb2;

/// Accept window for a description candidate from the primary selectors.
const DESCRIPTION_MIN_CHARS: usize = 50;
const DESCRIPTION_ACCEPT_MAX_CHARS: usize = 2000;
/// Accept window for the paragraph fallback.
const PARAGRAPH_MIN_CHARS: usize = 100;
const PARAGRAPH_MAX_CHARS: usize = 1000;
/// Accept window for a single details block.
const DETAILS_BLOCK_MIN_CHARS: usize = 20;
const DETAILS_BLOCK_MAX_CHARS: usize = 1500;
const COLOR_MAX_CHARS: usize = 50;
const IMAGE_URL_MIN_CHARS: usize = 30;
/// How far up the ancestor chain to look for a listing price.
const PRICE_ANCESTOR_LEVELS: usize = 5;
const MIN_ANCHOR_NAME_CHARS: usize = 3;

/// Consent banners frequently outscore real descriptions on the generic
/// selectors, so candidates carrying these markers are rejected outright.
const COOKIE_MARKERS: &[&str] = &["cookie", "consent", "traffic sources", "measure and improve"];
const COOKIE_PREFIX: &str = "these cookies";

/// A fallback paragraph must read like product copy.
const MARKETING_KEYWORDS: &[&str] = &[
    "features",
    "designed",
    "crafted",
    "made of",
    "perfect for",
    "collection",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "[class*='product-description']",
    "[itemprop='description']",
    "[data-testid*='description']",
    "[class*='description']",
    "[class*='overview']",
];

/// Attribute substrings that mark a spec/materials/care block.
const DETAILS_TOPICS: &[&str] = &[
    "details",
    "specifications",
    "materials",
    "care",
    "features",
    "about",
];

const SWATCH_SELECTORS: &[&str] = &[
    "[data-color]",
    "[class*='swatch']",
    "[class*='color-option']",
    "button[aria-label*='olor']",
    "[class*='color'] button",
];

const META_SKU_SELECTORS: &[&str] = &[
    "meta[property='product:retailer_item_id']",
    "meta[itemprop='sku']",
];

pub struct PageExtractor {
    anchor: Selector,
    image: Selector,
    srcset_source: Selector,
    paragraph: Selector,
    descriptions: Vec<Selector>,
    details_blocks: Selector,
    swatches: Selector,
    meta_sku: Vec<Selector>,
    price_pattern: Regex,
    dimension_triple: Regex,
    overall_label: Regex,
    width_label: Regex,
    depth_label: Regex,
    height_label: Regex,
    generic_dimensions_label: Regex,
    sku_label: Regex,
    item_label: Regex,
    color_reject: Regex,
    has_digit: Regex,
}

impl PageExtractor {
    pub fn new() -> Result<Self> {
        let details_css = DETAILS_TOPICS
            .iter()
            .flat_map(|kw| {
                [
                    format!("[class*='{kw}']"),
                    format!("[id*='{kw}']"),
                    format!("[data-testid*='{kw}']"),
                ]
            })
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            anchor: compile("a[href]")?,
            image: compile("img")?,
            srcset_source: compile("source[srcset]")?,
            paragraph: compile("p")?,
            descriptions: DESCRIPTION_SELECTORS
                .iter()
                .map(|css| compile(css))
                .collect::<Result<Vec<_>>>()?,
            details_blocks: compile(&details_css)?,
            swatches: compile(&SWATCH_SELECTORS.join(", "))?,
            meta_sku: META_SKU_SELECTORS
                .iter()
                .map(|css| compile(css))
                .collect::<Result<Vec<_>>>()?,
            price_pattern: Regex::new(r"\$[\d,]+(?:\.\d+)?")?,
            dimension_triple: Regex::new(
                r#"(?i)\d+(?:\.\d+)?\s*(?:"|in\.?|cm)?\s*[wdh]?\.?\s*x\s*\d+(?:\.\d+)?\s*(?:"|in\.?|cm)?\s*[wdh]?\.?\s*x\s*\d+(?:\.\d+)?\s*(?:"|in\.?|cm)?\s*[wdh]?\.?"#,
            )?,
            overall_label: Regex::new(r"(?i)overall\s+dimensions?\s*:?\s*([^\n]+)")?,
            width_label: Regex::new(r#"(?i)\bwidth\s*:?\s*(\d+(?:\.\d+)?\s*(?:"|in\.?|cm)?)"#)?,
            depth_label: Regex::new(r#"(?i)\bdepth\s*:?\s*(\d+(?:\.\d+)?\s*(?:"|in\.?|cm)?)"#)?,
            height_label: Regex::new(r#"(?i)\bheight\s*:?\s*(\d+(?:\.\d+)?\s*(?:"|in\.?|cm)?)"#)?,
            generic_dimensions_label: Regex::new(r"(?i)\bdimensions?\s*:?\s*([^\n]+)")?,
            sku_label: Regex::new(r"(?i)\bSKU\b\s*:?\s*#?\s*(\d{5,7})")?,
            item_label: Regex::new(r"(?i)\b(?:item|product)\s*(?:#|id|number)?\s*:?\s*#?\s*(\d{5,7})")?,
            color_reject: Regex::new(r"(?i)\d+\s*x\s*\d+|price|cart|buy")?,
            has_digit: Regex::new(r"\d")?,
        })
    }

    /// Scan a rendered listing page for product tiles. Duplicates within the
    /// page are suppressed by dedup key; callers still own cross-page dedup.
    pub fn extract_listing(&self, html: &str, base: &Url) -> Vec<PartialProduct> {
        let document = Html::parse_document(html);
        let mut found = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for anchor in document.select(&self.anchor) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !product_url::is_product_path(href) {
                continue;
            }
            let canonical = product_url::normalize(href, base);
            if !seen.insert(product_url::dedup_key(&canonical, base)) {
                continue;
            }

            let anchor_text = collapse_whitespace(&anchor.text().collect::<String>());
            let name = if anchor_text.chars().count() >= MIN_ANCHOR_NAME_CHARS {
                anchor_text
            } else {
                name_from_slug(&canonical).unwrap_or(anchor_text)
            };

            found.push(PartialProduct {
                url: canonical,
                name: truncate_chars(&name, NAME_MAX_CHARS),
                thumbnail_url: self.find_thumbnail(anchor, base).unwrap_or_default(),
                price: self.find_price(anchor).unwrap_or_default(),
            });
        }
        found
    }

    /// Run every detail field's strategy chain over a rendered product page.
    pub fn extract_detail(&self, html: &str, page_url: &str) -> PartialDetail {
        let document = Html::parse_document(html);
        let text = visible_text(&document);

        PartialDetail {
            dimensions: self.extract_dimensions(&text).unwrap_or_default(),
            sku: self.extract_sku(&document, &text, page_url).unwrap_or_default(),
            description: self.extract_description(&document).unwrap_or_default(),
            details: self.extract_details(&document).unwrap_or_default(),
            colors: self.extract_colors(&document),
            images: self.extract_images(&document),
        }
    }

    fn find_thumbnail(&self, anchor: ElementRef<'_>, base: &Url) -> Option<String> {
        let scopes = [Some(anchor), anchor.parent().and_then(ElementRef::wrap)];
        for scope in scopes.into_iter().flatten() {
            for img in scope.select(&self.image) {
                let src = img
                    .value()
                    .attr("src")
                    .or_else(|| img.value().attr("data-src"));
                if let Some(src) = src {
                    if !src.trim().is_empty() {
                        return Some(product_url::resolve(src, base));
                    }
                }
            }
        }
        None
    }

    fn find_price(&self, anchor: ElementRef<'_>) -> Option<String> {
        let mut scope = Some(anchor);
        for _ in 0..PRICE_ANCESTOR_LEVELS {
            let element = scope?;
            let text = element.text().collect::<String>();
            if let Some(m) = self.price_pattern.find(&text) {
                return Some(m.as_str().to_string());
            }
            scope = element.parent().and_then(ElementRef::wrap);
        }
        None
    }

    fn extract_dimensions(&self, text: &str) -> Option<String> {
        let strategies: [fn(&Self, &str) -> Option<String>; 4] = [
            Self::dimensions_triple,
            Self::dimensions_overall_label,
            Self::dimensions_axis_labels,
            Self::dimensions_generic_label,
        ];
        strategies
            .iter()
            .find_map(|strategy| strategy(self, text))
            .map(|raw| truncate_chars(&collapse_whitespace(&raw), DIMENSIONS_MAX_CHARS))
    }

    fn dimensions_triple(&self, text: &str) -> Option<String> {
        self.dimension_triple
            .find(text)
            .map(|m| m.as_str().to_string())
    }

    fn dimensions_overall_label(&self, text: &str) -> Option<String> {
        self.overall_label
            .captures(text)
            .map(|c| c[1].trim().to_string())
    }

    fn dimensions_axis_labels(&self, text: &str) -> Option<String> {
        let width = self.width_label.captures(text)?;
        let depth = self.depth_label.captures(text)?;
        let height = self.height_label.captures(text)?;
        Some(format!(
            "{} x {} x {}",
            width[1].trim(),
            depth[1].trim(),
            height[1].trim()
        ))
    }

    fn dimensions_generic_label(&self, text: &str) -> Option<String> {
        let value = self.generic_dimensions_label.captures(text)?[1]
            .trim()
            .to_string();
        self.has_digit.is_match(&value).then_some(value)
    }

    fn extract_sku(&self, document: &Html, text: &str, page_url: &str) -> Option<String> {
        self.sku_label
            .captures(text)
            .map(|c| c[1].to_string())
            .or_else(|| self.item_label.captures(text).map(|c| c[1].to_string()))
            .or_else(|| self.sku_from_meta(document))
            .or_else(|| product_url::extract_sku(page_url))
    }

    fn sku_from_meta(&self, document: &Html) -> Option<String> {
        self.meta_sku.iter().find_map(|selector| {
            document
                .select(selector)
                .filter_map(|el| el.value().attr("content"))
                .map(|content| content.trim().to_string())
                .find(|content| !content.is_empty())
        })
    }

    fn extract_description(&self, document: &Html) -> Option<String> {
        for selector in &self.descriptions {
            for element in document.select(selector) {
                let text = collapse_whitespace(&element.text().collect::<String>());
                let chars = text.chars().count();
                if (DESCRIPTION_MIN_CHARS..=DESCRIPTION_ACCEPT_MAX_CHARS).contains(&chars)
                    && !is_cookie_text(&text)
                {
                    return Some(truncate_chars(&text, DESCRIPTION_MAX_CHARS));
                }
            }
        }

        // Fallback: any paragraph that reads like product copy.
        for paragraph in document.select(&self.paragraph) {
            let text = collapse_whitespace(&paragraph.text().collect::<String>());
            let chars = text.chars().count();
            if !(PARAGRAPH_MIN_CHARS..=PARAGRAPH_MAX_CHARS).contains(&chars)
                || is_cookie_text(&text)
            {
                continue;
            }
            let lower = text.to_lowercase();
            if MARKETING_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                return Some(truncate_chars(&text, DESCRIPTION_MAX_CHARS));
            }
        }
        None
    }

    fn extract_details(&self, document: &Html) -> Option<String> {
        let mut blocks: Vec<String> = Vec::new();
        for element in document.select(&self.details_blocks) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            let chars = text.chars().count();
            if !(DETAILS_BLOCK_MIN_CHARS..=DETAILS_BLOCK_MAX_CHARS).contains(&chars) {
                continue;
            }
            if !blocks.contains(&text) {
                blocks.push(text);
            }
        }
        if blocks.is_empty() {
            return None;
        }
        Some(truncate_chars(&blocks.join(" | "), DETAILS_MAX_CHARS))
    }

    fn extract_colors(&self, document: &Html) -> Vec<String> {
        let mut colors: Vec<String> = Vec::new();
        for swatch in document.select(&self.swatches) {
            if colors.len() >= LIST_FIELD_MAX_ITEMS {
                break;
            }
            let raw = swatch
                .value()
                .attr("data-color")
                .or_else(|| swatch.value().attr("title"))
                .or_else(|| swatch.value().attr("aria-label"))
                .map(str::to_string)
                .unwrap_or_else(|| swatch.text().collect::<String>());

            let mut label = collapse_whitespace(&raw);
            if label.to_lowercase().starts_with("select ") {
                label = label[7..].trim().to_string();
            }
            if label.is_empty()
                || label.chars().count() > COLOR_MAX_CHARS
                || self.color_reject.is_match(&label)
            {
                continue;
            }
            if !colors.contains(&label) {
                colors.push(label);
            }
        }
        colors
    }

    fn extract_images(&self, document: &Html) -> Vec<String> {
        let mut images: Vec<String> = Vec::new();

        let mut push = |raw: &str| {
            if !raw.contains(cb2::MEDIA_CDN_HOST) {
                return;
            }
            let cleaned = clean_image_url(raw);
            if cleaned.chars().count() > IMAGE_URL_MIN_CHARS && !images.contains(&cleaned) {
                images.push(cleaned);
            }
        };

        for img in document.select(&self.image) {
            if let Some(src) = img
                .value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
            {
                push(src);
            }
        }
        for source in document.select(&self.srcset_source) {
            if let Some(srcset) = source.value().attr("srcset") {
                for candidate in srcset.split(',') {
                    if let Some(candidate_url) = candidate.split_whitespace().next() {
                        push(candidate_url);
                    }
                }
            }
        }
        images
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// Page text with script/style/noscript subtrees removed, roughly what the
/// browser would report as `innerText`.
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !matches!(child_element.value().name(), "script" | "style" | "noscript") {
                collect_text(child_element, out);
            }
        }
    }
}

fn is_cookie_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.starts_with(COOKIE_PREFIX) || COOKIE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Title-case the hyphenated slug that precedes the SKU segment, dropping
/// digit-only tokens ("burl-wood-table-2024" reads "Burl Wood Table").
fn name_from_slug(url: &str) -> Option<String> {
    let path = Url::parse(url).ok()?.path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let marker = segments
        .iter()
        .position(|s| product_url::is_sku_segment(s))?;
    let slug = if marker == 0 {
        return None;
    } else {
        segments[marker - 1]
    };

    let words: Vec<String> = slug
        .split('-')
        .filter(|token| !token.is_empty() && !token.chars().all(|c| c.is_ascii_digit()))
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn clean_image_url(raw: &str) -> String {
    let mut cleaned = raw;
    for stop in ['?', '#', '$'] {
        if let Some(idx) = cleaned.find(stop) {
            cleaned = &cleaned[..idx];
        }
    }
    cleaned.trim_end_matches('/').to_string()
}
