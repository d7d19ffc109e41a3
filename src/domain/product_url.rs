//! Product URL canonicalization and dedup key derivation.
//!
//! The SKU embedded in a product path (`/s` followed by 5-6 digits) is the
//! preferred dedup key: it survives cosmetic slug changes. URLs without an
//! extractable SKU fall back to their canonical form as the key.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// 5-6 digit SKU segment after a `/s` path marker, terminated by `?`, `/`,
/// `#`, or end of string.
static SKU_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/s(\d{5,6})(?:[/?#]|$)").expect("sku segment pattern"));

/// Canonicalize a raw product URL: resolve against the base origin, drop
/// query string and fragment, strip the trailing slash, lower-case.
/// Empty input stays empty; unparseable input is cleaned best-effort.
pub fn normalize(raw: &str, base: &Url) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match base.join(trimmed) {
        Ok(mut resolved) => {
            resolved.set_query(None);
            resolved.set_fragment(None);
            resolved
                .to_string()
                .trim_end_matches('/')
                .to_ascii_lowercase()
        }
        Err(_) => {
            let stripped = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
            stripped.trim_end_matches('/').to_ascii_lowercase()
        }
    }
}

/// Resolve a possibly-relative URL against the base origin, leaving query
/// parameters intact. Used for asset URLs, not dedup keys.
pub fn resolve(raw: &str, base: &Url) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match base.join(trimmed) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// True when a lone path segment is itself the SKU marker ("s123456").
pub fn is_sku_segment(segment: &str) -> bool {
    segment
        .strip_prefix('s')
        .is_some_and(|digits| {
            (5..=6).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
        })
}

/// Extract the 5-6 digit SKU from a product URL, if present.
pub fn extract_sku(url: &str) -> Option<String> {
    SKU_SEGMENT
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Dedup key for a raw URL: the SKU when extractable, otherwise the
/// canonical URL itself.
pub fn dedup_key(raw: &str, base: &Url) -> String {
    let canonical = normalize(raw, base);
    extract_sku(&canonical).unwrap_or(canonical)
}

/// True when the path looks like a product page (carries a SKU segment).
pub fn is_product_path(url: &str) -> bool {
    SKU_SEGMENT.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.cb2.com").unwrap()
    }

    #[test]
    fn normalize_strips_query_fragment_and_trailing_slash() {
        let got = normalize("https://www.cb2.com/Foo-Chair/s12345/?ref=x#reviews", &base());
        assert_eq!(got, "https://www.cb2.com/foo-chair/s12345");
    }

    #[test]
    fn normalize_resolves_relative_paths() {
        let got = normalize("/furniture/sofas/", &base());
        assert_eq!(got, "https://www.cb2.com/furniture/sofas");
    }

    #[test]
    fn normalize_keeps_empty_input_empty() {
        assert_eq!(normalize("", &base()), "");
        assert_eq!(normalize("   ", &base()), "");
    }

    #[test]
    fn sku_requires_five_or_six_digits() {
        assert_eq!(extract_sku("/foo/s12345"), Some("12345".to_string()));
        assert_eq!(extract_sku("/foo/s123456/"), Some("123456".to_string()));
        assert_eq!(extract_sku("/foo/s1234"), None);
        assert_eq!(extract_sku("/foo/s1234567"), None);
        assert_eq!(extract_sku("/foo/series-9"), None);
    }

    #[test]
    fn sku_terminates_at_query() {
        assert_eq!(
            extract_sku("https://www.cb2.com/foo/s99887?ref=plp"),
            Some("99887".to_string())
        );
    }

    #[test]
    fn same_sku_different_slugs_share_a_key() {
        let a = dedup_key("/foo-chair/s12345", &base());
        let b = dedup_key("/foo-chair-new/s12345?ref=x", &base());
        assert_eq!(a, "12345");
        assert_eq!(a, b);
    }

    #[test]
    fn key_falls_back_to_canonical_url_without_sku() {
        let key = dedup_key("https://www.cb2.com/collections/new/?sort=price", &base());
        assert_eq!(key, "https://www.cb2.com/collections/new");
    }

    #[test]
    fn resolve_keeps_query_and_absolute_urls() {
        assert_eq!(
            resolve("/is/image/CB2/Thumb?wid=400", &base()),
            "https://www.cb2.com/is/image/CB2/Thumb?wid=400"
        );
        assert_eq!(
            resolve("https://cb2.scene7.com/is/image/CB2/Thumb", &base()),
            "https://cb2.scene7.com/is/image/CB2/Thumb"
        );
    }

    #[test]
    fn sku_segment_check_rejects_near_misses() {
        assert!(is_sku_segment("s12345"));
        assert!(is_sku_segment("s123456"));
        assert!(!is_sku_segment("s1234"));
        assert!(!is_sku_segment("s1234567"));
        assert!(!is_sku_segment("series9"));
        assert!(!is_sku_segment("12345"));
    }
}
