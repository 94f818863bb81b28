use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static SKU_SPEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/sku/\d+/").unwrap());
static SCRIPT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']([^"']*(?:sku|specifications)[^"']*)["']"#).unwrap()
});
static CPU_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"intel.*(?:core|xeon|pentium|celeron)")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static SPEC_BUTTON_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?:view|see)\s+(?:specifications|specs|details)")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Family and promotional pages that link everywhere but hold no per-product
/// data themselves.
const MARKETING_EXCLUDES: &[&str] = &[
    "/products/details/processors.html",
    "/products/details/processors/core.html",
    "/products/details/processors/xeon.html",
    "/products/details/processors/atom.html",
    "/products/overview.html",
    "/processors/processor-numbers.html",
    "/products/docs/",
    "where-to-buy",
    "ai-pc",
    "/edge.html",
    "14th-gen.html",
];

const CPU_BRANDS: &[&str] = &["core", "xeon", "pentium", "celeron", "atom"];

/// Only the US English locale of the vendor site is crawled; every other
/// locale holds translated duplicates of the same products.
pub fn is_us_english_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("/us/en/") && lower.contains("intel.com")
}

/// Whether a URL points at an individual product specification page rather
/// than a family landing page or promotional content.
pub fn is_spec_url(url: &str) -> bool {
    if !is_us_english_url(url) {
        return false;
    }
    let lower = url.to_lowercase();

    // SKU specification pages are unambiguous
    if lower.contains("/sku/") && lower.contains("specifications.html") {
        return true;
    }
    if lower.contains("/products/sku/") {
        return true;
    }
    if lower.contains("specifications.html")
        && CPU_BRANDS.iter().any(|brand| lower.contains(brand))
    {
        return true;
    }

    if MARKETING_EXCLUDES.iter().any(|ex| lower.contains(ex)) {
        return false;
    }

    SKU_SPEC_RE.is_match(&lower) || lower.contains("specifications.html")
}

/// Discover candidate specification URLs across a listing page.
///
/// The anchor scan takes its links in document order; script bodies, data
/// attributes, hidden inputs, and JSON-LD blocks supply URLs the anchor scan
/// cannot see. Duplicates collapse to the first occurrence and specification
/// pages sort ahead of everything else.
pub fn extract_spec_urls(doc: &Html, base: &Url) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    let anchor_sel = Selector::parse("a[href]").unwrap();
    for anchor in doc.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href_matches = SKU_SPEC_RE.is_match(href)
            || href.contains("specifications.html")
            || href.contains("/products/sku/")
            || href.contains("/processors/")
            || href.contains("/cpu/");
        let text = anchor.text().collect::<Vec<_>>().join(" ");
        if !href_matches && !CPU_TEXT_RE.is_match(&text) && !SPEC_BUTTON_RE.is_match(&text) {
            continue;
        }
        if let Ok(resolved) = base.join(href) {
            let resolved = resolved.to_string();
            if is_spec_url(&resolved) {
                found.push(resolved);
            }
        }
    }

    found.extend(secondary_discovery(doc, base));

    // First occurrence wins; later duplicates dropped
    let mut seen = HashSet::new();
    let deduped: Vec<String> = found
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect();

    let (spec, other): (Vec<String>, Vec<String>) = deduped
        .into_iter()
        .partition(|url| url.contains("specifications.html") || url.contains("/sku/"));

    debug!(spec = spec.len(), other = other.len(), "discovered candidate urls");
    spec.into_iter().chain(other).collect()
}

/// URLs embedded outside anchors: script literals, data-url attributes,
/// hidden form inputs, and JSON-LD structured data.
fn secondary_discovery(doc: &Html, base: &Url) -> Vec<String> {
    let mut found = Vec::new();

    let script_sel = Selector::parse("script").unwrap();
    for script in doc.select(&script_sel) {
        let body = script.text().collect::<Vec<_>>().join("");
        if script.value().attr("type") == Some("application/ld+json") {
            if let Ok(data) = serde_json::from_str::<serde_json::Value>(&body) {
                let mut urls = Vec::new();
                urls_from_json(&data, &mut urls);
                for raw in urls {
                    if let Ok(resolved) = base.join(&raw) {
                        let resolved = resolved.to_string();
                        if is_us_english_url(&resolved) {
                            found.push(resolved);
                        }
                    }
                }
            }
            continue;
        }
        for caps in SCRIPT_URL_RE.captures_iter(&body) {
            let raw = &caps[1];
            if raw.contains("/us/en/") {
                if let Ok(resolved) = base.join(raw) {
                    found.push(resolved.to_string());
                }
            }
        }
    }

    let data_sel = Selector::parse("[data-url]").unwrap();
    for element in doc.select(&data_sel) {
        if let Some(raw) = element.value().attr("data-url") {
            if raw.contains("sku") || raw.contains("specifications") {
                if let Ok(resolved) = base.join(raw) {
                    let resolved = resolved.to_string();
                    if is_us_english_url(&resolved) {
                        found.push(resolved);
                    }
                }
            }
        }
    }

    let hidden_sel = Selector::parse(r#"input[type="hidden"]"#).unwrap();
    for input in doc.select(&hidden_sel) {
        let Some(value) = input.value().attr("value") else {
            continue;
        };
        if !value.contains("sku") && !value.contains("specifications") {
            continue;
        }
        if value.starts_with("http") || value.starts_with('/') {
            if let Ok(resolved) = base.join(value) {
                let resolved = resolved.to_string();
                if is_us_english_url(&resolved) {
                    found.push(resolved);
                }
            }
        }
    }

    found
}

fn urls_from_json(data: &serde_json::Value, out: &mut Vec<String>) {
    match data {
        serde_json::Value::String(s) => {
            if (s.contains("http") || s.starts_with('/'))
                && (s.contains("sku") || s.contains("specifications"))
            {
                out.push(s.clone());
            }
        }
        serde_json::Value::Object(map) => {
            for value in map.values() {
                urls_from_json(value, out);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                urls_from_json(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.intel.com/content/www/us/en/products/details/processors.html")
            .unwrap()
    }

    #[test]
    fn locale_gate() {
        assert!(is_us_english_url(
            "https://www.intel.com/content/www/us/en/products/sku/1/specifications.html"
        ));
        assert!(!is_us_english_url(
            "https://www.intel.com/content/www/de/de/products/sku/1/specifications.html"
        ));
        assert!(!is_us_english_url("https://example.com/us/en/page.html"));
    }

    #[test]
    fn sku_spec_pages_accepted() {
        assert!(is_spec_url(
            "https://www.intel.com/content/www/us/en/products/sku/241063/intel-core-ultra-9/specifications.html"
        ));
        assert!(is_spec_url(
            "https://www.intel.com/content/www/us/en/products/sku/241063/"
        ));
    }

    #[test]
    fn marketing_pages_rejected() {
        assert!(!is_spec_url(
            "https://www.intel.com/content/www/us/en/products/details/processors/core.html"
        ));
        assert!(!is_spec_url(
            "https://www.intel.com/content/www/us/en/ai-pc/overview.html"
        ));
        assert!(!is_spec_url(
            "https://www.intel.com/content/www/us/en/products/docs/processors/guide.html"
        ));
    }

    #[test]
    fn anchors_resolved_and_filtered() {
        let doc = Html::parse_document(
            r#"<a href="/content/www/us/en/products/sku/241063/x/specifications.html">Ultra 9</a>
               <a href="/content/www/de/de/products/sku/241063/x/specifications.html">German</a>
               <a href="/content/www/us/en/ai-pc/overview.html">AI PC</a>"#,
        );
        let urls = extract_spec_urls(&doc, &base());
        assert_eq!(urls.len(), 1);
        assert!(urls[0].ends_with("/sku/241063/x/specifications.html"));
        assert!(urls[0].starts_with("https://www.intel.com/"));
    }

    #[test]
    fn first_occurrence_wins() {
        let doc = Html::parse_document(
            r#"<a href="/content/www/us/en/products/sku/1/a/specifications.html">A</a>
               <a href="/content/www/us/en/products/sku/2/b/specifications.html">B</a>
               <a href="/content/www/us/en/products/sku/1/a/specifications.html">A again</a>"#,
        );
        let urls = extract_spec_urls(&doc, &base());
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("/sku/1/"));
        assert!(urls[1].contains("/sku/2/"));
    }

    #[test]
    fn script_literals_discovered() {
        let doc = Html::parse_document(
            r#"<script>
                 var next = "/content/www/us/en/products/sku/999/hidden/specifications.html";
               </script>"#,
        );
        let urls = extract_spec_urls(&doc, &base());
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("/sku/999/"));
    }

    #[test]
    fn json_ld_discovered() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">
                 {"@type": "Product",
                  "offers": {"url": "https://www.intel.com/content/www/us/en/products/sku/777/specifications.html"}}
               </script>"#,
        );
        let urls = extract_spec_urls(&doc, &base());
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("/sku/777/"));
    }

    #[test]
    fn spec_pages_sort_first() {
        // The script literal is discovered but is not a specification page;
        // the anchor spec page must still come first
        let doc = Html::parse_document(
            r#"<script>var q = "/content/www/us/en/search?q=sku+finder";</script>
               <a href="/content/www/us/en/products/sku/3/c/specifications.html">C</a>"#,
        );
        let urls = extract_spec_urls(&doc, &base());
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("/sku/3/"));
        assert!(urls[1].contains("search"));
    }
}
