use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};

use crate::parser::text::normalize_text;

pub const UNKNOWN_NAME: &str = "Unknown CPU";

static SPEC_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\s*-\s*specifications.*$")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static SPECS_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\s*specs.*$")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static META_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(intel.*?(?:core|xeon).*?)(?:\s*[-|]|$)")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Best-effort product name via a prioritized strategy chain: page title,
/// header elements, meta tags, breadcrumbs, then URL-slug reconstruction.
/// The first plausible result wins; the sentinel name is the last resort.
pub fn extract(doc: &Html, url: &str) -> String {
    let strategies: [fn(&Html) -> Option<String>; 4] =
        [from_title, from_headers, from_meta, from_breadcrumbs];

    for strategy in strategies {
        if let Some(name) = strategy(doc) {
            let name = normalize_text(&name);
            if plausible(&name) {
                return name;
            }
        }
    }

    from_url(url).unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

/// A plausible product name carries the brand marker and is not a fragment.
fn plausible(name: &str) -> bool {
    name.len() > 5 && name.to_lowercase().contains("intel")
}

fn from_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").unwrap();
    let title = doc.select(&sel).next()?;
    let text = title.text().collect::<Vec<_>>().join(" ");
    let text = text.trim();
    if !text.to_lowercase().contains("intel") {
        return None;
    }
    // Product name leads the title; keep hyphenated model numbers intact and
    // only strip specification suffixes
    let name_part = text.split('|').next().unwrap_or(text).trim();
    let name_part = SPEC_SUFFIX_RE.replace(name_part, "");
    let name_part = SPECS_SUFFIX_RE.replace(&name_part, "").trim().to_string();
    (name_part.len() > 10).then_some(name_part)
}

fn from_headers(doc: &Html) -> Option<String> {
    const HEADER_SELECTORS: &[&str] = &[
        "h1.pdp-product-name",
        r#"h1[data-testid="product-name"]"#,
        ".product-title h1",
        "h1.page-title",
        ".product-header h1",
        ".specification-header h1",
        "h1",
        "h2",
    ];

    for selector in HEADER_SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        for element in doc.select(&sel) {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.trim();
            let lower = text.to_lowercase();
            if lower.contains("intel")
                && (lower.contains("core") || lower.contains("xeon") || lower.contains("processor"))
            {
                let cleaned = SPEC_SUFFIX_RE.replace(text, "");
                let cleaned = SPECS_SUFFIX_RE.replace(&cleaned, "").trim().to_string();
                return Some(cleaned);
            }
        }
    }
    None
}

fn from_meta(doc: &Html) -> Option<String> {
    const META_SELECTORS: &[&str] = &[
        r#"meta[property="og:title"]"#,
        r#"meta[name="title"]"#,
        r#"meta[name="description"]"#,
    ];

    for selector in META_SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        if let Some(meta) = doc.select(&sel).next() {
            if let Some(content) = meta.value().attr("content") {
                let lower = content.to_lowercase();
                if lower.contains("intel") && (lower.contains("core") || lower.contains("xeon")) {
                    if let Some(caps) = META_NAME_RE.captures(content) {
                        return Some(caps[1].trim().to_string());
                    }
                }
            }
        }
    }
    None
}

fn from_breadcrumbs(doc: &Html) -> Option<String> {
    const BREADCRUMB_SELECTORS: &[&str] = &[
        ".breadcrumbs",
        ".breadcrumb",
        r#"nav[aria-label="breadcrumb"]"#,
        r#"[role="navigation"]"#,
    ];
    let anchor_sel = Selector::parse("a").unwrap();

    for selector in BREADCRUMB_SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        if let Some(breadcrumb) = doc.select(&sel).next() {
            // Trail runs general -> specific; read from the end
            let anchors: Vec<String> = breadcrumb
                .select(&anchor_sel)
                .map(|a| a.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .collect();
            for text in anchors.iter().rev() {
                if text.len() > 10 && text.to_lowercase().contains("intel") {
                    return Some(text.clone());
                }
            }
        }
    }
    None
}

/// Reconstruct a readable name from the URL slug, e.g.
/// `/intel-core-ultra-9-processor-288v-.../` -> "Intel Core Ultra 9 Processor 288V".
fn from_url(url: &str) -> Option<String> {
    let decoded = url.replace("%20", " ");
    for part in decoded.split('/') {
        let lower = part.to_lowercase();
        if lower.contains("intel") && (lower.contains("core") || lower.contains("xeon")) {
            let words: Vec<String> = part.split('-').map(format_slug_word).collect();
            let name = words.join(" ");
            if name.len() > 10 {
                return Some(name);
            }
        }
    }
    None
}

fn format_slug_word(word: &str) -> String {
    let lower = word.to_lowercase();
    match lower.as_str() {
        "intel" | "core" | "xeon" | "processor" => capitalize(&lower),
        _ if lower.starts_with('i') && lower[1..].chars().all(|c| c.is_ascii_digit()) && lower.len() > 1 => {
            lower
        }
        _ if lower.chars().all(|c| c.is_ascii_digit()) => lower.to_uppercase(),
        _ if lower.ends_with('v') && lower[..lower.len() - 1].chars().all(|c| c.is_ascii_digit()) => {
            lower.to_uppercase()
        }
        _ => capitalize(&lower),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_wins_over_everything() {
        let doc = Html::parse_document(
            "<html><head>
               <title>Intel\u{00ae} Core\u{2122} i7-14700K Processor | Product Specs</title>
             </head><body><h1>Intel Xeon something else</h1></body></html>",
        );
        assert_eq!(extract(&doc, ""), "Intel Core i7-14700K Processor");
    }

    #[test]
    fn header_fallback_when_title_missing() {
        let doc = Html::parse_document(
            r#"<body><h1 class="pdp-product-name">Intel Core Ultra 7 155H</h1></body>"#,
        );
        assert_eq!(extract(&doc, ""), "Intel Core Ultra 7 155H");
    }

    #[test]
    fn meta_fallback() {
        let doc = Html::parse_document(
            r#"<head><meta property="og:title" content="Intel Xeon Platinum 8480 | datasheet"></head>"#,
        );
        assert_eq!(extract(&doc, ""), "Intel Xeon Platinum 8480");
    }

    #[test]
    fn url_slug_reconstruction() {
        let url = "https://example.com/products/sku/240961/intel-core-ultra-9-processor-288v/specifications.html";
        let doc = Html::parse_document("<body></body>");
        assert_eq!(extract(&doc, url), "Intel Core Ultra 9 Processor 288V");
    }

    #[test]
    fn sentinel_when_nothing_matches() {
        let doc = Html::parse_document("<body><h1>Some Other Product</h1></body>");
        assert_eq!(extract(&doc, "https://example.com/page.html"), UNKNOWN_NAME);
    }
}
