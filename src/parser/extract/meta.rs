use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::parser::text::clean_text;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+(?:\.\d{2})?").unwrap());

/// Recommended customer price, when the page carries one.
pub fn price(doc: &Html) -> Option<String> {
    const SELECTORS: &[&str] = &[".price", ".product-price", r#"[data-testid="price"]"#, ".pdp-price"];

    for selector in SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        if let Some(element) = doc.select(&sel).next() {
            let text = element.text().collect::<Vec<_>>().join(" ");
            if let Some(m) = PRICE_RE.find(&text) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

pub fn availability(doc: &Html) -> Option<String> {
    const SELECTORS: &[&str] = &[".availability", ".stock-status", r#"[data-testid="availability"]"#];

    for selector in SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        if let Some(element) = doc.select(&sel).next() {
            let text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Product description, length-capped; fragments under 10 chars are noise.
pub fn description(doc: &Html) -> Option<String> {
    const SELECTORS: &[&str] = &[
        ".product-description",
        ".pdp-description",
        r#"[data-testid="description"]"#,
        ".product-overview",
    ];
    const MAX_LEN: usize = 500;

    for selector in SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        if let Some(element) = doc.select(&sel).next() {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = clean_text(&text);
            if text.len() > 10 {
                let capped: String = text.chars().take(MAX_LEN).collect();
                return Some(capped);
            }
        }
    }
    None
}
