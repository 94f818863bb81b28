use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use super::tables::{definition_pairs, table_pairs};
use crate::parser::keys::canonical_key;

/// Heading texts that mark a specification section across page generations.
const SECTION_NAMES: &[&str] = &[
    "essentials",
    "essential",
    "cpu specifications",
    "processor specifications",
    "memory specifications",
    "memory specs",
    "gpu specifications",
    "graphics specifications",
    "npu specifications",
    "ai specifications",
    "expansion options",
    "connectivity",
    "package specifications",
    "package specs",
    "advanced technologies",
    "features",
    "security & reliability",
    "security",
    "supplemental information",
    "additional info",
];

/// Structured-section strategy: find headings matching the known section-name
/// set and walk forward through sibling content (tables, definition lists,
/// structured divs) until the next heading.
pub fn extract(doc: &Html) -> BTreeMap<String, String> {
    let heading_sel = Selector::parse("h2, h3, h4").unwrap();

    let mut specs = BTreeMap::new();
    for heading in doc.select(&heading_sel) {
        let text = heading
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_lowercase();
        if SECTION_NAMES.iter().any(|name| text.contains(name)) {
            for (key, value) in section_content(heading) {
                specs.insert(key, value);
            }
        }
    }
    specs
}

/// Key/value pairs from the sibling elements following a section heading,
/// stopping at the next heading.
fn section_content(heading: ElementRef) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        match sibling.value().name() {
            "h1" | "h2" | "h3" | "h4" => break,
            "table" => pairs.extend(table_pairs(sibling)),
            "dl" => pairs.extend(definition_pairs(sibling)),
            "div" => pairs.extend(div_pairs(sibling)),
            _ => {}
        }
    }
    pairs
}

/// Key/value pairs from structured divs: containers whose class mentions
/// "spec" or "detail", holding a key/label/name element and a
/// value/detail/data element.
fn div_pairs(container: ElementRef) -> Vec<(String, String)> {
    let spec_div_sel =
        Selector::parse(r#"div[class*="spec"], div[class*="detail"]"#).unwrap();
    let key_sel =
        Selector::parse(r#"[class*="key"], [class*="label"], [class*="name"]"#).unwrap();
    let value_sel =
        Selector::parse(r#"[class*="value"], [class*="detail"], [class*="data"]"#).unwrap();

    let mut pairs = Vec::new();
    let mut candidates: Vec<ElementRef> = container.select(&spec_div_sel).collect();
    if container.value().attr("class").is_some_and(|c| {
        c.contains("spec") || c.contains("detail")
    }) {
        candidates.push(container);
    }

    for spec_div in candidates {
        let key = spec_div
            .select(&key_sel)
            .next()
            .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string());
        let value = spec_div
            .select(&value_sel)
            .next()
            .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string());
        if let (Some(key), Some(value)) = (key, value) {
            if !key.is_empty() && !value.is_empty() && key != value {
                let canon = canonical_key(&key);
                if !canon.is_empty() {
                    pairs.push((canon, value));
                }
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_table_walk() {
        let doc = Html::parse_document(
            "<h2>CPU Specifications</h2>
             <table><tr><td>Total Cores</td><td>16</td></tr></table>
             <h2>Something Else</h2>
             <table><tr><td>Ignored</td><td>x</td></tr></table>",
        );
        let specs = extract(&doc);
        assert_eq!(specs.get("total_cores").map(String::as_str), Some("16"));
        assert!(!specs.contains_key("ignored"));
    }

    #[test]
    fn walk_stops_at_next_heading() {
        let doc = Html::parse_document(
            "<h3>Memory Specifications</h3>
             <dl><dt>Memory Types</dt><dd>DDR5</dd></dl>
             <h3>Notes</h3>
             <table><tr><td>Footnote</td><td>1</td></tr></table>",
        );
        let specs = extract(&doc);
        assert_eq!(specs.get("memory_types").map(String::as_str), Some("DDR5"));
        assert!(!specs.contains_key("footnote"));
    }

    #[test]
    fn structured_divs_inside_section() {
        let doc = Html::parse_document(
            r#"<h2>Essentials</h2>
               <div class="wrapper">
                 <div class="spec-item">
                   <span class="spec-label">Vertical Segment</span>
                   <span class="spec-value">Mobile</span>
                 </div>
               </div>"#,
        );
        let specs = extract(&doc);
        assert_eq!(specs.get("vertical_segment").map(String::as_str), Some("Mobile"));
    }

    #[test]
    fn unmatched_headings_ignored() {
        let doc = Html::parse_document(
            "<h2>Buy Now</h2><table><tr><td>Price</td><td>$499</td></tr></table>",
        );
        assert!(extract(&doc).is_empty());
    }
}
