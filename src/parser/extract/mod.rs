pub mod legacy;
pub mod meta;
pub mod name;
pub mod rows;
pub mod sections;
pub mod tables;

use std::collections::BTreeMap;

use scraper::Html;
use tracing::debug;

/// Run every extraction strategy over the document and merge the partial
/// results into one flat canonical-key map.
///
/// All strategies run unconditionally; a strategy finding nothing contributes
/// nothing and is not an error. Merge precedence is explicit and ascending:
/// the whole-text regex fallback is overridden by generic tables, tables by
/// structured sections, sections by modern label/data rows. A key seen by the
/// modern-row strategy therefore always wins a collision with the table scan.
pub fn extract_fields(doc: &Html) -> BTreeMap<String, String> {
    let mut merged = legacy::extract(doc);
    merged.extend(tables::extract(doc));
    merged.extend(sections::extract(doc));
    merged.extend(rows::extract(doc));
    debug!("extracted {} fields", merged.len());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_rows_override_tables_on_collision() {
        // Same canonical key from the generic-table scan ("A") and the
        // modern-row layout ("B"): the row value must win.
        let doc = Html::parse_document(
            r#"<table><tr><td>Total Cores</td><td>A</td></tr></table>
               <div class="tech-section-row">
                 <div class="tech-label">Total Cores</div>
                 <div class="tech-data">B</div>
               </div>"#,
        );
        let merged = extract_fields(&doc);
        assert_eq!(merged.get("total_cores").map(String::as_str), Some("B"));
    }

    #[test]
    fn tables_override_regex_fallback() {
        let doc = Html::parse_document(
            r#"<p>Total Cores 4</p>
               <table><tr><td>Total Cores</td><td>8</td></tr></table>"#,
        );
        let merged = extract_fields(&doc);
        assert_eq!(merged.get("total_cores").map(String::as_str), Some("8"));
    }

    #[test]
    fn disjoint_strategies_union() {
        let doc = Html::parse_document(
            r#"<p>TDP 35 W</p>
               <div class="tech-section-row">
                 <div class="tech-label">Total Threads</div>
                 <div class="tech-data">12</div>
               </div>"#,
        );
        let merged = extract_fields(&doc);
        assert_eq!(merged.get("tdp").map(String::as_str), Some("35"));
        assert_eq!(merged.get("total_threads").map(String::as_str), Some("12"));
    }

    #[test]
    fn empty_page_is_valid_empty_outcome() {
        let doc = Html::parse_document("<html><body><p>marketing copy</p></body></html>");
        assert!(extract_fields(&doc).is_empty());
    }
}
