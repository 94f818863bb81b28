use std::collections::BTreeMap;

use scraper::{Html, Selector};
use tracing::debug;

use crate::parser::keys::canonical_key;

/// Modern-row strategy: the newer page family renders each spec as a
/// `tech-section-row` div holding a `tech-label` / `tech-data` pair.
pub fn extract(doc: &Html) -> BTreeMap<String, String> {
    let row_sel = Selector::parse("div.tech-section-row").unwrap();
    let label_sel = Selector::parse("div.tech-label").unwrap();
    let data_sel = Selector::parse("div.tech-data").unwrap();

    let mut specs = BTreeMap::new();
    for row in doc.select(&row_sel) {
        let label = row
            .select(&label_sel)
            .next()
            .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string());
        let data = row
            .select(&data_sel)
            .next()
            .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string());

        if let (Some(label), Some(data)) = (label, data) {
            if !label.is_empty() && !data.is_empty() {
                let key = canonical_key(&label);
                if !key.is_empty() {
                    debug!("tech-section-row: {} = {}", key, data);
                    specs.insert(key, data);
                }
            }
        }
    }
    specs
}
