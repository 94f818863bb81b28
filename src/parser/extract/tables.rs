use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::parser::keys::canonical_key;

/// Generic-table strategy: every table on the page, rows with at least two
/// cells where the first two differ become key/value pairs. Definition lists
/// are read the same way. Works on any markup generation, at the cost of
/// picking up the occasional non-spec row.
pub fn extract(doc: &Html) -> BTreeMap<String, String> {
    let table_sel = Selector::parse("table").unwrap();
    let mut specs = BTreeMap::new();

    for table in doc.select(&table_sel) {
        for (key, value) in table_pairs(table) {
            specs.insert(key, value);
        }
    }

    let dl_sel = Selector::parse("dl").unwrap();
    for dl in doc.select(&dl_sel) {
        for (key, value) in definition_pairs(dl) {
            specs.insert(key, value);
        }
    }

    specs
}

/// Key/value rows of a single table. Header rows (identical first cells) are
/// skipped.
pub fn table_pairs(table: ElementRef) -> Vec<(String, String)> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td, th").unwrap();

    let mut pairs = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|c| c.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .collect();
        if cells.len() >= 2 && !cells[0].is_empty() && !cells[1].is_empty() && cells[0] != cells[1]
        {
            let key = canonical_key(&cells[0]);
            if !key.is_empty() {
                pairs.push((key, cells[1].clone()));
            }
        }
    }
    pairs
}

/// dt/dd pairs of a single definition list, matched positionally.
pub fn definition_pairs(dl: ElementRef) -> Vec<(String, String)> {
    let dt_sel = Selector::parse("dt").unwrap();
    let dd_sel = Selector::parse("dd").unwrap();

    let terms: Vec<String> = dl
        .select(&dt_sel)
        .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .collect();
    let defs: Vec<String> = dl
        .select(&dd_sel)
        .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .collect();

    terms
        .into_iter()
        .zip(defs)
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .filter_map(|(k, v)| {
            let key = canonical_key(&k);
            (!key.is_empty()).then_some((key, v))
        })
        .collect()
}
