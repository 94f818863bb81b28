pub mod categorize;
pub mod extract;
pub mod keys;
pub mod resolve;
pub mod text;

use chrono::{DateTime, Utc};
use scraper::Html;

use crate::record::{CategorizedSpecs, SpecRecord};
use text::normalize_text;

/// Parse one product page into an assembled record.
///
/// All extraction strategies run unconditionally and their outputs merge with
/// fixed precedence inside [`extract::extract_fields`]. The lithography value
/// is validated against the known process-node shapes; a value that fails is
/// replaced by a document-wide fallback scan or dropped entirely rather than
/// stored dirty.
pub fn parse_page(html: &str, url: &str, scraped_at: DateTime<Utc>) -> SpecRecord {
    let doc = Html::parse_document(html);

    let name = extract::name::extract(&doc, url);
    let mut fields = extract::extract_fields(&doc);

    if let Some(raw) = fields.get("lithography").cloned() {
        match resolve::resolve_lithography(&raw).or_else(|| resolve::lithography_fallback(&doc)) {
            Some(value) => {
                fields.insert("lithography".to_string(), value);
            }
            None => {
                fields.remove("lithography");
            }
        }
    }

    for value in fields.values_mut() {
        *value = normalize_text(value);
    }
    fields.retain(|_, value| !value.is_empty());

    let specs = CategorizedSpecs::from_fields(fields);

    SpecRecord::assemble(
        url,
        name,
        specs,
        extract::meta::price(&doc),
        extract::meta::availability(&doc),
        extract::meta::description(&doc),
        scraped_at,
    )
}
