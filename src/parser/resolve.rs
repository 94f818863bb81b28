use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};

use super::text::normalize_text;

static LEADING_PREP_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^(?:using|with|on|at|by)\s+")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static TRAILING_QUALIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\s+(?:process|technology|node|class|generation|finfet|gaafet)$")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static BRACKETS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[()\[\]]").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CODE_NAME_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^products\s+formerly\s+")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").unwrap());

/// Product-line terms that look like a process node to the loose label regex
/// but name an ISA or platform feature instead.
const NON_PROCESS_TERMS: &[&str] = &[
    "intel 64", "intel 32", "intel x86", "intel x64",
    "intel sse", "intel avx", "intel ht", "intel vt",
];

/// Shapes a real process-node value can take across page generations.
static NODE_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d+\s*nm",
        r"intel\s+(?:[3-9]|1[0-9])\b",
        r"n\d+[a-z]?\b",
        r"\d+\s*nanometer",
        r"\d+\s*nm\s*\+",
        r"intel\s+(?:[3-9]|1[0-9])\s*\+",
        r"\d+\s*nm\s+(?:finfet|gaafet)",
        r"tsmc\s+n\d+",
        r"samsung\s+\d+\s*nm",
        r"globalfoundries\s+\d+\s*nm",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
    .collect()
});

/// Clean a raw value paired with a lithography label and validate it against
/// the known process-node shapes. Known non-process terms and anything outside
/// the whitelist are discarded as false positives.
pub fn resolve_lithography(raw: &str) -> Option<String> {
    let raw = normalize_text(raw);
    if raw.len() < 2 {
        return None;
    }

    let value = LEADING_PREP_RE.replace(&raw, "");
    let value = TRAILING_QUALIFIER_RE.replace(&value, "");
    let value = BRACKETS_RE.replace_all(&value, "");
    let value = SPACES_RE.replace_all(&value, " ").trim().to_string();

    let lower = value.to_lowercase();
    if NON_PROCESS_TERMS.iter().any(|t| lower == *t) {
        return None;
    }

    if NODE_SHAPES.iter().any(|re| re.is_match(&value)) {
        Some(value)
    } else {
        None
    }
}

/// When the label-paired value failed validation, scan tables and definition
/// lists for any row whose label mentions the process node and revalidate.
pub fn lithography_fallback(doc: &Html) -> Option<String> {
    const PROCESS_KEYWORDS: &[&str] = &[
        "lithography", "process", "technology", "node", "fabrication", "manufacturing",
    ];

    let tr = Selector::parse("table tr").unwrap();
    let cell = Selector::parse("td, th").unwrap();
    for row in doc.select(&tr) {
        let cells: Vec<String> = row
            .select(&cell)
            .map(|c| c.text().collect::<Vec<_>>().join(" "))
            .collect();
        if cells.len() >= 2 {
            let key = cells[0].trim().to_lowercase();
            if PROCESS_KEYWORDS.iter().any(|kw| key.contains(kw)) {
                if let Some(cleaned) = resolve_lithography(cells[1].trim()) {
                    return Some(cleaned);
                }
            }
        }
    }

    let dl = Selector::parse("dl").unwrap();
    let dt = Selector::parse("dt").unwrap();
    let dd = Selector::parse("dd").unwrap();
    for list in doc.select(&dl) {
        let terms: Vec<_> = list.select(&dt).collect();
        let defs: Vec<_> = list.select(&dd).collect();
        for (term, def) in terms.iter().zip(defs.iter()) {
            let key = term.text().collect::<Vec<_>>().join(" ").trim().to_lowercase();
            if PROCESS_KEYWORDS.iter().any(|kw| key.contains(kw)) {
                let value = def.text().collect::<Vec<_>>().join(" ");
                if let Some(cleaned) = resolve_lithography(value.trim()) {
                    return Some(cleaned);
                }
            }
        }
    }

    None
}

/// Strip the localized "Products formerly" prefix and a trailing colon from a
/// raw code name. Empty or colon-only results normalize to absent.
pub fn clean_code_name(raw: &str) -> Option<String> {
    let cleaned = CODE_NAME_PREFIX_RE.replace(raw, "");
    let cleaned = cleaned.trim().trim_end_matches(':').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Pull the first embedded integer out of a raw value ("24 MB" -> 24).
/// Unparsable values are absent, never an error.
pub fn coerce_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    INT_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<i64>().ok())
}

/// Pull the first embedded decimal out of a raw value ("5.1 GHz" -> 5.1).
pub fn coerce_float(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    FLOAT_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_nanometer_node_accepted() {
        assert_eq!(resolve_lithography("10 nm").as_deref(), Some("10 nm"));
        assert_eq!(resolve_lithography("14nm+").as_deref(), Some("14nm+"));
        assert_eq!(resolve_lithography("Intel 7").as_deref(), Some("Intel 7"));
        assert_eq!(resolve_lithography("TSMC N3B").as_deref(), Some("TSMC N3B"));
    }

    #[test]
    fn qualifiers_stripped() {
        assert_eq!(
            resolve_lithography("using 10 nm process").as_deref(),
            Some("10 nm")
        );
        assert_eq!(
            resolve_lithography("7 nm FinFET").as_deref(),
            Some("7 nm")
        );
    }

    #[test]
    fn instruction_set_rejected() {
        assert_eq!(resolve_lithography("Intel 64"), None);
        assert_eq!(resolve_lithography("Intel AVX"), None);
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(resolve_lithography("Yes"), None);
        assert_eq!(resolve_lithography(""), None);
        assert_eq!(resolve_lithography("x"), None);
    }

    #[test]
    fn fallback_scans_tables() {
        let doc = Html::parse_document(
            "<table><tr><td>Process node</td><td>Intel 4</td></tr></table>",
        );
        assert_eq!(lithography_fallback(&doc).as_deref(), Some("Intel 4"));
    }

    #[test]
    fn fallback_scans_definition_lists() {
        let doc = Html::parse_document(
            "<dl><dt>Manufacturing</dt><dd>7 nm</dd></dl>",
        );
        assert_eq!(lithography_fallback(&doc).as_deref(), Some("7 nm"));
    }

    #[test]
    fn fallback_rejects_non_process_rows() {
        let doc = Html::parse_document(
            "<table><tr><td>Instruction Set Technology</td><td>Intel 64</td></tr></table>",
        );
        assert_eq!(lithography_fallback(&doc), None);
    }

    #[test]
    fn code_name_prefix_and_colon() {
        assert_eq!(
            clean_code_name("Products formerly Lunar Lake:").as_deref(),
            Some("Lunar Lake")
        );
        assert_eq!(
            clean_code_name("products FORMERLY Meteor Lake").as_deref(),
            Some("Meteor Lake")
        );
        assert_eq!(clean_code_name(":"), None);
        assert_eq!(clean_code_name(""), None);
        assert_eq!(clean_code_name("Raptor Lake").as_deref(), Some("Raptor Lake"));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(coerce_int(Some("24 MB")), Some(24));
        assert_eq!(coerce_int(Some("1,024")), Some(1));
        assert_eq!(coerce_int(Some("n/a")), None);
        assert_eq!(coerce_int(None), None);
        assert_eq!(coerce_float(Some("5.1 GHz")), Some(5.1));
        assert_eq!(coerce_float(Some("15")), Some(15.0));
        assert_eq!(coerce_float(Some("-")), None);
    }
}
