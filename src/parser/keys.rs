use std::sync::LazyLock;

use regex::Regex;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-]").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const PREFIXES: &[&str] = &["intel_", "processor_", "cpu_"];
const SUFFIXES: &[&str] = &["_support", "_technology"];

/// Canonicalize a raw label ("# of Performance-Cores ‡") into a stable
/// snake_case field identifier ("performance_cores").
///
/// Deterministic and idempotent; empty input yields an empty string.
pub fn canonical_key(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let stripped = NON_WORD_RE.replace_all(raw, "");
    let collapsed = SPACE_RE.replace_all(&stripped, " ");
    let mut key = collapsed
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('-', "_");

    // Strip to a fixpoint so the result itself is canonical
    loop {
        let before = key.len();
        for prefix in PREFIXES {
            if let Some(rest) = key.strip_prefix(prefix) {
                key = rest.to_string();
            }
        }
        for suffix in SUFFIXES {
            if let Some(rest) = key.strip_suffix(suffix) {
                key = rest.to_string();
            }
        }
        if key.len() == before {
            break;
        }
    }

    key
}
