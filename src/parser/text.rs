use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-\.,;:()&+/]").unwrap());

/// Normalize typographic Unicode variants down to plain text.
///
/// Spec pages mix non-breaking spaces, curly quotes and trademark glyphs
/// across page generations; every string that reaches the categorized spec
/// structure goes through here first. Idempotent.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            // Trademark/registered/service marks carry no spec information
            '\u{2122}' | '\u{00ae}' | '\u{2120}' | '\u{00a9}' => {}
            // Footnote daggers left behind by stripped superscripts
            '\u{2020}' | '\u{2021}' => {}
            // Space variants
            '\u{00a0}' | '\u{2007}' | '\u{2009}' | '\u{202f}' | '\u{3000}' => out.push(' '),
            '\u{200b}' | '\u{feff}' => {}
            // Quote and dash variants
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
    }
    WHITESPACE_RE.replace_all(&out, " ").trim().to_string()
}

/// Generic cleanup for free text pulled out of HTML: collapse whitespace and
/// drop characters outside a conservative whitelist.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    PUNCT_RE.replace_all(&collapsed, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trademark_glyphs() {
        assert_eq!(
            normalize_text("Intel\u{00ae} Core\u{2122} Ultra 9"),
            "Intel Core Ultra 9"
        );
    }

    #[test]
    fn non_breaking_spaces_collapse() {
        assert_eq!(normalize_text("10\u{00a0}\u{00a0}nm"), "10 nm");
    }

    #[test]
    fn curly_quotes_and_dashes() {
        assert_eq!(normalize_text("Q2\u{2019}24 \u{2013} Q3"), "Q2'24 - Q3");
    }

    #[test]
    fn idempotent() {
        let raw = "  Intel\u{00ae}\u{00a0}Core\u{2122}  i7\u{2013}1234U ";
        let once = normalize_text(raw);
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn clean_text_whitelist() {
        assert_eq!(clean_text("Up to  5.10 GHz\u{2020}?"), "Up to 5.10 GHz");
        assert_eq!(clean_text(""), "");
    }
}
