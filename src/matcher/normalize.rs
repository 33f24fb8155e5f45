//! Title normalization shared by matching and ranking.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static BRACKETED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[.*?\]").unwrap_or_else(|e| panic!("invalid static regex for brackets: {e}"))
});
static PARENTHESIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(.*?\)").unwrap_or_else(|e| panic!("invalid static regex for parentheses: {e}"))
});

/// Normalizes a title for comparison.
///
/// Strips diacritics, removes `[...]` and `(...)` spans, trims and lowercases.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let plain = strip_diacritics(title);
    let without_brackets = BRACKETED_RE.replace_all(&plain, "");
    let without_parens = PARENTHESIZED_RE.replace_all(&without_brackets, "");
    without_parens.trim().to_lowercase()
}

/// Removes combining marks after canonical decomposition and folds the Latin
/// letters that have no decomposition (`ø`, `ł`, `æ`, `ß`, ...).
#[must_use]
pub fn strip_diacritics(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.nfd().filter(|c| !is_combining_mark(*c)) {
        match ch {
            'Ø' => out.push('O'),
            'ø' => out.push('o'),
            'Ł' => out.push('L'),
            'ł' => out.push('l'),
            'Đ' | 'Ð' => out.push('D'),
            'đ' | 'ð' => out.push('d'),
            'Æ' => out.push_str("Ae"),
            'æ' => out.push_str("ae"),
            'Œ' => out.push_str("Oe"),
            'œ' => out.push_str("oe"),
            'Þ' => out.push_str("Th"),
            'þ' => out.push_str("th"),
            'ß' => out.push_str("ss"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_strips_diacritics_and_case() {
        assert_eq!(normalize_title("Les Misérables"), "les miserables");
        assert_eq!(normalize_title("Ærø Ødegård"), "aero odegard");
    }

    #[test]
    fn test_normalize_title_removes_bracketed_and_parenthesized_spans() {
        assert_eq!(
            normalize_title("  Dune (Dune Chronicles, Book 1) [Deluxe Edition] "),
            "dune"
        );
        assert_eq!(normalize_title("A (b) C (d)"), "a  c");
    }

    #[test]
    fn test_normalize_title_unbalanced_brackets_are_kept() {
        assert_eq!(normalize_title("Title (unclosed"), "title (unclosed");
    }
}
