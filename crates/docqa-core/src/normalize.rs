//! Text cleanup applied to raw document content before chunking.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+@\S+|http\S+|www\.\S+").expect("static regex"))
}

fn disallowed_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `\w` is Unicode-aware, so accented and other locale letters survive.
    RE.get_or_init(|| Regex::new(r"[^\w\s.,;:!?¿¡-]").expect("static regex"))
}

/// Clean raw text for indexing and display.
///
/// Removes URLs and email addresses, folds compatibility forms (ligatures,
/// full-width letters) to their base characters, replaces anything that is
/// not a word character, whitespace or basic punctuation with a space, and
/// collapses whitespace runs. Never fails; empty input yields empty output.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let folded: String = text.nfkc().collect();
    let without_links = link_pattern().replace_all(&folded, "");
    let filtered = disallowed_pattern().replace_all(&without_links, " ");
    collapse_whitespace(&filtered)
}

/// Clean and lowercase, the form chunks are built from.
pub fn normalize_for_index(text: &str) -> String {
    clean_text(text).to_lowercase()
}

/// Decompose and drop combining marks: "canción" -> "cancion".
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_urls_and_emails() {
        let out = clean_text("Write to ana@example.com or see https://example.com/x and www.foo.org today");
        assert_eq!(out, "Write to or see and today");
    }

    #[test]
    fn keeps_locale_letters_and_basic_punctuation() {
        assert_eq!(clean_text("¿Qué año? ¡Niño, señor!"), "¿Qué año? ¡Niño, señor!");
    }

    #[test]
    fn replaces_symbols_and_collapses_whitespace() {
        assert_eq!(clean_text("  a*b   (c)\n\n d#  "), "a b c d");
    }

    #[test]
    fn folds_compatibility_forms() {
        assert_eq!(clean_text("ﬁle ＡＢＣ"), "file ABC");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \t "), "");
    }

    #[test]
    fn strips_accents() {
        assert_eq!(strip_accents("canción año"), "cancion ano");
    }
}
