//! Tokenization shared by model fitting, query projection and snippets.

use regex::Regex;
use std::sync::OnceLock;

use docqa_core::normalize::strip_accents;

fn term_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Two or more word characters, hyphens allowed inside.
    RE.get_or_init(|| Regex::new(r"\b\w[\w-]*\w\b").expect("static regex"))
}

fn query_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[\w-]+\b").expect("static regex"))
}

/// Lowercased, accent-stripped word tokens of `text`.
pub fn words(text: &str) -> Vec<String> {
    let folded = strip_accents(&text.to_lowercase());
    term_pattern().find_iter(&folded).map(|m| m.as_str().to_string()).collect()
}

/// Word n-grams for n in `1..=ngram_max`, joined by single spaces.
pub fn ngrams(words: &[String], ngram_max: usize) -> Vec<String> {
    let mut terms = words.to_vec();
    for n in 2..=ngram_max {
        if words.len() < n { break; }
        terms.extend(words.windows(n).map(|w| w.join(" ")));
    }
    terms
}

/// Terms of `text` as the vocabulary sees them.
pub fn analyze(text: &str, ngram_max: usize) -> Vec<String> {
    ngrams(&words(text), ngram_max)
}

/// Query tokens used for snippet selection.
pub fn query_terms(query: &str) -> Vec<String> {
    let lowered = query.trim().to_lowercase();
    query_pattern().find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_drop_single_chars_and_accents() {
        assert_eq!(words("A Canción de año-nuevo, x y"), vec!["cancion", "de", "ano-nuevo"]);
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let terms = analyze("red apple pie", 2);
        assert_eq!(terms, vec!["red", "apple", "pie", "red apple", "apple pie"]);
    }

    #[test]
    fn query_terms_keep_short_tokens() {
        assert_eq!(query_terms("  What is A-1 revenue? "), vec!["what", "is", "a-1", "revenue"]);
        assert!(query_terms(" ?! ").is_empty());
    }
}
