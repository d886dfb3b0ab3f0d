//! Display snippets: the most query-dense window of a fragment.

use std::collections::BTreeSet;

use docqa_core::normalize::strip_accents;

pub const ELLIPSIS: char = '…';

/// Pick the `max_length`-character window of `text` containing the most
/// distinct `terms` (substring match ignoring case and accents).
///
/// Windows start every `max_length / 2` characters; the window flush with
/// the end of the text is always considered last. The first best window
/// wins ties. Text no longer than `max_length` is returned unchanged.
pub fn best_window(text: &str, terms: &[String], max_length: usize) -> String {
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let n_chars = bounds.len() - 1;
    if max_length == 0 || n_chars <= max_length {
        return text.to_string();
    }

    let terms: BTreeSet<String> = terms.iter().map(|t| strip_accents(&t.to_lowercase())).filter(|t| !t.is_empty()).collect();
    let step = (max_length / 2).max(1);
    let last_start = n_chars - max_length;
    let mut starts: Vec<usize> = (0..last_start).step_by(step).collect();
    starts.push(last_start);

    let mut best_start = 0;
    let mut best_score = None;
    for start in starts {
        let window = strip_accents(&text[bounds[start]..bounds[start + max_length]].to_lowercase());
        let score = terms.iter().filter(|t| window.contains(t.as_str())).count();
        if best_score.map_or(true, |best| score > best) {
            best_score = Some(score);
            best_start = start;
        }
    }

    let end = best_start + max_length;
    let mut out = String::with_capacity(bounds[end] - bounds[best_start] + 8);
    if best_start > 0 { out.push(ELLIPSIS); }
    out.push_str(&text[bounds[best_start]..bounds[end]]);
    if end < n_chars { out.push(ELLIPSIS); }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ts: &[&str]) -> Vec<String> { ts.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(best_window("short text", &terms(&["text"]), 300), "short text");
    }

    #[test]
    fn finds_term_near_the_end() {
        let mut text = "x".repeat(890);
        text.push_str(" apple ");
        text.push_str(&"y".repeat(1000 - text.len()));
        assert_eq!(text.chars().count(), 1000);

        let snippet = best_window(&text, &terms(&["apple"]), 300);
        assert!(snippet.starts_with(ELLIPSIS));
        assert!(snippet.contains("apple"));
        assert!(snippet.chars().count() <= 302);
    }

    #[test]
    fn first_window_wins_ties() {
        let text = "z".repeat(700);
        let snippet = best_window(&text, &terms(&["missing"]), 300);
        assert!(!snippet.starts_with(ELLIPSIS));
        assert!(snippet.ends_with(ELLIPSIS));
        assert_eq!(snippet.chars().count(), 301);
    }

    #[test]
    fn counts_distinct_terms() {
        let mut text = "apple apple apple ".repeat(10);
        text.push_str(&"-".repeat(300));
        text.push_str(" apple pear ");
        text.push_str(&"-".repeat(200));
        let snippet = best_window(&text, &terms(&["apple", "apple", "pear"]), 100);
        assert!(snippet.contains("pear"));
    }

    #[test]
    fn matching_ignores_accents_both_ways() {
        let text = "x".repeat(400) + " la canción del verano " + &"y".repeat(400);
        let plain = best_window(&text, &terms(&["cancion"]), 100);
        assert!(plain.contains("canción"));
        let text = "x".repeat(400) + " la cancion del verano " + &"y".repeat(400);
        let accented = best_window(&text, &terms(&["Canción"]), 100);
        assert!(accented.contains("cancion"));
    }

    #[test]
    fn windows_respect_multibyte_chars() {
        let text = "ñ".repeat(50) + "objetivo" + &"é".repeat(50);
        let snippet = best_window(&text, &terms(&["OBJETIVO"]), 20);
        assert!(snippet.contains("objetivo"));
    }
}
