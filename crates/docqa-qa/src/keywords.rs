//! The `[[kw1, kw2]]` keyword marker an answer generator may embed.

use regex::Regex;
use std::sync::OnceLock;

fn first_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[(.*?)\]\]").expect("static regex"))
}

fn marker_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\[\[.*?\]\]\s*").expect("static regex"))
}

/// Keywords listed in the first marker, trimmed, empties dropped.
pub fn extract_keywords(answer: &str) -> Vec<String> {
    first_marker()
        .captures(answer)
        .and_then(|caps| caps.get(1))
        .map(|inner| {
            inner.as_str().split(',').map(str::trim).filter(|k| !k.is_empty()).map(str::to_string).collect()
        })
        .unwrap_or_default()
}

/// The answer with every marker removed; the raw answer if nothing would remain.
pub fn clean_response(answer: &str) -> String {
    let cleaned = marker_segment().replace_all(answer, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() { answer.to_string() } else { cleaned.to_string() }
}

/// A "Sources:" footer listing each source name once, in order.
pub fn format_sources<'a, I>(sources: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = Vec::new();
    for source in sources {
        if !source.is_empty() && !seen.contains(&source) { seen.push(source); }
    }
    if seen.is_empty() { return String::new(); }
    let mut out = String::from("Sources:");
    for (i, source) in seen.iter().enumerate() {
        out.push_str(&format!("\n[{}] {}", i + 1, source));
    }
    out
}
