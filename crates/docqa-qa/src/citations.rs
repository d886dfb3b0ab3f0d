//! Citation building: one keyword-highlighted excerpt per source.
//!
//! For each kept source the excerpt is the densest run of the most frequent
//! keywords: matches of the top keywords are merged left to right into
//! windows no wider than `window_cap` characters, the window holding the
//! most matches wins, and it is padded and widened to whole words. Without
//! usable keywords the excerpt is the opening `fallback_chars` characters.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use tracing::warn;

use docqa_core::config::CitationSettings;
use docqa_core::types::Citation;

/// A text to cite and the source it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CitationCandidate<'a> {
    pub text: &'a str,
    pub source: &'a str,
    pub score: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct CitationBuilder {
    settings: CitationSettings,
}

impl Default for CitationBuilder {
    fn default() -> Self { Self::new(CitationSettings::default()) }
}

impl CitationBuilder {
    pub fn new(settings: CitationSettings) -> Self { Self { settings } }

    /// At most `max_citations` citations, first candidate per source wins.
    pub fn build(&self, candidates: &[CitationCandidate<'_>], keywords: &[String]) -> Vec<Citation> {
        let keywords = clean_keywords(keywords);
        let mut seen = HashSet::new();
        let mut citations = Vec::new();
        for candidate in candidates {
            if citations.len() >= self.settings.max_citations { break; }
            if !seen.insert(candidate.source) { continue; }
            citations.push(Citation {
                source: candidate.source.to_string(),
                content: self.excerpt(candidate.text, &keywords),
                score: candidate.score,
                page: None,
            });
        }
        citations
    }

    /// The highlighted keyword window of `text`, or its opening characters.
    pub fn excerpt(&self, text: &str, keywords: &[String]) -> String {
        match self.keyword_window(text, keywords) {
            Ok(Some(window)) => window,
            Ok(None) => self.fallback(text),
            Err(e) => {
                warn!(error = %e, "keyword pattern failed, using leading text");
                self.fallback(text)
            }
        }
    }

    fn fallback(&self, text: &str) -> String {
        text.chars().take(self.settings.fallback_chars).collect()
    }

    fn keyword_window(&self, text: &str, keywords: &[String]) -> Result<Option<String>, regex::Error> {
        if text.is_empty() || keywords.is_empty() { return Ok(None); }

        let mut counted = Vec::new();
        for keyword in keywords {
            let spans: Vec<(usize, usize)> = keyword_regex(keyword)?.find_iter(text).map(|m| (m.start(), m.end())).collect();
            if !spans.is_empty() { counted.push(spans); }
        }
        if counted.is_empty() { return Ok(None); }
        counted.sort_by(|a, b| b.len().cmp(&a.len()));
        let mut spans: Vec<(usize, usize)> = counted.into_iter().take(self.settings.top_keywords).flatten().collect();
        spans.sort_unstable();

        let chars = CharIndex::new(text);
        let (start, end) = densest_window(&spans, &chars, self.settings.window_cap);
        let (start, end) = chars.widen_to_words(text, chars.char_at(start), chars.char_at(end), self.settings.padding);
        let excerpt = text[chars.byte_at(start)..chars.byte_at(end)].trim();
        Ok(Some(self.highlight(excerpt, keywords)?))
    }

    fn highlight(&self, excerpt: &str, keywords: &[String]) -> Result<String, regex::Error> {
        let mut sorted: Vec<&String> = keywords.iter().collect();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()));
        let alternation = sorted.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
        let re = RegexBuilder::new(&alternation).case_insensitive(true).build()?;
        let (open, close) = (&self.settings.highlight_open, &self.settings.highlight_close);
        Ok(re.replace_all(excerpt, |caps: &regex::Captures<'_>| format!("{}{}{}", open, &caps[0], close)).into_owned())
    }
}

fn keyword_regex(keyword: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(keyword)).case_insensitive(true).build()
}

/// Trimmed, non-empty keywords, case-insensitive duplicates removed.
fn clean_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Merge sorted match spans into windows at most `cap` characters wide and
/// return the byte range of the window with the most matches (first wins).
fn densest_window(spans: &[(usize, usize)], chars: &CharIndex, cap: usize) -> (usize, usize) {
    let mut best = (spans[0], 0usize);
    let mut current = (spans[0], 0usize);
    for &(s, e) in spans {
        let (ws, we) = current.0;
        let width = chars.char_at(e.max(we)) - chars.char_at(ws);
        if current.1 == 0 || width <= cap {
            current = ((ws, we.max(e)), current.1 + 1);
        } else {
            current = ((s, e), 1);
        }
        if current.1 > best.1 { best = current; }
    }
    best.0
}

/// Byte offsets of every char boundary, for char-based arithmetic on UTF-8.
struct CharIndex {
    bounds: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        Self { bounds: text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect() }
    }

    fn len(&self) -> usize { self.bounds.len() - 1 }

    fn char_at(&self, byte: usize) -> usize {
        self.bounds.binary_search(&byte).unwrap_or_else(|i| i)
    }

    fn byte_at(&self, ch: usize) -> usize { self.bounds[ch.min(self.len())] }

    /// Pad `[start, end)` by `padding` chars and grow it to whitespace boundaries.
    fn widen_to_words(&self, text: &str, start: usize, end: usize, padding: usize) -> (usize, usize) {
        let is_space_at = |ch: usize| text[self.bounds[ch]..].chars().next().is_some_and(char::is_whitespace);
        let mut start = start.saturating_sub(padding);
        let mut end = (end + padding).min(self.len());
        while start > 0 && !is_space_at(start - 1) { start -= 1; }
        while end < self.len() && !is_space_at(end) { end += 1; }
        (start, end)
    }
}
