//! Sentence-grouped chunking of normalized text.

use crate::config::ChunkingSettings;

#[derive(Debug, Clone)]
pub struct Chunker {
    sentences_per_chunk: usize,
    min_chunk_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self { Self::from(&ChunkingSettings::default()) }
}

impl From<&ChunkingSettings> for Chunker {
    fn from(s: &ChunkingSettings) -> Self { Self::new(s.sentences_per_chunk, s.min_chunk_chars) }
}

impl Chunker {
    pub fn new(sentences_per_chunk: usize, min_chunk_chars: usize) -> Self {
        Self { sentences_per_chunk: sentences_per_chunk.max(1), min_chunk_chars }
    }

    /// Split `text` into chunks of `sentences_per_chunk` sentences.
    ///
    /// Chunks shorter than `min_chunk_chars` characters are dropped. If none
    /// survive and the text is not blank, the whole trimmed text is the only
    /// chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = split_sentences(text);
        let chunks: Vec<String> = sentences
            .chunks(self.sentences_per_chunk)
            .map(|group| group.join(" "))
            .filter(|chunk| chunk.chars().count() >= self.min_chunk_chars)
            .collect();
        if chunks.is_empty() {
            let trimmed = text.trim();
            if trimmed.is_empty() { return Vec::new(); }
            return vec![trimmed.to_string()];
        }
        chunks
    }
}

/// Split after `.`, `!` or `?` when followed by whitespace. Empty sentences are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') { continue; }
        let Some(&(next_i, next_c)) = chars.peek() else { break };
        if next_c.is_whitespace() {
            push_trimmed(&mut sentences, &text[start..next_i]);
            start = next_i;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() { out.push(s); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn groups_two_sentences_per_chunk() {
        let text = "the first sentence is here. the second one follows! is this the third? yes and the fourth.";
        let chunks = Chunker::default().chunk(text);
        assert_eq!(chunks, vec![
            "the first sentence is here. the second one follows!".to_string(),
            "is this the third? yes and the fourth.".to_string(),
        ]);
    }

    #[test]
    fn remainder_forms_final_chunk() {
        let text = "alpha sentence number one. beta sentence number two. gamma sentence number three.";
        let chunks = Chunker::default().chunk(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], "gamma sentence number three.");
    }

    #[test]
    fn drops_short_chunks() {
        let text = "ok. fine. this chunk is certainly long enough. and so is this one here.";
        let chunks = Chunker::default().chunk(text);
        assert_eq!(chunks, vec!["this chunk is certainly long enough. and so is this one here.".to_string()]);
    }

    #[test]
    fn falls_back_to_whole_text() {
        assert_eq!(Chunker::default().chunk("  tiny.  "), vec!["tiny.".to_string()]);
        assert!(Chunker::default().chunk("   ").is_empty());
    }

    #[test]
    fn terminator_without_whitespace_does_not_split() {
        assert_eq!(split_sentences("version 1.2 is out. done"), vec!["version 1.2 is out.", "done"]);
    }

    proptest! {
        #[test]
        fn chunks_meet_minimum_or_are_the_fallback(text in "[a-z .!?]{0,200}") {
            let chunks = Chunker::default().chunk(&text);
            let fallback = chunks.len() == 1 && chunks[0] == text.trim();
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() >= 20 || fallback);
            }
        }
    }
}
