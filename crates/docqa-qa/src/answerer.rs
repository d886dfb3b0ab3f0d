//! A generator that answers from the context itself, without a model.

use std::collections::HashSet;

use docqa_core::traits::AnswerGenerator;
use docqa_core::types::ContextDocument;
use docqa_text::tokenize::query_terms;

use crate::keywords::format_sources;

const STOPWORDS: &[&str] = &[
    "about", "does", "from", "have", "how", "that", "the", "there", "these", "this", "what", "when", "where", "which",
    "who", "why", "with", "would", "could", "should", "into", "they", "their", "were", "will",
];

/// Answers with the opening of the best-matching context document, the
/// sources it drew on and a keyword marker built from the question.
#[derive(Debug, Clone)]
pub struct ExtractiveAnswerer {
    excerpt_chars: usize,
    max_keywords: usize,
}

impl Default for ExtractiveAnswerer {
    fn default() -> Self { Self { excerpt_chars: 400, max_keywords: 5 } }
}

impl ExtractiveAnswerer {
    pub fn new(excerpt_chars: usize, max_keywords: usize) -> Self {
        Self { excerpt_chars: excerpt_chars.max(1), max_keywords }
    }

    fn content_words(&self, question: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        query_terms(question)
            .into_iter()
            .filter(|t| t.chars().count() >= 4 && !STOPWORDS.contains(&t.as_str()))
            .filter(|t| seen.insert(t.clone()))
            .take(self.max_keywords)
            .collect()
    }
}

impl AnswerGenerator for ExtractiveAnswerer {
    fn generate(&self, question: &str, context: &[ContextDocument]) -> anyhow::Result<String> {
        let keywords = self.content_words(question);
        let overlap = |doc: &ContextDocument| {
            let lowered = doc.content.to_lowercase();
            keywords.iter().filter(|k| lowered.contains(k.as_str())).count()
        };
        // Highest overlap, earliest document on ties.
        let Some(best) = context.iter().rev().max_by_key(|doc| overlap(doc)) else {
            return Ok("The loaded documents do not contain that information.".to_string());
        };

        let mut answer = excerpt(&best.content, self.excerpt_chars);
        let footer = format_sources(context.iter().map(|d| d.source.as_str()));
        if !footer.is_empty() {
            answer.push_str("\n\n");
            answer.push_str(&footer);
        }
        if !keywords.is_empty() {
            answer.push_str(&format!(" [[{}]]", keywords.join(", ")));
        }
        Ok(answer)
    }
}

/// Leading text cut at a word boundary, `…` appended when shortened.
fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars { return text.to_string(); }
    let head: String = text.chars().take(max_chars).collect();
    let cut = head.rfind(char::is_whitespace).filter(|&i| i > 0).unwrap_or(head.len());
    format!("{}…", head[..cut].trim_end())
}
