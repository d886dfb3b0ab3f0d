//! docqa-qa
//!
//! Question answering over indexed fragments: builds per-source context,
//! delegates wording to an `AnswerGenerator`, then attaches highlighted
//! citations for the keywords the generator marked.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod answerer;
pub mod citations;
pub mod keywords;

use chrono::Utc;
use tracing::{debug, info, warn};

use docqa_core::config::Settings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{AnswerGenerator, FragmentSource};
use docqa_core::types::{ContextDocument, Fragment, QaResponse};

pub use answerer::ExtractiveAnswerer;
pub use citations::{CitationBuilder, CitationCandidate};
pub use keywords::{clean_response, extract_keywords, format_sources};

pub const EMPTY_QUESTION: &str = "The question cannot be empty.";
pub const NO_DOCUMENTS: &str = "No documents are loaded.";
pub const GENERATION_FAILED: &str = "Could not process the question right now. Please try another question.";

pub struct QaEngine<S> where S: FragmentSource {
    source: S,
    generator: Box<dyn AnswerGenerator>,
    citations: CitationBuilder,
    context_limit: Option<usize>,
}

impl<S> QaEngine<S> where S: FragmentSource {
    pub fn new(source: S, generator: Box<dyn AnswerGenerator>) -> Self {
        Self { source, generator, citations: CitationBuilder::default(), context_limit: None }
    }

    pub fn with_settings(source: S, generator: Box<dyn AnswerGenerator>, settings: &Settings) -> Self {
        Self {
            source,
            generator,
            citations: CitationBuilder::new(settings.citations.clone()),
            context_limit: settings.qa.context_limit,
        }
    }

    /// Use only the `limit` best-ranked fragments as context instead of the whole corpus.
    pub fn with_context_limit(mut self, limit: Option<usize>) -> Self {
        self.context_limit = limit;
        self
    }

    /// Always yields a response; failures become a user-facing message.
    pub fn answer(&self, question: &str) -> QaResponse {
        match self.try_answer(question) {
            Ok(response) => response,
            Err(Error::InvalidRequest(_)) => QaResponse::without_context(question, EMPTY_QUESTION),
            Err(Error::NoDocuments) => QaResponse::without_context(question, NO_DOCUMENTS),
            Err(e) => {
                warn!(error = %e, "question answering failed");
                QaResponse::without_context(question, GENERATION_FAILED)
            }
        }
    }

    pub fn try_answer(&self, question: &str) -> Result<QaResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question is empty".into()));
        }

        let selected = self.select_fragments(question)?;
        let documents = group_by_document(&selected);
        info!(sources = documents.len(), fragments = selected.len(), "answering question");

        let raw = self
            .generator
            .generate(question, &documents)
            .map_err(|e| Error::Operation(format!("answer generation: {e:#}")))?;

        // Citations are cut from single fragments; the first one per source wins.
        let keywords = extract_keywords(&raw);
        let candidates: Vec<CitationCandidate<'_>> = selected
            .iter()
            .map(|(f, score)| CitationCandidate { text: &f.text, source: &f.document_name, score: Some(*score) })
            .collect();
        let citations = self.citations.build(&candidates, &keywords);

        Ok(QaResponse {
            answer: clean_response(&raw),
            citations,
            has_enough_context: true,
            question: question.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Fragments handed to the generator with their citation scores.
    ///
    /// The whole corpus scores 1.0. With a context limit the best-ranked
    /// fragments are used instead; when none of them matches the question
    /// the whole corpus is used.
    fn select_fragments(&self, question: &str) -> Result<Vec<(Fragment, f32)>> {
        let all = self.source.fragments();
        if all.is_empty() {
            return Err(Error::NoDocuments);
        }
        if let Some(limit) = self.context_limit {
            let ranked = self.source.ranked(question, limit);
            if !ranked.is_empty() {
                return Ok(ranked.into_iter().map(|s| (s.fragment, s.score)).collect());
            }
            debug!(limit, "no ranked fragment matches, using the whole corpus");
        }
        Ok(all.into_iter().map(|f| (f, 1.0)).collect())
    }
}

/// One context document per source in first-appearance order, fragment
/// texts joined in the order given.
fn group_by_document(fragments: &[(Fragment, f32)]) -> Vec<ContextDocument> {
    let mut grouped: Vec<ContextDocument> = Vec::new();
    for (fragment, _) in fragments {
        match grouped.iter_mut().find(|c| c.document_id == fragment.document_id) {
            Some(entry) => {
                entry.content.push(' ');
                entry.content.push_str(&fragment.text);
            }
            None => grouped.push(ContextDocument {
                document_id: fragment.document_id.clone(),
                source: fragment.document_name.clone(),
                content: fragment.text.clone(),
            }),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::ScoredFragment;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed(Vec<Fragment>);

    impl FragmentSource for Fixed {
        fn fragments(&self) -> Vec<Fragment> { self.0.clone() }
        fn ranked(&self, _query: &str, limit: usize) -> Vec<ScoredFragment> {
            self.0.iter().rev().take(limit).enumerate()
                .map(|(i, f)| ScoredFragment { fragment: f.clone(), score: 0.9 - i as f32 * 0.1 })
                .collect()
        }
    }

    struct Counting { calls: Arc<AtomicUsize>, reply: std::result::Result<String, String> }

    impl AnswerGenerator for Counting {
        fn generate(&self, _q: &str, _c: &[ContextDocument]) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(anyhow::Error::msg)
        }
    }

    fn frag(doc: &str, idx: usize, text: &str) -> Fragment {
        Fragment { document_id: doc.into(), document_name: format!("{doc}.txt"), chunk_index: idx, text: text.into() }
    }

    fn engine(frags: Vec<Fragment>, reply: std::result::Result<&str, &str>) -> (QaEngine<Fixed>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = Counting { calls: calls.clone(), reply: reply.map(str::to_string).map_err(str::to_string) };
        (QaEngine::new(Fixed(frags), Box::new(generator)), calls)
    }

    fn corpus() -> Vec<Fragment> {
        vec![
            frag("a", 0, "Revenue rose in spring."),
            frag("a", 1, "Costs fell in summer."),
            frag("b", 0, "Revenue targets were met."),
        ]
    }

    #[test]
    fn empty_question_short_circuits() {
        let (qa, calls) = engine(corpus(), Ok("x"));
        let r = qa.answer("   ");
        assert_eq!(r.answer, EMPTY_QUESTION);
        assert!(!r.has_enough_context);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_documents_skips_generator() {
        let (qa, calls) = engine(Vec::new(), Ok("x"));
        let r = qa.answer("what happened?");
        assert_eq!(r.answer, NO_DOCUMENTS);
        assert!(r.citations.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn generator_failure_becomes_message() {
        let (qa, calls) = engine(corpus(), Err("model offline"));
        let r = qa.answer("what happened?");
        assert_eq!(r.answer, GENERATION_FAILED);
        assert!(!r.has_enough_context);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(qa.try_answer("what happened?"), Err(Error::Operation(_))));
    }

    #[test]
    fn answer_is_cleaned_and_cited() {
        let (qa, _) = engine(corpus(), Ok("Revenue went up. [[revenue]]"));
        let r = qa.answer("  how did revenue do?  ");
        assert_eq!(r.question, "how did revenue do?");
        assert_eq!(r.answer, "Revenue went up.");
        assert!(r.has_enough_context);
        assert_eq!(r.citations.len(), 2);
        assert_eq!(r.citations[0].source, "a.txt");
        assert_eq!(r.citations[0].content, "**Revenue** rose in spring.");
        assert_eq!(r.citations[0].score, Some(1.0));
        assert_eq!(r.citations[1].content, "**Revenue** targets were met.");
    }

    #[test]
    fn context_limit_uses_ranked_fragments() {
        let (qa, _) = engine(corpus(), Ok("ok"));
        let qa = qa.with_context_limit(Some(2));
        let r = qa.answer("revenue");
        // ranked order: b#0 (0.9), a#1 (0.8)
        assert_eq!(r.citations.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(), vec!["b.txt", "a.txt"]);
        assert_eq!(r.citations[0].score, Some(0.9));
        assert_eq!(r.citations[1].content, "Costs fell in summer.");
    }

    #[test]
    fn citation_comes_from_first_fragment_of_each_source() {
        let (qa, _) = engine(corpus(), Ok("Costs dropped. [[costs]]"));
        let r = qa.answer("what about costs?");
        assert_eq!(r.citations.len(), 2);
        // a#0 wins for source a even though only a#1 mentions costs
        assert_eq!(r.citations[0].content, "Revenue rose in spring.");
        assert!(corpus().iter().any(|f| f.text == r.citations[0].content));
    }

    #[test]
    fn generator_sees_joined_documents() {
        struct Echo;
        impl AnswerGenerator for Echo {
            fn generate(&self, _q: &str, context: &[ContextDocument]) -> anyhow::Result<String> {
                Ok(context.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(" | "))
            }
        }
        let qa = QaEngine::new(Fixed(corpus()), Box::new(Echo));
        let r = qa.answer("anything");
        assert_eq!(r.answer, "Revenue rose in spring. Costs fell in summer. | Revenue targets were met.");
    }

    struct NothingRanks(Vec<Fragment>);

    impl FragmentSource for NothingRanks {
        fn fragments(&self) -> Vec<Fragment> { self.0.clone() }
        fn ranked(&self, _query: &str, _limit: usize) -> Vec<ScoredFragment> { Vec::new() }
    }

    #[test]
    fn unmatched_ranking_falls_back_to_whole_corpus() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = Counting { calls: calls.clone(), reply: Ok("Nothing specific. [[zeppelin]]".to_string()) };
        let qa = QaEngine::new(NothingRanks(corpus()), Box::new(generator)).with_context_limit(Some(3));
        let r = qa.answer("zeppelin");
        assert_ne!(r.answer, NO_DOCUMENTS);
        assert!(r.has_enough_context);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.citations.len(), 2);
        assert_eq!(r.citations[0].score, Some(1.0));
    }

    #[test]
    fn grouping_joins_fragments_per_document() {
        let selected: Vec<(Fragment, f32)> = corpus().into_iter().map(|f| (f, 0.5)).collect();
        let grouped = group_by_document(&selected);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].content, "Revenue rose in spring. Costs fell in summer.");
        assert_eq!(grouped[1].document_id, "b");
    }
}
