use std::sync::Arc;

use crate::types::{ContextDocument, Fragment, ScoredFragment};

/// Read access to the currently indexed fragments.
pub trait FragmentSource: Send + Sync {
    /// Every indexed fragment in corpus order.
    fn fragments(&self) -> Vec<Fragment>;
    /// Fragments ranked by relevance to `query`, best first, at most `limit`.
    fn ranked(&self, query: &str, limit: usize) -> Vec<ScoredFragment>;
}

impl<T> FragmentSource for Arc<T> where T: FragmentSource + ?Sized {
    fn fragments(&self) -> Vec<Fragment> { (**self).fragments() }
    fn ranked(&self, query: &str, limit: usize) -> Vec<ScoredFragment> { (**self).ranked(query, limit) }
}

/// The external answer-generation collaborator.
///
/// Implementations may embed a `[[kw1, kw2]]` keyword marker in the answer.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, question: &str, context: &[ContextDocument]) -> anyhow::Result<String>;
}
