use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use docqa_core::data_processor::DataProcessor;
use docqa_core::error::{Error, Result};
use docqa_core::types::{Document, Fragment};

use crate::tfidf::{SparseVector, TfidfModel, TfidfParams};

/// An immutable, internally consistent view of the index.
///
/// Row `i` of the weight matrix always belongs to `corpus[i]` and
/// `metadata[i]`. A snapshot is built whole and never mutated afterwards.
#[derive(Debug)]
pub struct IndexSnapshot {
    corpus: Vec<String>,
    metadata: Vec<Fragment>,
    model: Option<TfidfModel>,
    matrix: Vec<SparseVector>,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self { corpus: Vec::new(), metadata: Vec::new(), model: None, matrix: Vec::new() }
    }

    /// Chunk `documents` and fit a fresh term-weighting model over the fragments.
    ///
    /// Document ids must be unique.
    pub fn build(documents: &[Document], processor: &DataProcessor, params: TfidfParams) -> Result<Self> {
        let mut ids = HashSet::with_capacity(documents.len());
        if let Some(dup) = documents.iter().find(|d| !ids.insert(d.id.as_str())) {
            return Err(Error::InvalidRequest(format!("duplicate document id '{}'", dup.id)));
        }
        let metadata = processor.process_documents(documents);
        if metadata.is_empty() {
            info!(documents = documents.len(), "no fragments to index");
            return Ok(Self::empty());
        }
        let corpus: Vec<String> = metadata.iter().map(|f| f.text.clone()).collect();
        let (model, matrix) = TfidfModel::fit_transform(&corpus, params);
        let snapshot = Self { corpus, metadata, model: Some(model), matrix };
        snapshot.check_consistency()?;
        info!(
            documents = documents.len(),
            fragments = snapshot.len(),
            vocabulary = snapshot.vocabulary_len(),
            "built index"
        );
        Ok(snapshot)
    }

    fn check_consistency(&self) -> Result<()> {
        if self.corpus.len() != self.metadata.len() || self.corpus.len() != self.matrix.len() {
            return Err(Error::Operation(format!(
                "index shape mismatch: {} texts, {} fragments, {} rows",
                self.corpus.len(),
                self.metadata.len(),
                self.matrix.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.corpus.len() }

    pub fn is_empty(&self) -> bool { self.corpus.is_empty() || self.model.is_none() }

    pub fn corpus(&self) -> &[String] { &self.corpus }

    pub fn metadata(&self) -> &[Fragment] { &self.metadata }

    pub fn model(&self) -> Option<&TfidfModel> { self.model.as_ref() }

    pub fn matrix(&self) -> &[SparseVector] { &self.matrix }

    pub fn vocabulary_len(&self) -> usize { self.model.as_ref().map_or(0, TfidfModel::vocabulary_len) }

    /// Number of distinct source documents behind the fragments.
    pub fn source_count(&self) -> usize {
        self.metadata.iter().map(|f| f.document_id.as_str()).collect::<HashSet<_>>().len()
    }

    /// Cosine similarity of `text` against every fragment, in corpus order.
    pub fn similarities(&self, text: &str) -> Vec<f32> {
        let Some(model) = &self.model else { return Vec::new() };
        let query = model.transform(text);
        if query.is_empty() {
            return vec![0.0; self.matrix.len()];
        }
        self.matrix.iter().map(|row| query.cosine(row)).collect()
    }
}

/// The shared, swappable index.
///
/// Readers take a cheap `Arc` clone of the current snapshot and never
/// observe a half-built state. Rebuilds are serialized and build the new
/// snapshot outside the read lock before swapping it in.
pub struct Index {
    current: RwLock<Arc<IndexSnapshot>>,
    rebuild_guard: Mutex<()>,
    processor: DataProcessor,
    params: TfidfParams,
}

impl Index {
    pub fn new(processor: DataProcessor, params: TfidfParams) -> Self {
        Self { current: RwLock::new(Arc::new(IndexSnapshot::empty())), rebuild_guard: Mutex::new(()), processor, params }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> { self.current.read().clone() }

    /// Replace the whole index with one built from `documents`.
    ///
    /// On error the previous snapshot stays in place.
    pub fn rebuild(&self, documents: &[Document]) -> Result<Arc<IndexSnapshot>> {
        let _guard = self.rebuild_guard.lock();
        let next = Arc::new(IndexSnapshot::build(documents, &self.processor, self.params)?);
        *self.current.write() = Arc::clone(&next);
        Ok(next)
    }
}

impl Default for Index {
    fn default() -> Self { Self::new(DataProcessor::new(), TfidfParams::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("a", "Alpha", "Apples grow on trees in the orchard. Farmers pick them in autumn. Cider is pressed later."),
            Document::new("b", "Beta", "The harbor was busy this morning. Ships unloaded grain all day."),
        ]
    }

    #[test]
    fn shapes_agree_after_rebuild() {
        let index = Index::default();
        let snap = index.rebuild(&docs()).unwrap();
        assert_eq!(snap.corpus().len(), snap.metadata().len());
        assert_eq!(snap.corpus().len(), snap.matrix().len());
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.source_count(), 2);
        assert_eq!(snap.metadata()[2].document_id, "b");
        assert_eq!(snap.metadata()[1].chunk_index, 1);
    }

    #[test]
    fn empty_collection_gives_empty_index() {
        let index = Index::default();
        index.rebuild(&docs()).unwrap();
        let snap = index.rebuild(&[]).unwrap();
        assert!(snap.is_empty());
        assert!(index.snapshot().is_empty());
        assert!(snap.similarities("apples").is_empty());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let index = Index::default();
        let first = index.rebuild(&docs()).unwrap();
        let second = index.rebuild(&docs()).unwrap();
        assert_eq!(first.metadata(), second.metadata());
        assert_eq!(first.corpus(), second.corpus());
        assert_eq!(first.matrix(), second.matrix());
    }

    #[test]
    fn duplicate_ids_are_rejected_and_keep_the_old_snapshot() {
        let index = Index::default();
        index.rebuild(&docs()).unwrap();
        let mut dup = docs();
        dup[1].id = "a".to_string();
        assert!(matches!(index.rebuild(&dup), Err(Error::InvalidRequest(_))));
        assert_eq!(index.snapshot().len(), 3);
    }

    #[test]
    fn old_snapshots_survive_a_rebuild() {
        let index = Index::default();
        index.rebuild(&docs()).unwrap();
        let held = index.snapshot();
        index.rebuild(&docs()[1..]).unwrap();
        assert_eq!(held.len(), 3);
        assert_eq!(index.snapshot().len(), 1);
    }
}
