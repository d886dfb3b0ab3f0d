//! TF-IDF term weighting with an explicit fit/transform split.
//!
//! `TfidfModel::fit` learns a bounded vocabulary and smoothed IDF weights
//! from a corpus; the fitted model is immutable and `transform` projects any
//! text into the same weight space. Vectors are L2-normalized, so the cosine
//! similarity of two vectors is their dot product.
//!
//! - Terms: lowercased, accent-stripped word 1..n-grams (see `tokenize`)
//! - Vocabulary bound: the `max_features` most frequent terms across the
//!   corpus, ties broken alphabetically
//! - IDF: `ln((1 + N) / (1 + df)) + 1`
//! - TF: raw count

use std::collections::HashMap;

use docqa_core::config::IndexSettings;

use crate::tokenize::analyze;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TfidfParams {
    pub max_features: usize,
    pub ngram_max: usize,
}

impl Default for TfidfParams {
    fn default() -> Self { Self::from(&IndexSettings::default()) }
}

impl From<&IndexSettings> for TfidfParams {
    fn from(s: &IndexSettings) -> Self { Self { max_features: s.max_features, ngram_max: s.ngram_max } }
}

/// Sparse weight vector, entries sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    fn from_counts(counts: HashMap<u32, u32>, idf: &[f32]) -> Self {
        let mut entries: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(term, count)| (term, count as f32 * idf[term as usize]))
            .collect();
        entries.sort_unstable_by_key(|(term, _)| *term);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries { *w /= norm; }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(u32, f32)] { &self.entries }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => { sum += wa * wb; i += 1; j += 1; }
            }
        }
        sum
    }

    /// Cosine similarity of two normalized vectors, clamped to [0, 1].
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let s = self.dot(other);
        if s.is_finite() { s.clamp(0.0, 1.0) } else { 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TfidfModel {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    ngram_max: usize,
}

impl TfidfModel {
    pub fn fit<S: AsRef<str>>(corpus: &[S], params: TfidfParams) -> Self {
        Self::fit_transform(corpus, params).0
    }

    /// Fit on `corpus` and return the weight matrix of the same corpus, one row per text.
    pub fn fit_transform<S: AsRef<str>>(corpus: &[S], params: TfidfParams) -> (Self, Vec<SparseVector>) {
        let per_doc: Vec<HashMap<String, u32>> = corpus
            .iter()
            .map(|text| {
                let mut counts = HashMap::new();
                for term in analyze(text.as_ref(), params.ngram_max) {
                    *counts.entry(term).or_insert(0u32) += 1;
                }
                counts
            })
            .collect();

        let mut totals: HashMap<&str, (u64, u32)> = HashMap::new();
        for counts in &per_doc {
            for (term, &count) in counts {
                let e = totals.entry(term.as_str()).or_insert((0, 0));
                e.0 += u64::from(count);
                e.1 += 1;
            }
        }

        let mut ranked: Vec<(&str, u64, u32)> = totals.into_iter().map(|(t, (tf, df))| (t, tf, df)).collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(params.max_features);
        ranked.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let n_docs = corpus.len() as f32;
        let mut vocabulary = HashMap::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (i, (term, _, df)) in ranked.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), i as u32);
            idf.push(((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0);
        }

        let model = Self { vocabulary, idf, ngram_max: params.ngram_max };
        let matrix = per_doc.into_iter().map(|counts| model.weigh(counts)).collect();
        (model, matrix)
    }

    /// Project `text` into the fitted weight space. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts = HashMap::new();
        for term in analyze(text, self.ngram_max) {
            *counts.entry(term).or_insert(0u32) += 1;
        }
        self.weigh(counts)
    }

    fn weigh(&self, counts: HashMap<String, u32>) -> SparseVector {
        let indexed = counts
            .into_iter()
            .filter_map(|(term, c)| self.vocabulary.get(&term).map(|&i| (i, c)))
            .collect();
        SparseVector::from_counts(indexed, &self.idf)
    }

    pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }

    pub fn term_index(&self, term: &str) -> Option<u32> { self.vocabulary.get(term).copied() }

    pub fn idf(&self, term: &str) -> Option<f32> { self.term_index(term).map(|i| self.idf[i as usize]) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_features: usize) -> TfidfParams { TfidfParams { max_features, ngram_max: 2 } }

    #[test]
    fn vocabulary_contains_unigrams_and_bigrams() {
        let model = TfidfModel::fit(&["red apple", "green apple"], params(100));
        for t in ["red", "green", "apple", "red apple", "green apple"] {
            assert!(model.term_index(t).is_some(), "missing {}", t);
        }
        assert_eq!(model.vocabulary_len(), 5);
    }

    #[test]
    fn rarer_terms_get_higher_idf() {
        let model = TfidfModel::fit(&["red apple", "green apple", "apple pie"], params(100));
        assert!(model.idf("red").unwrap() > model.idf("apple").unwrap());
        assert!((model.idf("apple").unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let model = TfidfModel::fit(&["apple apple banana", "apple cherry"], TfidfParams { max_features: 1, ngram_max: 1 });
        assert_eq!(model.vocabulary_len(), 1);
        assert!(model.term_index("apple").is_some());
    }

    #[test]
    fn rows_are_unit_length_and_self_similar() {
        let corpus = ["the quick brown fox", "lazy dogs sleep all day"];
        let (model, matrix) = TfidfModel::fit_transform(&corpus, params(100));
        assert_eq!(matrix.len(), 2);
        for row in &matrix {
            assert!((row.dot(row) - 1.0).abs() < 1e-5);
        }
        assert!((model.transform(corpus[0]).cosine(&matrix[0]) - 1.0).abs() < 1e-5);
        assert_eq!(matrix[0].cosine(&matrix[1]), 0.0);
    }

    #[test]
    fn unknown_text_projects_to_empty_vector() {
        let model = TfidfModel::fit(&["alpha beta"], params(100));
        assert!(model.transform("gamma delta").is_empty());
        assert!(model.transform("").is_empty());
    }

    #[test]
    fn transform_matches_accented_query() {
        let model = TfidfModel::fit(&["la cancion del verano"], params(100));
        assert!(!model.transform("Canción").is_empty());
    }
}
