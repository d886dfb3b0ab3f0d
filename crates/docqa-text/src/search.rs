use tracing::{debug, warn};

use docqa_core::config::SearchSettings;
use docqa_core::error::{Error, Result};
use docqa_core::types::{ScoredFragment, SearchPage, SearchResult};

use crate::index::IndexSnapshot;
use crate::snippet::best_window;
use crate::tokenize::query_terms;

/// Scores, sorts and paginates fragments of an index snapshot.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    snippet_length: usize,
    max_page_size: usize,
}

impl Default for QueryEngine {
    fn default() -> Self { Self::from(&SearchSettings::default()) }
}

impl From<&SearchSettings> for QueryEngine {
    fn from(s: &SearchSettings) -> Self { Self { snippet_length: s.snippet_length, max_page_size: s.max_page_size } }
}

impl QueryEngine {
    /// Search and degrade any failure to an empty page.
    pub fn search(&self, snapshot: &IndexSnapshot, query: &str, page: usize, page_size: usize) -> SearchPage {
        match self.try_search(snapshot, query, page, page_size) {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, query, "search failed");
                SearchPage::empty(page, page_size)
            }
        }
    }

    pub fn try_search(&self, snapshot: &IndexSnapshot, query: &str, page: usize, page_size: usize) -> Result<SearchPage> {
        if page == 0 {
            return Err(Error::InvalidRequest("page must be at least 1".to_string()));
        }
        if page_size == 0 || page_size > self.max_page_size {
            return Err(Error::InvalidRequest(format!("page size must be between 1 and {}", self.max_page_size)));
        }
        let terms = query_terms(query);
        if terms.is_empty() || snapshot.is_empty() {
            return Ok(SearchPage::empty(page, page_size));
        }

        let ranked = rank(snapshot, query);
        let total = ranked.len();
        let total_pages = total.div_ceil(page_size);
        let start = (page - 1).saturating_mul(page_size);
        let results = ranked
            .iter()
            .skip(start)
            .take(page_size)
            .map(|&(i, score)| {
                let fragment = &snapshot.metadata()[i];
                SearchResult {
                    text: best_window(&fragment.text, &terms, self.snippet_length),
                    document_name: fragment.document_name.clone(),
                    relevance_score: round4(score),
                    document_id: fragment.document_id.clone(),
                    chunk_index: fragment.chunk_index,
                }
            })
            .collect();
        debug!(query, total, page, page_size, "search complete");
        Ok(SearchPage { results, total, page, page_size, total_pages })
    }

    /// The `limit` best fragments for `query` with their raw scores.
    pub fn top_fragments(&self, snapshot: &IndexSnapshot, query: &str, limit: usize) -> Vec<ScoredFragment> {
        if query_terms(query).is_empty() { return Vec::new(); }
        rank(snapshot, query)
            .into_iter()
            .take(limit)
            .map(|(i, score)| ScoredFragment { fragment: snapshot.metadata()[i].clone(), score })
            .collect()
    }
}

/// Fragment positions with similarity > 0, best first; ties keep corpus order.
pub fn rank(snapshot: &IndexSnapshot, query: &str) -> Vec<(usize, f32)> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() { return Vec::new(); }
    let mut scored: Vec<(usize, f32)> = snapshot
        .similarities(&normalized)
        .into_iter()
        .enumerate()
        .filter(|(_, s)| *s > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

fn round4(score: f32) -> f32 { (score * 10_000.0).round() / 10_000.0 }
