//! Domain types shared by the index, the query engine and the QA layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// A source document as handed to the ingestion boundary.
///
/// `content` is raw text; normalization and chunking happen on rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), content: content.into() }
    }
}

/// Listing entry for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub name: String,
    pub num_characters: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self { id: doc.id.clone(), name: doc.name.clone(), num_characters: doc.content.chars().count() }
    }
}

/// A chunk of a source document, the unit of indexing and retrieval.
///
/// - `document_id`/`document_name`: the source document
/// - `chunk_index`: 0-based position within the source document's chunks
/// - `text`: normalized, lowercased chunk text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub document_id: DocumentId,
    pub document_name: String,
    pub chunk_index: usize,
    pub text: String,
}

/// A fragment paired with its relevance to some query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f32,
}

/// One source document's text as handed to the answer generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub document_id: DocumentId,
    pub source: String,
    pub content: String,
}

/// One ranked fragment as shown to a searcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Display snippet, not necessarily the whole fragment.
    pub text: String,
    #[serde(rename = "documentName")]
    pub document_name: String,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: f32,
    pub document_id: DocumentId,
    pub chunk_index: usize,
}

/// A page of search results plus the pagination totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub total: usize,
    pub page: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

impl SearchPage {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self { results: Vec::new(), total: 0, page, page_size, total_pages: 0 }
    }

    pub fn is_empty(&self) -> bool { self.results.is_empty() }
}

/// A highlighted excerpt supporting a generated answer, one per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    #[serde(rename = "hasEnoughContext")]
    pub has_enough_context: bool,
    pub question: String,
    pub timestamp: DateTime<Utc>,
}

impl QaResponse {
    /// A response with no citations and no usable context.
    pub fn without_context(question: &str, answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            citations: Vec::new(),
            has_enough_context: false,
            question: question.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Ready,
    Indexing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub status: IndexState,
    /// Number of indexed fragments.
    pub documents_loaded: usize,
    /// Number of distinct source documents behind those fragments.
    pub sources_loaded: usize,
    pub last_updated: DateTime<Utc>,
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_page_uses_frontend_field_names() {
        let page = SearchPage {
            results: vec![SearchResult {
                text: "snippet".into(),
                document_name: "report.pdf".into(),
                relevance_score: 0.5,
                document_id: "report_1.json".into(),
                chunk_index: 2,
            }],
            total: 1,
            page: 1,
            page_size: 10,
            total_pages: 1,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["results"][0]["documentName"], "report.pdf");
        assert_eq!(json["results"][0]["relevanceScore"], 0.5);
        assert_eq!(json["results"][0]["chunk_index"], 2);
    }

    #[test]
    fn status_state_serializes_lowercase() {
        assert_eq!(serde_json::to_value(IndexState::Indexing).unwrap(), "indexing");
    }

    #[test]
    fn citation_omits_missing_score() {
        let c = Citation { source: "a".into(), content: "b".into(), score: None, page: None };
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("score").is_none());
    }
}
