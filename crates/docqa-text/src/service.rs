//! The long-lived search service: document collection, index and status.
//!
//! Every successful mutation of the collection (add, remove, clear, reload)
//! triggers a full rebuild. Mutations are serialized; searches only read the
//! current index snapshot and never wait on a rebuild.
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use docqa_core::chunker::Chunker;
use docqa_core::config::Settings;
use docqa_core::data_processor::{DataProcessor, LoadReport};
use docqa_core::error::{Error, Result};
use docqa_core::traits::FragmentSource;
use docqa_core::types::{
    Document, DocumentSummary, Fragment, IndexState, IndexStatus, ScoredFragment, SearchPage,
};

use crate::index::{Index, IndexSnapshot};
use crate::search::QueryEngine;
use crate::tfidf::TfidfParams;

struct StatusState {
    state: IndexState,
    error: Option<String>,
    last_updated: DateTime<Utc>,
}

pub struct SearchService {
    documents: Mutex<Vec<Document>>,
    index: Index,
    engine: QueryEngine,
    processor: DataProcessor,
    default_page_size: usize,
    status: RwLock<StatusState>,
}

impl Default for SearchService {
    fn default() -> Self { Self::new(&Settings::default()) }
}

impl SearchService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            index: Index::new(
                DataProcessor::with_chunker(Chunker::from(&settings.chunking)),
                TfidfParams::from(&settings.index),
            ),
            engine: QueryEngine::from(&settings.search),
            processor: DataProcessor::with_chunker(Chunker::from(&settings.chunking)),
            default_page_size: settings.search.default_page_size,
            status: RwLock::new(StatusState { state: IndexState::Ready, error: None, last_updated: Utc::now() }),
        }
    }

    /// Add or replace (by id) one document, then rebuild.
    ///
    /// Mutations commit the new collection only once its rebuild succeeded,
    /// so the collection always matches the served index.
    pub fn add_document(&self, document: Document) -> Result<usize> {
        self.add_documents(vec![document])
    }

    pub fn add_documents(&self, documents: Vec<Document>) -> Result<usize> {
        let mut current = self.documents.lock();
        let mut next = current.clone();
        for document in documents {
            match next.iter_mut().find(|d| d.id == document.id) {
                Some(existing) => *existing = document,
                None => next.push(document),
            }
        }
        let n = self.rebuild_locked(&next)?;
        *current = next;
        Ok(n)
    }

    /// Remove a document by id, then rebuild.
    pub fn remove_document(&self, id: &str) -> Result<Document> {
        let mut current = self.documents.lock();
        let pos = current.iter().position(|d| d.id == id).ok_or_else(|| Error::NotFound(format!("document '{}'", id)))?;
        let mut next = current.clone();
        let removed = next.remove(pos);
        self.rebuild_locked(&next)?;
        *current = next;
        info!(id, "removed document");
        Ok(removed)
    }

    pub fn clear(&self) -> Result<usize> {
        let mut current = self.documents.lock();
        self.rebuild_locked(&[])?;
        Ok(std::mem::take(&mut *current).len())
    }

    /// Replace the collection with the documents stored in `dir`, then rebuild.
    pub fn load_directory(&self, dir: &Path) -> Result<LoadReport> {
        let (documents, report) = self.processor.load_directory(dir);
        let mut current = self.documents.lock();
        self.rebuild_locked(&documents)?;
        *current = documents;
        Ok(report)
    }

    /// Rebuild from the current collection.
    pub fn rebuild(&self) -> Result<usize> {
        let current = self.documents.lock();
        self.rebuild_locked(&current)
    }

    fn rebuild_locked(&self, documents: &[Document]) -> Result<usize> {
        self.status.write().state = IndexState::Indexing;
        let outcome = self.index.rebuild(documents);
        let mut status = self.status.write();
        status.last_updated = Utc::now();
        match outcome {
            Ok(snapshot) => {
                status.state = IndexState::Ready;
                status.error = None;
                Ok(snapshot.len())
            }
            Err(e) => {
                error!(error = %e, "index rebuild failed");
                status.state = IndexState::Error;
                status.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.documents.lock().iter().map(DocumentSummary::from).collect()
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> { self.index.snapshot() }

    pub fn default_page_size(&self) -> usize { self.default_page_size }

    pub fn search(&self, query: &str, page: usize, page_size: usize) -> SearchPage {
        self.engine.search(&self.snapshot(), query, page, page_size)
    }

    pub fn try_search(&self, query: &str, page: usize, page_size: usize) -> Result<SearchPage> {
        self.engine.try_search(&self.snapshot(), query, page, page_size)
    }

    pub fn status(&self) -> IndexStatus {
        let snapshot = self.snapshot();
        let status = self.status.read();
        IndexStatus {
            status: status.state,
            documents_loaded: snapshot.len(),
            sources_loaded: snapshot.source_count(),
            last_updated: status.last_updated,
            device: device_description(),
            error: status.error.clone(),
        }
    }
}

impl FragmentSource for SearchService {
    fn fragments(&self) -> Vec<Fragment> { self.snapshot().metadata().to_vec() }

    fn ranked(&self, query: &str, limit: usize) -> Vec<ScoredFragment> {
        self.engine.top_fragments(&self.snapshot(), query, limit)
    }
}

fn device_description() -> String {
    format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH)
}
