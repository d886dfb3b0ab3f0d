//! docqa-text
//!
//! Lexical (TF-IDF) indexing and paginated search over document fragments.
//! `SearchService` is the entry point; `index`, `search` and `snippet` hold
//! the pieces it is built from.
pub mod index;
pub mod search;
pub mod service;
pub mod snippet;
pub mod tfidf;
pub mod tokenize;

pub use index::{Index, IndexSnapshot};
pub use search::QueryEngine;
pub use service::SearchService;
pub use tfidf::{SparseVector, TfidfModel, TfidfParams};
