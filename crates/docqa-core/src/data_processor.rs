//! Turning document files into `Document`s and documents into `Fragment`s.
//!
//! A documents directory holds one JSON record per ingested file (the format
//! written by [`DataProcessor::save_document`]) and may also hold plain `.txt`
//! files. Unreadable or malformed files are skipped and logged; they never
//! abort loading of the rest of the directory.
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::chunker::Chunker;
use crate::error::{Error, Result};
use crate::normalize::normalize_for_index;
use crate::types::{Document, Fragment};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordMetadata {
    #[serde(default, alias = "nombre_original", skip_serializing_if = "Option::is_none")]
    original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_extension: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uploaded_at: Option<String>,
    #[serde(default)]
    metadata: RecordMetadata,
    #[serde(alias = "contenido")]
    content: String,
}

#[derive(Default)]
pub struct DataProcessor {
    chunker: Chunker,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_chunker(chunker: Chunker) -> Self { Self { chunker } }

    /// Normalize, lowercase and chunk one document.
    pub fn fragments(&self, document: &Document) -> Vec<Fragment> {
        let normalized = normalize_for_index(&document.content);
        self.chunker
            .chunk(&normalized)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Fragment {
                document_id: document.id.clone(),
                document_name: document.name.clone(),
                chunk_index,
                text,
            })
            .collect()
    }

    /// Fragments of all documents, per-document order preserved.
    pub fn process_documents(&self, documents: &[Document]) -> Vec<Fragment> {
        let mut all = Vec::new();
        for document in documents {
            let fragments = self.fragments(document);
            if fragments.is_empty() {
                debug!(document = %document.id, "document produced no fragments");
            }
            all.extend(fragments);
        }
        all
    }

    /// Load every document file under `data_dir`, sorted by path.
    ///
    /// A missing directory yields no documents.
    pub fn load_directory(&self, data_dir: &Path) -> (Vec<Document>, LoadReport) {
        let mut report = LoadReport::default();
        if !data_dir.is_dir() {
            info!(dir = %data_dir.display(), "documents directory does not exist");
            return (Vec::new(), report);
        }
        let mut documents = Vec::new();
        for path in list_document_files(data_dir) {
            match load_document(&path) {
                Ok(document) => {
                    debug!(path = %path.display(), id = %document.id, "loaded document");
                    documents.push(document);
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping document");
                    report.skipped += 1;
                }
            }
        }
        info!(loaded = report.loaded, skipped = report.skipped, dir = %data_dir.display(), "loaded documents");
        (documents, report)
    }

    /// Persist `content` as a JSON document record and return the stored document.
    pub fn save_document(&self, data_dir: &Path, original_filename: &str, content: &str) -> Result<(PathBuf, Document)> {
        fs::create_dir_all(data_dir)?;
        let (base, ext) = split_extension(original_filename);
        let stem = format!("{}{}_{}", sanitize_base(base), sanitize_ext(ext), Local::now().format("%Y%m%d_%H%M%S"));
        let mut file_path = data_dir.join(format!("{}.json", stem));
        let mut n = 1;
        while file_path.exists() {
            file_path = data_dir.join(format!("{}-{}.json", stem, n));
            n += 1;
        }
        let file_name = file_name_of(&file_path);
        let record = DocumentRecord {
            id: file_path.file_stem().map(|s| s.to_string_lossy().to_string()),
            filename: Some(file_name.clone()),
            uploaded_at: Some(Local::now().to_rfc3339()),
            metadata: RecordMetadata {
                original_filename: Some(original_filename.to_string()),
                file_size: Some(content.len()),
                file_extension: (!ext.is_empty()).then(|| ext.trim_start_matches('.').to_lowercase()),
            },
            content: content.to_string(),
        };
        fs::write(&file_path, serde_json::to_string_pretty(&record)?)?;
        info!(path = %file_path.display(), "saved document");
        Ok((file_path, Document::new(file_name, original_filename, content)))
    }

    /// Delete the stored record whose file name, stem or record id is `id`.
    pub fn delete_document(&self, data_dir: &Path, id: &str) -> Result<PathBuf> {
        for path in list_document_files(data_dir) {
            let matches_name = file_name_of(&path) == id
                || path.file_stem().is_some_and(|s| s.to_string_lossy() == id);
            let matches_record = !matches_name
                && path.extension().is_some_and(|e| e == "json")
                && read_record(&path).is_ok_and(|r| r.id.as_deref() == Some(id));
            if matches_name || matches_record {
                fs::remove_file(&path)?;
                info!(path = %path.display(), "deleted document");
                return Ok(path);
            }
        }
        Err(Error::NotFound(format!("document '{}' in {}", id, data_dir.display())))
    }
}

/// Read one `.json` record or `.txt` file. The document id is the file name.
pub fn load_document(path: &Path) -> Result<Document> {
    let file_name = file_name_of(path);
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let record = read_record(path)?;
            let name = record.metadata.original_filename.or(record.filename).unwrap_or_else(|| file_name.clone());
            Ok(Document::new(file_name, name, record.content))
        }
        Some("txt") => {
            let bytes = fs::read(path)?;
            let content = String::from_utf8_lossy(&bytes).to_string();
            Ok(Document::new(file_name.clone(), file_name, content))
        }
        _ => Err(Error::MalformedDocument { path: path.to_path_buf(), reason: "unsupported file type".to_string() }),
    }
}

fn read_record(path: &Path) -> Result<DocumentRecord> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| Error::MalformedDocument { path: path.to_path_buf(), reason: e.to_string() })
}

fn list_document_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "txt")))
        .collect();
    files.sort();
    files
}

fn file_name_of(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

fn sanitize_base(base: &str) -> String {
    let safe: String = base.chars().map(|c| if c.is_alphanumeric() || " _-.".contains(c) { c } else { '_' }).collect();
    if safe.trim_matches(|c| "_.- ".contains(c)).is_empty() { "document".to_string() } else { safe }
}

fn sanitize_ext(ext: &str) -> String {
    ext.chars().filter(|c| c.is_alphanumeric() || *c == '_' || *c == '.').flat_map(char::to_lowercase).collect()
}
