//! Persisted per-document extraction artifacts.
//!
//! Layout mirrors the verified store: `<root>/<doc-id>/data.json` holds the
//! step history and reconciled record, `ocr.txt` the raw recognized text.
//! Records are write-once per processing pass; concurrent runs against the
//! same document id are not supported.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StoreError;
use crate::models::record::DocumentRecord;

/// Store of processing outputs, one directory per document.
#[derive(Debug, Clone)]
pub struct ExtractionStore {
    root: PathBuf,
}

impl ExtractionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a document already has a persisted record.
    pub fn is_processed(&self, doc_id: &str) -> bool {
        self.data_path(doc_id).is_file()
    }

    /// Persist one processing pass: `data.json` plus the `ocr.txt` sidecar.
    pub fn save(&self, record: &DocumentRecord, raw_text: &str) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(&record.document.id);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Write {
            path: dir.display().to_string(),
            source: e,
        })?;

        let data_path = dir.join("data.json");
        let json = serde_json::to_string_pretty(record).map_err(|e| StoreError::Malformed {
            path: data_path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&data_path, json).map_err(|e| StoreError::Write {
            path: data_path.display().to_string(),
            source: e,
        })?;

        let ocr_path = dir.join("ocr.txt");
        std::fs::write(&ocr_path, raw_text).map_err(|e| StoreError::Write {
            path: ocr_path.display().to_string(),
            source: e,
        })?;

        info!(doc_id = %record.document.id, path = %data_path.display(), "record persisted");
        Ok(data_path)
    }

    /// Load a persisted record, if the document was processed.
    pub fn load(&self, doc_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let path = self.data_path(doc_id);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                path: path.display().to_string(),
                source: e,
            })
    }

    /// Ids of all processed documents.
    pub fn document_ids(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| StoreError::Read {
            path: self.root.display().to_string(),
            source: e,
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join("data.json").is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn data_path(&self, doc_id: &str) -> PathBuf {
        self.root.join(doc_id).join("data.json")
    }
}
