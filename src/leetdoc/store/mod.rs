//! # Storage Layer
//!
//! This module defines the storage abstraction for leetdoc. The [`DataStore`]
//! trait lets the application work with different storage backends, and
//! [`StorePersister`] turns any store into the persistence collaborator that
//! fulfils section save requests.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: Production file-based storage
//!   - Summaries of all documents in `data.json`
//!   - One `doc-{id}.json` per document, in the canonical document shape
//!
//! - [`memory::InMemoryStore`]: In-memory storage for testing
//!   - No persistence
//!   - Can be told to fail writes, to exercise the save-failure path
//!
//! ## Scope Pattern
//!
//! All operations take a [`Scope`] parameter:
//! - `Scope::Project`: Local `.leetdoc/` directory in the current project
//! - `Scope::Global`: User-wide storage (`~/.local/share/leetdoc/`)
//!
//! ## Storage Format
//!
//! For `FileStore`:
//! ```text
//! .leetdoc/
//! ├── data.json           # Summaries of all documents (JSON object keyed by id)
//! ├── doc-{id}.json       # Individual documents
//! └── config.json         # Scope configuration
//! ```
//!
//! Summaries are kept apart from documents so listing never parses section
//! payloads.

use crate::container::{SaveOutcome, SaveRequest};
use crate::error::{LeetdocError, Result};
use crate::model::{Document, DocumentMetadata, Scope};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

pub mod fs;
pub mod memory;

/// What listing needs to know about a document without loading it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub metadata: DocumentMetadata,
    pub title: String,
    pub section_count: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            metadata: doc.metadata.clone(),
            title: doc.title.clone(),
            section_count: doc.sections.len(),
        }
    }
}

/// Abstract interface for document storage.
pub trait DataStore {
    /// Save a document (create or update)
    fn save_document(&mut self, doc: &Document, scope: Scope) -> Result<()>;

    /// Get a document by id
    fn get_document(&self, id: &str, scope: Scope) -> Result<Document>;

    /// Summaries of all documents in a scope
    fn list_documents(&self, scope: Scope) -> Result<Vec<DocumentSummary>>;

    /// Delete a document permanently
    fn delete_document(&mut self, id: &str, scope: Scope) -> Result<()>;

    /// Where the document lives (for file-based stores)
    fn document_path(&self, id: &str, scope: Scope) -> Result<PathBuf>;
}

/// Receives the save requests issued by section containers.
pub trait SectionPersister {
    fn persist(&mut self, request: &SaveRequest) -> SaveOutcome;
}

/// Persists a section by rewriting its document in a [`DataStore`].
pub struct StorePersister<'a, S: DataStore> {
    store: &'a mut S,
    scope: Scope,
}

impl<'a, S: DataStore> StorePersister<'a, S> {
    pub fn new(store: &'a mut S, scope: Scope) -> Self {
        Self { store, scope }
    }

    fn write(&mut self, request: &SaveRequest) -> Result<()> {
        let mut doc = self.store.get_document(&request.document_id, self.scope)?;
        let section = doc
            .section_mut(&request.section_id)
            .ok_or_else(|| LeetdocError::SectionNotFound(request.section_id.clone()))?;
        section.set_content(request.content.clone())?;
        doc.touch_saved();
        self.store.save_document(&doc, self.scope)
    }
}

impl<S: DataStore> SectionPersister for StorePersister<'_, S> {
    fn persist(&mut self, request: &SaveRequest) -> SaveOutcome {
        debug!(document = %request.document_id, section = %request.section_id, "persisting section");
        self.write(request).map_err(|e| {
            warn!(section = %request.section_id, error = %e, "persisting section failed");
            LeetdocError::Persistence(e.to_string()).to_string()
        })
    }
}
