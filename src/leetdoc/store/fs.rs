use super::{DataStore, DocumentSummary};
use crate::error::{LeetdocError, Result};
use crate::model::{Document, Scope};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const INDEX_FILENAME: &str = "data.json";

pub struct FileStore {
    project_root: Option<PathBuf>,
    global_root: PathBuf,
}

impl FileStore {
    pub fn new(project_root: Option<PathBuf>, global_root: PathBuf) -> Self {
        Self {
            project_root,
            global_root,
        }
    }

    fn doc_filename(id: &str) -> String {
        format!("doc-{}.json", id)
    }

    fn get_store_path(&self, scope: Scope) -> Result<PathBuf> {
        let root = match scope {
            Scope::Project => self.project_root.as_ref().ok_or_else(|| {
                LeetdocError::Store("No project scope available".to_string())
            })?,
            Scope::Global => &self.global_root,
        };
        Ok(root.clone())
    }

    fn load_index(&self, store_path: &Path) -> Result<HashMap<String, DocumentSummary>> {
        let index_file = store_path.join(INDEX_FILENAME);
        if !index_file.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(index_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_index(&self, store_path: &Path, index: &HashMap<String, DocumentSummary>) -> Result<()> {
        let content = serde_json::to_string_pretty(index)?;
        fs::write(store_path.join(INDEX_FILENAME), content)?;
        Ok(())
    }
}

impl DataStore for FileStore {
    fn save_document(&mut self, doc: &Document, scope: Scope) -> Result<()> {
        doc.validate()?;
        let root = self.get_store_path(scope)?;
        fs::create_dir_all(&root)?;

        // Document first, so the index never points at a file that is not there
        let path = root.join(Self::doc_filename(doc.id()));
        fs::write(&path, doc.to_json()?)?;

        let mut index = self.load_index(&root)?;
        index.insert(doc.metadata.id.clone(), DocumentSummary::from(doc));
        self.save_index(&root, &index)?;

        debug!(document = %doc.id(), path = %path.display(), "document written");
        Ok(())
    }

    fn get_document(&self, id: &str, scope: Scope) -> Result<Document> {
        let root = self.get_store_path(scope)?;
        let path = root.join(Self::doc_filename(id));
        if !path.exists() {
            return Err(LeetdocError::DocumentNotFound(id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        let doc = Document::from_json(&raw)?;
        debug!(document = %id, "document read");
        Ok(doc)
    }

    fn list_documents(&self, scope: Scope) -> Result<Vec<DocumentSummary>> {
        let root = self.get_store_path(scope)?;
        if !root.exists() {
            return Ok(Vec::new());
        }
        Ok(self.load_index(&root)?.into_values().collect())
    }

    fn delete_document(&mut self, id: &str, scope: Scope) -> Result<()> {
        let root = self.get_store_path(scope)?;

        let mut index = self.load_index(&root)?;
        if index.remove(id).is_none() {
            return Err(LeetdocError::DocumentNotFound(id.to_string()));
        }
        self.save_index(&root, &index)?;

        let path = root.join(Self::doc_filename(id));
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn document_path(&self, id: &str, scope: Scope) -> Result<PathBuf> {
        Ok(self.get_store_path(scope)?.join(Self::doc_filename(id)))
    }
}
