use super::{DataStore, DocumentSummary};
use crate::error::{LeetdocError, Result};
use crate::model::{Document, Scope};
use std::collections::HashMap;
use std::path::PathBuf;

/// In-memory storage for testing and development.
/// Does NOT persist data.
#[derive(Default)]
pub struct InMemoryStore {
    docs: HashMap<(Scope, String), Document>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail, like an unreachable backend.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl DataStore for InMemoryStore {
    fn save_document(&mut self, doc: &Document, scope: Scope) -> Result<()> {
        if self.fail_writes {
            return Err(LeetdocError::Store("store is unavailable".to_string()));
        }
        self.docs
            .insert((scope, doc.metadata.id.clone()), doc.clone());
        Ok(())
    }

    fn get_document(&self, id: &str, scope: Scope) -> Result<Document> {
        self.docs
            .get(&(scope, id.to_string()))
            .cloned()
            .ok_or_else(|| LeetdocError::DocumentNotFound(id.to_string()))
    }

    fn list_documents(&self, scope: Scope) -> Result<Vec<DocumentSummary>> {
        Ok(self
            .docs
            .iter()
            .filter(|((s, _), _)| *s == scope)
            .map(|(_, d)| DocumentSummary::from(d))
            .collect())
    }

    fn delete_document(&mut self, id: &str, scope: Scope) -> Result<()> {
        if self.fail_writes {
            return Err(LeetdocError::Store("store is unavailable".to_string()));
        }
        if self.docs.remove(&(scope, id.to_string())).is_none() {
            return Err(LeetdocError::DocumentNotFound(id.to_string()));
        }
        Ok(())
    }

    fn document_path(&self, id: &str, _scope: Scope) -> Result<PathBuf> {
        Ok(PathBuf::from(format!("memory://doc-{}.json", id)))
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Section, SectionContent, SectionType};

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_documents(mut self, count: usize, scope: Scope) -> Self {
            for i in 0..count {
                let doc = Document::new(format!("Test Document {}", i + 1));
                self.store.save_document(&doc, scope).unwrap();
            }
            self
        }

        /// A document with one unpopulated section of every type, in type order.
        pub fn with_sample_document(mut self, title: &str, scope: Scope) -> Self {
            let mut doc = Document::new(title);
            for (order, ty) in SectionType::ALL.into_iter().enumerate() {
                doc.sections.push(Section::new(
                    format!("{}-{}", ty, order),
                    format!("{} section", ty),
                    order as i64,
                    ty,
                ));
            }
            self.store.save_document(&doc, scope).unwrap();
            self
        }

        pub fn with_text_document(mut self, title: &str, texts: &[&str], scope: Scope) -> Self {
            let mut doc = Document::new(title);
            for (order, text) in texts.iter().enumerate() {
                let section = Section::new(format!("t{}", order + 1), format!("Part {}", order + 1), order as i64, SectionType::Text)
                    .with_content(SectionContent::Text(text.to_string()))
                    .unwrap();
                doc.sections.push(section);
            }
            self.store.save_document(&doc, scope).unwrap();
            self
        }

        pub fn only_document(&self, scope: Scope) -> Document {
            let summaries = self.store.list_documents(scope).unwrap();
            assert_eq!(summaries.len(), 1, "fixture expected exactly one document");
            self.store
                .get_document(&summaries[0].metadata.id, scope)
                .unwrap()
        }
    }
}
