use crate::commands::{CmdMessage, CmdResult};
use crate::error::{LeetdocError, Result};
use crate::model::{Document, Scope};
use crate::store::DataStore;

/// Creates an empty document. Sections are added afterwards.
pub fn run<S: DataStore>(store: &mut S, scope: Scope, title: String) -> Result<CmdResult> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(LeetdocError::Api("Document title cannot be empty".to_string()));
    }
    let doc = Document::new(title);
    store.save_document(&doc, scope)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Document created: {} ({})",
        doc.title,
        doc.short_id()
    )));
    result.affected_documents.push(doc);
    Ok(result)
}
