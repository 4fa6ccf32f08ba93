use crate::commands::{CmdMessage, CmdResult};
use crate::error::{LeetdocError, Result};
use crate::index::DocSelector;
use crate::model::Scope;
use crate::store::DataStore;

use super::helpers::load_document;

/// Changes a document's title.
pub fn retitle<S: DataStore>(
    store: &mut S,
    scope: Scope,
    selector: &DocSelector,
    title: String,
) -> Result<CmdResult> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(LeetdocError::Api("Document title cannot be empty".to_string()));
    }
    let mut doc = load_document(store, scope, selector)?;
    let old = std::mem::replace(&mut doc.title, title);
    doc.touch_saved();
    store.save_document(&doc, scope)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Document retitled: {} -> {}",
        old, doc.title
    )));
    result.affected_documents.push(doc);
    Ok(result)
}
