use crate::error::Result;
use crate::index::{index_documents, select, DisplayDocument, DocSelector};
use crate::model::{Document, Scope};
use crate::store::DataStore;

pub fn indexed_documents<S: DataStore>(store: &S, scope: Scope) -> Result<Vec<DisplayDocument>> {
    Ok(index_documents(store.list_documents(scope)?))
}

/// Resolves a selector against the current listing and loads the document.
pub fn load_document<S: DataStore>(
    store: &S,
    scope: Scope,
    selector: &DocSelector,
) -> Result<Document> {
    let listed = indexed_documents(store, scope)?;
    let id = select(&listed, selector)?.summary.metadata.id.clone();
    store.get_document(&id, scope)
}

/// Resolves every selector before loading any document, so a bad selector
/// fails the whole batch.
pub fn load_documents<S: DataStore>(
    store: &S,
    scope: Scope,
    selectors: &[DocSelector],
) -> Result<Vec<Document>> {
    let listed = indexed_documents(store, scope)?;
    let ids = selectors
        .iter()
        .map(|sel| select(&listed, sel).map(|d| d.summary.metadata.id.clone()))
        .collect::<Result<Vec<_>>>()?;
    ids.iter().map(|id| store.get_document(id, scope)).collect()
}
