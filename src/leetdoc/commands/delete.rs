use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::DocSelector;
use crate::model::Scope;
use crate::store::DataStore;

use super::helpers::load_documents;

/// Removes documents permanently.
pub fn run<S: DataStore>(store: &mut S, scope: Scope, selectors: &[DocSelector]) -> Result<CmdResult> {
    let docs = load_documents(store, scope, selectors)?;
    let mut result = CmdResult::default();

    for doc in docs {
        store.delete_document(doc.id(), scope)?;
        result.add_message(CmdMessage::success(format!("Document deleted: {}", doc.title)));
        result.affected_documents.push(doc);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::list;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn deletes_selected_documents() {
        let mut fixture = StoreFixture::new().with_documents(3, Scope::Project);
        run(
            &mut fixture.store,
            Scope::Project,
            &[DocSelector::Index(1), DocSelector::Index(3)],
        )
        .unwrap();
        let left = list::run(&fixture.store, Scope::Project).unwrap();
        assert_eq!(left.listed_documents.len(), 1);
    }
}
