use crate::commands::CmdResult;
use crate::error::Result;
use crate::model::Scope;
use crate::store::DataStore;

use super::helpers::indexed_documents;

pub fn run<S: DataStore>(store: &S, scope: Scope) -> Result<CmdResult> {
    let listed = indexed_documents(store, scope)?;
    Ok(CmdResult::default().with_listed_documents(listed))
}
