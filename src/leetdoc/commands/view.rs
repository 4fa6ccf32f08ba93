use crate::commands::CmdResult;
use crate::config::LeetdocConfig;
use crate::error::Result;
use crate::index::DocSelector;
use crate::model::{Document, Scope};
use crate::session::DocumentSession;
use crate::store::DataStore;
use crate::terminal::TerminalHost;

use super::helpers::load_documents;

pub fn run<S: DataStore>(store: &S, scope: Scope, selectors: &[DocSelector]) -> Result<CmdResult> {
    let docs = load_documents(store, scope, selectors)?;
    Ok(CmdResult::default().with_affected_documents(docs))
}

/// Mounts every section of `doc` on a terminal host and returns the screen.
pub fn render(doc: Document, config: LeetdocConfig) -> Result<Vec<String>> {
    let host = TerminalHost::new();
    let mut session = DocumentSession::open(doc, Box::new(host.clone()), config)?;
    let lines = host.lines();
    session.close()?;
    Ok(lines)
}
