//! Interactive editing of one section.
//!
//! Opens a [`DocumentSession`] on the document, switches the section into
//! edit mode and focuses the editor (for the terminal host that runs
//! `$EDITOR`). A changed draft is saved through a [`StorePersister`]; an
//! unchanged one is cancelled.

use crate::commands::{CmdMessage, CmdResult};
use crate::config::LeetdocConfig;
use crate::container::SaveResolution;
use crate::error::Result;
use crate::index::{DocSelector, SectionSelector};
use crate::mode::ComponentHost;
use crate::model::Scope;
use crate::session::DocumentSession;
use crate::store::{DataStore, StorePersister};
use tracing::{debug, warn};

use super::helpers::load_document;

pub fn run<S: DataStore>(
    store: &mut S,
    scope: Scope,
    config: LeetdocConfig,
    doc_sel: &DocSelector,
    section_sel: &SectionSelector,
    host: Box<dyn ComponentHost>,
) -> Result<CmdResult> {
    let doc = load_document(store, scope, doc_sel)?;
    let section_id = section_sel.resolve(&doc)?;
    let title = doc
        .section(&section_id)
        .map(|s| s.title.clone())
        .unwrap_or_default();
    let original = doc
        .section(&section_id)
        .and_then(|s| s.content())
        .cloned();

    let mut session = DocumentSession::open(doc, host, config)?;
    session.begin_edit(&section_id)?;
    if !session.focus(&section_id)? {
        warn!(section = %section_id, "editor cannot take focus");
    }
    let draft = session.draft(&section_id)?;

    let mut result = CmdResult::default();
    if let Some(reason) = session.edit_error(&section_id)? {
        warn!(section = %section_id, error = %reason, "edit discarded");
        session.cancel(&section_id)?;
        result.add_message(CmdMessage::error(format!(
            "Edit of {} discarded: {}",
            title, reason
        )));
    } else if draft == original {
        debug!(section = %section_id, "draft unchanged");
        session.cancel(&section_id)?;
        result.add_message(CmdMessage::info(format!("No changes to {}", title)));
    } else {
        let mut persister = StorePersister::new(store, scope);
        match session.save_with(&section_id, draft, &mut persister)? {
            SaveResolution::Committed(_) => {
                result.add_message(CmdMessage::success(format!("Section saved: {}", title)));
            }
            SaveResolution::Rejected(reason) => {
                result.add_message(CmdMessage::error(format!(
                    "Could not save {}: {}",
                    title, reason
                )));
                session.cancel(&section_id)?;
            }
        }
    }

    result.affected_documents.push(session.into_document()?);
    Ok(result)
}
