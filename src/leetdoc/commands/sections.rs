//! Section authoring against a stored document.
//!
//! Each command loads the document, applies one mutation from
//! [`super::authoring`] and writes the whole document back.

use crate::commands::{CmdMessage, CmdResult};
use crate::container::{AddPosition, SectionIntent, SectionNotification};
use crate::error::Result;
use crate::index::{DocSelector, SectionSelector};
use crate::model::{Document, Scope, SectionType};
use crate::store::DataStore;

use super::authoring;
use super::helpers::load_document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

fn commit<S: DataStore>(store: &mut S, scope: Scope, mut doc: Document) -> Result<Document> {
    doc.touch_saved();
    store.save_document(&doc, scope)?;
    Ok(doc)
}

pub fn add<S: DataStore>(
    store: &mut S,
    scope: Scope,
    doc_sel: &DocSelector,
    section_type: SectionType,
    title: Option<String>,
    anchor: Option<(&SectionSelector, AddPosition)>,
) -> Result<CmdResult> {
    let mut doc = load_document(store, scope, doc_sel)?;
    let anchor_id = anchor.map(|(sel, _)| sel.resolve(&doc)).transpose()?;
    let anchor = anchor_id.as_deref().zip(anchor.map(|(_, pos)| pos));

    let id = authoring::add_section(&mut doc, section_type, title, anchor)?;
    let doc = commit(store, scope, doc)?;

    let mut result = CmdResult::default();
    if let (Some(section), Some(pos)) = (doc.section(&id), doc.position_of(&id)) {
        result.add_message(CmdMessage::success(format!(
            "Section added at {}: {} [{}]",
            pos + 1,
            section.title,
            section_type
        )));
    }
    result.affected_documents.push(doc);
    Ok(result)
}

/// Removes a section. Its content goes with it.
pub fn remove<S: DataStore>(
    store: &mut S,
    scope: Scope,
    doc_sel: &DocSelector,
    section_sel: &SectionSelector,
) -> Result<CmdResult> {
    let mut doc = load_document(store, scope, doc_sel)?;
    let id = section_sel.resolve(&doc)?;
    let removed = authoring::delete_section(&mut doc, &id)?;
    let doc = commit(store, scope, doc)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Section deleted: {}",
        removed.title
    )));
    result.affected_documents.push(doc);
    Ok(result)
}

pub fn shift<S: DataStore>(
    store: &mut S,
    scope: Scope,
    doc_sel: &DocSelector,
    section_sel: &SectionSelector,
    direction: Direction,
) -> Result<CmdResult> {
    let mut doc = load_document(store, scope, doc_sel)?;
    let id = section_sel.resolve(&doc)?;
    let intent = match direction {
        Direction::Up => SectionIntent::MoveUp,
        Direction::Down => SectionIntent::MoveDown,
    };
    let message = authoring::apply_notification(
        &mut doc,
        &SectionNotification {
            section_id: id,
            intent,
        },
    )?;
    let doc = commit(store, scope, doc)?;

    let mut result = CmdResult::default();
    result.add_message(message);
    result.affected_documents.push(doc);
    Ok(result)
}

pub fn rename<S: DataStore>(
    store: &mut S,
    scope: Scope,
    doc_sel: &DocSelector,
    section_sel: &SectionSelector,
    title: String,
) -> Result<CmdResult> {
    let mut doc = load_document(store, scope, doc_sel)?;
    let id = section_sel.resolve(&doc)?;
    authoring::rename_section(&mut doc, &id, title.trim())?;
    let doc = commit(store, scope, doc)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Section renamed: {}",
        title.trim()
    )));
    result.affected_documents.push(doc);
    Ok(result)
}
