//! Section authoring on an in-memory [`Document`].
//!
//! Every mutation that changes the sequence renumbers `order` to `0..n` in
//! rendering order, so orders stay contiguous and unique after any edit.

use crate::commands::CmdMessage;
use crate::container::{AddPosition, SectionIntent, SectionNotification};
use crate::error::{LeetdocError, Result};
use crate::model::{new_id, Document, Section, SectionType};

/// Puts sections in rendering order and renumbers them from zero.
pub fn renumber(doc: &mut Document) {
    doc.sections.sort_by_key(|s| s.order);
    for (i, section) in doc.sections.iter_mut().enumerate() {
        section.order = i as i64;
    }
}

fn index_of(doc: &Document, id: &str) -> Result<usize> {
    doc.sections
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| LeetdocError::SectionNotFound(id.to_string()))
}

pub fn default_title(section_type: SectionType) -> String {
    match section_type {
        SectionType::Text => "New text section",
        SectionType::Drawing => "New drawing",
        SectionType::Plot => "New plot",
        SectionType::SystemDescription => "New system description",
    }
    .to_string()
}

/// Adds an unpopulated section and returns its id.
///
/// Without an anchor the section goes last.
pub fn add_section(
    doc: &mut Document,
    section_type: SectionType,
    title: Option<String>,
    anchor: Option<(&str, AddPosition)>,
) -> Result<String> {
    renumber(doc);
    let at = match anchor {
        Some((id, AddPosition::Before)) => index_of(doc, id)?,
        Some((id, AddPosition::After)) => index_of(doc, id)? + 1,
        None => doc.sections.len(),
    };
    let id = new_id();
    let title = title.unwrap_or_else(|| default_title(section_type));
    doc.sections
        .insert(at, Section::new(id.clone(), title, at as i64, section_type));
    renumber_in_place(doc);
    Ok(id)
}

pub fn delete_section(doc: &mut Document, id: &str) -> Result<Section> {
    let idx = index_of(doc, id)?;
    let removed = doc.sections.remove(idx);
    renumber(doc);
    Ok(removed)
}

/// Swaps a section with its predecessor. Returns false if it is already first.
pub fn move_up(doc: &mut Document, id: &str) -> Result<bool> {
    renumber(doc);
    let idx = index_of(doc, id)?;
    if idx == 0 {
        return Ok(false);
    }
    doc.sections.swap(idx - 1, idx);
    renumber_in_place(doc);
    Ok(true)
}

/// Swaps a section with its successor. Returns false if it is already last.
pub fn move_down(doc: &mut Document, id: &str) -> Result<bool> {
    renumber(doc);
    let idx = index_of(doc, id)?;
    if idx + 1 >= doc.sections.len() {
        return Ok(false);
    }
    doc.sections.swap(idx, idx + 1);
    renumber_in_place(doc);
    Ok(true)
}

fn renumber_in_place(doc: &mut Document) {
    for (i, section) in doc.sections.iter_mut().enumerate() {
        section.order = i as i64;
    }
}

pub fn rename_section(doc: &mut Document, id: &str, title: &str) -> Result<()> {
    let section = doc
        .section_mut(id)
        .ok_or_else(|| LeetdocError::SectionNotFound(id.to_string()))?;
    section.title = title.to_string();
    Ok(())
}

/// Applies one forwarded container notification to the document.
pub fn apply_notification(doc: &mut Document, note: &SectionNotification) -> Result<CmdMessage> {
    let id = note.section_id.as_str();
    let message = match &note.intent {
        SectionIntent::Delete => {
            let removed = delete_section(doc, id)?;
            CmdMessage::success(format!("Section deleted: {}", removed.title))
        }
        SectionIntent::MoveUp => {
            if move_up(doc, id)? {
                CmdMessage::success(format!("Section moved up: {}", title_of(doc, id)))
            } else {
                CmdMessage::info(format!("Already first: {}", title_of(doc, id)))
            }
        }
        SectionIntent::MoveDown => {
            if move_down(doc, id)? {
                CmdMessage::success(format!("Section moved down: {}", title_of(doc, id)))
            } else {
                CmdMessage::info(format!("Already last: {}", title_of(doc, id)))
            }
        }
        SectionIntent::TitleChange(title) => {
            rename_section(doc, id, title)?;
            CmdMessage::success(format!("Section renamed: {}", title))
        }
        SectionIntent::AddSection {
            position,
            section_type,
        } => {
            let new_id = add_section(doc, *section_type, None, Some((id, *position)))?;
            CmdMessage::success(format!("Section added: {}", title_of(doc, &new_id)))
        }
    };
    Ok(message)
}

fn title_of(doc: &Document, id: &str) -> String {
    doc.section(id).map(|s| s.title.clone()).unwrap_or_default()
}
