use crate::error::{LeetdocError, Result};
use crate::mode::{ContentSource, EditComponent, ElementHandle, Focusable, ModeComponent};
use crate::model::{SectionContent, SectionType};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_BUFFER: AtomicU64 = AtomicU64::new(1);

/// Hands a buffer to an editor and returns what came back.
/// Arguments are the initial buffer and the file extension to use.
pub type Launcher = fn(&str, &str) -> Result<String>;

/// Serializes section content into what the user edits: the raw string for
/// text and system descriptions, pretty JSON for drawings and plots.
pub fn to_buffer(content: Option<&SectionContent>) -> Result<String> {
    Ok(match content {
        None => String::new(),
        Some(SectionContent::Text(s)) | Some(SectionContent::SystemDescription(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(&other.to_json())?,
    })
}

/// Parses an edited buffer back into content of `section_type`.
///
/// A blank buffer means "no content" when there was none before, so opening
/// and closing the editor on an empty section leaves it empty.
pub fn from_buffer(
    section_type: SectionType,
    buffer: &str,
    previous: Option<&SectionContent>,
) -> Result<Option<SectionContent>> {
    if buffer.trim().is_empty() && previous.is_none() {
        return Ok(None);
    }
    match section_type {
        SectionType::Text => Ok(Some(SectionContent::Text(strip_final_newline(buffer)))),
        SectionType::SystemDescription => Ok(Some(SectionContent::SystemDescription(
            strip_final_newline(buffer),
        ))),
        SectionType::Drawing | SectionType::Plot => {
            if buffer.trim().is_empty() {
                return Ok(None);
            }
            let value: Value = serde_json::from_str(buffer)?;
            SectionContent::from_json(section_type, value)
        }
    }
}

// Editors append a newline on save
fn strip_final_newline(buffer: &str) -> String {
    buffer
        .strip_suffix('\n')
        .map(|b| b.strip_suffix('\r').unwrap_or(b))
        .unwrap_or(buffer)
        .to_string()
}

pub fn file_extension(section_type: SectionType) -> &'static str {
    match section_type {
        SectionType::Text => ".html",
        SectionType::SystemDescription => ".txt",
        SectionType::Drawing | SectionType::Plot => ".json",
    }
}

/// Gets the editor command from environment.
/// Checks $EDITOR, then $VISUAL, then falls back to common editors.
pub fn get_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for fallback in ["vim", "vi", "nano"] {
        if Command::new("which")
            .arg(fallback)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Ok(fallback.to_string());
        }
    }

    Err(LeetdocError::Api(
        "No editor found. Set $EDITOR environment variable.".to_string(),
    ))
}

/// Opens a file in the user's editor and waits for it to close.
/// Returns the contents of the file after editing.
pub fn open_in_editor<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let editor = get_editor()?;
    let path = file_path.as_ref();

    // $EDITOR may carry arguments, e.g. "code --wait"
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| LeetdocError::Api(format!("Failed to launch editor '{}': {}", editor, e)))?;

    if !status.success() {
        return Err(LeetdocError::Api(format!(
            "Editor '{}' exited with non-zero status",
            editor
        )));
    }

    Ok(fs::read_to_string(path)?)
}

/// Default [`Launcher`]: round-trips the buffer through a temp file.
pub fn edit_buffer(initial: &str, file_extension: &str) -> Result<String> {
    let temp_file = env::temp_dir().join(format!(
        "leetdoc_edit_{}_{}{}",
        std::process::id(),
        NEXT_BUFFER.fetch_add(1, Ordering::Relaxed),
        file_extension
    ));
    fs::write(&temp_file, initial)?;
    let result = open_in_editor(&temp_file);
    let _ = fs::remove_file(&temp_file);
    result
}

/// Edit component that hands the section to an external editor on focus.
pub struct ExternalEditor {
    element: ElementHandle,
    section_type: SectionType,
    original: Option<SectionContent>,
    draft: Option<SectionContent>,
    last_error: Option<String>,
    launcher: Launcher,
    destroyed: bool,
}

impl ExternalEditor {
    pub fn new(
        section_id: &str,
        section_type: SectionType,
        content: Option<&SectionContent>,
        launcher: Launcher,
    ) -> Self {
        Self {
            element: ElementHandle::new(format!("editor:{}", section_id)),
            section_type,
            original: content.cloned(),
            draft: content.cloned(),
            last_error: None,
            launcher,
            destroyed: false,
        }
    }

    /// The draft differs from what the editor was opened with.
    pub fn is_dirty(&self) -> bool {
        self.draft != self.original
    }

    fn round_trip(&mut self) -> Result<Option<SectionContent>> {
        let buffer = to_buffer(self.draft.as_ref())?;
        let edited = (self.launcher)(&buffer, file_extension(self.section_type))?;
        from_buffer(self.section_type, &edited, self.draft.as_ref())
    }
}

impl ModeComponent for ExternalEditor {
    fn element(&self) -> &ElementHandle {
        &self.element
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            debug!(element = self.element.id(), "editor released");
        }
    }

    fn should_exit_fullscreen(&self) -> bool {
        !self.is_dirty()
    }
}

impl ContentSource for ExternalEditor {
    fn get_content(&self) -> Option<SectionContent> {
        self.draft.clone()
    }
}

impl Focusable for ExternalEditor {
    fn focus(&mut self) {
        if self.destroyed {
            return;
        }
        match self.round_trip() {
            Ok(draft) => {
                self.draft = draft;
                self.last_error = None;
            }
            Err(e) => {
                warn!(element = self.element.id(), error = %e, "edited buffer discarded");
                self.last_error = Some(e.to_string());
            }
        }
    }
}

impl EditComponent for ExternalEditor {
    fn content_source(&self) -> Option<&dyn ContentSource> {
        Some(self)
    }

    fn focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(buffer: &str, _ext: &str) -> Result<String> {
        Ok(format!("{}\n", buffer))
    }

    fn write_hello(_buffer: &str, ext: &str) -> Result<String> {
        assert_eq!(ext, ".html");
        Ok("<p>hello</p>\n".to_string())
    }

    fn write_scene(_buffer: &str, _ext: &str) -> Result<String> {
        Ok(json!({"format": "excalidraw/json", "data": {"elements": [{"id": "r1"}], "appState": {}}})
            .to_string())
    }

    fn write_garbage(_buffer: &str, _ext: &str) -> Result<String> {
        Ok("{ not json".to_string())
    }

    fn editor_gone(_buffer: &str, _ext: &str) -> Result<String> {
        Err(LeetdocError::Api("Editor 'vi' exited with non-zero status".into()))
    }

    #[test]
    fn blank_buffer_keeps_absent_content_absent() {
        assert_eq!(from_buffer(SectionType::Text, "\n", None).unwrap(), None);
        assert_eq!(
            from_buffer(
                SectionType::Text,
                "",
                Some(&SectionContent::Text("x".into()))
            )
            .unwrap(),
            Some(SectionContent::Text(String::new()))
        );
    }

    #[test]
    fn structured_types_edit_as_json() {
        let plot = SectionContent::from_json(
            SectionType::Plot,
            json!({"format": "vega-lite", "data": {"mark": "bar"}}),
        )
        .unwrap();
        let buffer = to_buffer(plot.as_ref()).unwrap();
        assert!(buffer.contains("\"vega-lite\""));
        assert_eq!(
            from_buffer(SectionType::Plot, &buffer, plot.as_ref()).unwrap(),
            plot
        );
    }

    #[test]
    fn unchanged_round_trip_is_not_dirty() {
        let content = SectionContent::SystemDescription("a -> b".into());
        let mut editor = ExternalEditor::new("s1", SectionType::SystemDescription, Some(&content), echo);
        editor.focus();
        assert!(!editor.is_dirty());
        assert!(editor.should_exit_fullscreen());
        assert_eq!(editor.get_content(), Some(content));
    }

    #[test]
    fn edit_marks_dirty_and_blocks_fullscreen_exit() {
        let mut editor = ExternalEditor::new("s1", SectionType::Text, None, write_hello);
        editor.focus();
        assert!(editor.is_dirty());
        assert!(!editor.should_exit_fullscreen());
        assert_eq!(
            editor.get_content(),
            Some(SectionContent::Text("<p>hello</p>".into()))
        );
    }

    #[test]
    fn drawing_edit_parses_scene() {
        let mut editor = ExternalEditor::new("d1", SectionType::Drawing, None, write_scene);
        editor.focus();
        match editor.get_content() {
            Some(SectionContent::Drawing(d)) => assert_eq!(d.data.elements.len(), 1),
            other => panic!("unexpected draft: {:?}", other),
        }
    }

    #[test]
    fn invalid_json_keeps_previous_draft() {
        let mut editor = ExternalEditor::new("d1", SectionType::Drawing, None, write_garbage);
        editor.focus();
        assert_eq!(editor.get_content(), None);
        assert!(editor.last_error().is_some());
    }

    #[test]
    fn failed_launch_is_recorded() {
        let mut editor = ExternalEditor::new("t1", SectionType::Text, None, editor_gone);
        editor.focus();
        assert!(editor.last_error().unwrap().contains("non-zero"));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn destroyed_editor_ignores_focus() {
        let mut editor = ExternalEditor::new("t1", SectionType::Text, None, write_hello);
        editor.destroy();
        editor.destroy();
        editor.focus();
        assert_eq!(editor.get_content(), None);
    }

    #[test]
    fn exposes_capabilities() {
        let mut editor = ExternalEditor::new("t1", SectionType::Text, None, echo);
        assert!(editor.content_source().is_some());
        assert!(editor.focusable().is_some());
    }
}
