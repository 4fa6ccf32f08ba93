//! Terminal rendition of the mode component protocol.
//!
//! [`TerminalHost`] keeps a "screen": the attached elements, each with the
//! section order it belongs at and the lines it renders. Views are plain text; editing goes through
//! [`ExternalEditor`].

use crate::editor::{edit_buffer, ExternalEditor, Launcher};
use crate::error::Result;
use crate::mode::{ComponentHost, EditComponent, ElementHandle, ModeComponent, ViewComponent};
use crate::model::{SectionContent, SectionData};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Lines a section shows when viewed.
pub fn render_section(data: &SectionData, content: Option<&SectionContent>) -> Vec<String> {
    let mut lines = vec![format!("## {} [{}]", data.title, data.section_type)];
    match content {
        None => lines.push("(empty)".to_string()),
        Some(SectionContent::Text(text)) | Some(SectionContent::SystemDescription(text)) => {
            if text.is_empty() {
                lines.push(String::new());
            }
            lines.extend(text.lines().map(str::to_string));
        }
        Some(SectionContent::Drawing(drawing)) => lines.push(format!(
            "{} scene, {} element(s)",
            drawing.format,
            drawing.data.elements.len()
        )),
        Some(SectionContent::Plot(plot)) => {
            let keys: Vec<&str> = plot.data.keys().map(String::as_str).collect();
            lines.push(format!("{} plot: {}", plot.format, keys.join(", ")));
        }
    }
    lines
}

pub struct TextView {
    element: ElementHandle,
}

impl ModeComponent for TextView {
    fn element(&self) -> &ElementHandle {
        &self.element
    }

    // Plain lines hold no listeners
    fn destroy(&mut self) {}

    fn should_exit_fullscreen(&self) -> bool {
        true
    }
}

impl ViewComponent for TextView {}

#[derive(Default)]
struct Screen {
    rendered: HashMap<u64, (i64, Vec<String>)>,
    attached: Vec<(String, u64)>,
}

/// Host for the CLI. Clones share one screen.
#[derive(Clone)]
pub struct TerminalHost {
    screen: Rc<RefCell<Screen>>,
    launcher: Launcher,
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::with_launcher(edit_buffer)
    }

    pub fn with_launcher(launcher: Launcher) -> Self {
        Self {
            screen: Rc::new(RefCell::new(Screen::default())),
            launcher,
        }
    }

    /// Everything currently attached, in section order.
    pub fn lines(&self) -> Vec<String> {
        let screen = self.screen.borrow();
        let mut shown: Vec<&(i64, Vec<String>)> = screen
            .attached
            .iter()
            .filter_map(|(_, element)| screen.rendered.get(element))
            .collect();
        shown.sort_by_key(|(order, _)| *order);
        shown
            .into_iter()
            .flat_map(|(_, lines)| lines.iter().cloned())
            .collect()
    }

    pub fn attached_count(&self) -> usize {
        self.screen.borrow().attached.len()
    }
}

impl ComponentHost for TerminalHost {
    fn create_view(
        &mut self,
        data: &SectionData,
        content: Option<&SectionContent>,
    ) -> Result<Box<dyn ViewComponent>> {
        let element = ElementHandle::new(format!("view:{}", data.id));
        self.screen
            .borrow_mut()
            .rendered
            .insert(element.id(), (data.order, render_section(data, content)));
        Ok(Box::new(TextView { element }))
    }

    fn create_edit(
        &mut self,
        data: &SectionData,
        content: Option<&SectionContent>,
    ) -> Result<Box<dyn EditComponent>> {
        let editor = ExternalEditor::new(&data.id, data.section_type, content, self.launcher);
        self.screen.borrow_mut().rendered.insert(
            editor.element().id(),
            (
                data.order,
                vec![format!("## {} [{}] (editing)", data.title, data.section_type)],
            ),
        );
        Ok(Box::new(editor))
    }

    fn attach(&mut self, section_id: &str, element: &ElementHandle) {
        debug!(section = %section_id, element = element.id(), label = element.label(), "attach");
        self.screen
            .borrow_mut()
            .attached
            .push((section_id.to_string(), element.id()));
    }

    fn detach(&mut self, section_id: &str, element: &ElementHandle) {
        debug!(section = %section_id, element = element.id(), "detach");
        let mut screen = self.screen.borrow_mut();
        screen.attached.retain(|(_, id)| *id != element.id());
        screen.rendered.remove(&element.id());
    }
}
