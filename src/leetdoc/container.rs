//! # Section Container
//!
//! A [`SectionContainer`] owns the single mode component of one section and
//! moves it between viewing and editing:
//!
//! ```text
//!            begin_edit                      request_save
//!  Viewing ─────────────▶ Editing ─────────────────────────▶ Editing (save pending)
//!     ▲                    │   ▲                                    │
//!     │       cancel       │   │          resolve_save: Rejected    │
//!     └────────────────────┘   └────────────────────────────────────┤
//!     ▲                                                             │
//!     └──────────────── leave_edit ◀── resolve_save: Committed ─────┘
//! ```
//!
//! Every swap goes through `Transitioning`: the old component is detached and
//! destroyed before the new one is attached, so the host never sees two
//! components for one section. The replacement is built *before* the swap
//! starts; if building fails the old component stays in place.
//!
//! A pending save is a critical section. While one is outstanding the
//! container rejects another save, a cancel, and a forwarded delete with
//! [`LeetdocError::SaveInFlight`].
//!
//! The container never touches the document. It reports what was saved and
//! [`crate::session::DocumentSession`] writes it.

use crate::error::{LeetdocError, Result};
use crate::mode::{ComponentHost, EditComponent, ElementHandle, ViewComponent};
use crate::model::{SectionContent, SectionData, SectionType};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Viewing,
    Editing,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveTicket(u64);

impl SaveTicket {
    fn next() -> Self {
        SaveTicket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(value: u64) -> Self {
        SaveTicket(value)
    }
}

/// Outbound half of a save: what the persistence collaborator must store.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub ticket: SaveTicket,
    pub document_id: String,
    pub section_id: String,
    pub content: Option<SectionContent>,
}

/// Inbound half of a save: `Err` carries the collaborator's failure message.
pub type SaveOutcome = std::result::Result<(), String>;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Pending,
    Resolved,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveResolution {
    Committed(Option<SectionContent>),
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPosition {
    Before,
    After,
}

/// Authoring requests a container forwards upward untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionIntent {
    Delete,
    MoveUp,
    MoveDown,
    TitleChange(String),
    AddSection {
        position: AddPosition,
        section_type: SectionType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionNotification {
    pub section_id: String,
    pub intent: SectionIntent,
}

enum Mode {
    Viewing(Box<dyn ViewComponent>),
    Editing {
        component: Box<dyn EditComponent>,
        pending: Option<SaveRequest>,
    },
    Transitioning,
}

impl Mode {
    fn element(&self) -> Option<&ElementHandle> {
        match self {
            Mode::Viewing(view) => Some(view.element()),
            Mode::Editing { component, .. } => Some(component.element()),
            Mode::Transitioning => None,
        }
    }

    fn allows_fullscreen_exit(&self) -> bool {
        match self {
            Mode::Viewing(view) => view.should_exit_fullscreen(),
            Mode::Editing { component, .. } => component.should_exit_fullscreen(),
            Mode::Transitioning => false,
        }
    }
}

pub struct SectionContainer {
    data: SectionData,
    mode: Mode,
    fullscreen: bool,
    save_status: Option<SaveStatus>,
}

impl SectionContainer {
    /// Builds the view component for a section and attaches it.
    pub fn mount(
        data: SectionData,
        content: Option<&SectionContent>,
        host: &mut dyn ComponentHost,
    ) -> Result<Self> {
        let view = host.create_view(&data, content)?;
        host.attach(&data.id, view.element());
        debug!(section = %data.id, "mounted in view mode");
        Ok(Self {
            data,
            mode: Mode::Viewing(view),
            fullscreen: false,
            save_status: None,
        })
    }

    pub fn data(&self) -> &SectionData {
        &self.data
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// Takes new title, order and prompts. A view is rebuilt so it shows
    /// them; an editor keeps running and picks them up on the next mount.
    pub fn refresh(
        &mut self,
        data: SectionData,
        content: Option<&SectionContent>,
        host: &mut dyn ComponentHost,
    ) -> Result<()> {
        if data == self.data {
            return Ok(());
        }
        self.data = data;
        if let Mode::Viewing(_) = self.mode {
            let view = host.create_view(&self.data, content)?;
            self.swap(Mode::Viewing(view), host);
            debug!(section = %self.data.id, "view rebuilt");
        }
        Ok(())
    }

    pub fn state(&self) -> ContainerState {
        match self.mode {
            Mode::Viewing(_) => ContainerState::Viewing,
            Mode::Editing { .. } => ContainerState::Editing,
            Mode::Transitioning => ContainerState::Transitioning,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.save_status.as_ref()
    }

    pub fn pending_save(&self) -> Option<&SaveRequest> {
        match &self.mode {
            Mode::Editing { pending, .. } => pending.as_ref(),
            _ => None,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.pending_save().is_some()
    }

    /// Id of the element currently attached for this section.
    pub fn element_id(&self) -> Option<u64> {
        self.mode.element().map(ElementHandle::id)
    }

    pub fn begin_edit(
        &mut self,
        content: Option<&SectionContent>,
        host: &mut dyn ComponentHost,
    ) -> Result<()> {
        match self.mode {
            Mode::Viewing(_) => {}
            Mode::Editing { .. } => return Err(self.transition_error("already editing")),
            Mode::Transitioning => return Err(self.transition_error("transition in progress")),
        }
        let editor = host.create_edit(&self.data, content)?;
        self.swap(
            Mode::Editing {
                component: editor,
                pending: None,
            },
            host,
        );
        self.save_status = None;
        if self.data.edits_in_fullscreen() {
            self.fullscreen = true;
        }
        debug!(section = %self.data.id, fullscreen = self.fullscreen, "entered edit mode");
        Ok(())
    }

    /// Current draft, through the editor's content-source capability.
    pub fn draft(&self) -> Result<Option<SectionContent>> {
        match &self.mode {
            Mode::Editing { component, .. } => component
                .content_source()
                .map(|source| source.get_content())
                .ok_or_else(|| self.missing("content source")),
            _ => Err(self.transition_error("not editing")),
        }
    }

    /// Error the editor recorded for input it could not accept.
    pub fn edit_error(&self) -> Option<String> {
        match &self.mode {
            Mode::Editing { component, .. } => component.last_error().map(str::to_string),
            _ => None,
        }
    }

    /// Moves focus to the editor. Returns whether the editor could take it.
    pub fn focus(&mut self) -> bool {
        match &mut self.mode {
            Mode::Editing { component, .. } => match component.focusable() {
                Some(target) => {
                    target.focus();
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Starts a save with the given content. The editor stays mounted until
    /// [`SectionContainer::resolve_save`] receives the outcome.
    pub fn request_save(
        &mut self,
        document_id: &str,
        content: Option<SectionContent>,
    ) -> Result<SaveRequest> {
        if let Some(c) = &content {
            c.ensure_type(self.data.section_type)?;
        }
        let section_id = self.data.id.clone();
        match &mut self.mode {
            Mode::Editing { pending, .. } => {
                if pending.is_some() {
                    return Err(LeetdocError::SaveInFlight(section_id));
                }
                let request = SaveRequest {
                    ticket: SaveTicket::next(),
                    document_id: document_id.to_string(),
                    section_id,
                    content,
                };
                *pending = Some(request.clone());
                self.save_status = Some(SaveStatus::Pending);
                debug!(section = %request.section_id, ticket = request.ticket.value(), "save requested");
                Ok(request)
            }
            _ => Err(LeetdocError::InvalidTransition {
                section_id,
                reason: "save requested outside edit mode".to_string(),
            }),
        }
    }

    /// Same as [`SectionContainer::request_save`] with the editor's own draft.
    pub fn request_save_current(&mut self, document_id: &str) -> Result<SaveRequest> {
        if self.is_saving() {
            return Err(LeetdocError::SaveInFlight(self.data.id.clone()));
        }
        let draft = self.draft()?;
        self.request_save(document_id, draft)
    }

    /// Records the terminal outcome of a pending save.
    ///
    /// On rejection the editor stays mounted with its draft. On success the
    /// caller stores the content and then calls [`SectionContainer::leave_edit`].
    pub fn resolve_save(&mut self, ticket: SaveTicket, outcome: SaveOutcome) -> Result<SaveResolution> {
        let request = match &mut self.mode {
            Mode::Editing { pending, .. }
                if pending.as_ref().map(|r| r.ticket) == Some(ticket) =>
            {
                pending.take()
            }
            _ => None,
        }
        .ok_or(LeetdocError::UnknownSaveTicket(ticket.value()))?;

        match outcome {
            Ok(()) => {
                debug!(section = %self.data.id, ticket = ticket.value(), "save resolved");
                self.save_status = Some(SaveStatus::Resolved);
                Ok(SaveResolution::Committed(request.content))
            }
            Err(message) => {
                tracing::warn!(section = %self.data.id, ticket = ticket.value(), %message, "save rejected");
                self.save_status = Some(SaveStatus::Rejected(message.clone()));
                Ok(SaveResolution::Rejected(message))
            }
        }
    }

    /// Discards the editor and its draft, returning to view mode.
    pub fn cancel(
        &mut self,
        content: Option<&SectionContent>,
        host: &mut dyn ComponentHost,
    ) -> Result<()> {
        if self.is_saving() {
            return Err(LeetdocError::SaveInFlight(self.data.id.clone()));
        }
        self.leave_edit(content, host)?;
        debug!(section = %self.data.id, "edit cancelled");
        Ok(())
    }

    /// Swaps the editor for a view of `content`.
    pub fn leave_edit(
        &mut self,
        content: Option<&SectionContent>,
        host: &mut dyn ComponentHost,
    ) -> Result<()> {
        match &self.mode {
            Mode::Editing { pending: None, .. } => {}
            Mode::Editing { .. } => return Err(LeetdocError::SaveInFlight(self.data.id.clone())),
            _ => return Err(self.transition_error("not editing")),
        }
        let view = host.create_view(&self.data, content)?;
        self.swap(Mode::Viewing(view), host);
        if self.fullscreen && self.data.edits_in_fullscreen() {
            self.exit_fullscreen();
        }
        debug!(section = %self.data.id, "returned to view mode");
        Ok(())
    }

    pub fn enter_fullscreen(&mut self) {
        self.fullscreen = true;
    }

    /// Leaves fullscreen if the active component allows it.
    ///
    /// Returns whether the section is out of fullscreen afterwards.
    pub fn exit_fullscreen(&mut self) -> bool {
        if !self.fullscreen {
            return true;
        }
        let allowed = self.mode.allows_fullscreen_exit();
        if allowed {
            self.fullscreen = false;
        } else {
            debug!(section = %self.data.id, "fullscreen exit refused by component");
        }
        allowed
    }

    /// Checks an authoring request and wraps it for the upstream collaborator.
    pub fn forward(&self, intent: SectionIntent) -> Result<SectionNotification> {
        if intent == SectionIntent::Delete && self.is_saving() {
            return Err(LeetdocError::SaveInFlight(self.data.id.clone()));
        }
        Ok(SectionNotification {
            section_id: self.data.id.clone(),
            intent,
        })
    }

    /// Detaches and destroys the active component.
    pub fn unmount(&mut self, host: &mut dyn ComponentHost) -> Result<()> {
        if self.is_saving() {
            return Err(LeetdocError::SaveInFlight(self.data.id.clone()));
        }
        self.swap(Mode::Transitioning, host);
        debug!(section = %self.data.id, "unmounted");
        Ok(())
    }

    /// Detaches and destroys the active component even while a save is
    /// pending. The pending save is abandoned.
    pub fn teardown(&mut self, host: &mut dyn ComponentHost) {
        self.swap(Mode::Transitioning, host);
        self.save_status = None;
    }

    fn swap(&mut self, next: Mode, host: &mut dyn ComponentHost) {
        let previous = std::mem::replace(&mut self.mode, Mode::Transitioning);
        match previous {
            Mode::Viewing(mut view) => {
                host.detach(&self.data.id, view.element());
                view.destroy();
            }
            Mode::Editing { mut component, .. } => {
                host.detach(&self.data.id, component.element());
                component.destroy();
            }
            Mode::Transitioning => {}
        }
        if let Some(element) = next.element() {
            host.attach(&self.data.id, element);
        }
        self.mode = next;
    }

    fn transition_error(&self, reason: &str) -> LeetdocError {
        LeetdocError::InvalidTransition {
            section_id: self.data.id.clone(),
            reason: reason.to_string(),
        }
    }

    fn missing(&self, capability: &'static str) -> LeetdocError {
        LeetdocError::MissingCapability {
            section_id: self.data.id.clone(),
            capability,
        }
    }
}

// No host is reachable here, so the element stays attached; owners detach
// through `unmount` or `teardown` first.
impl Drop for SectionContainer {
    fn drop(&mut self) {
        match &mut self.mode {
            Mode::Viewing(view) => view.destroy(),
            Mode::Editing { component, .. } => component.destroy(),
            Mode::Transitioning => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::fixtures::RecordingHost;
    use crate::mode::ModeKind;
    use crate::model::{DrawingContent, SceneData, Section, SectionPrompts};

    fn data(id: &str, ty: SectionType, fullscreen: Option<bool>) -> SectionData {
        let section = Section::new(id, "Title", 0, ty);
        let prompts = SectionPrompts {
            get_answer: "a".into(),
            verify_answer: "v".into(),
        };
        SectionData::for_section("doc", &section, &prompts, fullscreen)
    }

    fn mounted(host: &mut RecordingHost, ty: SectionType) -> SectionContainer {
        SectionContainer::mount(data("s1", ty, None), None, host).unwrap()
    }

    #[test]
    fn mount_attaches_one_view() {
        let mut host = RecordingHost::new();
        let container = mounted(&mut host, SectionType::Text);
        assert_eq!(container.state(), ContainerState::Viewing);
        assert_eq!(host.attached("s1").len(), 1);
        assert_eq!(host.created("s1", ModeKind::View), 1);
    }

    #[test]
    fn edit_swaps_components_without_overlap() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        let view_id = container.element_id().unwrap();

        container.begin_edit(None, &mut host).unwrap();
        assert_eq!(container.state(), ContainerState::Editing);
        assert_eq!(host.attached("s1").len(), 1);
        assert_ne!(container.element_id(), Some(view_id));
        assert_eq!(host.destroyed("s1"), 1);
        assert_eq!(host.max_attached(), 1);
    }

    #[test]
    fn begin_edit_twice_is_rejected() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        container.begin_edit(None, &mut host).unwrap();
        assert!(matches!(
            container.begin_edit(None, &mut host),
            Err(LeetdocError::InvalidTransition { .. })
        ));
        assert_eq!(host.created("s1", ModeKind::Edit), 1);
    }

    #[test]
    fn failed_editor_creation_keeps_view() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        host.fail_creates(true);
        assert!(container.begin_edit(None, &mut host).is_err());
        assert_eq!(container.state(), ContainerState::Viewing);
        assert_eq!(host.attached("s1").len(), 1);
        assert_eq!(host.destroyed("s1"), 0);
    }

    #[test]
    fn null_text_draft_is_none_not_error() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        container.begin_edit(None, &mut host).unwrap();
        assert_eq!(container.draft().unwrap(), None);
    }

    #[test]
    fn draft_without_capability_is_a_protocol_error() {
        let mut host = RecordingHost::new().without_content_source();
        let mut container = mounted(&mut host, SectionType::Text);
        container.begin_edit(None, &mut host).unwrap();
        assert!(matches!(
            container.draft(),
            Err(LeetdocError::MissingCapability { .. })
        ));
        assert!(container.request_save_current("doc").is_err());
    }

    #[test]
    fn second_save_while_pending_is_rejected() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        container.begin_edit(None, &mut host).unwrap();
        container
            .request_save("doc", Some(SectionContent::Text("a".into())))
            .unwrap();
        assert!(matches!(
            container.request_save("doc", Some(SectionContent::Text("b".into()))),
            Err(LeetdocError::SaveInFlight(_))
        ));
        assert!(matches!(
            container.cancel(None, &mut host),
            Err(LeetdocError::SaveInFlight(_))
        ));
        assert!(matches!(
            container.forward(SectionIntent::Delete),
            Err(LeetdocError::SaveInFlight(_))
        ));
        assert_eq!(container.state(), ContainerState::Editing);
        assert_eq!(container.save_status(), Some(&SaveStatus::Pending));
    }

    #[test]
    fn editor_survives_until_save_resolves() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Drawing);
        container.begin_edit(None, &mut host).unwrap();
        let content = SectionContent::Drawing(DrawingContent::excalidraw(SceneData::default()));
        let request = container.request_save("doc", Some(content.clone())).unwrap();
        assert_eq!(host.destroyed("s1"), 1);

        let resolution = container.resolve_save(request.ticket, Ok(())).unwrap();
        assert_eq!(resolution, SaveResolution::Committed(Some(content.clone())));
        assert_eq!(container.state(), ContainerState::Editing);

        container.leave_edit(Some(&content), &mut host).unwrap();
        assert_eq!(container.state(), ContainerState::Viewing);
        assert_eq!(host.destroyed("s1"), 2);
        assert_eq!(host.max_attached(), 1);
    }

    #[test]
    fn rejected_save_keeps_editor() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        container.begin_edit(None, &mut host).unwrap();
        let request = container
            .request_save("doc", Some(SectionContent::Text("x".into())))
            .unwrap();
        let resolution = container
            .resolve_save(request.ticket, Err("offline".into()))
            .unwrap();
        assert_eq!(resolution, SaveResolution::Rejected("offline".into()));
        assert_eq!(container.state(), ContainerState::Editing);
        assert_eq!(
            container.save_status(),
            Some(&SaveStatus::Rejected("offline".into()))
        );
        // A new save may start once the previous one finished.
        assert!(container.request_save_current("doc").is_ok());
    }

    #[test]
    fn stale_ticket_is_unknown() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        container.begin_edit(None, &mut host).unwrap();
        let request = container.request_save("doc", None).unwrap();
        container.resolve_save(request.ticket, Ok(())).unwrap();
        assert!(matches!(
            container.resolve_save(request.ticket, Ok(())),
            Err(LeetdocError::UnknownSaveTicket(_))
        ));
    }

    #[test]
    fn save_with_mismatched_content_is_refused() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Plot);
        container.begin_edit(None, &mut host).unwrap();
        let drawing = SectionContent::Drawing(DrawingContent::excalidraw(SceneData::default()));
        assert!(matches!(
            container.request_save("doc", Some(drawing)),
            Err(LeetdocError::ContentMismatch { .. })
        ));
        assert!(!container.is_saving());
    }

    #[test]
    fn save_outside_edit_mode_is_refused() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        assert!(matches!(
            container.request_save("doc", None),
            Err(LeetdocError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn fullscreen_exit_respects_component() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::SystemDescription);
        container.begin_edit(None, &mut host).unwrap();
        container.enter_fullscreen();

        host.block_fullscreen_exit("s1", true);
        for _ in 0..3 {
            assert!(!container.exit_fullscreen());
            assert!(container.is_fullscreen());
        }

        host.block_fullscreen_exit("s1", false);
        assert!(container.exit_fullscreen());
        assert!(!container.is_fullscreen());
    }

    #[test]
    fn fullscreen_sections_enter_on_edit() {
        let mut host = RecordingHost::new();
        let mut container = SectionContainer::mount(
            data("s1", SectionType::SystemDescription, Some(true)),
            None,
            &mut host,
        )
        .unwrap();
        container.begin_edit(None, &mut host).unwrap();
        assert!(container.is_fullscreen());

        container.cancel(None, &mut host).unwrap();
        assert!(!container.is_fullscreen());
    }

    #[test]
    fn leaving_edit_keeps_fullscreen_when_view_refuses() {
        let mut host = RecordingHost::new();
        let mut container = SectionContainer::mount(
            data("s1", SectionType::SystemDescription, Some(true)),
            None,
            &mut host,
        )
        .unwrap();
        container.begin_edit(None, &mut host).unwrap();
        host.block_fullscreen_exit("s1", true);
        container.cancel(None, &mut host).unwrap();
        assert_eq!(container.state(), ContainerState::Viewing);
        assert!(container.is_fullscreen());
    }

    #[test]
    fn focus_reports_capability() {
        let mut host = RecordingHost::new().without_focus();
        let mut container = mounted(&mut host, SectionType::Text);
        assert!(!container.focus());
        container.begin_edit(None, &mut host).unwrap();
        assert!(!container.focus());
    }

    #[test]
    fn forward_passes_intent_through() {
        let mut host = RecordingHost::new();
        let container = mounted(&mut host, SectionType::Text);
        let note = container
            .forward(SectionIntent::TitleChange("New".into()))
            .unwrap();
        assert_eq!(note.section_id, "s1");
        assert_eq!(note.intent, SectionIntent::TitleChange("New".into()));
    }

    #[test]
    fn unmount_and_drop_destroy_once() {
        let mut host = RecordingHost::new();
        let mut container = mounted(&mut host, SectionType::Text);
        container.unmount(&mut host).unwrap();
        assert!(host.attached("s1").is_empty());
        drop(container);
        assert_eq!(host.destroyed("s1"), 1);
    }

    #[test]
    fn drop_destroys_active_component() {
        let mut host = RecordingHost::new();
        let container = mounted(&mut host, SectionType::Text);
        drop(container);
        assert_eq!(host.destroyed("s1"), 1);
    }
}
