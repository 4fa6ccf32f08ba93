//! # Document Session
//!
//! A [`DocumentSession`] is the single writer of one open document. It holds
//! the [`Document`], one [`SectionContainer`] per section and the
//! [`ComponentHost`] the containers build their components with.
//!
//! Everything the containers report flows back through the session:
//!
//! - a committed save is written into the document (and stamps
//!   `lastSavedAt`) before the container swaps back to its view,
//! - authoring intents (delete, move, rename, add) queue up in the order they
//!   were raised, for the authoring collaborator to take with
//!   [`DocumentSession::drain_notifications`], or to apply in place with
//!   [`DocumentSession::apply_notifications`].
//!
//! After the section list changes, [`DocumentSession::sync`] reconciles the
//! containers with the document.

use crate::commands::authoring::apply_notification;
use crate::commands::CmdMessage;
use crate::config::LeetdocConfig;
use crate::container::{
    ContainerState, SaveOutcome, SaveRequest, SaveResolution, SaveTicket, SectionContainer,
    SectionIntent, SectionNotification,
};
use crate::error::{LeetdocError, Result};
use crate::mode::ComponentHost;
use crate::model::{Document, SectionContent};
use crate::store::SectionPersister;
use std::collections::VecDeque;
use tracing::{debug, warn};

pub struct DocumentSession {
    document: Document,
    containers: Vec<SectionContainer>,
    host: Box<dyn ComponentHost>,
    config: LeetdocConfig,
    notifications: VecDeque<SectionNotification>,
}

fn find_mut<'a>(
    containers: &'a mut [SectionContainer],
    section_id: &str,
) -> Result<&'a mut SectionContainer> {
    containers
        .iter_mut()
        .find(|c| c.id() == section_id)
        .ok_or_else(|| LeetdocError::SectionNotFound(section_id.to_string()))
}

impl DocumentSession {
    /// Opens a document, mounting a view for every section in rendering order.
    pub fn open(
        document: Document,
        mut host: Box<dyn ComponentHost>,
        config: LeetdocConfig,
    ) -> Result<Self> {
        document.validate()?;
        let mut containers = Vec::with_capacity(document.sections.len());
        for section in document.ordered_sections() {
            let data = config.section_data(document.id(), section);
            containers.push(SectionContainer::mount(
                data,
                section.content(),
                host.as_mut(),
            )?);
        }
        debug!(document = %document.id(), sections = containers.len(), "session opened");
        Ok(Self {
            document,
            containers,
            host,
            config,
            notifications: VecDeque::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn container(&self, section_id: &str) -> Option<&SectionContainer> {
        self.containers.iter().find(|c| c.id() == section_id)
    }

    pub fn containers(&self) -> &[SectionContainer] {
        &self.containers
    }

    pub fn state(&self, section_id: &str) -> Result<ContainerState> {
        self.container(section_id)
            .map(SectionContainer::state)
            .ok_or_else(|| LeetdocError::SectionNotFound(section_id.to_string()))
    }

    pub fn begin_edit(&mut self, section_id: &str) -> Result<()> {
        let content = self.document.section(section_id).and_then(|s| s.content());
        find_mut(&mut self.containers, section_id)?.begin_edit(content, self.host.as_mut())
    }

    pub fn draft(&self, section_id: &str) -> Result<Option<SectionContent>> {
        self.container(section_id)
            .ok_or_else(|| LeetdocError::SectionNotFound(section_id.to_string()))?
            .draft()
    }

    pub fn edit_error(&self, section_id: &str) -> Result<Option<String>> {
        Ok(self
            .container(section_id)
            .ok_or_else(|| LeetdocError::SectionNotFound(section_id.to_string()))?
            .edit_error())
    }

    pub fn focus(&mut self, section_id: &str) -> Result<bool> {
        Ok(find_mut(&mut self.containers, section_id)?.focus())
    }

    /// The edit component's save callback: issues a request for `content`.
    pub fn save(&mut self, section_id: &str, content: Option<SectionContent>) -> Result<SaveRequest> {
        let doc_id = self.document.metadata.id.clone();
        find_mut(&mut self.containers, section_id)?.request_save(&doc_id, content)
    }

    /// Issues a save request for whatever the editor currently holds.
    pub fn save_current(&mut self, section_id: &str) -> Result<SaveRequest> {
        let doc_id = self.document.metadata.id.clone();
        find_mut(&mut self.containers, section_id)?.request_save_current(&doc_id)
    }

    /// Delivers the persistence outcome for a pending save.
    pub fn resolve_save(&mut self, ticket: SaveTicket, outcome: SaveOutcome) -> Result<SaveResolution> {
        let container = self
            .containers
            .iter_mut()
            .find(|c| c.pending_save().map(|r| r.ticket) == Some(ticket))
            .ok_or(LeetdocError::UnknownSaveTicket(ticket.value()))?;
        let section_id = container.id().to_string();
        let resolution = container.resolve_save(ticket, outcome)?;

        if let SaveResolution::Committed(content) = &resolution {
            let section = self
                .document
                .section_mut(&section_id)
                .ok_or_else(|| LeetdocError::SectionNotFound(section_id.clone()))?;
            section.set_content(content.clone())?;
            self.document.touch_saved();
            container.leave_edit(content.as_ref(), self.host.as_mut())?;
            debug!(section = %section_id, "save committed to document");
        }
        Ok(resolution)
    }

    /// Runs a save to completion against a synchronous persister.
    pub fn save_with(
        &mut self,
        section_id: &str,
        content: Option<SectionContent>,
        persister: &mut dyn SectionPersister,
    ) -> Result<SaveResolution> {
        let request = self.save(section_id, content)?;
        let outcome = persister.persist(&request);
        self.resolve_save(request.ticket, outcome)
    }

    /// The edit component's cancel callback. The document is not touched.
    pub fn cancel(&mut self, section_id: &str) -> Result<()> {
        let content = self.document.section(section_id).and_then(|s| s.content());
        find_mut(&mut self.containers, section_id)?.cancel(content, self.host.as_mut())
    }

    pub fn enter_fullscreen(&mut self, section_id: &str) -> Result<()> {
        find_mut(&mut self.containers, section_id)?.enter_fullscreen();
        Ok(())
    }

    /// Returns whether the section left fullscreen; the component may refuse.
    pub fn exit_fullscreen(&mut self, section_id: &str) -> Result<bool> {
        Ok(find_mut(&mut self.containers, section_id)?.exit_fullscreen())
    }

    /// Forwards an authoring intent from a section, keeping arrival order.
    pub fn notify(&mut self, section_id: &str, intent: SectionIntent) -> Result<()> {
        let note = self
            .container(section_id)
            .ok_or_else(|| LeetdocError::SectionNotFound(section_id.to_string()))?
            .forward(intent)?;
        self.notifications.push_back(note);
        Ok(())
    }

    pub fn pending_notifications(&self) -> impl Iterator<Item = &SectionNotification> {
        self.notifications.iter()
    }

    pub fn drain_notifications(&mut self) -> Vec<SectionNotification> {
        self.notifications.drain(..).collect()
    }

    /// Applies queued intents to the document in order, then re-syncs.
    ///
    /// An intent that fails (e.g. its section is gone, or a save is pending
    /// on a section being deleted) is reported and skipped.
    pub fn apply_notifications(&mut self) -> Result<Vec<CmdMessage>> {
        let mut messages = Vec::new();
        while let Some(note) = self.notifications.pop_front() {
            if note.intent == SectionIntent::Delete
                && self
                    .container(&note.section_id)
                    .is_some_and(SectionContainer::is_saving)
            {
                warn!(section = %note.section_id, "delete skipped while a save is pending");
                messages.push(CmdMessage::warning(format!(
                    "Section {} is being saved and was not deleted",
                    note.section_id
                )));
                continue;
            }
            match apply_notification(&mut self.document, &note) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    warn!(section = %note.section_id, error = %e, "notification not applied");
                    messages.push(CmdMessage::warning(e.to_string()));
                }
            }
        }
        self.sync()?;
        Ok(messages)
    }

    /// Reconciles containers with the document's current section list.
    pub fn sync(&mut self) -> Result<()> {
        let doc_id = self.document.metadata.id.clone();

        let mut kept = Vec::with_capacity(self.document.sections.len());
        for mut container in std::mem::take(&mut self.containers) {
            if self.document.section(container.id()).is_some() {
                kept.push(container);
            } else {
                container.unmount(self.host.as_mut())?;
            }
        }

        let mut synced = Vec::with_capacity(self.document.sections.len());
        for section in self.document.ordered_sections() {
            let data = self.config.section_data(&doc_id, section);
            match kept.iter().position(|c| c.id() == section.id) {
                Some(idx) => {
                    let mut container = kept.swap_remove(idx);
                    container.refresh(data, section.content(), self.host.as_mut())?;
                    synced.push(container);
                }
                None => synced.push(SectionContainer::mount(
                    data,
                    section.content(),
                    self.host.as_mut(),
                )?),
            }
        }
        self.containers = synced;
        Ok(())
    }

    /// Tears down every component. Fails while any save is pending.
    pub fn close(&mut self) -> Result<()> {
        if let Some(busy) = self.containers.iter().find(|c| c.is_saving()) {
            return Err(LeetdocError::SaveInFlight(busy.id().to_string()));
        }
        for container in &mut self.containers {
            container.unmount(self.host.as_mut())?;
        }
        self.containers.clear();
        debug!(document = %self.document.id(), "session closed");
        Ok(())
    }

    pub fn into_document(mut self) -> Result<Document> {
        self.close()?;
        Ok(std::mem::replace(&mut self.document, Document::new("")))
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        for container in &mut self.containers {
            container.teardown(self.host.as_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::AddPosition;
    use crate::mode::fixtures::RecordingHost;
    use crate::model::{DrawingContent, SceneData, Section, SectionType};
    use crate::store::memory::InMemoryStore;
    use crate::store::{DataStore, StorePersister};
    use crate::model::Scope;
    use serde_json::json;

    fn doc() -> Document {
        let mut doc = Document::new("Design");
        doc.sections.push(Section::new("text", "Intro", 0, SectionType::Text));
        doc.sections
            .push(Section::new("draw", "Diagram", 1, SectionType::Drawing));
        doc.sections.push(
            Section::new("dsl", "System", 2, SectionType::SystemDescription)
                .with_content(SectionContent::SystemDescription("system A".into()))
                .unwrap(),
        );
        doc
    }

    fn open(host: &RecordingHost) -> DocumentSession {
        DocumentSession::open(doc(), Box::new(host.clone()), LeetdocConfig::default()).unwrap()
    }

    #[test]
    fn opening_mounts_one_view_per_section() {
        let host = RecordingHost::new();
        let session = open(&host);
        assert_eq!(session.containers().len(), 3);
        for id in ["text", "draw", "dsl"] {
            assert_eq!(session.state(id).unwrap(), ContainerState::Viewing);
            assert_eq!(host.attached(id).len(), 1);
        }
    }

    #[test]
    fn null_text_section_edits_to_none_draft() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("text").unwrap();
        assert_eq!(session.draft("text").unwrap(), None);
    }

    #[test]
    fn drawing_save_commits_exact_content() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("draw").unwrap();

        let payload = json!({"format": "excalidraw/json", "data": {"elements": [], "appState": {}}});
        let content = SectionContent::from_json(SectionType::Drawing, payload.clone()).unwrap();
        let before = session.document().metadata.last_saved_at;

        let request = session.save("draw", content.clone()).unwrap();
        assert_eq!(session.state("draw").unwrap(), ContainerState::Editing);
        assert!(session.document().section("draw").unwrap().content().is_none());

        let resolution = session.resolve_save(request.ticket, Ok(())).unwrap();
        assert_eq!(resolution, SaveResolution::Committed(content.clone()));
        let stored = session.document().section("draw").unwrap().content().cloned();
        assert_eq!(stored, content);
        assert_eq!(stored.unwrap().to_json(), payload);
        assert_eq!(session.state("draw").unwrap(), ContainerState::Viewing);
        assert!(session.document().metadata.last_saved_at >= before);
        assert_eq!(host.max_attached(), 1);
    }

    #[test]
    fn rejected_save_leaves_document_unchanged() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("dsl").unwrap();
        host.set_draft("dsl", Some(SectionContent::SystemDescription("system B".into())));

        let request = session.save_current("dsl").unwrap();
        let resolution = session
            .resolve_save(request.ticket, Err("network down".into()))
            .unwrap();
        assert_eq!(resolution, SaveResolution::Rejected("network down".into()));
        assert_eq!(session.state("dsl").unwrap(), ContainerState::Editing);
        assert_eq!(
            session.document().section("dsl").unwrap().content(),
            Some(&SectionContent::SystemDescription("system A".into()))
        );
        // The draft survives for another attempt
        assert_eq!(
            session.draft("dsl").unwrap(),
            Some(SectionContent::SystemDescription("system B".into()))
        );
    }

    #[test]
    fn cancel_never_touches_content() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        let original = session.document().clone();
        session.begin_edit("dsl").unwrap();
        host.set_draft("dsl", Some(SectionContent::SystemDescription("scratch".into())));
        session.cancel("dsl").unwrap();
        assert_eq!(session.document(), &original);
        assert_eq!(session.state("dsl").unwrap(), ContainerState::Viewing);
    }

    #[test]
    fn dsl_sections_edit_in_fullscreen_and_gate_exit() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("dsl").unwrap();
        assert!(session.container("dsl").unwrap().is_fullscreen());

        host.block_fullscreen_exit("dsl", true);
        assert!(!session.exit_fullscreen("dsl").unwrap());
        assert!(session.container("dsl").unwrap().is_fullscreen());

        host.block_fullscreen_exit("dsl", false);
        assert!(session.exit_fullscreen("dsl").unwrap());
    }

    #[test]
    fn save_with_store_persister() {
        let host = RecordingHost::new();
        let mut store = InMemoryStore::new();
        store.save_document(&doc(), Scope::Project).unwrap();
        let stored = store.list_documents(Scope::Project).unwrap()[0].metadata.id.clone();
        let document = store.get_document(&stored, Scope::Project).unwrap();

        let mut session =
            DocumentSession::open(document, Box::new(host.clone()), LeetdocConfig::default()).unwrap();
        session.begin_edit("text").unwrap();
        let content = Some(SectionContent::Text("<p>Hi</p>".into()));
        let mut persister = StorePersister::new(&mut store, Scope::Project);
        let resolution = session.save_with("text", content.clone(), &mut persister).unwrap();
        assert_eq!(resolution, SaveResolution::Committed(content.clone()));

        let reloaded = store.get_document(&stored, Scope::Project).unwrap();
        assert_eq!(reloaded.section("text").unwrap().content().cloned(), content);
    }

    #[test]
    fn failed_persistence_keeps_editing() {
        let host = RecordingHost::new();
        let mut store = InMemoryStore::new();
        let original = doc();
        store.save_document(&original, Scope::Project).unwrap();
        store.fail_writes(true);

        let mut session =
            DocumentSession::open(original.clone(), Box::new(host.clone()), LeetdocConfig::default())
                .unwrap();
        session.begin_edit("text").unwrap();
        let mut persister = StorePersister::new(&mut store, Scope::Project);
        let resolution = session
            .save_with("text", Some(SectionContent::Text("x".into())), &mut persister)
            .unwrap();
        assert!(matches!(resolution, SaveResolution::Rejected(_)));
        assert_eq!(session.state("text").unwrap(), ContainerState::Editing);
        assert!(session.document().section("text").unwrap().content().is_none());
    }

    #[test]
    fn notifications_keep_order_and_apply() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.notify("dsl", SectionIntent::MoveUp).unwrap();
        session
            .notify("text", SectionIntent::TitleChange("Overview".into()))
            .unwrap();
        session.notify("draw", SectionIntent::Delete).unwrap();

        let queued: Vec<_> = session
            .pending_notifications()
            .map(|n| n.section_id.clone())
            .collect();
        assert_eq!(queued, vec!["dsl", "text", "draw"]);

        let messages = session.apply_notifications().unwrap();
        assert_eq!(messages.len(), 3);

        let ids: Vec<_> = session.containers().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["text", "dsl"]);
        assert_eq!(session.container("text").unwrap().data().title, "Overview");
        assert_eq!(session.container("dsl").unwrap().data().order, 1);
        assert!(host.attached("draw").is_empty());
        assert_eq!(host.destroyed("draw"), 1);
    }

    #[test]
    fn added_sections_get_a_view() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session
            .notify(
                "text",
                SectionIntent::AddSection {
                    position: AddPosition::After,
                    section_type: SectionType::Plot,
                },
            )
            .unwrap();
        session.apply_notifications().unwrap();

        let ordered = session.document().ordered_sections();
        let added = ordered[1];
        assert_eq!(added.section_type(), SectionType::Plot);
        assert_eq!(session.state(&added.id).unwrap(), ContainerState::Viewing);
        assert_eq!(host.attached(&added.id).len(), 1);
    }

    #[test]
    fn delete_is_refused_while_saving() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("text").unwrap();
        session.save("text", None).unwrap();
        assert!(matches!(
            session.notify("text", SectionIntent::Delete),
            Err(LeetdocError::SaveInFlight(_))
        ));
        assert!(matches!(session.close(), Err(LeetdocError::SaveInFlight(_))));
    }

    #[test]
    fn close_destroys_everything() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("text").unwrap();
        session.close().unwrap();
        for id in ["text", "draw", "dsl"] {
            assert!(host.attached(id).is_empty());
        }
        // view + editor for "text"
        assert_eq!(host.destroyed("text"), 2);
        assert_eq!(host.destroyed("draw"), 1);
    }

    #[test]
    fn dropping_the_session_detaches_everything() {
        let host = RecordingHost::new();
        {
            let mut session = open(&host);
            session.begin_edit("text").unwrap();
            session.save("text", None).unwrap();
        }
        for id in ["text", "draw", "dsl"] {
            assert!(host.attached(id).is_empty());
        }
        assert_eq!(host.destroyed("text"), 2);
        assert_eq!(host.destroyed("dsl"), 1);
    }

    #[test]
    fn title_change_rebuilds_only_that_view() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        let before = host.attached("draw");

        session
            .notify("draw", SectionIntent::TitleChange("Topology".into()))
            .unwrap();
        session.apply_notifications().unwrap();

        let after = host.attached("draw");
        assert_eq!(after.len(), 1);
        assert_ne!(after, before);
        assert_eq!(host.destroyed("draw"), 1);
        assert_eq!(host.destroyed("text"), 0);
        assert_eq!(host.destroyed("dsl"), 0);
    }

    #[test]
    fn mismatched_save_content_is_rejected_up_front() {
        let host = RecordingHost::new();
        let mut session = open(&host);
        session.begin_edit("text").unwrap();
        let drawing = SectionContent::Drawing(DrawingContent::excalidraw(SceneData::default()));
        assert!(matches!(
            session.save("text", Some(drawing)),
            Err(LeetdocError::ContentMismatch { .. })
        ));
    }
}
