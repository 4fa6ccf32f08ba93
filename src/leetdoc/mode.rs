//! # Mode Component Protocol
//!
//! Every section is shown through exactly one *mode component* at a time:
//! either a view component or an edit component. The traits here are the
//! contract those widgets implement; the [`crate::container`] drives them.
//!
//! ## Capabilities
//!
//! [`ModeComponent`] is the minimal set every component offers. Edit
//! components may additionally offer [`ContentSource`] and [`Focusable`].
//! These are separate traits reached through [`EditComponent::content_source`]
//! and [`EditComponent::focusable`]; callers ask for the capability and get
//! `None` when the component does not have it.
//!
//! ## Hosts
//!
//! A [`ComponentHost`] builds components for a section and owns the surface
//! they are attached to. The container hands the host a borrowed
//! [`ElementHandle`] to attach or detach; the handle itself stays with the
//! component that created it.

use crate::error::Result;
use crate::model::{SectionContent, SectionData};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Root presentation handle of a mode component.
///
/// Not `Clone`: a handle has exactly one owner.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: u64,
    label: String,
}

impl ElementHandle {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    View,
    Edit,
}

pub trait ModeComponent {
    fn element(&self) -> &ElementHandle;

    /// Releases listeners and nested editors. Calling it again is a no-op,
    /// and it is safe on a component that was never attached.
    fn destroy(&mut self);

    /// Whether the component currently lets the section leave fullscreen.
    /// Must not have side effects.
    fn should_exit_fullscreen(&self) -> bool;
}

pub trait ViewComponent: ModeComponent {}

/// Read access to the (possibly unsaved) content held by an editor.
pub trait ContentSource {
    /// `None` means the section is still unpopulated.
    fn get_content(&self) -> Option<SectionContent>;
}

pub trait Focusable {
    /// Best effort; no guarantee anything receives focus.
    fn focus(&mut self);
}

pub trait EditComponent: ModeComponent {
    fn content_source(&self) -> Option<&dyn ContentSource> {
        None
    }

    fn focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    /// Why the editor's most recent input was discarded, if it was.
    fn last_error(&self) -> Option<&str> {
        None
    }
}

/// Builds mode components and owns the surface they are attached to.
pub trait ComponentHost {
    fn create_view(
        &mut self,
        data: &SectionData,
        content: Option<&SectionContent>,
    ) -> Result<Box<dyn ViewComponent>>;

    fn create_edit(
        &mut self,
        data: &SectionData,
        content: Option<&SectionContent>,
    ) -> Result<Box<dyn EditComponent>>;

    fn attach(&mut self, section_id: &str, element: &ElementHandle);

    fn detach(&mut self, section_id: &str, element: &ElementHandle);
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    //! A recording host whose components are driven from the test.

    use super::*;
    use crate::error::LeetdocError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostEvent {
        Created {
            section_id: String,
            kind: ModeKind,
            element: u64,
        },
        Attached {
            section_id: String,
            element: u64,
        },
        Detached {
            section_id: String,
            element: u64,
        },
        Destroyed {
            section_id: String,
            element: u64,
        },
    }

    /// Knobs and counters shared by the host and one section's components.
    #[derive(Debug, Default)]
    pub struct StubState {
        pub draft: Option<SectionContent>,
        /// Applied to the draft when the editor is focused.
        pub scripted_edit: Option<Option<SectionContent>>,
        pub block_fullscreen_exit: bool,
        pub focus_calls: usize,
        pub destroy_calls: usize,
    }

    #[derive(Default)]
    struct Record {
        events: Vec<HostEvent>,
        attached: HashMap<String, Vec<u64>>,
        max_attached: usize,
        states: HashMap<String, Rc<RefCell<StubState>>>,
        without_content_source: bool,
        without_focus: bool,
        fail_creates: bool,
    }

    #[derive(Clone, Default)]
    pub struct RecordingHost {
        inner: Rc<RefCell<Record>>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self::default()
        }

        /// Edit components built from now on have no `ContentSource`.
        pub fn without_content_source(self) -> Self {
            self.inner.borrow_mut().without_content_source = true;
            self
        }

        pub fn without_focus(self) -> Self {
            self.inner.borrow_mut().without_focus = true;
            self
        }

        pub fn fail_creates(&self, fail: bool) {
            self.inner.borrow_mut().fail_creates = fail;
        }

        pub fn state(&self, section_id: &str) -> Rc<RefCell<StubState>> {
            self.inner
                .borrow_mut()
                .states
                .entry(section_id.to_string())
                .or_default()
                .clone()
        }

        pub fn set_draft(&self, section_id: &str, draft: Option<SectionContent>) {
            self.state(section_id).borrow_mut().draft = draft;
        }

        pub fn script_edit(&self, section_id: &str, edit: Option<SectionContent>) {
            self.state(section_id).borrow_mut().scripted_edit = Some(edit);
        }

        pub fn block_fullscreen_exit(&self, section_id: &str, block: bool) {
            self.state(section_id).borrow_mut().block_fullscreen_exit = block;
        }

        pub fn events(&self) -> Vec<HostEvent> {
            self.inner.borrow().events.clone()
        }

        pub fn attached(&self, section_id: &str) -> Vec<u64> {
            self.inner
                .borrow()
                .attached
                .get(section_id)
                .cloned()
                .unwrap_or_default()
        }

        /// Highest number of elements ever attached at once for one section.
        pub fn max_attached(&self) -> usize {
            self.inner.borrow().max_attached
        }

        pub fn created(&self, section_id: &str, kind: ModeKind) -> usize {
            self.inner
                .borrow()
                .events
                .iter()
                .filter(|e| {
                    matches!(e, HostEvent::Created { section_id: s, kind: k, .. }
                        if s == section_id && *k == kind)
                })
                .count()
        }

        pub fn destroyed(&self, section_id: &str) -> usize {
            self.inner
                .borrow()
                .events
                .iter()
                .filter(|e| matches!(e, HostEvent::Destroyed { section_id: s, .. } if s == section_id))
                .count()
        }

        fn push(&self, event: HostEvent) {
            self.inner.borrow_mut().events.push(event);
        }

        fn check_create(&self, section_id: &str) -> Result<()> {
            if self.inner.borrow().fail_creates {
                return Err(LeetdocError::Api(format!(
                    "cannot build component for {}",
                    section_id
                )));
            }
            Ok(())
        }
    }

    pub struct StubComponent {
        section_id: String,
        element: ElementHandle,
        state: Rc<RefCell<StubState>>,
        host: RecordingHost,
        destroyed: bool,
        content_source: bool,
        focusable: bool,
    }

    impl ModeComponent for StubComponent {
        fn element(&self) -> &ElementHandle {
            &self.element
        }

        fn destroy(&mut self) {
            self.state.borrow_mut().destroy_calls += 1;
            if self.destroyed {
                return;
            }
            self.destroyed = true;
            self.host.push(HostEvent::Destroyed {
                section_id: self.section_id.clone(),
                element: self.element.id(),
            });
        }

        fn should_exit_fullscreen(&self) -> bool {
            !self.state.borrow().block_fullscreen_exit
        }
    }

    impl ViewComponent for StubComponent {}

    impl ContentSource for StubComponent {
        fn get_content(&self) -> Option<SectionContent> {
            self.state.borrow().draft.clone()
        }
    }

    impl Focusable for StubComponent {
        fn focus(&mut self) {
            let mut state = self.state.borrow_mut();
            state.focus_calls += 1;
            if let Some(edit) = state.scripted_edit.take() {
                state.draft = edit;
            }
        }
    }

    impl EditComponent for StubComponent {
        fn content_source(&self) -> Option<&dyn ContentSource> {
            if self.content_source {
                Some(self)
            } else {
                None
            }
        }

        fn focusable(&mut self) -> Option<&mut dyn Focusable> {
            if self.focusable {
                Some(self)
            } else {
                None
            }
        }
    }

    impl RecordingHost {
        fn build(&self, data: &SectionData, kind: ModeKind) -> StubComponent {
            let element = ElementHandle::new(format!("{}:{:?}", data.id, kind));
            self.push(HostEvent::Created {
                section_id: data.id.clone(),
                kind,
                element: element.id(),
            });
            let record = self.inner.borrow();
            let content_source = !record.without_content_source;
            let focusable = !record.without_focus;
            drop(record);
            StubComponent {
                section_id: data.id.clone(),
                element,
                state: self.state(&data.id),
                host: self.clone(),
                destroyed: false,
                content_source,
                focusable,
            }
        }
    }

    impl ComponentHost for RecordingHost {
        fn create_view(
            &mut self,
            data: &SectionData,
            _content: Option<&SectionContent>,
        ) -> Result<Box<dyn ViewComponent>> {
            self.check_create(&data.id)?;
            Ok(Box::new(self.build(data, ModeKind::View)))
        }

        fn create_edit(
            &mut self,
            data: &SectionData,
            content: Option<&SectionContent>,
        ) -> Result<Box<dyn EditComponent>> {
            self.check_create(&data.id)?;
            let component = self.build(data, ModeKind::Edit);
            component.state.borrow_mut().draft = content.cloned();
            Ok(Box::new(component))
        }

        fn attach(&mut self, section_id: &str, element: &ElementHandle) {
            self.push(HostEvent::Attached {
                section_id: section_id.to_string(),
                element: element.id(),
            });
            let mut record = self.inner.borrow_mut();
            let list = record.attached.entry(section_id.to_string()).or_default();
            list.push(element.id());
            let count = list.len();
            record.max_attached = record.max_attached.max(count);
        }

        fn detach(&mut self, section_id: &str, element: &ElementHandle) {
            self.push(HostEvent::Detached {
                section_id: section_id.to_string(),
                element: element.id(),
            });
            if let Some(list) = self.inner.borrow_mut().attached.get_mut(section_id) {
                list.retain(|id| *id != element.id());
            }
        }
    }
}
