//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for UI
//! clients. It parses user-facing selectors, loads per-scope configuration
//! and dispatches to `commands/*.rs`. It does no printing.
//!
//! `DocApi<S: DataStore>` is generic over the storage backend:
//! `DocApi<FileStore>` in production, `DocApi<InMemoryStore>` in tests.

use crate::commands;
use crate::config::LeetdocConfig;
use crate::container::AddPosition;
use crate::error::{LeetdocError, Result};
use crate::index::{DocSelector, SectionSelector};
use crate::mode::ComponentHost;
use crate::model::{Scope, SectionType};
use crate::store::DataStore;
use std::path::{Path, PathBuf};

pub struct DocApi<S: DataStore> {
    store: S,
    paths: commands::LeetdocPaths,
}

impl<S: DataStore> DocApi<S> {
    pub fn new(store: S, paths: commands::LeetdocPaths) -> Self {
        Self { store, paths }
    }

    /// Scope configuration; defaults when the scope has none yet.
    pub fn load_config(&self, scope: Scope) -> Result<LeetdocConfig> {
        match self.paths.scope_dir(scope) {
            Ok(dir) => LeetdocConfig::load(dir),
            Err(_) => Ok(LeetdocConfig::default()),
        }
    }

    pub fn create_document(&mut self, scope: Scope, title: String) -> Result<commands::CmdResult> {
        commands::create::run(&mut self.store, scope, title)
    }

    pub fn list_documents(&self, scope: Scope) -> Result<commands::CmdResult> {
        commands::list::run(&self.store, scope)
    }

    pub fn view_documents<I: AsRef<str>>(
        &self,
        scope: Scope,
        docs: &[I],
    ) -> Result<commands::CmdResult> {
        let selectors = parse_doc_selectors(docs)?;
        commands::view::run(&self.store, scope, &selectors)
    }

    pub fn delete_documents<I: AsRef<str>>(
        &mut self,
        scope: Scope,
        docs: &[I],
    ) -> Result<commands::CmdResult> {
        let selectors = parse_doc_selectors(docs)?;
        commands::delete::run(&mut self.store, scope, &selectors)
    }

    pub fn retitle_document(
        &mut self,
        scope: Scope,
        doc: &str,
        title: String,
    ) -> Result<commands::CmdResult> {
        commands::update::retitle(&mut self.store, scope, &parse_doc(doc)?, title)
    }

    pub fn add_section(
        &mut self,
        scope: Scope,
        doc: &str,
        section_type: SectionType,
        title: Option<String>,
        anchor: Option<(&str, AddPosition)>,
    ) -> Result<commands::CmdResult> {
        let anchor = anchor
            .map(|(sel, pos)| parse_section(sel).map(|s| (s, pos)))
            .transpose()?;
        commands::sections::add(
            &mut self.store,
            scope,
            &parse_doc(doc)?,
            section_type,
            title,
            anchor.as_ref().map(|(s, pos)| (s, *pos)),
        )
    }

    pub fn remove_section(
        &mut self,
        scope: Scope,
        doc: &str,
        section: &str,
    ) -> Result<commands::CmdResult> {
        commands::sections::remove(
            &mut self.store,
            scope,
            &parse_doc(doc)?,
            &parse_section(section)?,
        )
    }

    pub fn move_section(
        &mut self,
        scope: Scope,
        doc: &str,
        section: &str,
        direction: commands::sections::Direction,
    ) -> Result<commands::CmdResult> {
        commands::sections::shift(
            &mut self.store,
            scope,
            &parse_doc(doc)?,
            &parse_section(section)?,
            direction,
        )
    }

    pub fn rename_section(
        &mut self,
        scope: Scope,
        doc: &str,
        section: &str,
        title: String,
    ) -> Result<commands::CmdResult> {
        commands::sections::rename(
            &mut self.store,
            scope,
            &parse_doc(doc)?,
            &parse_section(section)?,
            title,
        )
    }

    /// Edits one section through components built by `host`.
    pub fn edit_section(
        &mut self,
        scope: Scope,
        doc: &str,
        section: &str,
        host: Box<dyn ComponentHost>,
    ) -> Result<commands::CmdResult> {
        let config = self.load_config(scope)?;
        commands::edit::run(
            &mut self.store,
            scope,
            config,
            &parse_doc(doc)?,
            &parse_section(section)?,
            host,
        )
    }

    /// Terminal rendering of the selected documents, one block per document.
    pub fn render_documents<I: AsRef<str>>(
        &self,
        scope: Scope,
        docs: &[I],
    ) -> Result<Vec<Vec<String>>> {
        let config = self.load_config(scope)?;
        let viewed = self.view_documents(scope, docs)?;
        viewed
            .affected_documents
            .into_iter()
            .map(|doc| commands::view::render(doc, config.clone()))
            .collect()
    }

    pub fn export_documents<I: AsRef<str>>(
        &self,
        scope: Scope,
        docs: &[I],
        out_dir: &Path,
    ) -> Result<commands::CmdResult> {
        let selectors = parse_doc_selectors(docs)?;
        let config = self.load_config(scope)?;
        commands::export::run(&self.store, scope, &selectors, config.export_markdown, out_dir)
    }

    pub fn import_documents(
        &mut self,
        scope: Scope,
        paths: Vec<PathBuf>,
    ) -> Result<commands::CmdResult> {
        commands::import::run(&mut self.store, scope, paths)
    }

    pub fn document_path(&self, scope: Scope, doc: &str) -> Result<PathBuf> {
        let loaded = commands::helpers::load_document(&self.store, scope, &parse_doc(doc)?)?;
        self.store.document_path(loaded.id(), scope)
    }

    pub fn config(&self, scope: Scope, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, scope, action)
    }

    pub fn init(&self, scope: Scope) -> Result<commands::CmdResult> {
        commands::init::run(&self.paths, scope)
    }

    pub fn paths(&self) -> &commands::LeetdocPaths {
        &self.paths
    }
}

fn parse_doc(input: &str) -> Result<DocSelector> {
    input.parse().map_err(LeetdocError::Api)
}

fn parse_section(input: &str) -> Result<SectionSelector> {
    input.parse().map_err(LeetdocError::Api)
}

fn parse_doc_selectors<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<DocSelector>> {
    inputs.iter().map(|s| parse_doc(s.as_ref())).collect()
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::sections::Direction;
pub use commands::{CmdMessage, CmdResult, LeetdocPaths, MessageLevel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::fixtures::RecordingHost;
    use crate::model::SectionContent;
    use crate::store::memory::InMemoryStore;

    fn api() -> (DocApi<InMemoryStore>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = LeetdocPaths {
            project: Some(tmp.path().join("project")),
            global: tmp.path().join("global"),
        };
        (DocApi::new(InMemoryStore::new(), paths), tmp)
    }

    #[test]
    fn authoring_round() {
        let (mut api, _tmp) = api();
        api.create_document(Scope::Project, "Chat service".into())
            .unwrap();
        api.add_section(Scope::Project, "1", SectionType::Text, Some("Goals".into()), None)
            .unwrap();
        api.add_section(
            Scope::Project,
            "1",
            SectionType::SystemDescription,
            None,
            Some(("1", AddPosition::Before)),
        )
        .unwrap();
        api.move_section(Scope::Project, "1", "2", Direction::Up)
            .unwrap();
        api.rename_section(Scope::Project, "1", "2", "Model".into())
            .unwrap();

        let viewed = api.view_documents(Scope::Project, &["1"]).unwrap();
        let doc = &viewed.affected_documents[0];
        let titles: Vec<_> = doc
            .ordered_sections()
            .iter()
            .map(|s| s.title.clone())
            .collect();
        assert_eq!(titles, vec!["Goals", "Model"]);
    }

    #[test]
    fn edit_goes_through_the_host() {
        let (mut api, _tmp) = api();
        api.create_document(Scope::Global, "Doc".into()).unwrap();
        let added = api
            .add_section(Scope::Global, "1", SectionType::Text, None, None)
            .unwrap();
        let section_id = added.affected_documents[0].sections[0].id.clone();

        let host = RecordingHost::new();
        host.script_edit(&section_id, Some(SectionContent::Text("hello".into())));
        api.edit_section(Scope::Global, "1", "1", Box::new(host))
            .unwrap();

        let doc = &api.view_documents(Scope::Global, &["1"]).unwrap().affected_documents[0];
        assert_eq!(
            doc.section(&section_id).unwrap().content(),
            Some(&SectionContent::Text("hello".into()))
        );
    }

    #[test]
    fn bad_selectors_are_api_errors() {
        let (mut api, _tmp) = api();
        assert!(matches!(
            api.remove_section(Scope::Project, "0", "1"),
            Err(LeetdocError::Api(_))
        ));
        assert!(matches!(
            api.view_documents(Scope::Project, &["1"]),
            Err(LeetdocError::Api(_))
        ));
    }

    #[test]
    fn export_follows_scope_config() {
        let (mut api, tmp) = api();
        api.create_document(Scope::Project, "Doc".into()).unwrap();
        api.config(
            Scope::Project,
            ConfigAction::Set("export-markdown".into(), "false".into()),
        )
        .unwrap();
        let result = api
            .export_documents::<&str>(Scope::Project, &[], tmp.path())
            .unwrap();
        assert_eq!(result.document_paths.len(), 1);
    }

    #[test]
    fn render_uses_terminal_views() {
        let (mut api, _tmp) = api();
        api.create_document(Scope::Project, "Doc".into()).unwrap();
        api.add_section(Scope::Project, "1", SectionType::Plot, Some("Load".into()), None)
            .unwrap();
        let blocks = api.render_documents(Scope::Project, &["1"]).unwrap();
        assert_eq!(blocks[0], vec!["## Load [plot]", "(empty)"]);
    }
}
