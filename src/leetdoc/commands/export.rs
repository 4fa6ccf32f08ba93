use crate::commands::{CmdMessage, CmdResult};
use crate::error::{LeetdocError, Result};
use crate::index::DocSelector;
use crate::model::{Document, Scope, SectionContent};
use crate::store::DataStore;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use super::helpers::{indexed_documents, load_documents};

/// Writes the selected documents (all of them when none are selected) to a
/// timestamped `.tar.gz` in `out_dir`.
pub fn run<S: DataStore>(
    store: &S,
    scope: Scope,
    selectors: &[DocSelector],
    with_markdown: bool,
    out_dir: &Path,
) -> Result<CmdResult> {
    let docs = resolve_documents(store, scope, selectors)?;

    if docs.is_empty() {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("No documents to export."));
        return Ok(res);
    }

    let filename = format!("leetdoc-{}.tar.gz", Utc::now().format("%Y-%m-%d_%H-%M-%S"));
    let path = out_dir.join(filename);
    let file = File::create(&path)?;
    write_archive(file, &docs, with_markdown)?;
    debug!(path = %path.display(), count = docs.len(), "export written");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} document(s) to {}",
        docs.len(),
        path.display()
    )));
    Ok(result.with_document_paths(vec![path]))
}

fn resolve_documents<S: DataStore>(
    store: &S,
    scope: Scope,
    selectors: &[DocSelector],
) -> Result<Vec<Document>> {
    if selectors.is_empty() {
        indexed_documents(store, scope)?
            .iter()
            .map(|d| store.get_document(&d.summary.metadata.id, scope))
            .collect()
    } else {
        load_documents(store, scope, selectors)
    }
}

fn write_archive<W: Write>(writer: W, docs: &[Document], with_markdown: bool) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for doc in docs {
        let stem = format!(
            "leetdoc/{}-{}",
            sanitize_filename(&doc.title),
            doc.short_id()
        );
        append(&mut tar, format!("{}.json", stem), doc.to_json()?.as_bytes())?;
        if with_markdown {
            append(&mut tar, format!("{}.md", stem), render_markdown(doc)?.as_bytes())?;
        }
    }

    tar.into_inner()?.finish()?;
    Ok(())
}

fn append<W: Write>(tar: &mut tar::Builder<W>, name: String, data: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, name, data)
        .map_err(LeetdocError::Io)
}

/// Renders a document as markdown: one heading per section in order.
pub fn render_markdown(doc: &Document) -> Result<String> {
    let mut out = format!("# {}\n", doc.title);
    for section in doc.ordered_sections() {
        out.push_str(&format!("\n## {}\n\n", section.title));
        match section.content() {
            None => out.push_str("_(empty)_\n"),
            Some(SectionContent::Text(text)) => {
                out.push_str(text.trim_end());
                out.push('\n');
            }
            Some(SectionContent::SystemDescription(dsl)) => {
                out.push_str("```\n");
                out.push_str(dsl.trim_end());
                out.push_str("\n```\n");
            }
            Some(other) => {
                let json = serde_json::to_string_pretty(&other.to_json())?;
                out.push_str("```json\n");
                out.push_str(&json);
                out.push_str("\n```\n");
            }
        }
    }
    Ok(out)
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DrawingContent, SceneData, Section, SectionType};
    use crate::store::memory::fixtures::StoreFixture;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn entries(buf: &[u8]) -> Vec<(String, String)> {
        let mut archive = tar::Archive::new(GzDecoder::new(buf));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let name = e.path().unwrap().display().to_string();
                let mut body = String::new();
                e.read_to_string(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    #[test]
    fn archive_holds_json_and_markdown() {
        let fixture = StoreFixture::new().with_sample_document("Queue design", Scope::Project);
        let docs = resolve_documents(&fixture.store, Scope::Project, &[]).unwrap();

        let mut buf = Vec::new();
        write_archive(&mut buf, &docs, true).unwrap();
        let entries = entries(&buf);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].0.starts_with("leetdoc/Queue_design-"));
        assert!(entries[0].0.ends_with(".json"));
        assert!(entries[1].0.ends_with(".md"));

        let restored = Document::from_json(&entries[0].1).unwrap();
        assert_eq!(restored, docs[0]);
    }

    #[test]
    fn non_ascii_ids_are_cut_on_char_boundaries() {
        let mut doc = Document::new("Spec");
        doc.metadata.id = "ドキュメント-123".to_string();

        let mut buf = Vec::new();
        write_archive(&mut buf, &[doc], false).unwrap();
        let entries = entries(&buf);
        assert_eq!(entries[0].0, "leetdoc/Spec-ドキュメント-1.json");
    }

    #[test]
    fn markdown_can_be_left_out() {
        let fixture = StoreFixture::new().with_documents(2, Scope::Project);
        let docs = resolve_documents(&fixture.store, Scope::Project, &[]).unwrap();
        let mut buf = Vec::new();
        write_archive(&mut buf, &docs, false).unwrap();
        assert!(entries(&buf).iter().all(|(n, _)| n.ends_with(".json")));
    }

    #[test]
    fn markdown_rendering() {
        let mut doc = Document::new("Cache");
        doc.sections.push(
            Section::new("a", "Intro", 0, SectionType::Text)
                .with_content(SectionContent::Text("<p>LRU</p>".into()))
                .unwrap(),
        );
        doc.sections.push(
            Section::new("b", "Model", 1, SectionType::SystemDescription)
                .with_content(SectionContent::SystemDescription("cache -> db".into()))
                .unwrap(),
        );
        doc.sections.push(
            Section::new("c", "Sketch", 2, SectionType::Drawing)
                .with_content(SectionContent::Drawing(DrawingContent::excalidraw(
                    SceneData::default(),
                )))
                .unwrap(),
        );
        doc.sections
            .push(Section::new("d", "Load", 3, SectionType::Plot));

        let md = render_markdown(&doc).unwrap();
        assert!(md.starts_with("# Cache\n"));
        assert!(md.contains("## Intro\n\n<p>LRU</p>\n"));
        assert!(md.contains("```\ncache -> db\n```"));
        assert!(md.contains("```json\n{"));
        assert!(md.contains("\"excalidraw/json\""));
        assert!(md.contains("## Load\n\n_(empty)_\n"));
        assert!(md.find("## Intro").unwrap() < md.find("## Load").unwrap());
    }

    #[test]
    fn run_writes_into_out_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let fixture = StoreFixture::new().with_documents(1, Scope::Global);
        let result = run(&fixture.store, Scope::Global, &[], true, tmp.path()).unwrap();
        assert_eq!(result.document_paths.len(), 1);
        assert!(result.document_paths[0].exists());
    }

    #[test]
    fn run_with_nothing_to_export() {
        let tmp = tempfile::tempdir().unwrap();
        let fixture = StoreFixture::new();
        let result = run(&fixture.store, Scope::Global, &[], true, tmp.path()).unwrap();
        assert!(result.document_paths.is_empty());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename("Hello World"), "Hello_World");
        assert_eq!(sanitize_filename("foo/bar"), "foo_bar");
    }
}
