use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{new_id, Document, Scope};
use crate::store::DataStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Imports document JSON files, or every `.json` file in a directory.
///
/// A file that fails to parse or carries an unknown schema is reported and
/// skipped. Documents whose id is already taken get a fresh one.
pub fn run<S: DataStore>(store: &mut S, scope: Scope, paths: Vec<PathBuf>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut imported = 0;

    for path in paths {
        let files = if path.is_dir() {
            json_files_in(&path)?
        } else if path.is_file() {
            vec![path]
        } else {
            result.add_message(CmdMessage::warning(format!(
                "Path not found: {}",
                path.display()
            )));
            continue;
        };

        for file in files {
            match import_file(store, scope, &file) {
                Ok(doc) => {
                    imported += 1;
                    result.add_message(CmdMessage::info(format!(
                        "Imported: {} ({})",
                        doc.title,
                        file.display()
                    )));
                    result.affected_documents.push(doc);
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "import failed");
                    result.add_message(CmdMessage::warning(format!(
                        "Failed to import {}: {}",
                        file.display(),
                        e
                    )));
                }
            }
        }
    }

    result.add_message(CmdMessage::success(format!("Total imported: {}", imported)));
    Ok(result)
}

fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn import_file<S: DataStore>(store: &mut S, scope: Scope, path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)?;
    let mut doc = Document::from_json(&raw)?;

    let taken = store
        .list_documents(scope)?
        .iter()
        .any(|s| s.metadata.id == doc.metadata.id);
    if taken {
        doc.metadata.id = new_id();
    }

    store.save_document(&doc, scope)?;
    Ok(doc)
}
