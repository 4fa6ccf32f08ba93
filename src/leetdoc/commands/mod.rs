use crate::config::LeetdocConfig;
use crate::error::{LeetdocError, Result};
use crate::index::DisplayDocument;
use crate::model::{Document, Scope};
use std::path::PathBuf;

pub mod authoring;
pub mod config;
pub mod create;
pub mod delete;
pub mod edit;
pub mod export;
pub mod helpers;
pub mod import;
pub mod init;
pub mod list;
pub mod sections;
pub mod update;
pub mod view;

#[derive(Debug, Clone)]
pub struct LeetdocPaths {
    pub project: Option<PathBuf>,
    pub global: PathBuf,
}

impl LeetdocPaths {
    pub fn scope_dir(&self, scope: Scope) -> Result<PathBuf> {
        match scope {
            Scope::Project => self
                .project
                .clone()
                .ok_or_else(|| LeetdocError::Store("Project scope is not available".to_string())),
            Scope::Global => Ok(self.global.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// What a command did, for the CLI to render.
#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_documents: Vec<Document>,
    pub listed_documents: Vec<DisplayDocument>,
    pub document_paths: Vec<PathBuf>,
    pub config: Option<LeetdocConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_documents(mut self, docs: Vec<Document>) -> Self {
        self.affected_documents = docs;
        self
    }

    pub fn with_listed_documents(mut self, docs: Vec<DisplayDocument>) -> Self {
        self.listed_documents = docs;
        self
    }

    pub fn with_document_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.document_paths = paths;
        self
    }

    pub fn with_config(mut self, config: LeetdocConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
