use crate::model::SectionType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeetdocError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Duplicate section id: {0}")]
    DuplicateSection(String),

    #[error("Content of type '{found}' cannot be stored in a '{expected}' section")]
    ContentMismatch {
        expected: SectionType,
        found: SectionType,
    },

    #[error("Invalid {section_type} content: {reason}")]
    InvalidContent {
        section_type: SectionType,
        reason: String,
    },

    #[error("A save is already in progress for section {0}")]
    SaveInFlight(String),

    #[error("Unknown save ticket {0}")]
    UnknownSaveTicket(u64),

    #[error("Invalid transition for section {section_id}: {reason}")]
    InvalidTransition { section_id: String, reason: String },

    #[error("Component for section {section_id} does not offer {capability}")]
    MissingCapability {
        section_id: String,
        capability: &'static str,
    },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Unsupported schema version '{found}' (expected '{expected}')")]
    UnsupportedSchema { found: String, expected: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, LeetdocError>;
