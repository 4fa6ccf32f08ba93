//! User-facing addressing of documents and sections.
//!
//! Documents are listed newest-saved first and numbered from 1; a document can
//! be picked by that number or by a prefix of its id. Sections are picked by
//! their 1-based position in rendering order or by id.

use crate::error::{LeetdocError, Result};
use crate::model::{Document, Section};
use crate::store::DocumentSummary;

/// Selects a document from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSelector {
    Index(usize),
    IdPrefix(String),
}

impl std::fmt::Display for DocSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocSelector::Index(i) => write!(f, "{}", i),
            DocSelector::IdPrefix(p) => write!(f, "{}", p),
        }
    }
}

impl std::str::FromStr for DocSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty document selector".to_string());
        }
        match s.parse::<usize>() {
            Ok(0) => Err("Document indexes start at 1".to_string()),
            Ok(n) => Ok(DocSelector::Index(n)),
            Err(_) => Ok(DocSelector::IdPrefix(s.to_string())),
        }
    }
}

/// Selects a section within one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSelector {
    Position(usize),
    Id(String),
}

impl std::fmt::Display for SectionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionSelector::Position(i) => write!(f, "{}", i),
            SectionSelector::Id(id) => write!(f, "{}", id),
        }
    }
}

impl std::str::FromStr for SectionSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty section selector".to_string());
        }
        match s.parse::<usize>() {
            Ok(0) => Err("Section positions start at 1".to_string()),
            Ok(n) => Ok(SectionSelector::Position(n)),
            Err(_) => Ok(SectionSelector::Id(s.to_string())),
        }
    }
}

impl SectionSelector {
    /// Resolves to the section id in `doc`.
    pub fn resolve(&self, doc: &Document) -> Result<String> {
        let ordered = doc.ordered_sections();
        let found: Option<&Section> = match self {
            SectionSelector::Position(n) => ordered.get(n - 1).copied(),
            SectionSelector::Id(id) => ordered.iter().copied().find(|s| &s.id == id),
        };
        found
            .map(|s| s.id.clone())
            .ok_or_else(|| LeetdocError::SectionNotFound(self.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDocument {
    pub summary: DocumentSummary,
    pub index: usize,
}

/// Numbers summaries from 1, most recently saved first. Ties keep id order so
/// the numbering is stable between runs.
pub fn index_documents(mut summaries: Vec<DocumentSummary>) -> Vec<DisplayDocument> {
    summaries.sort_by(|a, b| {
        b.metadata
            .last_saved_at
            .cmp(&a.metadata.last_saved_at)
            .then_with(|| a.metadata.id.cmp(&b.metadata.id))
    });
    summaries
        .into_iter()
        .enumerate()
        .map(|(i, summary)| DisplayDocument {
            summary,
            index: i + 1,
        })
        .collect()
}

/// Finds the single listed document a selector names.
pub fn select<'a>(listed: &'a [DisplayDocument], selector: &DocSelector) -> Result<&'a DisplayDocument> {
    match selector {
        DocSelector::Index(i) => listed
            .iter()
            .find(|d| d.index == *i)
            .ok_or_else(|| LeetdocError::Api(format!("Index {} not found in current scope", i))),
        DocSelector::IdPrefix(prefix) => {
            let mut hits = listed
                .iter()
                .filter(|d| d.summary.metadata.id.starts_with(prefix.as_str()));
            match (hits.next(), hits.next()) {
                (Some(doc), None) => Ok(doc),
                (None, _) => Err(LeetdocError::DocumentNotFound(prefix.clone())),
                (Some(_), Some(_)) => Err(LeetdocError::Api(format!(
                    "Id prefix '{}' matches more than one document",
                    prefix
                ))),
            }
        }
    }
}
