//! # Document Model
//!
//! A [`Document`] is an ordered list of typed [`Section`]s plus metadata. The
//! section type is the discriminant of a tagged union: the content a section
//! carries must always have the shape its type declares.
//!
//! ## Content vs. absence
//!
//! A section's content is an `Option<SectionContent>`. `None` means "the
//! section exists but has not been populated yet" and is valid for every type.
//! It is never conflated with empty content: `Some(SectionContent::Text(""))`
//! is a populated, empty text section.
//!
//! ## Type/content coupling
//!
//! [`Section`] keeps its type and content private. The only ways to put
//! content into a section ([`Section::with_content`], [`Section::set_content`]
//! and deserialization) check the pairing and fail with
//! [`LeetdocError::ContentMismatch`] or [`LeetdocError::InvalidContent`].
//!
//! ## Persisted shape
//!
//! Documents serialize to camelCase JSON. Each section is written as
//! `{ "id", "title", "order", "type", "content" }` where `content` is `null`
//! or the payload for that type:
//!
//! ```text
//! text                -> "<p>markup</p>"
//! drawing             -> { "format": "excalidraw/json", "data": { "elements": [...], "appState": {...} } }
//! plot                -> { "format": "chartjs_config", "data": { ... } }
//! system_description  -> "dsl source"
//! ```

use crate::error::{LeetdocError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Schema version written into every new document. Loaders refuse anything else.
pub const SCHEMA_VERSION: &str = "1.0";

/// Format tag for drawing scenes produced by the Excalidraw widget.
pub const EXCALIDRAW_FORMAT: &str = "excalidraw/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Project,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Text,
    Drawing,
    Plot,
    SystemDescription,
}

impl SectionType {
    pub const ALL: [SectionType; 4] = [
        SectionType::Text,
        SectionType::Drawing,
        SectionType::Plot,
        SectionType::SystemDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Text => "text",
            SectionType::Drawing => "drawing",
            SectionType::Plot => "plot",
            SectionType::SystemDescription => "system_description",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "text" => Ok(SectionType::Text),
            "drawing" => Ok(SectionType::Drawing),
            "plot" => Ok(SectionType::Plot),
            "system_description" | "system" | "dsl" => Ok(SectionType::SystemDescription),
            _ => Err(format!("Unknown section type: {}", s)),
        }
    }
}

/// A drawing scene: the ordered elements plus the widget's view state.
///
/// Keys the widget writes beyond `elements` and `appState` are kept in
/// `extra` so a load/save cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub elements: Vec<Value>,
    #[serde(rename = "appState", default)]
    pub app_state: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingContent {
    pub format: String,
    pub data: SceneData,
}

impl DrawingContent {
    pub fn excalidraw(data: SceneData) -> Self {
        Self {
            format: EXCALIDRAW_FORMAT.to_string(),
            data,
        }
    }
}

/// Plot configuration, e.g. a `chartjs_config` or `plotly_json` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotContent {
    pub format: String,
    pub data: Map<String, Value>,
}

/// Non-null section content. Each variant belongs to exactly one [`SectionType`].
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    /// Serialized rich-text markup.
    Text(String),
    Drawing(DrawingContent),
    Plot(PlotContent),
    /// DSL source, interpreted elsewhere.
    SystemDescription(String),
}

impl SectionContent {
    pub fn section_type(&self) -> SectionType {
        match self {
            SectionContent::Text(_) => SectionType::Text,
            SectionContent::Drawing(_) => SectionType::Drawing,
            SectionContent::Plot(_) => SectionType::Plot,
            SectionContent::SystemDescription(_) => SectionType::SystemDescription,
        }
    }

    /// Fails unless this content belongs in a section of `expected` type.
    pub fn ensure_type(&self, expected: SectionType) -> Result<()> {
        let found = self.section_type();
        if found != expected {
            return Err(LeetdocError::ContentMismatch { expected, found });
        }
        if let SectionContent::Plot(plot) = self {
            if plot.format == EXCALIDRAW_FORMAT {
                return Err(invalid(
                    SectionType::Plot,
                    "drawing scene format is not a plot format",
                ));
            }
        }
        Ok(())
    }

    /// Interprets a JSON payload as content for a section of the given type.
    ///
    /// `null` yields `Ok(None)`: an unpopulated section, not an error.
    pub fn from_json(section_type: SectionType, value: Value) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        let content = match section_type {
            SectionType::Text => match value {
                Value::String(s) => SectionContent::Text(s),
                other => return Err(invalid(section_type, expected_string(&other))),
            },
            SectionType::SystemDescription => match value {
                Value::String(s) => SectionContent::SystemDescription(s),
                other => return Err(invalid(section_type, expected_string(&other))),
            },
            SectionType::Drawing => {
                let drawing: DrawingContent = serde_json::from_value(value)
                    .map_err(|e| invalid(section_type, e.to_string()))?;
                SectionContent::Drawing(drawing)
            }
            SectionType::Plot => {
                let plot: PlotContent = serde_json::from_value(value)
                    .map_err(|e| invalid(section_type, e.to_string()))?;
                SectionContent::Plot(plot)
            }
        };
        content.ensure_type(section_type)?;
        Ok(Some(content))
    }

    pub fn to_json(&self) -> Value {
        match self {
            SectionContent::Text(s) | SectionContent::SystemDescription(s) => {
                Value::String(s.clone())
            }
            SectionContent::Drawing(d) => serde_json::to_value(d).unwrap_or(Value::Null),
            SectionContent::Plot(p) => serde_json::to_value(p).unwrap_or(Value::Null),
        }
    }
}

fn invalid(section_type: SectionType, reason: impl Into<String>) -> LeetdocError {
    LeetdocError::InvalidContent {
        section_type,
        reason: reason.into(),
    }
}

fn expected_string(found: &Value) -> String {
    let kind = match found {
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
        _ => "something else",
    };
    format!("expected a string, found {}", kind)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One addressable unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SectionRecord", into = "SectionRecord")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub order: i64,
    section_type: SectionType,
    content: Option<SectionContent>,
}

impl Section {
    /// A new, unpopulated section.
    pub fn new(id: impl Into<String>, title: impl Into<String>, order: i64, section_type: SectionType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            order,
            section_type,
            content: None,
        }
    }

    pub fn with_content(mut self, content: SectionContent) -> Result<Self> {
        self.set_content(Some(content))?;
        Ok(self)
    }

    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub fn content(&self) -> Option<&SectionContent> {
        self.content.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.content.is_some()
    }

    /// Replaces the content. `None` clears the section back to unpopulated.
    pub fn set_content(&mut self, content: Option<SectionContent>) -> Result<()> {
        if let Some(c) = &content {
            c.ensure_type(self.section_type)?;
        }
        self.content = content;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionRecord {
    id: String,
    title: String,
    order: i64,
    #[serde(rename = "type")]
    section_type: SectionType,
    #[serde(default)]
    content: Value,
}

impl TryFrom<SectionRecord> for Section {
    type Error = LeetdocError;

    fn try_from(record: SectionRecord) -> Result<Self> {
        let content = SectionContent::from_json(record.section_type, record.content)?;
        Ok(Section {
            id: record.id,
            title: record.title,
            order: record.order,
            section_type: record.section_type,
            content,
        })
    }
}

impl From<Section> for SectionRecord {
    fn from(section: Section) -> Self {
        SectionRecord {
            content: section
                .content
                .as_ref()
                .map(SectionContent::to_json)
                .unwrap_or(Value::Null),
            id: section.id,
            title: section.title,
            order: section.order,
            section_type: section.section_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: String,
    pub schema_version: String,
    pub last_saved_at: DateTime<Utc>,
}

impl DocumentMetadata {
    pub fn new() -> Self {
        Self {
            id: new_id(),
            schema_version: SCHEMA_VERSION.to_string(),
            last_saved_at: Utc::now(),
        }
    }
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: DocumentMetadata,
    pub title: String,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            metadata: DocumentMetadata::new(),
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// First eight characters of the id, for display and file names.
    pub fn short_id(&self) -> String {
        self.metadata.id.chars().take(8).collect()
    }

    /// Sections in rendering order: ascending `order`, ties kept in insertion order.
    pub fn ordered_sections(&self) -> Vec<&Section> {
        let mut ordered: Vec<&Section> = self.sections.iter().collect();
        ordered.sort_by_key(|s| s.order);
        ordered
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Zero-based position of a section in rendering order.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.ordered_sections().iter().position(|s| s.id == id)
    }

    pub fn touch_saved(&mut self) {
        self.metadata.last_saved_at = Utc::now();
    }

    pub fn check_schema(&self) -> Result<()> {
        if self.metadata.schema_version != SCHEMA_VERSION {
            return Err(LeetdocError::UnsupportedSchema {
                found: self.metadata.schema_version.clone(),
                expected: SCHEMA_VERSION.to_string(),
            });
        }
        Ok(())
    }

    /// Checks the schema tag and that section ids are unique.
    pub fn validate(&self) -> Result<()> {
        self.check_schema()?;
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(LeetdocError::DuplicateSection(section.id.clone()));
            }
        }
        Ok(())
    }

    /// Parses and validates a persisted document.
    ///
    /// The schema version is checked before any section is interpreted.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let version = value
            .get("metadata")
            .and_then(|m| m.get("schemaVersion"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if version != SCHEMA_VERSION {
            return Err(LeetdocError::UnsupportedSchema {
                found: version.to_string(),
                expected: SCHEMA_VERSION.to_string(),
            });
        }
        let document: Document = serde_json::from_value(value)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Instructions handed to the assessment collaborator for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPrompts {
    pub get_answer: String,
    pub verify_answer: String,
}

/// Editor-facing projection of a section. A container is built from this;
/// the content itself travels through the mode components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionData {
    pub id: String,
    pub design_id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub title: String,
    pub order: i64,
    pub get_answer_prompt: String,
    pub verify_answer_prompt: String,
    #[serde(
        rename = "editInFSMode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub edit_in_fs_mode: Option<bool>,
}

impl SectionData {
    pub fn for_section(
        design_id: &str,
        section: &Section,
        prompts: &SectionPrompts,
        edit_in_fs_mode: Option<bool>,
    ) -> Self {
        Self {
            id: section.id.clone(),
            design_id: design_id.to_string(),
            section_type: section.section_type(),
            title: section.title.clone(),
            order: section.order,
            get_answer_prompt: prompts.get_answer.clone(),
            verify_answer_prompt: prompts.verify_answer.clone(),
            edit_in_fs_mode,
        }
    }

    pub fn edits_in_fullscreen(&self) -> bool {
        self.edit_in_fs_mode.unwrap_or(false)
    }
}
