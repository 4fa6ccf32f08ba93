use crate::error::Result;
use crate::model::{Section, SectionData, SectionPrompts, SectionType};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

static DEFAULT_PROMPTS: Lazy<BTreeMap<SectionType, SectionPrompts>> = Lazy::new(|| {
    let prompt = |get: &str, verify: &str| SectionPrompts {
        get_answer: get.to_string(),
        verify_answer: verify.to_string(),
    };
    BTreeMap::from([
        (
            SectionType::Text,
            prompt(
                "Write the answer for this section of the design.",
                "Check that the text answers the section's question completely.",
            ),
        ),
        (
            SectionType::Drawing,
            prompt(
                "Sketch the components and how they connect.",
                "Check that the drawing shows every component and data flow.",
            ),
        ),
        (
            SectionType::Plot,
            prompt(
                "Plot the numbers that support this section.",
                "Check that the plot's axes and values are plausible.",
            ),
        ),
        (
            SectionType::SystemDescription,
            prompt(
                "Describe the system in the system description language.",
                "Check that the system description is complete and consistent.",
            ),
        ),
    ])
});

/// Configuration for leetdoc, stored in `<scope dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeetdocConfig {
    /// Edit system-description sections in fullscreen
    #[serde(default = "default_true")]
    pub fullscreen_system_description: bool,

    /// Put a markdown rendering next to the JSON in export archives
    #[serde(default = "default_true")]
    pub export_markdown: bool,

    /// Assessment prompts per section type; missing types use the defaults
    #[serde(default)]
    pub prompts: BTreeMap<SectionType, SectionPrompts>,
}

fn default_true() -> bool {
    true
}

impl Default for LeetdocConfig {
    fn default() -> Self {
        Self {
            fullscreen_system_description: true,
            export_markdown: true,
            prompts: BTreeMap::new(),
        }
    }
}

impl LeetdocConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: LeetdocConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn prompts_for(&self, section_type: SectionType) -> SectionPrompts {
        self.prompts
            .get(&section_type)
            .or_else(|| DEFAULT_PROMPTS.get(&section_type))
            .cloned()
            .unwrap_or(SectionPrompts {
                get_answer: String::new(),
                verify_answer: String::new(),
            })
    }

    pub fn edit_in_fs_mode(&self, section_type: SectionType) -> Option<bool> {
        match section_type {
            SectionType::SystemDescription => Some(self.fullscreen_system_description),
            _ => None,
        }
    }

    /// Builds the editor-facing projection of a section.
    pub fn section_data(&self, document_id: &str, section: &Section) -> SectionData {
        let ty = section.section_type();
        SectionData::for_section(
            document_id,
            section,
            &self.prompts_for(ty),
            self.edit_in_fs_mode(ty),
        )
    }

    /// Keys: `fullscreen-dsl`, `export-markdown`, `prompt.<type>.get`, `prompt.<type>.verify`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "fullscreen-dsl" => Some(self.fullscreen_system_description.to_string()),
            "export-markdown" => Some(self.export_markdown.to_string()),
            _ => {
                let (ty, which) = parse_prompt_key(key)?;
                let prompts = self.prompts_for(ty);
                Some(match which {
                    PromptKind::Get => prompts.get_answer,
                    PromptKind::Verify => prompts.verify_answer,
                })
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "fullscreen-dsl" => self.fullscreen_system_description = parse_bool(value)?,
            "export-markdown" => self.export_markdown = parse_bool(value)?,
            _ => {
                let (ty, which) =
                    parse_prompt_key(key).ok_or_else(|| format!("Unknown config key: {}", key))?;
                let mut prompts = self.prompts_for(ty);
                match which {
                    PromptKind::Get => prompts.get_answer = value.to_string(),
                    PromptKind::Verify => prompts.verify_answer = value.to_string(),
                }
                self.prompts.insert(ty, prompts);
            }
        }
        Ok(())
    }

    pub fn keys() -> Vec<String> {
        let mut keys = vec!["fullscreen-dsl".to_string(), "export-markdown".to_string()];
        for ty in SectionType::ALL {
            keys.push(format!("prompt.{}.get", ty));
            keys.push(format!("prompt.{}.verify", ty));
        }
        keys
    }
}

enum PromptKind {
    Get,
    Verify,
}

fn parse_prompt_key(key: &str) -> Option<(SectionType, PromptKind)> {
    let rest = key.strip_prefix("prompt.")?;
    let (ty, which) = rest.rsplit_once('.')?;
    let ty = ty.parse().ok()?;
    let which = match which {
        "get" => PromptKind::Get,
        "verify" => PromptKind::Verify,
        _ => return None,
    };
    Some((ty, which))
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("Expected true or false, got '{}'", other)),
    }
}
