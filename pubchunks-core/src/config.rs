use crate::types::{Publisher, Section};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_sections() -> Vec<Section> {
    Section::ALL.to_vec()
}

fn default_join_separator() -> String {
    " ".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Sections to extract from every document
    #[serde(default = "default_sections")]
    pub sections: Vec<Section>,
    /// Force this publisher profile instead of detecting one per document
    #[serde(default)]
    pub publisher: Option<Publisher>,
    /// Process batch documents on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Extra YAML rule file merged over the built-in profiles
    #[serde(default)]
    pub rules_file: Option<String>,
    /// Tabular output configuration
    #[serde(default)]
    pub tabular: TabularConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularConfig {
    /// Separator used when a single-valued section matched several nodes
    #[serde(default = "default_join_separator")]
    pub join_separator: String,
    /// Emit a table for multi-valued sections even when no document has rows
    #[serde(default = "default_true")]
    pub include_empty_tables: bool,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            join_separator: default_join_separator(),
            include_empty_tables: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            publisher: None,
            parallel: true,
            rules_file: None,
            tabular: TabularConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config file {path}"))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: ExtractionConfig = serde_yaml::from_str(content)?;
        config.dedup_sections();
        Ok(config)
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self.dedup_sections();
        self
    }

    fn dedup_sections(&mut self) {
        let mut seen = Vec::with_capacity(self.sections.len());
        self.sections.retain(|s| {
            if seen.contains(s) {
                false
            } else {
                seen.push(*s);
                true
            }
        });
    }
}
