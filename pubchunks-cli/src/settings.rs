// Effective configuration for a CLI run
//
// The config file (or the defaults) comes first; command-line flags are
// applied on top of it.

use anyhow::{anyhow, Result};
use pubchunks_core::{ExtractionConfig, Publisher, Section};

/// Where the effective config came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Defaults,
    File(String),
    /// The file could not be read or parsed, so defaults were used
    Fallback { path: String, error: String },
}

/// Load the config file if one was given, falling back to defaults on error
pub fn load_config(path: Option<&str>) -> (ExtractionConfig, ConfigOrigin) {
    let Some(path) = path else {
        return (ExtractionConfig::default(), ConfigOrigin::Defaults);
    };
    match ExtractionConfig::load_from_file(path) {
        Ok(config) => (config, ConfigOrigin::File(path.to_string())),
        Err(e) => {
            let error = format!("{e:#}");
            tracing::warn!(path, error = %error, "failed to load config, using defaults");
            let origin = ConfigOrigin::Fallback {
                path: path.to_string(),
                error,
            };
            (ExtractionConfig::default(), origin)
        }
    }
}

/// Flag values that win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sections: Option<String>,
    pub publisher: Option<String>,
    pub rules: Option<String>,
    pub sequential: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut ExtractionConfig) -> Result<()> {
        if let Some(selector) = &self.sections {
            let sections = Section::parse_list(selector).map_err(|e| anyhow!(e))?;
            *config = config.clone().with_sections(sections);
        }
        if let Some(name) = &self.publisher {
            let publisher: Publisher = name.parse().map_err(|e: String| anyhow!(e))?;
            config.publisher = Some(publisher);
        }
        if let Some(rules) = &self.rules {
            config.rules_file = Some(rules.clone());
        }
        if self.sequential {
            config.parallel = false;
        }
        Ok(())
    }
}
