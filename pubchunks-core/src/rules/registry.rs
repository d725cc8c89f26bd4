use super::profiles::builtin_profiles;
use crate::query::QueryEngine;
use crate::types::{Publisher, Section};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// A named sub-value read relative to each matched node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub query: String,
}

/// How to find one section: candidate queries tried in order until one
/// matches, plus optional per-match fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRule>,
}

impl ExtractionRule {
    pub fn new(queries: &[&str]) -> Self {
        Self {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, query: &str) -> Self {
        self.fields.push(FieldRule {
            name: name.to_string(),
            query: query.to_string(),
        });
        self
    }

    /// Every query string the rule will evaluate
    pub fn all_queries(&self) -> impl Iterator<Item = &str> {
        self.queries
            .iter()
            .map(String::as_str)
            .chain(self.fields.iter().map(|f| f.query.as_str()))
    }
}

/// Result of a registry lookup. `Unsupported` means the profile has no rule
/// at all, which is different from a rule that finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLookup<'a> {
    Supported(&'a ExtractionRule),
    Unsupported,
}

/// One entry of a YAML rule file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    pub publisher: Publisher,
    pub section: Section,
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldRule>,
    /// Drop support for this (publisher, section) pair instead of defining it
    #[serde(default)]
    pub unsupported: bool,
}

/// Rule overrides loaded from YAML:
///
/// ```yaml
/// rules:
///   - publisher: hindawi
///     section: refs_dois
///     queries: ["//ref-list/ref//pub-id[@pub-id-type='doi']"]
///   - publisher: plos
///     section: acknowledgments
///     unsupported: true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetFile {
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

impl RuleSetFile {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading rule file {path}"))?;
        Self::from_yaml(&content).with_context(|| format!("parsing rule file {path}"))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Static (publisher, section) → rule mapping. Built once, then only read.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    profiles: BTreeMap<Publisher, BTreeMap<Section, ExtractionRule>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleRegistry {
    /// Registry with the built-in publisher profiles
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
        }
    }

    /// Registry without any rules; every lookup is unsupported
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    pub fn lookup(&self, publisher: Publisher, section: Section) -> RuleLookup<'_> {
        match self
            .profiles
            .get(&publisher)
            .and_then(|profile| profile.get(&section))
        {
            Some(rule) => RuleLookup::Supported(rule),
            None => RuleLookup::Unsupported,
        }
    }

    pub fn supports(&self, publisher: Publisher, section: Section) -> bool {
        matches!(self.lookup(publisher, section), RuleLookup::Supported(_))
    }

    /// Sections with a rule for this publisher, in `Section` order
    pub fn supported_sections(&self, publisher: Publisher) -> Vec<Section> {
        self.profiles
            .get(&publisher)
            .map(|profile| profile.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn with_rule(mut self, publisher: Publisher, section: Section, rule: ExtractionRule) -> Self {
        self.profiles
            .entry(publisher)
            .or_default()
            .insert(section, rule);
        self
    }

    pub fn without_rule(mut self, publisher: Publisher, section: Section) -> Self {
        if let Some(profile) = self.profiles.get_mut(&publisher) {
            profile.remove(&section);
        }
        self
    }

    /// Merge a rule file over this registry. Every query is checked with
    /// `engine` first; one bad query rejects the whole file.
    pub fn merge(mut self, rule_set: RuleSetFile, engine: &dyn QueryEngine) -> Result<Self> {
        for entry in &rule_set.rules {
            if entry.unsupported {
                continue;
            }
            if entry.queries.is_empty() {
                bail!(
                    "rule for {}/{} has no queries",
                    entry.publisher,
                    entry.section
                );
            }
            for query in entry
                .queries
                .iter()
                .chain(entry.fields.iter().map(|f| &f.query))
            {
                engine.check(query).with_context(|| {
                    format!("rule for {}/{}", entry.publisher, entry.section)
                })?;
            }
        }

        for entry in rule_set.rules {
            if entry.unsupported {
                tracing::debug!(publisher = %entry.publisher, section = %entry.section, "rule removed");
                self = self.without_rule(entry.publisher, entry.section);
            } else {
                tracing::debug!(publisher = %entry.publisher, section = %entry.section, "rule overridden");
                let rule = ExtractionRule {
                    queries: entry.queries,
                    fields: entry.fields,
                };
                self = self.with_rule(entry.publisher, entry.section, rule);
            }
        }
        Ok(self)
    }

    pub fn merge_file(self, path: &str, engine: &dyn QueryEngine) -> Result<Self> {
        let rule_set = RuleSetFile::load_from_file(path)?;
        let count = rule_set.rules.len();
        let merged = self.merge(rule_set, engine)?;
        tracing::info!(path, rules = count, "extraction rules loaded");
        Ok(merged)
    }

    /// Check every query in the registry against `engine`
    pub fn validate(&self, engine: &dyn QueryEngine) -> Result<()> {
        for (publisher, profile) in &self.profiles {
            for (section, rule) in profile {
                for query in rule.all_queries() {
                    engine
                        .check(query)
                        .with_context(|| format!("rule for {publisher}/{section}"))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::XPathEngine;

    #[test]
    fn test_builtin_rules_are_valid() {
        RuleRegistry::builtin()
            .validate(&XPathEngine::new())
            .unwrap();
    }

    #[test]
    fn test_every_publisher_has_a_profile() {
        let registry = RuleRegistry::builtin();
        for publisher in Publisher::ALL {
            assert!(
                registry.supports(publisher, Section::Title),
                "{publisher} has no title rule"
            );
        }
    }

    #[test]
    fn test_unsupported_pairs() {
        let registry = RuleRegistry::builtin();
        assert_eq!(
            registry.lookup(Publisher::Hindawi, Section::RefsDois),
            RuleLookup::Unsupported
        );
        assert!(registry.supports(Publisher::Elife, Section::ExecutiveSummary));
        assert!(!registry.supports(Publisher::Plos, Section::ExecutiveSummary));
        assert!(!registry.supports(Publisher::Elsevier, Section::JournalMeta));
        assert!(RuleRegistry::empty()
            .supported_sections(Publisher::Elife)
            .is_empty());
    }

    #[test]
    fn test_merge_overrides_and_removes() {
        let rules = RuleSetFile::from_yaml(
            r#"
rules:
  - publisher: hindawi
    section: refs_dois
    queries: ["//ref//pub-id[@pub-id-type='doi']"]
  - publisher: plos
    section: acknowledgments
    unsupported: true
"#,
        )
        .unwrap();
        let registry = RuleRegistry::builtin()
            .merge(rules, &XPathEngine::new())
            .unwrap();

        match registry.lookup(Publisher::Hindawi, Section::RefsDois) {
            RuleLookup::Supported(rule) => {
                assert_eq!(rule.queries, vec!["//ref//pub-id[@pub-id-type='doi']"])
            }
            RuleLookup::Unsupported => panic!("override not applied"),
        }
        assert!(!registry.supports(Publisher::Plos, Section::Acknowledgments));
        assert!(registry.supports(Publisher::Elife, Section::Acknowledgments));
    }

    #[test]
    fn test_merge_rejects_invalid_queries() {
        let rules = RuleSetFile::from_yaml(
            r#"
rules:
  - publisher: elife
    section: title
    queries: ["//title-group/"]
"#,
        )
        .unwrap();
        let err = RuleRegistry::builtin()
            .merge(rules, &XPathEngine::new())
            .unwrap_err();
        assert!(format!("{err:#}").contains("elife/title"), "{err:#}");
    }

    #[test]
    fn test_merge_rejects_rule_without_queries() {
        let rules = RuleSetFile::from_yaml("rules:\n  - publisher: plos\n    section: doi\n").unwrap();
        assert!(RuleRegistry::builtin()
            .merge(rules, &XPathEngine::new())
            .is_err());
    }

    #[test]
    fn test_unknown_section_in_rule_file_is_rejected() {
        assert!(RuleSetFile::from_yaml(
            "rules:\n  - publisher: plos\n    section: figures\n    queries: ['//fig']\n"
        )
        .is_err());
    }
}
