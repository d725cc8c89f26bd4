//! Section extraction
//!
//! Applies registry rules to a parsed document. Every requested section gets
//! exactly one outcome; a missing rule, a rule that matches nothing, and a
//! query the engine rejects all end up in the outcome map rather than as
//! errors.

use crate::document::Document;
use crate::query::{Match, QueryEngine, XPathEngine};
use crate::rules::{ExtractionRule, RuleLookup, RuleRegistry};
use crate::types::{Chunk, Publisher, Section, SectionOutcome};
use std::collections::BTreeMap;

pub struct SectionExtractor {
    registry: RuleRegistry,
    engine: Box<dyn QueryEngine>,
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::new(RuleRegistry::builtin(), Box::new(XPathEngine::new()))
    }
}

impl SectionExtractor {
    pub fn new(registry: RuleRegistry, engine: Box<dyn QueryEngine>) -> Self {
        Self { registry, engine }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &dyn QueryEngine {
        self.engine.as_ref()
    }

    /// Extract every requested section. Duplicate requests collapse into one entry.
    pub fn extract(
        &self,
        document: &mut Document,
        publisher: Publisher,
        sections: &[Section],
    ) -> BTreeMap<Section, SectionOutcome> {
        sections
            .iter()
            .map(|&section| (section, self.extract_section(document, publisher, section)))
            .collect()
    }

    pub fn extract_section(
        &self,
        document: &mut Document,
        publisher: Publisher,
        section: Section,
    ) -> SectionOutcome {
        match self.registry.lookup(publisher, section) {
            RuleLookup::Supported(rule) => self.apply_rule(document, rule),
            RuleLookup::Unsupported => {
                tracing::debug!(%publisher, %section, "section unsupported for publisher");
                SectionOutcome::Unsupported
            }
        }
    }

    /// Try candidate queries in order; the first one with a non-empty match wins
    fn apply_rule(&self, document: &mut Document, rule: &ExtractionRule) -> SectionOutcome {
        for query in &rule.queries {
            let matches = match self.engine.evaluate(document, None, query) {
                Ok(matches) => matches,
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "skipping query the engine rejected");
                    continue;
                }
            };

            let chunks: Vec<Chunk> = matches
                .iter()
                .filter_map(|m| self.build_chunk(document, m, rule))
                .collect();

            if !chunks.is_empty() {
                return SectionOutcome::Found {
                    query: query.clone(),
                    chunks,
                };
            }
        }
        SectionOutcome::NotFound
    }

    fn build_chunk(&self, document: &mut Document, matched: &Match, rule: &ExtractionRule) -> Option<Chunk> {
        if matched.text().is_empty() {
            return None;
        }

        let mut chunk = Chunk::new(matched.text());
        for field in &rule.fields {
            let value = match self.engine.evaluate(document, Some(matched), &field.query) {
                Ok(values) => values
                    .iter()
                    .map(|v| v.text())
                    .find(|v| !v.is_empty())
                    .unwrap_or_default()
                    .to_string(),
                Err(e) => {
                    tracing::warn!(field = %field.name, error = %e, "field query rejected");
                    String::new()
                }
            };
            chunk.fields.insert(field.name.clone(), value);
        }
        Some(chunk)
    }
}
