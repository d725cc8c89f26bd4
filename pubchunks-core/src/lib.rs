// PubChunks Core Library
//
// Pulls publisher-specific sections out of scholarly article XML.
// Pipeline: load XML -> detect publisher -> look up rules -> extract
// sections -> (optionally) flatten into tables.

pub mod types;
pub mod error;
pub mod document;
pub mod preprocessors;
pub mod query;
pub mod classifier;
pub mod rules;
pub mod extractor;
pub mod processor;
pub mod tabular;
pub mod config;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{ChunkError, QueryError};
pub use document::{Document, DocumentSource, LoadedDocument};
pub use preprocessors::{parse_xml, Preprocessor, XmlPreprocessor};
pub use query::{Match, QueryEngine, XPathEngine};
pub use classifier::PublisherDetector;
pub use rules::{ExtractionRule, RuleLookup, RuleRegistry, RuleSetFile};
pub use extractor::SectionExtractor;
pub use processor::{DocumentProcessor, StepProfiler};
pub use tabular::{Table, TableSet, Tabularizer};
pub use config::{ExtractionConfig, TabularConfig};
