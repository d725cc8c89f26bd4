//! Document Preprocessors
//!
//! This module provides the loading layer that turns document sources into
//! the parsed `Document` tree consumed by detection and extraction.
//!
//! ## Architecture
//!
//! ```text
//! DocumentSource (path, inline text, parsed handle)
//!     ↓
//! [Preprocessor]
//!     ↓
//! Document (XPath document store)
//!     ↓
//! [PublisherDetector] → [SectionExtractor] → [Tabularizer]
//! ```
//!
//! ## Available Preprocessors
//!
//! - `XmlPreprocessor` - JATS and Elsevier article XML loaded into an XPath document store

pub mod preprocessor;
pub mod xml_parser;

pub use preprocessor::{Preprocessor, XmlPreprocessor};
pub use xml_parser::parse_xml;
