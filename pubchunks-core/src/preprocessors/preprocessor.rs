// Preprocessor abstraction for document loading
//
// This module defines the boundary between document loading (source -> Document)
// and section extraction (Document -> sections). The abstraction allows for
// different markup front ends while keeping detection and extraction format-agnostic.

use crate::document::{Document, DocumentSource, LoadedDocument};
use crate::error::{ChunkError, Result};
use std::path::Path;

/// Preprocessor trait - converts document sources to parsed Documents
///
/// Everything after this point works with `Document` trees and never
/// touches raw bytes again. The loading happens in two steps:
/// 1. Source -> markup text (read file, decode UTF-8)
/// 2. Markup text -> Document (parse)
pub trait Preprocessor: Send + Sync {
    /// Step 2: Parse markup text into a Document tree
    fn parse_markup(&self, markup: &str) -> Result<Document>;

    /// Step 1: Decode raw bytes into markup text
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            ChunkError::malformed(format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()))
        })
    }

    /// Convenience method: read a file and parse it
    fn load_file(&self, path: &Path) -> Result<Document> {
        let bytes = std::fs::read(path).map_err(|source| ChunkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let markup = self.decode(&bytes)?;
        self.parse_markup(&markup)
    }

    /// Main entry point: resolve any source to a queryable Document
    fn load<'a>(&self, source: &'a DocumentSource) -> Result<LoadedDocument<'a>> {
        match source {
            DocumentSource::Path(path) => self.load_file(path).map(LoadedDocument::Owned),
            DocumentSource::Text(text) => self.parse_markup(text).map(LoadedDocument::Owned),
            DocumentSource::Parsed(shared) => Ok(LoadedDocument::lock(shared)),
        }
    }

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

/// Preprocessor for article XML (JATS, Elsevier full text, PMC article sets)
#[derive(Debug, Default, Clone)]
pub struct XmlPreprocessor;

impl XmlPreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Preprocessor for XmlPreprocessor {
    fn parse_markup(&self, markup: &str) -> Result<Document> {
        super::xml_parser::parse_xml(markup)
    }

    fn name(&self) -> &str {
        "xml"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xml" | "nxml" | "jats"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryEngine, XPathEngine};
    use crate::types::FailureKind;
    use std::io::Write;

    fn root_name(doc: &mut Document) -> String {
        let names = XPathEngine::new().evaluate(doc, None, "local-name(/*)").unwrap();
        names[0].text().to_string()
    }

    #[test]
    fn test_load_text_and_parsed_sources() {
        let preprocessor = XmlPreprocessor::new();
        let text = DocumentSource::Text("<article/>".to_string());
        let mut loaded = preprocessor.load(&text).unwrap();
        assert!(matches!(loaded, LoadedDocument::Owned(_)));
        assert_eq!(root_name(&mut loaded), "article");

        let parsed = DocumentSource::from(preprocessor.parse_markup("<response/>").unwrap());
        let mut loaded = preprocessor.load(&parsed).unwrap();
        assert!(matches!(loaded, LoadedDocument::Shared(_)));
        assert_eq!(root_name(&mut loaded), "response");
    }

    #[test]
    fn test_load_file_strips_bom() {
        let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        file.write_all(b"\xef\xbb\xbf<article><title>T</title></article>")
            .unwrap();
        let mut doc = XmlPreprocessor::new().load_file(file.path()).unwrap();
        let titles = XPathEngine::new().evaluate(&mut doc, None, "//title").unwrap();
        assert_eq!(titles[0].text(), "T");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = XmlPreprocessor::new()
            .load(&DocumentSource::Path("does/not/exist.xml".into()))
            .unwrap_err();
        assert_eq!(err.to_failure().kind, FailureKind::Unreadable);
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = XmlPreprocessor::new().decode(b"<a>\xff</a>").unwrap_err();
        assert_eq!(err.to_failure().kind, FailureKind::Malformed);
    }

    #[test]
    fn test_supported_extensions() {
        let preprocessor = XmlPreprocessor::new();
        assert!(preprocessor.supports_file_type(Path::new("a/elife.XML")));
        assert!(preprocessor.supports_file_type(Path::new("PMC123.nxml")));
        assert!(!preprocessor.supports_file_type(Path::new("paper.pdf")));
    }
}
