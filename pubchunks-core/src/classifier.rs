use crate::document::Document;
use crate::query::{QueryEngine, XPathEngine};
use crate::types::*;
use regex::Regex;
use std::sync::LazyLock;

static DOI_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:doi:\s*|doi\.org/)?(10\.\d{4,9})/\S+").unwrap());

const ROOT_NAME_QUERY: &str = "local-name(/*)";
const ROOT_NAMESPACE_QUERY: &str = "namespace-uri(/*)";
const ARTICLE_DOI_QUERY: &str = "//article-meta/article-id[@pub-id-type='doi']";
const COREDATA_DOI_QUERY: &str = "//*:coredata/*:doi";
const PUBLISHER_NAME_QUERY: &str = "//journal-meta//publisher-name";

const ELSEVIER_NAMESPACES: [&str; 2] = [
    "http://www.elsevier.com/xml/svapi/article/dtd",
    "http://www.elsevier.com/xml/ja/dtd",
];

/// DOI registrant prefixes, one per publisher
const DOI_PREFIXES: [(&str, Publisher); 10] = [
    ("10.7554", Publisher::Elife),
    ("10.1371", Publisher::Plos),
    ("10.7717", Publisher::Peerj),
    ("10.3897", Publisher::Pensoft),
    ("10.1155", Publisher::Hindawi),
    ("10.5194", Publisher::Copernicus),
    ("10.3389", Publisher::Frontiers),
    ("10.12688", Publisher::F1000research),
    ("10.1080", Publisher::Cogent),
    ("10.1016", Publisher::Elsevier),
];

/// Lowercase markers looked for inside the publisher-name text
const PUBLISHER_NAME_MARKERS: [(&str, Publisher); 10] = [
    ("elife", Publisher::Elife),
    ("public library of science", Publisher::Plos),
    ("peerj", Publisher::Peerj),
    ("pensoft", Publisher::Pensoft),
    ("hindawi", Publisher::Hindawi),
    ("copernicus", Publisher::Copernicus),
    ("frontiers", Publisher::Frontiers),
    ("f1000", Publisher::F1000research),
    ("cogent", Publisher::Cogent),
    ("elsevier", Publisher::Elsevier),
];

/// Pull the registrant prefix ("10.7554") out of a DOI string or DOI URL
pub fn doi_prefix(doi: &str) -> Option<&str> {
    DOI_PREFIX_REGEX
        .captures(doi)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Classifies documents into publisher profiles.
///
/// Diagnostics run in a fixed order and the first one that produces any
/// candidate decides: root element / namespace, then the article DOI prefix,
/// then the publisher-name text. Within a diagnostic, candidates are ranked
/// by `Publisher` declaration order.
pub struct PublisherDetector {
    engine: XPathEngine,
}

type Diagnostic = fn(&PublisherDetector, &mut Document) -> Option<(Publisher, DetectionSignal)>;

impl Default for PublisherDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PublisherDetector {
    pub fn new() -> Self {
        Self {
            engine: XPathEngine::new(),
        }
    }

    pub fn detect(&self, document: &mut Document) -> Detection {
        let diagnostics: [Diagnostic; 3] = [
            Self::from_root_element,
            Self::from_doi_prefix,
            Self::from_publisher_name,
        ];

        for diagnostic in diagnostics {
            if let Some((publisher, signal)) = diagnostic(self, document) {
                tracing::debug!(%publisher, ?signal, "publisher detected");
                return Detection {
                    publisher,
                    signal: Some(signal),
                };
            }
        }

        tracing::debug!("no publisher diagnostic matched, using unknown profile");
        Detection::unrecognized()
    }

    /// Detection that skips diagnostics and pins the profile
    pub fn forced(&self, publisher: Publisher) -> Detection {
        Detection {
            publisher,
            signal: Some(DetectionSignal::Override),
        }
    }

    /// Non-empty string values selected by `query` from the document node
    fn values(&self, document: &mut Document, query: &str) -> Vec<String> {
        match self.engine.evaluate(document, None, query) {
            Ok(matches) => matches
                .iter()
                .map(|m| m.text().to_string())
                .filter(|text| !text.is_empty())
                .collect(),
            Err(e) => {
                tracing::debug!(query, error = %e, "detection query failed");
                Vec::new()
            }
        }
    }

    fn from_root_element(&self, document: &mut Document) -> Option<(Publisher, DetectionSignal)> {
        let name = self.values(document, ROOT_NAME_QUERY).into_iter().next()?;
        let namespace = self.values(document, ROOT_NAMESPACE_QUERY).into_iter().next();

        let mut candidates = Vec::new();
        if name == "full-text-retrieval-response" {
            candidates.push((Publisher::Elsevier, name.clone()));
        }
        if let Some(ns) = namespace.filter(|ns| ELSEVIER_NAMESPACES.contains(&ns.as_str())) {
            candidates.push((Publisher::Elsevier, ns));
        }
        if name == "pmc-articleset" {
            candidates.push((Publisher::Entrez, name));
        }

        pick(candidates).map(|(p, value)| (p, DetectionSignal::RootElement(value)))
    }

    fn from_doi_prefix(&self, document: &mut Document) -> Option<(Publisher, DetectionSignal)> {
        let mut dois = self.values(document, ARTICLE_DOI_QUERY);
        dois.extend(self.values(document, COREDATA_DOI_QUERY));

        let mut candidates = Vec::new();
        for doi in &dois {
            let Some(prefix) = doi_prefix(doi) else {
                continue;
            };
            if let Some((_, publisher)) = DOI_PREFIXES.iter().find(|(p, _)| *p == prefix) {
                candidates.push((*publisher, prefix.to_string()));
            }
        }

        pick(candidates).map(|(p, value)| (p, DetectionSignal::DoiPrefix(value)))
    }

    fn from_publisher_name(&self, document: &mut Document) -> Option<(Publisher, DetectionSignal)> {
        let mut candidates = Vec::new();
        for name in self.values(document, PUBLISHER_NAME_QUERY) {
            let lowered = name.to_lowercase();
            for (marker, publisher) in PUBLISHER_NAME_MARKERS {
                if lowered.contains(marker) {
                    candidates.push((publisher, name.clone()));
                }
            }
        }

        pick(candidates).map(|(p, value)| (p, DetectionSignal::PublisherName(value)))
    }
}

/// Highest-priority candidate; first seen wins among equals
fn pick(candidates: Vec<(Publisher, String)>) -> Option<(Publisher, String)> {
    candidates.into_iter().reduce(|best, next| if next.0 < best.0 { next } else { best })
}
