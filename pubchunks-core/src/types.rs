use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ===== PUBLISHER PROFILES =====
// Declaration order doubles as the detection priority order: when one
// diagnostic matches several publishers, the earliest variant wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Publisher {
    Elife,
    Plos,
    Peerj,
    Pensoft,
    Hindawi,
    Copernicus,
    Frontiers,
    F1000research,
    Cogent,
    Elsevier,
    Entrez,
    Unknown,
}

impl Publisher {
    /// Every publisher, in priority order. `Unknown` is last.
    pub const ALL: [Publisher; 12] = [
        Publisher::Elife,
        Publisher::Plos,
        Publisher::Peerj,
        Publisher::Pensoft,
        Publisher::Hindawi,
        Publisher::Copernicus,
        Publisher::Frontiers,
        Publisher::F1000research,
        Publisher::Cogent,
        Publisher::Elsevier,
        Publisher::Entrez,
        Publisher::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Publisher::Elife => "elife",
            Publisher::Plos => "plos",
            Publisher::Peerj => "peerj",
            Publisher::Pensoft => "pensoft",
            Publisher::Hindawi => "hindawi",
            Publisher::Copernicus => "copernicus",
            Publisher::Frontiers => "frontiers",
            Publisher::F1000research => "f1000research",
            Publisher::Cogent => "cogent",
            Publisher::Elsevier => "elsevier",
            Publisher::Entrez => "entrez",
            Publisher::Unknown => "unknown",
        }
    }

    /// Publishers whose articles are delivered as JATS XML
    pub fn is_jats(&self) -> bool {
        !matches!(self, Publisher::Elsevier)
    }
}

impl fmt::Display for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Publisher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Publisher::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown publisher '{s}'"))
    }
}

// ===== SECTIONS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Front,
    Body,
    Back,
    Title,
    Doi,
    Categories,
    Authors,
    Aff,
    Keywords,
    Abstract,
    ExecutiveSummary,
    Refs,
    RefsDois,
    Publisher,
    JournalMeta,
    ArticleMeta,
    Acknowledgments,
    Permissions,
    History,
}

impl Section {
    pub const ALL: [Section; 19] = [
        Section::Front,
        Section::Body,
        Section::Back,
        Section::Title,
        Section::Doi,
        Section::Categories,
        Section::Authors,
        Section::Aff,
        Section::Keywords,
        Section::Abstract,
        Section::ExecutiveSummary,
        Section::Refs,
        Section::RefsDois,
        Section::Publisher,
        Section::JournalMeta,
        Section::ArticleMeta,
        Section::Acknowledgments,
        Section::Permissions,
        Section::History,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Front => "front",
            Section::Body => "body",
            Section::Back => "back",
            Section::Title => "title",
            Section::Doi => "doi",
            Section::Categories => "categories",
            Section::Authors => "authors",
            Section::Aff => "aff",
            Section::Keywords => "keywords",
            Section::Abstract => "abstract",
            Section::ExecutiveSummary => "executive_summary",
            Section::Refs => "refs",
            Section::RefsDois => "refs_dois",
            Section::Publisher => "publisher",
            Section::JournalMeta => "journal_meta",
            Section::ArticleMeta => "article_meta",
            Section::Acknowledgments => "acknowledgments",
            Section::Permissions => "permissions",
            Section::History => "history",
        }
    }

    /// Sections that naturally hold many sub-entities and get one table row each
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            Section::Authors
                | Section::Aff
                | Section::Categories
                | Section::Keywords
                | Section::Refs
                | Section::RefsDois
        )
    }

    /// Parse a comma separated selector list. `all` expands to every section.
    /// Duplicates are dropped, first occurrence wins.
    pub fn parse_list(selector: &str) -> Result<Vec<Section>, String> {
        let mut sections = Vec::new();
        for part in selector.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("all") {
                for section in Section::ALL {
                    if !sections.contains(&section) {
                        sections.push(section);
                    }
                }
                continue;
            }
            let section: Section = part.parse()?;
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
        if sections.is_empty() {
            return Err("no sections requested".to_string());
        }
        Ok(sections)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Section::ALL
            .iter()
            .copied()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

// ===== DETECTION =====

/// Which diagnostic decided the publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DetectionSignal {
    /// Root element name or namespace declaration
    RootElement(String),
    /// Registrant prefix of the article DOI
    DoiPrefix(String),
    /// Text of the publisher-name element
    PublisherName(String),
    /// Caller forced the profile
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub publisher: Publisher,
    /// None when nothing matched and the profile fell back to `unknown`
    pub signal: Option<DetectionSignal>,
}

impl Detection {
    pub fn unrecognized() -> Self {
        Self {
            publisher: Publisher::Unknown,
            signal: None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.publisher != Publisher::Unknown
    }
}

// ===== EXTRACTION RESULTS =====

/// Content of one matched node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Named sub-fields (e.g. an author's surname); absent fields are empty strings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// A rule matched; `query` is the candidate that produced the chunks
    Found { query: String, chunks: Vec<Chunk> },
    /// The profile has a rule but nothing in this document matched it
    NotFound,
    /// The profile has no rule for this section
    Unsupported,
}

impl SectionOutcome {
    pub fn chunks(&self) -> &[Chunk] {
        match self {
            SectionOutcome::Found { chunks, .. } => chunks,
            _ => &[],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SectionOutcome::Found { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, SectionOutcome::Unsupported)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub publisher: Publisher,
    pub detection: Detection,
    pub sections: BTreeMap<Section, SectionOutcome>,
}

impl DocumentExtraction {
    pub fn section(&self, section: Section) -> Option<&SectionOutcome> {
        self.sections.get(&section)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Source could not be read
    Unreadable,
    /// Source is not well-formed XML
    Malformed,
    /// Source holds no root element
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Extracted(DocumentExtraction),
    Failed(DocumentFailure),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Stable identifier derived from the input position ("doc-1", "doc-2", ...)
    pub id: String,
    /// File path, or "inline" for text sources
    pub source: String,
    pub outcome: DocumentOutcome,
}

impl DocumentResult {
    pub fn extraction(&self) -> Option<&DocumentExtraction> {
        match &self.outcome {
            DocumentOutcome::Extracted(extraction) => Some(extraction),
            DocumentOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DocumentFailure> {
        match &self.outcome {
            DocumentOutcome::Failed(failure) => Some(failure),
            DocumentOutcome::Extracted(_) => None,
        }
    }

    pub fn publisher(&self) -> Option<Publisher> {
        self.extraction().map(|e| e.publisher)
    }
}

/// The schema version stamped on every report.
/// Bump this when the output shape changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub schema_version: String,
    /// Version of the library that produced the report
    pub tool_version: String,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<Section>,
    pub documents: Vec<DocumentResult>,
}

impl ExtractionReport {
    pub fn new(sections: Vec<Section>, documents: Vec<DocumentResult>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            sections,
            documents,
        }
    }

    pub fn get(&self, id: &str) -> Option<&DocumentResult> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn succeeded(&self) -> usize {
        self.documents
            .iter()
            .filter(|doc| doc.extraction().is_some())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }
}

pub fn document_id(index: usize) -> String {
    format!("doc-{}", index + 1)
}
