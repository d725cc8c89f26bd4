//! Tabular output
//!
//! Flattens an `ExtractionReport` into uniform tables:
//! - `documents`: one row per input document, one column per requested
//!   single-valued section
//! - one table per requested multi-valued section (`authors`, `refs`, ...):
//!   one row per chunk, carrying the originating document id
//!
//! Every row in a table has exactly `columns.len()` cells; anything missing
//! is an empty string. Column names are unique: `profile` is the publisher
//! profile used for extraction, and a section or field whose name repeats a
//! fixed column is written as `section.<name>` / `field.<name>`.

use crate::config::TabularConfig;
use crate::types::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const DOCUMENTS_TABLE: &str = "documents";

const DOCUMENT_COLUMNS: [&str; 5] = ["document", "source", "profile", "status", "error"];
const CHUNK_COLUMNS: [&str; 4] = ["document", "profile", "index", "text"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len(), "ragged row in {}", self.name);
        self.rows.push(row);
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().map(Value::String))
                    .collect()
            })
            .collect()
    }

    /// Tab-separated rendering with a header line. Tabs and newlines inside
    /// cells become spaces.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join("\t"));
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.replace(['\t', '\n', '\r'], " "))
                .collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSet {
    pub tables: Vec<Table>,
}

impl TableSet {
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// `{ "<table>": [ {column: value, ...}, ... ], ... }`
    pub fn to_json_records(&self) -> Value {
        let mut out = Map::new();
        for table in &self.tables {
            let records = table.to_records().into_iter().map(Value::Object).collect();
            out.insert(table.name.clone(), Value::Array(records));
        }
        Value::Object(out)
    }

    /// All tables as TSV blocks, each preceded by a `# <name>` line
    pub fn to_tsv(&self) -> String {
        self.tables
            .iter()
            .map(|t| format!("# {}\n{}", t.name, t.to_tsv()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct Tabularizer {
    config: TabularConfig,
}

impl Default for Tabularizer {
    fn default() -> Self {
        Self::new(TabularConfig::default())
    }
}

impl Tabularizer {
    pub fn new(config: TabularConfig) -> Self {
        Self { config }
    }

    pub fn tabularize(&self, report: &ExtractionReport, sections: &[Section]) -> TableSet {
        let mut tables = vec![self.documents_table(report, sections)];

        let mut seen = Vec::new();
        for &section in sections.iter().filter(|s| s.is_multi_valued()) {
            if seen.contains(&section) {
                continue;
            }
            seen.push(section);
            let table = self.section_table(report, section);
            if table.is_empty() && !self.config.include_empty_tables {
                continue;
            }
            tables.push(table);
        }

        tracing::debug!(tables = tables.len(), "report tabularized");
        TableSet { tables }
    }

    fn documents_table(&self, report: &ExtractionReport, sections: &[Section]) -> Table {
        let mut single: Vec<Section> = Vec::new();
        for &section in sections.iter().filter(|s| !s.is_multi_valued()) {
            if !single.contains(&section) {
                single.push(section);
            }
        }

        let columns = column_names(&DOCUMENT_COLUMNS, single.iter().map(|s| s.as_str()), "section");
        let mut table = Table::new(DOCUMENTS_TABLE, columns);

        for doc in &report.documents {
            let mut row = vec![doc.id.clone(), doc.source.clone()];
            match &doc.outcome {
                DocumentOutcome::Extracted(extraction) => {
                    row.push(extraction.publisher.to_string());
                    row.push("extracted".to_string());
                    row.push(String::new());
                    for section in &single {
                        let cell = extraction
                            .section(*section)
                            .map(|outcome| self.join_chunks(outcome.chunks()))
                            .unwrap_or_default();
                        row.push(cell);
                    }
                }
                DocumentOutcome::Failed(failure) => {
                    row.push(String::new());
                    row.push("failed".to_string());
                    row.push(failure.message.clone());
                    row.extend(single.iter().map(|_| String::new()));
                }
            }
            table.push_row(row);
        }
        table
    }

    fn section_table(&self, report: &ExtractionReport, section: Section) -> Table {
        // Union of field names first so every row has the same shape
        let field_names: BTreeSet<&str> = report
            .documents
            .iter()
            .filter_map(|doc| doc.extraction())
            .filter_map(|e| e.section(section))
            .flat_map(|outcome| outcome.chunks())
            .flat_map(|chunk| chunk.fields.keys().map(String::as_str))
            .collect();

        let columns = column_names(&CHUNK_COLUMNS, field_names.iter().copied(), "field");
        let mut table = Table::new(section.as_str(), columns);

        for doc in &report.documents {
            let Some(extraction) = doc.extraction() else {
                continue;
            };
            let Some(outcome) = extraction.section(section) else {
                continue;
            };
            for (index, chunk) in outcome.chunks().iter().enumerate() {
                let mut row = vec![
                    doc.id.clone(),
                    extraction.publisher.to_string(),
                    (index + 1).to_string(),
                    chunk.text.clone(),
                ];
                row.extend(
                    field_names
                        .iter()
                        .map(|f| chunk.field(f).unwrap_or_default().to_string()),
                );
                table.push_row(row);
            }
        }
        table
    }

    fn join_chunks(&self, chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.config.join_separator)
    }
}

/// Fixed columns followed by `extra`, prefixing extras that repeat a fixed name
fn column_names<'a>(fixed: &[&str], extra: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    let mut columns: Vec<String> = fixed.iter().map(|c| c.to_string()).collect();
    for name in extra {
        if fixed.contains(&name) {
            columns.push(format!("{prefix}.{name}"));
        } else {
            columns.push(name.to_string());
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn extracted(id: &str, publisher: Publisher, sections: Vec<(Section, SectionOutcome)>) -> DocumentResult {
        DocumentResult {
            id: id.to_string(),
            source: format!("{id}.xml"),
            outcome: DocumentOutcome::Extracted(DocumentExtraction {
                publisher,
                detection: Detection {
                    publisher,
                    signal: None,
                },
                sections: sections.into_iter().collect::<BTreeMap<_, _>>(),
            }),
        }
    }

    fn found(chunks: Vec<Chunk>) -> SectionOutcome {
        SectionOutcome::Found {
            query: "//x".to_string(),
            chunks,
        }
    }

    fn with_field(text: &str, name: &str, value: &str) -> Chunk {
        let mut chunk = Chunk::new(text);
        chunk.fields.insert(name.to_string(), value.to_string());
        chunk
    }

    fn report() -> ExtractionReport {
        ExtractionReport::new(
            vec![Section::Title, Section::Refs],
            vec![
                extracted(
                    "doc-1",
                    Publisher::Pensoft,
                    vec![
                        (Section::Title, found(vec![Chunk::new("A"), Chunk::new("B")])),
                        (
                            Section::Refs,
                            found(vec![
                                with_field("r1", "doi", "10.1/x"),
                                with_field("r2", "label", "2"),
                                Chunk::new("r3"),
                            ]),
                        ),
                    ],
                ),
                DocumentResult {
                    id: "doc-2".to_string(),
                    source: "bad.xml".to_string(),
                    outcome: DocumentOutcome::Failed(DocumentFailure {
                        kind: FailureKind::Malformed,
                        message: "malformed XML: boom".to_string(),
                    }),
                },
                extracted(
                    "doc-3",
                    Publisher::Hindawi,
                    vec![
                        (Section::Title, SectionOutcome::NotFound),
                        (Section::Refs, SectionOutcome::Unsupported),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_documents_table_has_one_row_per_document() {
        let tables = Tabularizer::default().tabularize(&report(), &[Section::Title, Section::Refs]);
        let docs = tables.get(DOCUMENTS_TABLE).unwrap();

        assert_eq!(
            docs.columns,
            vec!["document", "source", "profile", "status", "error", "title"]
        );
        assert_eq!(docs.len(), 3);
        assert_eq!(docs.cell(0, "title"), Some("A B"));
        assert_eq!(docs.cell(1, "status"), Some("failed"));
        assert_eq!(docs.cell(1, "title"), Some(""));
        assert_eq!(docs.cell(2, "title"), Some(""));
        assert_eq!(docs.cell(2, "profile"), Some("hindawi"));
    }

    #[test]
    fn test_publisher_section_gets_its_own_column() {
        let report = ExtractionReport::new(
            vec![Section::Title, Section::Publisher],
            vec![extracted(
                "doc-1",
                Publisher::Plos,
                vec![
                    (Section::Title, found(vec![Chunk::new("Snails")])),
                    (Section::Publisher, found(vec![Chunk::new("Public Library of Science")])),
                ],
            )],
        );
        let tables = Tabularizer::default().tabularize(&report, &[Section::Title, Section::Publisher]);
        let docs = tables.get(DOCUMENTS_TABLE).unwrap();

        let unique: BTreeSet<&String> = docs.columns.iter().collect();
        assert_eq!(unique.len(), docs.columns.len(), "{:?}", docs.columns);
        assert_eq!(docs.cell(0, "profile"), Some("plos"));
        assert_eq!(docs.cell(0, "publisher"), Some("Public Library of Science"));
        assert_eq!(docs.to_records()[0]["publisher"], "Public Library of Science");
    }

    #[test]
    fn test_field_named_like_a_fixed_column_is_prefixed() {
        let report = ExtractionReport::new(
            vec![Section::Keywords],
            vec![extracted(
                "doc-1",
                Publisher::Peerj,
                vec![(Section::Keywords, found(vec![with_field("shell", "text", "raw")]))],
            )],
        );
        let tables = Tabularizer::default().tabularize(&report, &[Section::Keywords]);
        let keywords = tables.get("keywords").unwrap();

        assert_eq!(keywords.columns, vec!["document", "profile", "index", "text", "field.text"]);
        assert_eq!(keywords.cell(0, "text"), Some("shell"));
        assert_eq!(keywords.cell(0, "field.text"), Some("raw"));
    }

    #[test]
    fn test_multi_valued_rows_share_document_reference() {
        let tables = Tabularizer::default().tabularize(&report(), &[Section::Refs]);
        let refs = tables.get("refs").unwrap();

        assert_eq!(refs.columns, vec!["document", "profile", "index", "text", "doi", "label"]);
        assert_eq!(refs.len(), 3);
        for row in 0..3 {
            assert_eq!(refs.cell(row, "document"), Some("doc-1"));
        }
        assert_eq!(refs.cell(0, "doi"), Some("10.1/x"));
        assert_eq!(refs.cell(0, "label"), Some(""));
        assert_eq!(refs.cell(2, "index"), Some("3"));
        assert!(refs.rows.iter().all(|r| r.len() == refs.columns.len()));
    }

    #[test]
    fn test_join_separator_and_empty_tables() {
        let config = TabularConfig {
            join_separator: " | ".to_string(),
            include_empty_tables: false,
        };
        let tables = Tabularizer::new(config).tabularize(&report(), &[Section::Title, Section::Authors]);
        assert_eq!(tables.get(DOCUMENTS_TABLE).unwrap().cell(0, "title"), Some("A | B"));
        assert!(tables.get("authors").is_none());

        let tables = Tabularizer::default().tabularize(&report(), &[Section::Authors]);
        let authors = tables.get("authors").unwrap();
        assert!(authors.is_empty());
        assert_eq!(authors.columns, vec!["document", "profile", "index", "text"]);
    }

    #[test]
    fn test_tsv_and_records() {
        let mut table = Table::new("t", vec!["a".to_string(), "b".to_string()]);
        table.push_row(vec!["x\ty".to_string(), "line\nbreak".to_string()]);
        assert_eq!(table.to_tsv(), "a\tb\nx y\tline break\n");

        let set = TableSet { tables: vec![table] };
        let json = set.to_json_records();
        assert_eq!(json["t"][0]["b"], "line\nbreak");
        assert!(set.to_tsv().starts_with("# t\na\tb\n"));
    }
}
