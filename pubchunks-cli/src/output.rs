// Output rendering for the CLI
//
// The core library produces an `ExtractionReport`; this module turns it into
// the bytes written to disk or stdout for each `--output-format`.

use anyhow::Result;
use clap::ValueEnum;
use pubchunks_core::{ExtractionReport, Section, TabularConfig, Tabularizer};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full extraction report (per-document section outcomes)
    Json,
    /// Flattened tables as JSON records
    Tables,
    /// Flattened tables as tab-separated text
    Tsv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Tables => "json",
            OutputFormat::Tsv => "tsv",
        }
    }
}

pub fn render(
    report: &ExtractionReport,
    sections: &[Section],
    format: OutputFormat,
    tabular: &TabularConfig,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Tables => {
            let tables = Tabularizer::new(tabular.clone()).tabularize(report, sections);
            serde_json::to_string_pretty(&tables.to_json_records())?
        }
        OutputFormat::Tsv => Tabularizer::new(tabular.clone())
            .tabularize(report, sections)
            .to_tsv(),
    };
    Ok(rendered)
}

/// Default output path: `<first input stem>_pubchunks.<ext>`, or
/// `batch_pubchunks.<ext>` when several inputs were given
pub fn default_output_path(inputs: &[String], format: OutputFormat) -> String {
    let stem = match inputs {
        [single] => Path::new(single)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output"),
        _ => "batch",
    };
    format!("{stem}_pubchunks.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubchunks_core::{DocumentProcessor, DocumentSource, ExtractionConfig};

    fn report(sections: &[Section]) -> ExtractionReport {
        let source = DocumentSource::Text(
            r#"<article><front><article-meta>
<article-id pub-id-type="doi">10.7717/peerj.100</article-id>
<title-group><article-title>Snail	shells</article-title></title-group>
<kwd-group><kwd>mollusca</kwd><kwd>shell</kwd></kwd-group>
</article-meta></front></article>"#
                .to_string(),
        );
        let config = ExtractionConfig::default().with_sections(sections.to_vec());
        DocumentProcessor::new().process_batch(&[source], &config)
    }

    #[test]
    fn test_json_report() {
        let sections = [Section::Title];
        let out = render(&report(&sections), &sections, OutputFormat::Json, &TabularConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["documents"][0]["outcome"]["publisher"], "peerj");
    }

    #[test]
    fn test_tables_and_tsv() {
        let sections = [Section::Title, Section::Keywords];
        let report = report(&sections);

        let out = render(&report, &sections, OutputFormat::Tables, &TabularConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["documents"][0]["title"], "Snail shells");
        assert_eq!(value["keywords"].as_array().unwrap().len(), 2);

        let tsv = render(&report, &sections, OutputFormat::Tsv, &TabularConfig::default()).unwrap();
        assert!(tsv.starts_with("# documents\ndocument\tsource\tprofile\tstatus\terror\ttitle\n"));
        assert!(tsv.contains("# keywords\n"));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(&["papers/zookeys.xml".to_string()], OutputFormat::Tsv),
            "zookeys_pubchunks.tsv"
        );
        assert_eq!(
            default_output_path(&["a.xml".to_string(), "b.xml".to_string()], OutputFormat::Json),
            "batch_pubchunks.json"
        );
    }
}
