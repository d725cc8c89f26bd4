use crate::classifier::PublisherDetector;
use crate::config::ExtractionConfig;
use crate::document::{Document, DocumentSource, LoadedDocument};
use crate::error::ChunkError;
use crate::extractor::SectionExtractor;
use crate::preprocessors::{Preprocessor, XmlPreprocessor};
use crate::query::XPathEngine;
use crate::rules::RuleRegistry;
use crate::types::*;
use anyhow::Result;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Pipeline stages timed by the profiler
const STAGE_LOAD: &str = "Load + parse XML";
const STAGE_DETECT: &str = "Publisher detection";
const STAGE_EXTRACT: &str = "Section extraction";

/// Simple profiler that collects timings for pipeline steps.
/// Repeated steps (one per document in a batch) are summed under one name.
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration, usize)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, step_name: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        match self.timings.iter_mut().find(|(name, _, _)| name == step_name) {
            Some((_, total, count)) => {
                *total += elapsed;
                *count += 1;
            }
            None => self.timings.push((step_name.to_string(), elapsed, 1)),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        self.record(step_name, start.elapsed());
        result
    }

    /// Total time recorded for a step, if it ran
    pub fn total(&self, step_name: &str) -> Option<Duration> {
        self.timings
            .iter()
            .find(|(name, _, _)| name == step_name)
            .map(|(_, total, _)| *total)
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d, _)| *d).sum();

        for (step, duration, count) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.0}ms ({:.1}%, {}x)",
                step,
                duration.as_millis(),
                percentage,
                count
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Per-document stage timings, merged into a `StepProfiler` after a batch
type StageTimings = Vec<(&'static str, Duration)>;

pub struct DocumentProcessor {
    preprocessor: Box<dyn Preprocessor>,
    detector: PublisherDetector,
    extractor: SectionExtractor,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor {
    /// Create DocumentProcessor with full dependency injection
    pub fn new_with_dependencies(
        preprocessor: Box<dyn Preprocessor>,
        extractor: SectionExtractor,
    ) -> Self {
        Self {
            preprocessor,
            detector: PublisherDetector::new(),
            extractor,
        }
    }

    /// XML preprocessor, built-in rules, built-in query engine
    pub fn new() -> Self {
        Self::new_with_dependencies(Box::new(XmlPreprocessor::new()), SectionExtractor::default())
    }

    /// Build a processor for a config, merging its rule file over the built-ins
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let engine = XPathEngine::new();
        let registry = match &config.rules_file {
            Some(path) => RuleRegistry::builtin().merge_file(path, &engine)?,
            None => RuleRegistry::builtin(),
        };
        let extractor = SectionExtractor::new(registry, Box::new(engine));
        Ok(Self::new_with_dependencies(
            Box::new(XmlPreprocessor::new()),
            extractor,
        ))
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.extractor.registry()
    }

    pub fn preprocessor(&self) -> &dyn Preprocessor {
        self.preprocessor.as_ref()
    }

    /// Load a source and report which publisher it belongs to, without extracting
    pub fn detect(&self, source: &DocumentSource) -> std::result::Result<Detection, ChunkError> {
        let mut document = self.preprocessor.load(source)?;
        Ok(self.detector.detect(&mut document))
    }

    /// Publisher a full run with `config` would use for `source`: the
    /// configured override if there is one, detection otherwise. The source
    /// is still loaded, so unreadable inputs fail the same way in both.
    pub fn resolve(
        &self,
        source: &DocumentSource,
        config: &ExtractionConfig,
    ) -> std::result::Result<Detection, ChunkError> {
        let mut document = self.preprocessor.load(source)?;
        Ok(self.resolve_publisher(&mut document, config))
    }

    /// Detect (or take the forced publisher) and extract from an already parsed document
    pub fn extract_document(&self, document: &mut Document, config: &ExtractionConfig) -> DocumentExtraction {
        let detection = self.resolve_publisher(document, config);
        let sections = self
            .extractor
            .extract(document, detection.publisher, &config.sections);
        DocumentExtraction {
            publisher: detection.publisher,
            detection,
            sections,
        }
    }

    /// Process one source. Load failures end up in the result, never as an error.
    pub fn process_document(
        &self,
        index: usize,
        source: &DocumentSource,
        config: &ExtractionConfig,
    ) -> DocumentResult {
        self.process_document_timed(index, source, config, false).0
    }

    fn process_document_timed(
        &self,
        index: usize,
        source: &DocumentSource,
        config: &ExtractionConfig,
        timed: bool,
    ) -> (DocumentResult, StageTimings) {
        let id = document_id(index);
        let label = source.label();
        let mut timings = StageTimings::new();
        let mut stage = |name: &'static str, start: Instant| {
            if timed {
                timings.push((name, start.elapsed()));
            }
        };

        let start = Instant::now();
        let loaded: std::result::Result<LoadedDocument, ChunkError> = self.preprocessor.load(source);
        stage(STAGE_LOAD, start);

        let outcome = match loaded {
            Ok(mut document) => {
                let start = Instant::now();
                let detection = self.resolve_publisher(&mut document, config);
                stage(STAGE_DETECT, start);

                let start = Instant::now();
                let sections = self
                    .extractor
                    .extract(&mut document, detection.publisher, &config.sections);
                stage(STAGE_EXTRACT, start);

                let found = sections.values().filter(|o| o.is_found()).count();
                tracing::debug!(
                    document = %id,
                    source = %label,
                    publisher = %detection.publisher,
                    found,
                    requested = sections.len(),
                    "document extracted"
                );
                DocumentOutcome::Extracted(DocumentExtraction {
                    publisher: detection.publisher,
                    detection,
                    sections,
                })
            }
            Err(e) => {
                tracing::warn!(document = %id, source = %label, error = %e, "document failed");
                DocumentOutcome::Failed(e.to_failure())
            }
        };

        let result = DocumentResult {
            id,
            source: label,
            outcome,
        };
        (result, timings)
    }

    fn resolve_publisher(&self, document: &mut Document, config: &ExtractionConfig) -> Detection {
        if let Some(publisher) = config.publisher {
            return self.detector.forced(publisher);
        }
        let detection = self.detector.detect(document);
        if !detection.is_recognized() {
            tracing::warn!("publisher not recognized, using the generic profile");
        }
        detection
    }

    /// Process every source independently. Results come back in input order
    /// whether or not the batch ran in parallel.
    pub fn process_batch(&self, sources: &[DocumentSource], config: &ExtractionConfig) -> ExtractionReport {
        self.process_batch_with_profiling(sources, config, &mut StepProfiler::new(false))
    }

    pub fn process_batch_with_profiling(
        &self,
        sources: &[DocumentSource],
        config: &ExtractionConfig,
        profiler: &mut StepProfiler,
    ) -> ExtractionReport {
        let timed = profiler.is_enabled();
        let start = Instant::now();

        let processed: Vec<(DocumentResult, StageTimings)> = if config.parallel {
            sources
                .par_iter()
                .enumerate()
                .map(|(index, source)| self.process_document_timed(index, source, config, timed))
                .collect()
        } else {
            sources
                .iter()
                .enumerate()
                .map(|(index, source)| self.process_document_timed(index, source, config, timed))
                .collect()
        };

        let mut documents = Vec::with_capacity(processed.len());
        for (result, timings) in processed {
            for (stage, elapsed) in timings {
                profiler.record(stage, elapsed);
            }
            documents.push(result);
        }

        let report = ExtractionReport::new(config.sections.clone(), documents);
        tracing::info!(
            documents = report.documents.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            parallel = config.parallel,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pensoft(title: &str) -> DocumentSource {
        DocumentSource::Text(format!(
            r#"<article><front><journal-meta><publisher><publisher-name>Pensoft Publishers</publisher-name></publisher></journal-meta>
<article-meta><article-id pub-id-type="doi">10.3897/zookeys.1.1</article-id>
<title-group><article-title>{title}</article-title></title-group></article-meta></front></article>"#
        ))
    }

    fn config(sections: &[Section]) -> ExtractionConfig {
        ExtractionConfig::default().with_sections(sections.to_vec())
    }

    #[test]
    fn test_failures_are_isolated() {
        let sources = vec![
            pensoft("First"),
            DocumentSource::Text("<article><front></article>".to_string()),
            DocumentSource::Path(PathBuf::from("does/not/exist.xml")),
            DocumentSource::Text("   ".to_string()),
            pensoft("Last"),
        ];
        let report = DocumentProcessor::new().process_batch(&sources, &config(&[Section::Title]));

        assert_eq!(report.documents.len(), 5);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.documents[1].failure().unwrap().kind, FailureKind::Malformed);
        assert_eq!(report.documents[2].failure().unwrap().kind, FailureKind::Unreadable);
        assert_eq!(report.documents[3].failure().unwrap().kind, FailureKind::Empty);
        let last = report.documents[4].extraction().unwrap();
        assert_eq!(last.publisher, Publisher::Pensoft);
        assert_eq!(last.sections[&Section::Title].chunks()[0].text, "Last");
    }

    #[test]
    fn test_batch_order_is_stable_in_both_modes() {
        let sources: Vec<DocumentSource> = (0..24).map(|i| pensoft(&format!("T{i}"))).collect();
        let processor = DocumentProcessor::new();

        for parallel in [true, false] {
            let mut config = config(&[Section::Title]);
            config.parallel = parallel;
            let report = processor.process_batch(&sources, &config);
            for (i, doc) in report.documents.iter().enumerate() {
                assert_eq!(doc.id, format!("doc-{}", i + 1));
                let title = &doc.extraction().unwrap().sections[&Section::Title];
                assert_eq!(title.chunks()[0].text, format!("T{i}"));
            }
        }
    }

    #[test]
    fn test_forced_publisher_overrides_detection() {
        let mut config = config(&[Section::ExecutiveSummary]);
        config.publisher = Some(Publisher::Hindawi);
        let result = DocumentProcessor::new().process_document(0, &pensoft("X"), &config);
        let extraction = result.extraction().unwrap();
        assert_eq!(extraction.publisher, Publisher::Hindawi);
        assert_eq!(extraction.detection.signal, Some(DetectionSignal::Override));
        assert!(extraction.sections[&Section::ExecutiveSummary].is_unsupported());
    }

    #[test]
    fn test_detect_only() {
        let detection = DocumentProcessor::new().detect(&pensoft("X")).unwrap();
        assert_eq!(detection.publisher, Publisher::Pensoft);
        assert!(DocumentProcessor::new()
            .detect(&DocumentSource::Text("<a>".to_string()))
            .is_err());
    }

    #[test]
    fn test_resolve_honours_publisher_override() {
        let processor = DocumentProcessor::new();
        let mut config = config(&[Section::Title]);
        assert_eq!(
            processor.resolve(&pensoft("X"), &config).unwrap().publisher,
            Publisher::Pensoft
        );

        config.publisher = Some(Publisher::Elife);
        let detection = processor.resolve(&pensoft("X"), &config).unwrap();
        assert_eq!(detection.publisher, Publisher::Elife);
        assert_eq!(detection.signal, Some(DetectionSignal::Override));
        assert!(processor
            .resolve(&DocumentSource::Text("<a>".to_string()), &config)
            .is_err());
    }

    #[test]
    fn test_shared_parsed_document_in_a_batch() {
        let document = XmlPreprocessor::new()
            .parse_markup(
                r#"<article><front><article-meta><article-id pub-id-type="doi">10.3897/zookeys.1.1</article-id>
<title-group><article-title>Shared</article-title></title-group></article-meta></front></article>"#,
            )
            .unwrap();
        let shared = DocumentSource::from(document);
        let sources = vec![shared.clone(), shared];
        let report = DocumentProcessor::new().process_batch(&sources, &config(&[Section::Title]));

        for doc in &report.documents {
            assert_eq!(doc.source, "parsed");
            let extraction = doc.extraction().unwrap();
            assert_eq!(extraction.publisher, Publisher::Pensoft);
            assert_eq!(extraction.sections[&Section::Title].chunks()[0].text, "Shared");
        }
    }

    #[test]
    fn test_profiler_aggregates_stages() {
        let sources = vec![pensoft("A"), pensoft("B")];
        let mut profiler = StepProfiler::new(true);
        DocumentProcessor::new().process_batch_with_profiling(
            &sources,
            &config(&[Section::Title]),
            &mut profiler,
        );
        assert!(profiler.total(STAGE_LOAD).is_some());
        assert!(profiler.total(STAGE_EXTRACT).is_some());

        let mut disabled = StepProfiler::new(false);
        assert_eq!(disabled.time_step("noop", || 7), 7);
        assert!(disabled.total("noop").is_none());
    }
}
