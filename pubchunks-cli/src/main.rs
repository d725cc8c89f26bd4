use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pubchunks::output::{default_output_path, render, OutputFormat};
use pubchunks::settings::{load_config, ConfigOrigin, Overrides};
use pubchunks::{
    DocumentProcessor, DocumentSource, ExtractionConfig, ExtractionReport, Publisher, Section,
    SectionOutcome, StepProfiler,
};

#[derive(Parser)]
#[command(name = "pubchunks")]
#[command(about = "Extract publisher-specific sections from scholarly article XML")]
struct Args {
    /// Article XML files to process
    #[arg(
        short,
        long,
        num_args = 1..,
        required_unless_present_any = ["show_providers", "show_sections"]
    )]
    input: Vec<String>,

    /// Sections to extract: comma separated list, or `all`
    #[arg(short, long)]
    sections: Option<String>,

    /// Force a publisher profile instead of detecting one per document
    #[arg(short, long)]
    publisher: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Extra extraction rules (YAML) merged over the built-in profiles
    #[arg(short, long)]
    rules: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "json")]
    output_format: OutputFormat,

    /// Output file path (auto-generated if not specified, `-` for stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Only report the detected publisher for each input
    #[arg(long)]
    detect_only: bool,

    /// List publisher profiles and the sections each supports, then exit
    #[arg(long)]
    show_providers: bool,

    /// List section names, then exit
    #[arg(long)]
    show_sections: bool,

    /// Process inputs one at a time instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let to_stdout = args.output.as_deref() == Some("-");

    // Progress goes to stdout like the rest of the CLI, unless stdout carries the data
    macro_rules! progress {
        ($($arg:tt)*) => {
            if !to_stdout {
                println!($($arg)*);
            }
        };
    }

    progress!("🦀 PubChunks Article Extractor");

    let (mut config, origin) = load_config(args.config.as_deref());
    match &origin {
        ConfigOrigin::File(path) => progress!("📋 Loaded config from: {}", path),
        ConfigOrigin::Defaults => progress!("📋 Using default config"),
        ConfigOrigin::Fallback { path, error } => {
            eprintln!("⚠️  Could not load config {}: {}", path, error);
            progress!("📋 Using default config");
        }
    }
    args.overrides().apply(&mut config)?;
    tracing::debug!(
        sections = config.sections.len(),
        publisher = ?config.publisher,
        parallel = config.parallel,
        "effective config"
    );

    let processor = DocumentProcessor::from_config(&config)?;
    if let Some(rules_path) = &config.rules_file {
        progress!("📐 Merged extraction rules from: {}", rules_path);
    }

    if args.show_providers {
        show_providers(&processor);
        return Ok(());
    }
    if args.show_sections {
        show_sections();
        return Ok(());
    }

    let sources: Vec<DocumentSource> = args
        .input
        .iter()
        .map(|path| DocumentSource::Path(PathBuf::from(path)))
        .collect();

    for path in &args.input {
        if !Path::new(path).exists() {
            progress!("⚠️  Input not found: {} (recorded as failed)", path);
        }
    }

    if args.detect_only {
        detect_only(&processor, &sources, &config);
        return Ok(());
    }

    progress!(
        "📄 Processing {} document(s){}",
        sources.len(),
        if config.parallel { "" } else { " sequentially" }
    );

    let mut profiler = StepProfiler::new(args.profile);
    let report = processor.process_batch_with_profiling(&sources, &config, &mut profiler);

    progress!(
        "✅ Extracted {} of {} document(s)",
        report.succeeded(),
        report.documents.len()
    );
    if !to_stdout {
        print_summary(&report);
    }

    let rendered = render(&report, &config.sections, args.output_format, &config.tabular)?;
    if to_stdout {
        println!("{rendered}");
    } else {
        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.input, args.output_format));
        std::fs::write(&output_path, rendered)?;
        println!("💾 Results saved to: {}", output_path);
    }

    if !to_stdout {
        profiler.print_summary();
    }

    if report.succeeded() == 0 && !report.documents.is_empty() {
        eprintln!("❌ No document could be processed");
        std::process::exit(1);
    }

    Ok(())
}

impl Args {
    /// CLI flags win over config file values
    fn overrides(&self) -> Overrides {
        Overrides {
            sections: self.sections.clone(),
            publisher: self.publisher.clone(),
            rules: self.rules.clone(),
            sequential: self.sequential,
        }
    }
}

fn detect_only(processor: &DocumentProcessor, sources: &[DocumentSource], config: &ExtractionConfig) {
    println!("\n🔎 Publisher detection:");
    for source in sources {
        match processor.resolve(source, config) {
            Ok(detection) => {
                let evidence = detection
                    .signal
                    .map(|s| format!("{s:?}"))
                    .unwrap_or_else(|| "no evidence".to_string());
                println!("   {} → {} ({})", source.label(), detection.publisher, evidence);
            }
            Err(e) => println!("   {} → ❌ {}", source.label(), e),
        }
    }
}

fn print_summary(report: &ExtractionReport) {
    println!("📊 Section summary:");
    for doc in &report.documents {
        match (doc.extraction(), doc.failure()) {
            (Some(extraction), _) => {
                let count = |f: fn(&SectionOutcome) -> bool| {
                    extraction.sections.values().filter(|o| f(o)).count()
                };
                println!(
                    "   - {} [{}] found {}, not found {}, unsupported {}",
                    doc.source,
                    extraction.publisher,
                    count(SectionOutcome::is_found),
                    count(|o| matches!(o, SectionOutcome::NotFound)),
                    count(SectionOutcome::is_unsupported),
                );
            }
            (None, Some(failure)) => {
                println!("   - {} ❌ {:?}: {}", doc.source, failure.kind, failure.message);
            }
            (None, None) => {}
        }
    }
}

fn show_providers(processor: &DocumentProcessor) {
    println!("\n📋 Publisher profiles:");
    for publisher in Publisher::ALL {
        let sections: Vec<&str> = processor
            .registry()
            .supported_sections(publisher)
            .iter()
            .map(|s| s.as_str())
            .collect();
        println!("  {:<14} {}", publisher.as_str(), sections.join(", "));
    }
}

fn show_sections() {
    println!("\n📋 Sections (* = one table row per entry):");
    for section in Section::ALL {
        let marker = if section.is_multi_valued() { "*" } else { " " };
        println!("  {} {}", marker, section.as_str());
    }

    println!("\n📝 Usage Examples:");
    println!("  pubchunks -i article.xml");
    println!("  pubchunks -i a.xml b.xml -s title,abstract,refs -f tsv -o out.tsv");
    println!("  pubchunks -i article.xml -p pensoft -r extra_rules.yaml -o -");
}
