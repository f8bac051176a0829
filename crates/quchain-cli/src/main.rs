//! quchain CLI - Command-line interface
//!
//! Usage:
//!   quchain extract [DIR] [--newoff] [--incass] [--prooff] [--format json]
//!   quchain export [DIR] [--output DIR]
//!
//! Results go to stdout, diagnostics to stderr.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use quchain_core::{AppConfig, ChainRecord, FilterConfig, Lexicon, LoggingConfig};
use quchain_extractor::{BatchSummary, ChainExtractor};
use quchain_parser::{conllu, is_tei_file, TeiParser};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quchain")]
#[command(about = "Extract coreference chains around interrogative words from TEI transcripts")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chains of every .tei document in a directory
    Extract {
        /// Directory holding the documents
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Accept interrogative mentions that are not new referents
        #[arg(long)]
        newoff: bool,

        /// Include associative chains
        #[arg(long)]
        incass: bool,

        /// Do not require a pronoun in the chain
        #[arg(long)]
        prooff: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
    /// Write a CoNLL-U file for every .tei document in a directory
    Export {
        /// Directory holding the documents
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Directory receiving the .conllu files
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

/// One line of JSON output
#[derive(Serialize)]
struct JsonRecord<'a> {
    file: &'a str,
    #[serde(flatten)]
    record: &'a ChainRecord,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            dir,
            newoff,
            incass,
            prooff,
            format,
        } => {
            let filter = apply_flags(config.filter, newoff, incass, prooff);
            let mut out = BufWriter::new(io::stdout().lock());
            run_extract(&dir, filter, format, &mut out)?;
            out.flush()?;
            Ok(())
        }
        Commands::Export { dir, output } => run_export(&dir, &output),
    }
}

/// Defaults, then the file, then the environment
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_override()?)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Command-line switches only ever relax the filter
fn apply_flags(mut filter: FilterConfig, newoff: bool, incass: bool, prooff: bool) -> FilterConfig {
    if newoff {
        filter.require_novelty = false;
    }
    if incass {
        filter.exclude_associative = false;
    }
    if prooff {
        filter.require_pronoun = false;
    }
    filter
}

/// `.tei` files directly under `dir`, sorted by name
fn list_documents(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_tei_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract every document of `dir`, writing results to `out`
///
/// A document that fails is logged and skipped.
fn run_extract(
    dir: &Path,
    filter: FilterConfig,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<BatchSummary> {
    let files = list_documents(dir)?;
    tracing::info!(dir = %dir.display(), documents = files.len(), ?filter, "Extracting chains");

    let parser = TeiParser::new();
    let extractor = ChainExtractor::new(filter, Lexicon::french());
    let mut summary = BatchSummary::default();

    for path in &files {
        let name = file_name(path);

        let extraction = parser
            .parse(path)
            .map_err(anyhow::Error::from)
            .and_then(|doc| Ok(extractor.extract_document(&doc)?));

        let extraction = match extraction {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Document skipped");
                summary.record_skip();
                continue;
            }
        };

        summary.record(&extraction.stats);
        match format {
            OutputFormat::Markdown => write_markdown(out, &name, &extraction.records)?,
            OutputFormat::Json => write_json(out, &name, &extraction.records)?,
        }
    }

    tracing::info!(
        documents = summary.documents,
        skipped = summary.skipped,
        with_chains = summary.with_chains,
        chains = summary.totals.rendered_chains(),
        rejected = summary.totals.rejected_chains,
        "Extraction finished"
    );
    Ok(summary)
}

fn write_markdown(out: &mut impl Write, name: &str, records: &[ChainRecord]) -> io::Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    writeln!(out, "### File: {name}\n")?;
    for record in records {
        writeln!(
            out,
            " * {}: [{}]\n",
            record.chain_id,
            record.member_mention_ids.join(", ")
        )?;
        writeln!(out, "\t{}\n", record.rendered_text)?;
    }
    Ok(())
}

fn write_json(out: &mut impl Write, name: &str, records: &[ChainRecord]) -> anyhow::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, &JsonRecord { file: name, record })?;
        writeln!(out)?;
    }
    Ok(())
}

fn run_export(dir: &Path, output: &Path) -> anyhow::Result<()> {
    let files = list_documents(dir)?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Cannot create directory {}", output.display()))?;

    // Plain transcripts are exported too
    let parser = TeiParser::new().with_annotations(false);
    let mut written = 0;

    for path in &files {
        let result = parser
            .parse(path)
            .and_then(|doc| conllu::export_file(&doc, path, output));

        match result {
            Ok(target) => {
                tracing::info!(file = %file_name(path), target = %target.display(), "Exported");
                written += 1;
            }
            Err(e) => tracing::warn!(file = %file_name(path), error = %e, "Document skipped"),
        }
    }

    tracing::info!(documents = files.len(), written, "Export finished");
    Ok(())
}
