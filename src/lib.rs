//! PentoRef: turns multimodal dialogue corpus recordings into tables.
//!
//! A PentoRef corpus is a set of recordings, each annotated as a bundle of
//! time-aligned tiers (episodes, utterances, words, dialogue acts, hand
//! actions) plus per-game scene descriptions. This crate aligns the tiers
//! by temporal overlap and emits flat tables of words, utterances,
//! references, scene objects and actions, together with a diagnostic log of
//! everything that could not be aligned.
//!
//! # Modules
//!
//! - [`ir`]: Intervals, tiers, recordings and the five record kinds
//! - [`index`]: Directory scan into recordings and scene sources
//! - [`resolve`]: Overlap resolver
//! - [`assemble`]: Record assembler, one extractor per corpus variant
//! - [`text`]: Utterance cleaning, markup, tokenization and lemmatization
//! - [`tables`]: Frozen table schemas and CSV / JSON / SQLite output
//! - [`diagnostics`]: The diagnostic log
//! - [`conversion`]: Per-run conversion report
//! - [`config`]: YAML run configuration
//! - [`error`]: Error types for pentoref operations

pub mod assemble;
pub mod config;
pub mod conversion;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod ir;
pub mod resolve;
pub mod tables;
pub mod text;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use error::PentorefError;

use assemble::{assemble_corpus, AssembleOptions};
use config::{ResolvedRun, RunConfig};
use conversion::{build_conversion_report, ConversionReport, Format, RunSummary};
use diagnostics::{write_log, DiagnosticLog, Phase};
use index::{CorpusLayout, IntervalIndex, SceneSources};
use ir::CorpusRecords;
use resolve::{Resolver, TieBreak};
use tables::{tables_for, Table};
use text::LexiconLemmatizer;

/// The pentoref CLI application.
#[derive(Parser)]
#[command(name = "pentoref")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a corpus into tables.
    Convert(ConvertArgs),
    /// List the tiers of every recording with their interval counts.
    Tiers(TiersArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Corpus root directory (e.g. TAKECV_PENTOREF).
    corpus: PathBuf,

    /// Corpus variant ('take', 'takecv', 'pentocv' or 'generic').
    /// Inferred from the corpus directory name when omitted.
    #[arg(long)]
    variant: Option<String>,

    /// YAML run configuration; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transcription directory (overrides layout discovery).
    #[arg(long)]
    transcriptions: Option<PathBuf>,

    /// Scene information directory (overrides layout discovery).
    #[arg(long)]
    scenes: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format ('csv', 'json' or 'sqlite').
    #[arg(long)]
    format: Option<String>,

    /// Diagnostic log file (default: <output>/<CORPUS>.log).
    #[arg(long)]
    log: Option<PathBuf>,

    /// Tab-separated lexicon (word, lemma, tag) used for lemmatization.
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Pick among several overlapping intervals the way archived datasets
    /// were produced.
    #[arg(long)]
    legacy_tie_break: bool,

    /// First reference ID of the run.
    #[arg(long)]
    first_ref_id: Option<u64>,

    /// Output format for the conversion report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

impl ConvertArgs {
    fn overrides(&self) -> RunConfig {
        RunConfig {
            variant: self.variant.clone(),
            transcriptions: self.transcriptions.clone(),
            scenes: self.scenes.clone(),
            output: self.output.clone(),
            format: self.format.clone(),
            log: self.log.clone(),
            lexicon: self.lexicon.clone(),
            tie_break: self.legacy_tie_break.then_some(TieBreak::Legacy),
            first_ref_id: self.first_ref_id,
        }
    }
}

/// Arguments for the tiers subcommand.
#[derive(clap::Args)]
struct TiersArgs {
    /// Corpus root directory.
    corpus: PathBuf,

    /// Transcription directory (overrides layout discovery).
    #[arg(long)]
    transcriptions: Option<PathBuf>,
}

/// Run the pentoref CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PentorefError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Tiers(args)) => run_tiers(args),
        None => {
            println!("pentoref {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Turns PentoRef corpus recordings into tables.");
            println!();
            println!("Run 'pentoref --help' for usage information.");
            Ok(())
        }
    }
}

/// Everything one conversion produced.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub records: CorpusRecords,
    pub log: DiagnosticLog,
    pub report: ConversionReport,
    /// Files written, log included.
    pub written: Vec<PathBuf>,
}

/// Converts the corpus described by `run` and writes tables and log.
pub fn convert(run: &ResolvedRun) -> Result<ConversionOutcome, PentorefError> {
    let index = IntervalIndex::build(&run.layout.transcriptions)?;

    let mut log = DiagnosticLog::new();
    let sources = match &run.layout.scenes {
        Some(dir) => {
            let mut source_log = DiagnosticLog::new();
            let sources = SceneSources::load(dir, &mut source_log)?;
            if !source_log.is_empty() {
                log.begin_phase(Phase::Sources);
                log.append(source_log);
            }
            sources
        }
        None => {
            log::info!("no scene directory, continuing without scenes");
            SceneSources::default()
        }
    };

    let lexicon = run
        .lexicon
        .as_deref()
        .map(LexiconLemmatizer::read)
        .transpose()?;

    let resolver = Resolver::new(run.tie_break);
    let mut options = AssembleOptions::new(&resolver).with_first_ref_id(run.first_ref_id);
    if let Some(lexicon) = &lexicon {
        options = options.with_lemmatizer(lexicon);
    }

    let records = assemble_corpus(run.variant, &index, &sources, options, &mut log);

    let tables = tables_for(run.variant, &records);
    let mut written = write_tables(run, &tables)?;
    write_log(&run.log, &log)?;
    written.push(run.log.clone());

    let report = build_conversion_report(
        &records,
        &RunSummary {
            variant: run.variant,
            format: run.format,
            recordings: index.len(),
            tie_break: run.tie_break,
            lemmatizer: lexicon.is_some(),
            log: &log,
        },
    );

    Ok(ConversionOutcome {
        records,
        log,
        report,
        written,
    })
}

fn write_tables(run: &ResolvedRun, tables: &[Table]) -> Result<Vec<PathBuf>, PentorefError> {
    let tag = run.variant.corpus_tag();
    match run.format {
        Format::Csv => tables::io_csv::write_tables_csv(&run.output, tag, tables),
        Format::Json => {
            let path = run.output.join(format!("{tag}.json"));
            tables::io_json::write_tables_json(&path, tag, tables)?;
            Ok(vec![path])
        }
        #[cfg(feature = "sqlite")]
        Format::Sqlite => {
            let path = run.output.join(format!("{tag}.db"));
            tables::io_sqlite::write_tables_sqlite(&path, tables)?;
            Ok(vec![path])
        }
        #[cfg(not(feature = "sqlite"))]
        Format::Sqlite => Err(PentorefError::UnsupportedFormat(
            "'sqlite' (this build has no sqlite support)".to_string(),
        )),
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), PentorefError> {
    if !matches!(args.report.as_str(), "text" | "json") {
        return Err(PentorefError::UnsupportedFormat(format!(
            "report format '{}' (supported: text, json)",
            args.report
        )));
    }

    let file_config = match &args.config {
        Some(path) => RunConfig::read(path)?,
        None => RunConfig::default(),
    };
    let config = file_config.overridden_by(args.overrides());
    let run = config.resolve(&args.corpus)?;

    let outcome = convert(&run)?;

    if args.report == "json" {
        let json = serde_json::to_string_pretty(&outcome.report).map_err(|source| {
            PentorefError::JsonWrite {
                path: PathBuf::from("<stdout>"),
                source,
            }
        })?;
        println!("{json}");
    } else {
        print!("{}", outcome.report);
        for path in &outcome.written {
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

/// Execute the tiers subcommand.
fn run_tiers(args: TiersArgs) -> Result<(), PentorefError> {
    let transcriptions = match args.transcriptions {
        Some(dir) => dir,
        None => CorpusLayout::discover(&args.corpus)?.transcriptions,
    };
    print!("{}", tier_listing(&transcriptions)?);
    Ok(())
}

/// One block per recording: its name, then `<tier>\t<intervals>` lines.
pub fn tier_listing(transcriptions: &Path) -> Result<String, PentorefError> {
    let index = IntervalIndex::build(transcriptions)?;
    let mut out = String::new();
    for recording in index.recordings() {
        out.push_str(&format!(
            "{} ({} intervals)\n",
            recording.name,
            recording.interval_count()
        ));
        for tier in &recording.tiers {
            out.push_str(&format!("  {}\t{}\n", tier.name, tier.len()));
        }
    }
    Ok(out)
}
