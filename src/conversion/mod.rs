//! Conversion reporting.
//!
//! After a corpus run the records are checked against the variant's table
//! schemas. Anything that was filled but will not be written, and every
//! policy that shaped the output, ends up in a [`ConversionReport`].

pub mod report;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity, TableCounts,
};

use std::fmt;
use std::str::FromStr;

use crate::assemble::Variant;
use crate::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::error::PentorefError;
use crate::ir::CorpusRecords;
use crate::resolve::TieBreak;
use crate::tables::dropped_columns;

/// Output format identifier.
///
/// This mirrors the CLI's `--format` but is decoupled from clap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Sqlite,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = PentorefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "sqlite" | "db" => Ok(Format::Sqlite),
            other => Err(PentorefError::UnsupportedFormat(format!(
                "'{}' (supported: csv, json, sqlite)",
                other
            ))),
        }
    }
}

/// What the report needs to know about a run besides its records.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary<'a> {
    pub variant: Variant,
    pub format: Format,
    pub recordings: usize,
    pub tie_break: TieBreak,
    pub lemmatizer: bool,
    pub log: &'a DiagnosticLog,
}

/// Build the report for a finished run.
///
/// - Output counts per table
/// - Populated fields the variant's tables leave out (warnings)
/// - Policy decisions that apply to this run (info notes)
pub fn build_conversion_report(records: &CorpusRecords, run: &RunSummary<'_>) -> ConversionReport {
    let mut report = ConversionReport::new(run.variant.name(), run.format.name());
    report.recordings = run.recordings;
    report.diagnostics = run.log.diagnostics().count();
    report.output = TableCounts {
        words: records.words.len(),
        utts: records.utterances.len(),
        refs: records.references.len(),
        scenes: records.scenes.len(),
        actions: records.actions.len(),
    };

    for dropped in dropped_columns(run.variant, records) {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::DropColumn,
            format!(
                "{}.{} is filled for {} record(s) but not exported by the {} tables",
                dropped.table.name(),
                dropped.column,
                dropped.populated,
                run.variant
            ),
        ));
    }

    add_tie_break_policy(run, &mut report);
    add_sticky_episode_policy(run, &mut report);

    let skipped = run.log.count(DiagnosticCode::SceneFileSkipped);
    if skipped > 0 {
        report.add(ConversionIssue::info(
            ConversionIssueCode::SceneSkipPolicy,
            format!(
                "{} unreadable scene file(s) were skipped; the run continued without them",
                skipped
            ),
        ));
    }

    if !run.lemmatizer && !records.words.is_empty() {
        report.add(ConversionIssue::info(
            ConversionIssueCode::NoLemmatizer,
            "no lexicon configured: lemma and tag are empty",
        ));
    }

    report
}

fn add_tie_break_policy(run: &RunSummary<'_>, report: &mut ConversionReport) {
    let ambiguous = run.log.count(DiagnosticCode::AmbiguousOverlap);
    let rule = match run.tie_break {
        TieBreak::LargestOverlap => "the candidate with the largest overlap (first on ties)",
        TieBreak::Legacy => "the legacy rule scored against the last interval of the tier",
    };
    report.add(ConversionIssue::info(
        ConversionIssueCode::TieBreakPolicy,
        format!(
            "{} ambiguous overlap(s) resolved by {} [{}]",
            ambiguous,
            rule,
            run.tie_break.as_str()
        ),
    ));
}

fn add_sticky_episode_policy(run: &RunSummary<'_>, report: &mut ConversionReport) {
    let fallbacks = run.log.count(DiagnosticCode::EpisodeFallback);
    if fallbacks > 0 {
        report.add(ConversionIssue::info(
            ConversionIssueCode::StickyEpisodePolicy,
            format!(
                "{} record(s) outside every {} interval kept the previous game",
                fallbacks,
                run.variant.episode_tier()
            ),
        ));
    }
}
