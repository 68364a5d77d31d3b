//! Conversion report types.
//!
//! A report summarizes one corpus run: how many rows each table got, which
//! populated record fields the variant's schema leaves out, and the policy
//! decisions that shaped the output. It is the structured counterpart of
//! the plain-text [`DiagnosticLog`](crate::diagnostics::DiagnosticLog).

use serde::Serialize;
use std::fmt;

/// A report generated for one corpus run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Corpus variant name.
    pub corpus: String,
    /// Output format name.
    pub format: String,
    /// Number of recordings processed.
    pub recordings: usize,
    /// Rows per table.
    pub output: TableCounts,
    /// Number of diagnostic log lines written.
    pub diagnostics: usize,
    /// Issues discovered while building the report.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn new(corpus: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            corpus: corpus.into(),
            format: format.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (dropped information).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Count of info-level issues (policy notes).
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Returns true if some populated field did not make it into a table.
    pub fn is_lossy(&self) -> bool {
        self.warning_count() > 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} corpus, {} recording(s) -> {}",
            self.corpus, self.recordings, self.format
        )?;
        writeln!(
            f,
            "  {} words, {} utts, {} refs, {} scenes, {} actions",
            self.output.words,
            self.output.utts,
            self.output.refs,
            self.output.scenes,
            self.output.actions
        )?;
        writeln!(f, "  {} diagnostic(s) logged", self.diagnostics)?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Rows written per table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub words: usize,
    pub utts: usize,
    pub refs: usize,
    pub scenes: usize,
    pub actions: usize,
}

/// A single issue discovered during report building.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// Populated data that no table carries.
    Warning,
    /// A policy decision; nothing is lost.
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// A populated record field is not in the variant's column list.
    DropColumn,

    // Policy decisions (Info level)
    /// Which tie-break picked among several overlapping intervals.
    TieBreakPolicy,
    /// Unreadable scene files are skipped, not fatal.
    SceneSkipPolicy,
    /// Utterances and tier words outside every game keep the previous game.
    StickyEpisodePolicy,
    /// Words carry no lemma because no lexicon was configured.
    NoLemmatizer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_not_lossy() {
        let report = ConversionReport::new("take", "csv");
        assert!(!report.is_lossy());
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.info_count(), 0);
    }

    #[test]
    fn warning_makes_report_lossy() {
        let mut report = ConversionReport::new("take", "csv");
        report.add(ConversionIssue::warning(
            ConversionIssueCode::DropColumn,
            "words.lemma is filled for 3 record(s) but not exported",
        ));
        report.add(ConversionIssue::info(
            ConversionIssueCode::TieBreakPolicy,
            "largest overlap",
        ));
        assert!(report.is_lossy());
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.info_count(), 1);

        let text = report.to_string();
        assert!(text.contains("Warnings (1):"));
        assert!(text.contains("Notes (1):"));
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = ConversionReport::new("pentocv", "json");
        report.recordings = 2;
        report.output = TableCounts {
            words: 10,
            utts: 3,
            refs: 2,
            scenes: 40,
            actions: 5,
        };
        report.add(ConversionIssue::info(
            ConversionIssueCode::SceneSkipPolicy,
            "unreadable scene files are skipped",
        ));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"corpus\":\"pentocv\""));
        assert!(json.contains("\"scenes\":40"));
        assert!(json.contains("\"severity\":\"info\""));
        assert!(json.contains("\"code\":\"scene_skip_policy\""));
    }
}
