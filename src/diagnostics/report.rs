//! Diagnostic log types.
//!
//! The log is the only audit trail of a corpus run: every anomaly that did
//! not stop the run (a missing episode, an unknown tile, an unreadable
//! action) becomes one line. It renders to the plain-text `<corpus>.log`
//! file and can also be inspected programmatically through stable codes.

use serde::Serialize;
use std::fmt;

/// An append-only sink of diagnostics, grouped by recording and phase.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
}

impl DiagnosticLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Starts the section of one recording.
    pub fn begin_recording(&mut self, name: impl Into<String>) {
        self.entries.push(LogEntry::Recording(name.into()));
    }

    /// Starts an extraction phase inside the current recording.
    pub fn begin_phase(&mut self, phase: Phase) {
        self.entries.push(LogEntry::Phase(phase));
    }

    /// Appends a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.entries.push(LogEntry::Diagnostic(diagnostic));
    }

    /// Appends a diagnostic tied to a point on the recording timeline.
    pub fn at(&mut self, time: f64, code: DiagnosticCode, message: impl Into<String>) {
        self.add(Diagnostic::at(time, code, message));
    }

    /// Appends a diagnostic not tied to a timeline (e.g. a skipped file).
    pub fn note(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.add(Diagnostic::untimed(code, message));
    }

    /// All diagnostics, in the order they were written.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Diagnostic(d) => Some(d),
            _ => None,
        })
    }

    /// Number of diagnostics (section headers excluded).
    pub fn len(&self) -> usize {
        self.diagnostics().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of diagnostics with the given code.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics().filter(|d| d.code == code).count()
    }

    /// Appends another log's entries.
    pub fn append(&mut self, other: DiagnosticLog) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry {
                LogEntry::Recording(name) => write!(f, "\n{name}")?,
                LogEntry::Phase(phase) => write!(f, "\n{phase}\n\n")?,
                LogEntry::Diagnostic(d) => writeln!(f, "{d}")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
enum LogEntry {
    Recording(String),
    Phase(Phase),
    Diagnostic(Diagnostic),
}

/// Extraction phases, in the order they run for each recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Sources,
    ReferencesScenes,
    Utterances,
    Words,
    Actions,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Sources => "sources",
            Phase::ReferencesScenes => "references/scenes",
            Phase::Utterances => "utterances",
            Phase::Words => "words",
            Phase::Actions => "actions",
        };
        f.write_str(label)
    }
}

/// A single anomaly.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    /// Position on the recording timeline, in seconds.
    pub time: Option<f64>,

    /// A stable code for the anomaly type.
    pub code: DiagnosticCode,

    /// A human-readable description.
    pub message: String,
}

impl Diagnostic {
    pub fn at(time: f64, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            time: Some(time),
            code,
            message: message.into(),
        }
    }

    pub fn untimed(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            time: None,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{} seconds: {}", format_seconds(time), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Formats seconds the way the corpus logs always have: whole numbers keep
/// one decimal (`3.0`), everything else uses the shortest exact form.
pub fn format_seconds(time: f64) -> String {
    if time.is_finite() && time.fract() == 0.0 {
        format!("{time:.1}")
    } else {
        format!("{time}")
    }
}

/// A stable code identifying the type of anomaly.
///
/// These codes can be used for counting or filtering log entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    // Resolver
    /// Several intervals of a tier overlapped a query; the best one was used.
    AmbiguousOverlap,

    // Episodes
    /// No episode interval overlapped; the previous episode was reused.
    EpisodeFallback,
    /// No episode interval overlapped and no previous episode exists.
    NoPreviousEpisode,
    /// A scene snapshot or action could not be placed in any game.
    GameNotFound,

    // References and scenes
    /// No selected-tile fragment exists for a game; no reference emitted.
    TileNotFound,
    /// No scene description exists for a game.
    SceneNotFound,
    /// One object of a scene description lacks a required attribute.
    SceneObjectUnreadable,
    /// A scene file could not be parsed and was skipped.
    SceneFileSkipped,

    // Utterances and words
    /// A speaker role could not be resolved; the previous role was reused.
    RoleFallback,
    /// No dialogue act overlapped an utterance.
    DialogueActNotFound,
    /// A token had no lemma.
    LemmatizationFailed,
    /// No utterance overlapped a word; the previous utterance was reused.
    UtteranceFallback,
    /// No reference exists for a word's game; the word was dropped.
    WordWithoutReference,
    /// A word precedes every utterance it could belong to; it was dropped.
    WordWithoutUtterance,

    // Actions
    /// An action label had no `action:piece` shape.
    ActionUnreadable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_keep_one_decimal() {
        assert_eq!(format_seconds(3.0), "3.0");
        assert_eq!(format_seconds(12.345), "12.345");
        assert_eq!(format_seconds(0.1), "0.1");
    }

    #[test]
    fn renders_sections_and_lines() {
        let mut log = DiagnosticLog::new();
        log.begin_recording("r1");
        log.begin_phase(Phase::ReferencesScenes);
        log.at(
            2.0,
            DiagnosticCode::TileNotFound,
            "No selected tile could be found for gameID \"r1_2\".",
        );
        log.begin_phase(Phase::Utterances);

        let text = log.to_string();
        assert_eq!(
            text,
            "\nr1\nreferences/scenes\n\n2.0 seconds: No selected tile could be found for gameID \"r1_2\".\n\nutterances\n\n"
        );
    }

    #[test]
    fn counts_by_code() {
        let mut log = DiagnosticLog::new();
        log.begin_recording("r1");
        log.at(1.0, DiagnosticCode::EpisodeFallback, "a");
        log.at(2.0, DiagnosticCode::EpisodeFallback, "b");
        log.note(DiagnosticCode::SceneFileSkipped, "c");

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(DiagnosticCode::EpisodeFallback), 2);
        assert_eq!(log.count(DiagnosticCode::TileNotFound), 0);
    }

    #[test]
    fn diagnostic_serializes_code_as_snake_case() {
        let d = Diagnostic::at(1.5, DiagnosticCode::AmbiguousOverlap, "x");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"code\":\"ambiguous_overlap\""));
    }
}
