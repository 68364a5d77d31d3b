use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pentoref operations.
///
/// Only file-level failures end up here. Anomalies inside a recording
/// (missing episodes, unknown tiles, unreadable actions) are written to the
/// [`DiagnosticLog`](crate::diagnostics::DiagnosticLog) instead.
#[derive(Debug, Error)]
pub enum PentorefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TextGrid {path}: {message}")]
    TextGridParse { path: PathBuf, message: String },

    #[error("Failed to parse ELAN file {path}: {message}")]
    EafParse { path: PathBuf, message: String },

    #[error("Failed to decode {path}: {message}")]
    Encoding { path: PathBuf, message: String },

    #[error("Failed to parse scene XML {path}: {message}")]
    SceneXmlParse { path: PathBuf, message: String },

    #[error("Invalid corpus layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read lexicon {path}: {source}")]
    LexiconParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write table {path}: {source}")]
    TableWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "sqlite")]
    #[error("Database error in {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Unsupported corpus variant: {0}")]
    UnsupportedVariant(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
