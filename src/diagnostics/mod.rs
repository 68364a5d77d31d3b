//! Diagnostics for corpus runs.
//!
//! Nothing below a file-level decode failure is surfaced as an error. Every
//! recoverable anomaly is funnelled into a [`DiagnosticLog`], which is written
//! next to the converted tables.

mod report;

pub use report::{format_seconds, Diagnostic, DiagnosticCode, DiagnosticLog, Phase};

use std::fs;
use std::path::Path;

use crate::error::PentorefError;

/// Writes the rendered log to `path`, replacing any previous log.
pub fn write_log(path: &Path, log: &DiagnosticLog) -> Result<(), PentorefError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(PentorefError::Io)?;
    }
    fs::write(path, log.to_string()).map_err(PentorefError::Io)
}
