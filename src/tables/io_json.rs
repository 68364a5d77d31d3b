//! JSON output: one document holding every table of a run.
//!
//! ```json
//! {
//!   "corpus": "TAKE",
//!   "tables": [
//!     { "name": "words", "columns": ["gameID", ...], "rows": [["r1_1", ...]] }
//!   ]
//! }
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::Table;
use crate::error::PentorefError;

#[derive(Serialize)]
struct TablesDocument<'a> {
    corpus: &'a str,
    tables: &'a [Table],
}

/// Writes all tables to `path` as pretty-printed JSON.
pub fn write_tables_json(path: &Path, tag: &str, tables: &[Table]) -> Result<(), PentorefError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(PentorefError::Io)?;
    }
    let file = File::create(path).map_err(PentorefError::Io)?;
    let mut writer = BufWriter::new(file);

    let document = TablesDocument {
        corpus: tag,
        tables,
    };
    serde_json::to_writer_pretty(&mut writer, &document).map_err(|source| {
        PentorefError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n").map_err(PentorefError::Io)?;
    writer.flush().map_err(PentorefError::Io)?;
    Ok(())
}

/// Serializes all tables to a JSON string.
pub fn to_tables_json_string(tag: &str, tables: &[Table]) -> Result<String, PentorefError> {
    let document = TablesDocument {
        corpus: tag,
        tables,
    };
    serde_json::to_string_pretty(&document).map_err(|source| PentorefError::JsonWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}
