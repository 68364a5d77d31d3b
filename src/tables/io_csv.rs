//! CSV output: one file per table, with a header row.
//!
//! Null cells are written as empty fields. Files are named
//! `<TAG>_<table>.csv`, e.g. `TAKE_words.csv`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::Table;
use crate::error::PentorefError;

/// Writes every table into `dir`, returning the paths written.
pub fn write_tables_csv(
    dir: &Path,
    tag: &str,
    tables: &[Table],
) -> Result<Vec<PathBuf>, PentorefError> {
    fs::create_dir_all(dir).map_err(PentorefError::Io)?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{tag}_{}.csv", table.name));
        write_table_csv(&path, table)?;
        written.push(path);
    }
    Ok(written)
}

/// Writes one table to `path`.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), PentorefError> {
    let file = File::create(path).map_err(PentorefError::Io)?;
    let writer = BufWriter::new(file);

    let mut csv_writer = csv::Writer::from_writer(writer);
    write_rows(&mut csv_writer, table, path)?;

    csv_writer
        .into_inner()
        .map_err(|e| PentorefError::Io(e.into_error()))?
        .flush()
        .map_err(PentorefError::Io)?;

    Ok(())
}

/// Writes one table to a CSV string.
///
/// Useful for testing without file I/O.
pub fn to_table_csv_string(table: &Table) -> Result<String, PentorefError> {
    let dummy_path = Path::new("<string>");
    let mut csv_writer = csv::Writer::from_writer(Vec::new());
    write_rows(&mut csv_writer, table, dummy_path)?;

    let bytes = csv_writer
        .into_inner()
        .map_err(|e| PentorefError::Io(e.into_error()))?;

    // Every cell started out as a Rust string.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_rows<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    table: &Table,
    path: &Path,
) -> Result<(), PentorefError> {
    let to_error = |source| PentorefError::TableWrite {
        path: path.to_path_buf(),
        source,
    };

    csv_writer.write_record(&table.columns).map_err(to_error)?;
    for row in &table.rows {
        csv_writer
            .write_record(row.iter().map(|value| value.to_string()))
            .map_err(to_error)?;
    }
    Ok(())
}
