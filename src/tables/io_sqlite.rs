//! SQLite output (feature `sqlite`).
//!
//! One database per run with one table per exported table kind. Columns are
//! declared without types, like the frozen column lists, and rows go in
//! through parameterised inserts inside a single transaction.

use std::fs;
use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use super::{Table, Value};
use crate::error::PentorefError;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Value::Null => ValueRef::Null,
            Value::Text(text) => ValueRef::Text(text.as_bytes()),
            Value::Float(value) => ValueRef::Real(*value),
            Value::Int(value) => ValueRef::Integer(*value),
        }))
    }
}

/// Writes every table into a fresh database at `path`. An existing file is
/// replaced.
pub fn write_tables_sqlite(path: &Path, tables: &[Table]) -> Result<(), PentorefError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(PentorefError::Io)?;
    }
    if path.exists() {
        fs::remove_file(path).map_err(PentorefError::Io)?;
    }

    let to_error = |source| PentorefError::Database {
        path: path.to_path_buf(),
        source,
    };

    let mut conn = Connection::open(path).map_err(to_error)?;
    let tx = conn.transaction().map_err(to_error)?;
    for table in tables {
        tx.execute(&create_statement(table), []).map_err(to_error)?;
        let mut insert = tx.prepare(&insert_statement(table)).map_err(to_error)?;
        for row in &table.rows {
            insert.execute(params_from_iter(row.iter())).map_err(to_error)?;
        }
    }
    tx.commit().map_err(to_error)?;
    Ok(())
}

fn create_statement(table: &Table) -> String {
    let columns: Vec<String> = table.columns.iter().map(|c| quote(c)).collect();
    format!("create table {}({})", table.name, columns.join(", "))
}

fn insert_statement(table: &Table) -> String {
    let placeholders = vec!["?"; table.columns.len()].join(",");
    format!("insert into {} values ({placeholders})", table.name)
}

/// Column names like `dialogue-act` are not bare identifiers.
fn quote(column: &str) -> String {
    format!("\"{}\"", column.replace('"', "\"\""))
}
