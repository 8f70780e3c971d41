// src/storage/sqlite.rs
use crate::survey::NormalizedTable;
use crate::utils::error::StorageError;
use rusqlite::{params_from_iter, Connection};
use std::fs;
use std::path::Path;

/// `CREATE TABLE` statement for one normalized table. Every column is TEXT;
/// non-root tables reference `responses` through `response_id`.
pub fn create_table_sql(table: &NormalizedTable) -> String {
    let mut columns = vec!["response_id TEXT PRIMARY KEY".to_string()];
    columns.extend(table.columns().iter().map(|c| format!("{} TEXT", c)));
    if !table.kind.is_root() {
        columns.push("FOREIGN KEY (response_id) REFERENCES responses (response_id)".to_string());
    }

    format!("CREATE TABLE {} (\n    {}\n)", table.name(), columns.join(",\n    "))
}

/// Recreates the SQLite database at `path` from scratch.
pub fn write_database(path: &Path, tables: &[NormalizedTable]) -> Result<(), StorageError> {
    if path.exists() {
        tracing::debug!("Removing existing database {}", path.display());
        fs::remove_file(path)?;
    }

    let mut conn = Connection::open(path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Root table first so foreign keys resolve.
    let mut ordered: Vec<&NormalizedTable> = tables.iter().collect();
    ordered.sort_by_key(|t| !t.kind.is_root());

    let tx = conn.transaction()?;
    for table in &ordered {
        tx.execute(&create_table_sql(table), [])?;
    }

    for table in ordered.iter().filter(|t| !t.is_empty()) {
        let header = table.header();
        let placeholders = vec!["?"; header.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            header.join(", "),
            placeholders
        );

        let mut stmt = tx.prepare(&insert_sql)?;
        for row in &table.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
        tracing::debug!("Inserted {} rows into {}", table.rows.len(), table.name());
    }
    tx.commit()?;

    tracing::info!("Created SQLite database: {}", path.display());
    Ok(())
}
