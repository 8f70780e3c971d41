// src/storage/sql_script.rs
use crate::survey::NormalizedTable;
use crate::utils::error::StorageError;
use std::fs;
use std::path::Path;

const BANNER: &str = "-- ============================================================";

/// Renders one value as a SQL literal. Blank values and the `-` placeholder
/// become NULL; single quotes are doubled.
pub fn escape_sql(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value == "-" {
        return "NULL".to_string();
    }
    format!("'{}'", value.replace('\'', "''"))
}

pub fn insert_statement(table: &NormalizedTable, row: &[String]) -> String {
    let values: Vec<String> = row.iter().map(|v| escape_sql(v)).collect();
    format!(
        "INSERT INTO {} ({}) \nVALUES ({});",
        table.name(),
        table.header().join(", "),
        values.join(", ")
    )
}

/// Builds the full import script: one transaction, parent table first.
pub fn render_script(tables: &[NormalizedTable]) -> String {
    let response_count = tables
        .iter()
        .find(|t| t.kind.is_root())
        .map(|t| t.rows.len())
        .unwrap_or(0);

    let mut lines = vec![
        "-- Survey Data Import".to_string(),
        format!("-- Generated {}", chrono::Utc::now().to_rfc3339()),
        "-- Run this after creating the schema".to_string(),
        String::new(),
        "BEGIN;".to_string(),
        String::new(),
    ];

    let mut ordered: Vec<&NormalizedTable> = tables.iter().collect();
    ordered.sort_by_key(|t| !t.kind.is_root());

    for table in ordered {
        lines.push(BANNER.to_string());
        lines.push(format!("-- INSERT {}", table.kind.schema().title));
        lines.push(BANNER.to_string());
        lines.push(String::new());
        lines.extend(table.rows.iter().map(|row| insert_statement(table, row)));
        lines.push(String::new());
    }

    lines.push("COMMIT;".to_string());
    lines.push(String::new());
    lines.push("-- Data import completed!".to_string());
    lines.push(format!("-- Imported {} survey responses", response_count));

    lines.join("\n")
}

pub fn write_script(path: &Path, tables: &[NormalizedTable]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_script(tables))?;

    tracing::info!("Generated SQL import file: {}", path.display());
    Ok(())
}
