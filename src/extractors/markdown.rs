// src/extractors/markdown.rs

// --- Imports ---
use crate::extractors::schema::TableKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

// --- Regex Patterns (Lazy Static) ---
// A data row opens with a numeric respondent id cell: "| 12 | ..."
static DATA_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|\s*\d+\s*\|").expect("Failed to compile DATA_ROW_RE")
});

// Separator rows: "|---|---|", "| :--- | ---: |"
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|[\s:|-]*-[\s:|-]*$").expect("Failed to compile SEPARATOR_RE")
});

// --- Data Structures ---

/// One data line of a survey table, mapped onto its table's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub kind: TableKind,
    pub response_id: String,
    /// One value per schema field, in schema order.
    pub values: Vec<String>,
}

impl ParsedRow {
    /// Maps raw cells (first cell is the respondent id) onto `kind`'s fields.
    /// Short rows are padded with empty strings; extra cells are ignored.
    pub fn from_cells(kind: TableKind, cells: &[String]) -> Option<Self> {
        let (response_id, rest) = cells.split_first()?;
        let values = (0..kind.fields().len())
            .map(|i| rest.get(i).cloned().unwrap_or_default())
            .collect();

        Some(Self {
            kind,
            response_id: response_id.clone(),
            values,
        })
    }

    /// `(field, value)` pairs in schema order, excluding `response_id`.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.kind
            .fields()
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields().find(|(name, _)| *name == field).map(|(_, v)| v)
    }
}

/// All tables found in one source document, one bucket per table kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTables {
    buckets: BTreeMap<TableKind, Vec<ParsedRow>>,
}

impl Default for DocumentTables {
    fn default() -> Self {
        Self {
            buckets: TableKind::ALL.into_iter().map(|k| (k, Vec::new())).collect(),
        }
    }
}

impl DocumentTables {
    pub fn rows(&self, kind: TableKind) -> &[ParsedRow] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn extend(&mut self, kind: TableKind, rows: Vec<ParsedRow>) {
        self.buckets.entry(kind).or_default().extend(rows);
    }

    pub fn total_rows(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Consumes the document, yielding every bucket (empty ones included).
    pub fn into_buckets(self) -> impl Iterator<Item = (TableKind, Vec<ParsedRow>)> {
        self.buckets.into_iter()
    }
}

// --- Main Extractor Structure ---
#[derive(Debug, Default)]
pub struct TableExtractor;

impl TableExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every recognised survey table from one markdown document.
    /// Headings that never appear leave their bucket empty.
    pub fn extract_document(&self, text: &str) -> DocumentTables {
        let lines: Vec<&str> = text.lines().collect();
        let mut tables = DocumentTables::default();

        for (index, line) in lines.iter().enumerate() {
            if let Some(kind) = TableKind::from_heading(line) {
                let rows = self.extract_table(&lines, index, kind);
                tracing::debug!("Section '{}' at line {}: {} rows", kind, index + 1, rows.len());
                tables.extend(kind, rows);
            }
        }

        tracing::debug!("Extracted {} rows from document", tables.total_rows());
        tables
    }

    /// Parses the table that follows the heading at `heading_index`.
    ///
    /// The header row and an optional separator row are skipped. Data rows are
    /// read until the next `#` heading; blank lines, prose and rows without a
    /// numeric id inside that span are dropped.
    pub fn extract_table(&self, lines: &[&str], heading_index: usize, kind: TableKind) -> Vec<ParsedRow> {
        let mut i = heading_index + 1;

        // Find the table header, giving up at the next section.
        while i < lines.len() && !lines[i].trim_start().starts_with('|') {
            if lines[i].trim_start().starts_with('#') {
                tracing::debug!("No table under '{}' heading before next section", kind);
                return Vec::new();
            }
            i += 1;
        }

        if i < lines.len() {
            i += 1; // header row
            if i < lines.len() && is_separator(lines[i].trim()) {
                i += 1;
            }
        }

        let mut rows = Vec::new();
        for raw in &lines[i.min(lines.len())..] {
            let line = raw.trim();
            if line.starts_with('#') {
                break;
            }
            if !is_data_row(line) {
                if line.starts_with('|') && !is_separator(line) {
                    tracing::trace!("Skipping table line without response id: '{}'", line);
                }
                continue;
            }
            let cells = split_cells(line);
            if let Some(row) = ParsedRow::from_cells(kind, &cells) {
                rows.push(row);
            }
        }

        rows
    }
}

// --- Line Helpers ---

pub fn is_separator(line: &str) -> bool {
    SEPARATOR_RE.is_match(line)
}

/// True for a trimmed table line whose first cell is a numeric respondent id.
pub fn is_data_row(line: &str) -> bool {
    line.starts_with('|') && !is_separator(line) && DATA_ROW_RE.is_match(line)
}

/// Splits a pipe-table line into trimmed cells, dropping the outer pipes.
pub fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}
