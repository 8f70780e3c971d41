// src/storage/mod.rs
pub mod airtable;
pub mod sources;
pub mod sql_script;
pub mod sqlite;

use crate::survey::models::RESPONSE_ID;
use crate::survey::{CompositeResponse, NormalizedTable};
use crate::utils::error::StorageError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const RESPONSES_JSON: &str = "survey_data.json";
pub const RESPONSES_CSV: &str = "survey_data.csv";
pub const DATABASE_FILE: &str = "survey.db";
pub const SQL_SCRIPT: &str = "data_import.sql";
pub const AIRTABLE_DIR: &str = "airtable_import";

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes the merged responses as a pretty-printed JSON array.
    pub fn save_responses_json(&self, responses: &[CompositeResponse]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(RESPONSES_JSON);
        let json = serde_json::to_string_pretty(responses)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Exported {} responses to JSON: {}", responses.len(), file_path.display());
        Ok(file_path)
    }

    /// Writes one flat CSV of all responses. Returns `None` when there is nothing to write.
    pub fn save_responses_csv(&self, responses: &[CompositeResponse]) -> Result<Option<PathBuf>, StorageError> {
        if responses.is_empty() {
            tracing::warn!("No data to export to CSV");
            return Ok(None);
        }

        let header = flat_header(responses);
        let file_path = self.base_dir.join(RESPONSES_CSV);
        let mut writer = csv::Writer::from_path(&file_path)?;

        writer.write_record(&header)?;
        for response in responses {
            writer.write_record(header.iter().map(|key| response.get(key).unwrap_or("")))?;
        }
        writer.flush()?;

        tracing::info!("Exported to CSV: {}", file_path.display());
        Ok(Some(file_path))
    }

    /// Writes `table_<name>.csv` for every non-empty normalized table.
    pub fn save_table_csvs(&self, tables: &[NormalizedTable]) -> Result<Vec<PathBuf>, StorageError> {
        let mut written = Vec::new();

        for table in tables.iter().filter(|t| !t.is_empty()) {
            let file_path = self.base_dir.join(format!("table_{}.csv", table.name()));
            let header = table.sorted_header();
            let mut writer = csv::Writer::from_path(&file_path)?;

            writer.write_record(&header)?;
            for row in &table.rows {
                writer.write_record(table.project(row, &header))?;
            }
            writer.flush()?;

            tracing::info!("Created: {}", file_path.display());
            written.push(file_path);
        }

        Ok(written)
    }

    pub fn save_database(&self, tables: &[NormalizedTable]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(DATABASE_FILE);
        sqlite::write_database(&file_path, tables)?;
        Ok(file_path)
    }

    pub fn save_sql_script(&self, tables: &[NormalizedTable]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(SQL_SCRIPT);
        sql_script::write_script(&file_path, tables)?;
        Ok(file_path)
    }

    pub fn save_airtable_bundle(&self, tables: &[NormalizedTable]) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(AIRTABLE_DIR);
        airtable::write_bundle(&dir, tables)?;
        Ok(dir)
    }
}

/// Loads responses previously written by [`StorageManager::save_responses_json`].
pub fn load_responses_json(path: &Path) -> Result<Vec<CompositeResponse>, StorageError> {
    let text = fs::read_to_string(path)?;
    let responses: Vec<CompositeResponse> = serde_json::from_str(&text)
        .map_err(|e| StorageError::SerializationError(format!("{}: {}", path.display(), e)))?;

    tracing::info!("Loaded {} responses from {}", responses.len(), path.display());
    Ok(responses)
}

/// `response_id`, then every other key seen in any record, sorted.
pub fn flat_header(responses: &[CompositeResponse]) -> Vec<&str> {
    let keys: BTreeSet<&str> = responses.iter().flat_map(CompositeResponse::keys).collect();
    std::iter::once(RESPONSE_ID).chain(keys).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::normalize;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn responses() -> Vec<CompositeResponse> {
        vec![
            CompositeResponse::new(
                "1",
                BTreeMap::from([
                    ("summary_name".to_string(), "O'Brien, Pat".to_string()),
                    ("q10_q10_text".to_string(), "Cost".to_string()),
                ]),
            ),
            CompositeResponse::new(
                "2",
                BTreeMap::from([("q12_q12_response".to_string(), "Yes".to_string())]),
            ),
        ]
    }

    #[test]
    fn flat_header_pins_response_id() {
        let binding = responses();
        let header = flat_header(&binding);
        assert_eq!(
            header,
            vec!["response_id", "q10_q10_text", "q12_q12_response", "summary_name"]
        );
    }

    #[test]
    fn json_round_trips_through_disk() {
        let tmp = tempdir().unwrap();
        let storage = StorageManager::new(tmp.path().join("out")).unwrap();

        let path = storage.save_responses_json(&responses()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with("[\n  {\n    \"response_id\": \"1\""));

        let loaded = load_responses_json(&path).unwrap();
        assert_eq!(loaded, responses());
    }

    #[test]
    fn flat_csv_fills_missing_keys() {
        let tmp = tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();

        let path = storage.save_responses_csv(&responses()).unwrap().unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "response_id,q10_q10_text,q12_q12_response,summary_name");
        assert_eq!(lines[1], "1,Cost,,\"O'Brien, Pat\"");
        assert_eq!(lines[2], "2,,Yes,");
    }

    #[test]
    fn flat_csv_skips_empty_input() {
        let tmp = tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();
        assert!(storage.save_responses_csv(&[]).unwrap().is_none());
        assert!(!tmp.path().join(RESPONSES_CSV).exists());
    }

    #[test]
    fn table_csvs_use_sorted_columns() {
        let tmp = tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();
        let tables = normalize(&responses());

        let written = storage.save_table_csvs(&tables).unwrap();
        assert_eq!(written.len(), 11);

        let text = fs::read_to_string(tmp.path().join("table_q12_involvement.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["response_id,q12_notes,q12_response", "1,,", "2,,Yes"]);
    }
}
