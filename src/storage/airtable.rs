// src/storage/airtable.rs
use crate::extractors::TableKind;
use crate::survey::NormalizedTable;
use crate::utils::error::StorageError;
use std::fs;
use std::path::Path;

pub const INSTRUCTIONS_FILE: &str = "AIRTABLE_IMPORT_INSTRUCTIONS.md";

/// `email_contact` -> `Email Contact`
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Writes one CSV per table (schema column order, Title Case headers)
/// plus a markdown file describing how to wire the tables together.
pub fn write_bundle(dir: &Path, tables: &[NormalizedTable]) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;

    for table in tables.iter().filter(|t| !t.is_empty()) {
        let file_path = dir.join(format!("{}.csv", table.name()));
        let mut writer = csv::Writer::from_path(&file_path)?;

        writer.write_record(table.header().iter().map(|c| title_case(c)))?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        tracing::info!("Created Airtable CSV: {}", file_path.display());
    }

    let instructions_path = dir.join(INSTRUCTIONS_FILE);
    fs::write(&instructions_path, instructions())?;
    tracing::info!("Created instructions: {}", instructions_path.display());

    Ok(())
}

pub fn instructions() -> String {
    let root = TableKind::Summary.table_name();
    let question_tables: Vec<String> = TableKind::ALL
        .iter()
        .filter(|k| !k.is_root())
        .map(|k| format!("{}.csv", k.table_name()))
        .collect();
    let descriptions: Vec<String> = TableKind::ALL
        .iter()
        .map(|k| format!("- **{}**: {}", k.table_name(), k.schema().description))
        .collect();

    format!(
        "# Airtable Import Instructions

## Steps to Import:

1. **Create a new Airtable base** called \"Survey Data\"

2. **Import tables in this order:**
   - Import `{root}.csv` first (this will be your main table)
   - Import each question table ({questions})

3. **Set up relationships:**
   - In each question table, convert the \"Response Id\" field to a \"Link to another record\" field
   - Link it to the \"{root}\" table
   - This creates the relational structure

4. **Field Types to Consider:**
   - Text fields: Most fields can stay as \"Single line text\"
   - Long text: Q10, Q11 (concerns and ideas) should be \"Long text\"
   - Select fields: Consider making Yes/No fields into \"Single select\" with Yes/No options

## Table Descriptions:

{descriptions}
",
        root = root,
        questions = question_tables.join(", "),
        descriptions = descriptions.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{normalize, CompositeResponse};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn title_case_splits_on_underscores() {
        assert_eq!(title_case("response_id"), "Response Id");
        assert_eq!(title_case("q2_service_rating"), "Q2 Service Rating");
        assert_eq!(title_case("notes"), "Notes");
    }

    #[test]
    fn bundle_has_csvs_and_instructions() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("airtable_import");
        let tables = normalize(&[CompositeResponse::new(
            "8",
            BTreeMap::from([("q1_q2_q2_service_rating".to_string(), "Fair".to_string())]),
        )]);

        write_bundle(&dir, &tables).unwrap();

        let csv_text = fs::read_to_string(dir.join("q1_q2_preference_rating.csv")).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines[0], "Response Id,Q1 Preference,Q2 Service Rating,Notes");
        assert_eq!(lines[1], "8,,Fair,");

        let guide = fs::read_to_string(dir.join(INSTRUCTIONS_FILE)).unwrap();
        assert!(guide.contains("Import `responses.csv` first"));
        assert!(guide.contains("- **q12_involvement**: Willingness to be involved in solutions"));
    }
}
