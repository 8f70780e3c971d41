// src/survey/merge.rs
use crate::extractors::{DocumentTables, ParsedRow, TableKind};
use crate::survey::models::CompositeResponse;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Rows gathered from every source document, kept per table kind as one
/// batch per document in the order the documents were added.
#[derive(Debug, Default)]
pub struct SurveyCollection {
    batches: BTreeMap<TableKind, Vec<Vec<ParsedRow>>>,
    documents: usize,
}

impl SurveyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, tables: DocumentTables) {
        for (kind, rows) in tables.into_buckets() {
            self.batches.entry(kind).or_default().push(rows);
        }
        self.documents += 1;
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    fn rows(&self, kind: TableKind) -> impl Iterator<Item = &ParsedRow> {
        self.batches.get(&kind).into_iter().flatten().flatten()
    }

    /// Every distinct respondent id seen in any table, in merge order.
    pub fn response_ids(&self) -> Vec<&str> {
        let ids: BTreeSet<&str> = self
            .batches
            .values()
            .flatten()
            .flatten()
            .map(|row| row.response_id.as_str())
            .collect();

        let mut ids: Vec<&str> = ids.into_iter().collect();
        ids.sort_by(|a, b| compare_response_ids(a, b));
        ids
    }

    /// First row per respondent id for `kind`, scanning batches then rows in order.
    fn first_rows(&self, kind: TableKind) -> HashMap<&str, &ParsedRow> {
        let mut index = HashMap::new();
        for row in self.rows(kind) {
            index.entry(row.response_id.as_str()).or_insert(row);
        }
        index
    }

    /// Folds every table's contribution into one record per respondent.
    ///
    /// When an id appears more than once within a table kind, only the first
    /// occurrence contributes; later duplicates are ignored.
    pub fn merge(&self) -> Vec<CompositeResponse> {
        let ids = self.response_ids();
        if ids.is_empty() {
            tracing::warn!("No response ids found in {} documents", self.documents);
            return Vec::new();
        }

        let indexes: Vec<(TableKind, HashMap<&str, &ParsedRow>)> = TableKind::ALL
            .into_iter()
            .map(|kind| (kind, self.first_rows(kind)))
            .collect();

        let merged: Vec<CompositeResponse> = ids
            .iter()
            .map(|id| {
                let mut fields = BTreeMap::new();
                for (kind, index) in &indexes {
                    if let Some(row) = index.get(id) {
                        for (field, value) in row.fields() {
                            fields.insert(kind.prefixed(field), value.to_string());
                        }
                    }
                }
                CompositeResponse::new(*id, fields)
            })
            .collect();

        tracing::info!(
            "Merged {} responses from {} documents",
            merged.len(),
            self.documents
        );
        merged
    }
}

/// Numeric ids ascending; anything that is not all digits sorts after them.
pub fn compare_response_ids(a: &str, b: &str) -> Ordering {
    numeric_rank(a).cmp(&numeric_rank(b)).then_with(|| a.cmp(b))
}

// Digit strings of any length compare by significant length, then lexically.
fn numeric_rank(id: &str) -> (bool, usize, &str) {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return (true, 0, "");
    }
    let digits = id.trim_start_matches('0');
    (false, digits.len(), digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::TableExtractor;

    fn row(kind: TableKind, cells: &[&str]) -> ParsedRow {
        let cells: Vec<String> = cells.iter().map(|s| s.to_string()).collect();
        ParsedRow::from_cells(kind, &cells).unwrap()
    }

    fn document(rows: Vec<ParsedRow>) -> DocumentTables {
        let mut tables = DocumentTables::default();
        for r in rows {
            tables.extend(r.kind, vec![r]);
        }
        tables
    }

    #[test]
    fn ids_sort_numerically_with_non_numeric_last() {
        let mut ids = vec!["10", "2", "abc", "1"];
        ids.sort_by(|a, b| compare_response_ids(a, b));
        assert_eq!(ids, vec!["1", "2", "10", "abc"]);
    }

    #[test]
    fn ids_beyond_u64_keep_numeric_order() {
        let mut ids = vec!["x1", "100000000000000000000000", "99999999999999999999999", "007", "8"];
        ids.sort_by(|a, b| compare_response_ids(a, b));
        assert_eq!(
            ids,
            vec!["007", "8", "99999999999999999999999", "100000000000000000000000", "x1"]
        );
        assert_eq!(compare_response_ids("007", "7"), Ordering::Less);
    }

    #[test]
    fn empty_collection_merges_to_nothing() {
        let mut collection = SurveyCollection::new();
        assert!(collection.merge().is_empty());

        collection.add_document(DocumentTables::default());
        assert!(collection.merge().is_empty());
        assert_eq!(collection.document_count(), 1);
    }

    #[test]
    fn disjoint_tables_merge_into_union_of_keys() {
        let mut collection = SurveyCollection::new();
        collection.add_document(document(vec![
            row(TableKind::Summary, &["1", "12 Oak Ln", "Pat", "pat@x", "No"]),
            row(TableKind::Q10, &["2", "Cost"]),
        ]));
        collection.add_document(document(vec![row(TableKind::Q10, &["1", "Weeds"])]));

        let merged = collection.merge();
        assert_eq!(merged.len(), 2);

        let first = &merged[0];
        assert_eq!(first.response_id(), "1");
        assert_eq!(first.get("summary_address"), Some("12 Oak Ln"));
        assert_eq!(first.get("summary_anonymous"), Some("No"));
        assert_eq!(first.get("q10_q10_text"), Some("Weeds"));
        assert_eq!(first.key_count(), 6);

        let second = &merged[1];
        assert_eq!(second.response_id(), "2");
        assert_eq!(second.get("q10_q10_text"), Some("Cost"));
        assert_eq!(second.get("summary_address"), None);
        assert_eq!(second.keys().collect::<Vec<_>>(), vec!["q10_q10_text"]);
    }

    #[test]
    fn first_occurrence_wins_across_documents() {
        let mut collection = SurveyCollection::new();
        collection.add_document(document(vec![row(TableKind::Q9, &["5", "Raise", "first"])]));
        collection.add_document(document(vec![
            row(TableKind::Q9, &["5", "Lower", "second"]),
            row(TableKind::Q12, &["5", "Yes"]),
        ]));

        let merged = collection.merge();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("q9_q9_response"), Some("Raise"));
        assert_eq!(merged[0].get("q9_notes"), Some("first"));
        assert_eq!(merged[0].get("q12_q12_response"), Some("Yes"));
        assert_eq!(merged[0].get("q12_q12_notes"), Some(""));
    }

    #[test]
    fn merges_documents_parsed_from_markdown() {
        let extractor = TableExtractor::new();
        let set_a = "## Response Summary Table\n| # | Addr |\n|---|---|\n| 10 | A St |\n| 9 | B St |\n";
        let set_b = "### Q7: Interest Areas\n| # | NA | Plants |\n|---|---|---|\n| 9 | | X |\n";

        let mut collection = SurveyCollection::new();
        collection.add_document(extractor.extract_document(set_a));
        collection.add_document(extractor.extract_document(set_b));

        let merged = collection.merge();
        let ids: Vec<&str> = merged.iter().map(|r| r.response_id()).collect();
        assert_eq!(ids, vec!["9", "10"]);
        assert_eq!(merged[0].get("q7_plant_selection"), Some("X"));
        assert_eq!(merged[0].get("summary_address"), Some("B St"));
        assert_eq!(merged[1].get("q7_plant_selection"), None);
    }
}
