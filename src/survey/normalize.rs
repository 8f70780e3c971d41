// src/survey/normalize.rs
use crate::extractors::TableKind;
use crate::survey::models::{CompositeResponse, RESPONSE_ID};

/// A per-question relational table rebuilt from the merged records.
/// Every row starts with the respondent id, followed by the table's columns.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub kind: TableKind,
    pub rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    pub fn name(&self) -> &'static str {
        self.kind.table_name()
    }

    /// Columns after `response_id`, in schema order.
    pub fn columns(&self) -> &'static [&'static str] {
        self.kind.fields()
    }

    /// All column names in schema order, `response_id` first.
    pub fn header(&self) -> Vec<&'static str> {
        std::iter::once(RESPONSE_ID)
            .chain(self.columns().iter().copied())
            .collect()
    }

    /// Header with `response_id` pinned first and the rest sorted.
    pub fn sorted_header(&self) -> Vec<&'static str> {
        let mut columns = self.columns().to_vec();
        columns.sort_unstable();
        std::iter::once(RESPONSE_ID).chain(columns).collect()
    }

    /// Values of one row reordered to match `header`.
    pub fn project<'a>(&self, row: &'a [String], header: &[&str]) -> Vec<&'a str> {
        let own = self.header();
        header
            .iter()
            .map(|name| {
                own.iter()
                    .position(|col| col == name)
                    .and_then(|i| row.get(i))
                    .map(String::as_str)
                    .unwrap_or("")
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Splits merged records into one table per question.
/// Each table gets a row for every respondent; unanswered columns are empty.
pub fn normalize(responses: &[CompositeResponse]) -> Vec<NormalizedTable> {
    TableKind::ALL
        .into_iter()
        .map(|kind| {
            let rows = responses
                .iter()
                .map(|response| {
                    std::iter::once(response.response_id().to_string())
                        .chain(kind.fields().iter().map(|field| {
                            response.field(kind, field).unwrap_or_default().to_string()
                        }))
                        .collect::<Vec<String>>()
                })
                .collect();
            NormalizedTable { kind, rows }
        })
        .collect()
}
