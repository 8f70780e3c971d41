// src/extractors/schema.rs

//! Fixed table layouts of the survey export.
//!
//! Every survey question (or question group) is rendered as its own pipe
//! table under a known heading. `TableKind` names those tables and
//! `TableSchema` carries everything the rest of the crate needs to know
//! about one of them: how to find it, how its cells map onto named fields,
//! and what the normalized relational table is called.

use std::fmt;

/// How a section heading is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Heading {
    pub fn matches(&self, line: &str) -> bool {
        let line = line.trim();
        match self {
            Heading::Exact(text) => line == *text,
            Heading::Prefix(text) => line.starts_with(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Summary,
    Q1Q2,
    Q3,
    Q4,
    Q5Q6,
    Q7,
    Q8,
    Q9,
    Q10,
    Q11,
    Q12,
}

#[derive(Debug)]
pub struct TableSchema {
    pub kind: TableKind,
    /// Short tag used as the key prefix in merged records, e.g. `q1_q2`.
    pub tag: &'static str,
    pub heading: Heading,
    /// Field names after the leading `response_id` cell, in column order.
    pub fields: &'static [&'static str],
    /// Name of the normalized relational table.
    pub table_name: &'static str,
    /// Banner used in generated SQL.
    pub title: &'static str,
    pub description: &'static str,
}

// Indexed by `TableKind as usize`.
static SCHEMAS: [TableSchema; 11] = [
    TableSchema {
        kind: TableKind::Summary,
        tag: "summary",
        heading: Heading::Exact("## Response Summary Table"),
        fields: &["address", "name", "email_contact", "anonymous"],
        table_name: "responses",
        title: "RESPONSES (Main respondent information)",
        description: "Basic respondent information (address, name, contact)",
    },
    TableSchema {
        kind: TableKind::Q1Q2,
        tag: "q1_q2",
        heading: Heading::Exact("### Q1: Preference & Q2: Service Rating"),
        fields: &["q1_preference", "q2_service_rating", "notes"],
        table_name: "q1_q2_preference_rating",
        title: "Q1 & Q2: PREFERENCE & SERVICE RATING",
        description: "Landscaping preference and service rating",
    },
    TableSchema {
        kind: TableKind::Q3,
        tag: "q3",
        heading: Heading::Exact("### Q3: Already Opt-Out Reasons"),
        fields: &[
            "q3_na",
            "maintain_self",
            "quality",
            "pet_safety",
            "privacy",
            "other_text",
        ],
        table_name: "q3_opt_out_reasons",
        title: "Q3: OPT-OUT REASONS",
        description: "Reasons for wanting to opt out",
    },
    TableSchema {
        kind: TableKind::Q4,
        tag: "q4",
        heading: Heading::Exact("### Q4: Landscaping Issues"),
        fields: &[
            "irrigation",
            "poor_mowing",
            "property_damage",
            "missed_service",
            "inadequate_weeds",
            "irrigation_detail",
            "other_issues",
        ],
        table_name: "q4_landscaping_issues",
        title: "Q4: LANDSCAPING ISSUES",
        description: "Specific landscaping problems reported",
    },
    TableSchema {
        kind: TableKind::Q5Q6,
        tag: "q5_q6",
        // Exported headings carry a varying suffix after this text.
        heading: Heading::Prefix("### Q5 & Q6: Construction Issues"),
        fields: &["q5_construction_issues", "q5_explanation", "q6_group_action"],
        table_name: "q5_q6_construction_group",
        title: "Q5 & Q6: CONSTRUCTION & GROUP ACTION",
        description: "Construction issues and group action interest",
    },
    TableSchema {
        kind: TableKind::Q7,
        tag: "q7",
        heading: Heading::Exact("### Q7: Interest Areas"),
        fields: &[
            "q7_na",
            "plant_selection",
            "watering_irrigation",
            "fertilizing_pest",
            "lawn_maintenance",
            "seasonal_planning",
            "other_interests",
        ],
        table_name: "q7_interest_areas",
        title: "Q7: INTEREST AREAS",
        description: "Learning interests for landscaping topics",
    },
    TableSchema {
        kind: TableKind::Q8,
        tag: "q8",
        heading: Heading::Exact("### Q8: Equipment Ownership"),
        fields: &[
            "q8_na",
            "lawn_mower",
            "trimmer",
            "blower",
            "basic_tools",
            "truck_trailer",
            "notes",
        ],
        table_name: "q8_equipment_ownership",
        title: "Q8: EQUIPMENT OWNERSHIP",
        description: "What equipment respondents own",
    },
    TableSchema {
        kind: TableKind::Q9,
        tag: "q9",
        heading: Heading::Exact("### Q9: Dues Preference"),
        fields: &["q9_response", "notes"],
        table_name: "q9_dues_preference",
        title: "Q9: DUES PREFERENCE",
        description: "Preferences about dues changes",
    },
    TableSchema {
        kind: TableKind::Q10,
        tag: "q10",
        heading: Heading::Exact("### Q10: Biggest Concern"),
        fields: &["q10_text"],
        table_name: "q10_biggest_concern",
        title: "Q10: BIGGEST CONCERN",
        description: "Open-ended biggest concerns",
    },
    TableSchema {
        kind: TableKind::Q11,
        tag: "q11",
        heading: Heading::Exact("### Q11: Cost Reduction Ideas"),
        fields: &["q11_text"],
        table_name: "q11_cost_reduction",
        title: "Q11: COST REDUCTION IDEAS",
        description: "Ideas for cost reduction",
    },
    TableSchema {
        kind: TableKind::Q12,
        tag: "q12",
        heading: Heading::Exact("### Q12: Want Involvement"),
        fields: &["q12_response", "q12_notes"],
        table_name: "q12_involvement",
        title: "Q12: INVOLVEMENT",
        description: "Willingness to be involved in solutions",
    },
];

impl TableKind {
    pub const ALL: [TableKind; 11] = [
        TableKind::Summary,
        TableKind::Q1Q2,
        TableKind::Q3,
        TableKind::Q4,
        TableKind::Q5Q6,
        TableKind::Q7,
        TableKind::Q8,
        TableKind::Q9,
        TableKind::Q10,
        TableKind::Q11,
        TableKind::Q12,
    ];

    pub fn schema(self) -> &'static TableSchema {
        &SCHEMAS[self as usize]
    }

    pub fn tag(self) -> &'static str {
        self.schema().tag
    }

    pub fn fields(self) -> &'static [&'static str] {
        self.schema().fields
    }

    pub fn table_name(self) -> &'static str {
        self.schema().table_name
    }

    /// The root table every other table references.
    pub fn is_root(self) -> bool {
        self == TableKind::Summary
    }

    /// Identifies which table a section heading introduces, if any.
    pub fn from_heading(line: &str) -> Option<TableKind> {
        SCHEMAS
            .iter()
            .find(|schema| schema.heading.matches(line))
            .map(|schema| schema.kind)
    }

    /// Key under which `field` of this table is stored in a merged record.
    pub fn prefixed(self, field: &str) -> String {
        format!("{}_{}", self.tag(), field)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
