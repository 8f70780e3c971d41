// src/extractors/mod.rs
pub mod markdown;
pub mod schema;

// Re-export key extraction types for convenience
pub use markdown::{DocumentTables, ParsedRow, TableExtractor};
pub use schema::TableKind;
