// src/utils/error.rs
use thiserror::Error;

// Errors raised while talking to the hosted Supabase backend
#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status} for '{resource}'")]
    Http {
        resource: String,
        status: reqwest::StatusCode,
    },

    #[error("Database query failed: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Failed to load environment file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Failed to parse Supabase response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Supabase interaction failed: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{failed} of {total} connection checks failed")]
    ChecksFailed { failed: usize, total: usize },
}
