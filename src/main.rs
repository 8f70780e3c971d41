// src/main.rs
mod extractors;
mod storage;
mod supabase;
mod survey;
mod utils;

use clap::{Parser, Subcommand};
use extractors::{TableExtractor, TableKind};
use std::path::{Path, PathBuf};
use storage::StorageManager;
use supabase::SupabaseConfig;
use survey::{CompositeResponse, SurveyCollection};
use utils::AppError;

/// Command Line Interface for the survey table exporter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse markdown survey files and write merged JSON and CSV
    Parse {
        /// Markdown files or directories of them, in merge order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for generated files
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,
    },

    /// Split merged JSON into per-question CSVs, a SQLite database and an Airtable bundle
    Normalize {
        /// Merged responses written by `parse`
        #[arg(short, long, default_value = "./output/survey_data.json")]
        data: PathBuf,

        /// Output directory for generated files
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,
    },

    /// Generate a SQL INSERT script for the hosted database
    Sql {
        /// Merged responses written by `parse`
        #[arg(short, long, default_value = "./output/survey_data.json")]
        data: PathBuf,

        /// Script path
        #[arg(short, long, default_value = "./output/data_import.sql")]
        output: PathBuf,
    },

    /// Parse, merge and write every output format in one pass
    Run {
        /// Markdown files or directories of them, in merge order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for generated files
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,
    },

    /// Check Supabase configuration, connectivity and imported row counts
    Check {
        /// Rows every table should hold
        #[arg(long, default_value_t = 113)]
        expected_rows: u64,

        #[command(flatten)]
        supabase: SupabaseConfig,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load .env so clap's env fallbacks can see it
    let env_file = supabase::config::load_env_file(Path::new(supabase::config::ENV_FILE));

    // 2. Parse CLI Arguments
    let cli = Cli::parse();

    // 3. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(cli.verbose);
    if env_file? {
        tracing::debug!("Loaded environment from {}", supabase::config::ENV_FILE);
    } else if matches!(cli.command, Command::Check { .. }) {
        tracing::warn!(
            "{} file not found; Supabase settings come from the environment and flags only",
            supabase::config::ENV_FILE
        );
    }
    tracing::debug!("Starting with args: {:?}", cli);

    match cli.command {
        Command::Parse { inputs, output_dir } => {
            let responses = parse_documents(&inputs)?;
            let storage = StorageManager::new(&output_dir)?;
            write_merged(&storage, &responses)?;
        }
        Command::Normalize { data, output_dir } => {
            let responses = storage::load_responses_json(&data)?;
            let storage = StorageManager::new(&output_dir)?;
            write_normalized(&storage, &responses)?;
        }
        Command::Sql { data, output } => {
            let responses = storage::load_responses_json(&data)?;
            let tables = survey::normalize(&responses);
            storage::sql_script::write_script(&output, &tables)?;
            tracing::info!("Contains {} responses across {} tables", responses.len(), tables.len());
        }
        Command::Run { inputs, output_dir } => {
            let responses = parse_documents(&inputs)?;
            let storage = StorageManager::new(&output_dir)?;
            write_merged(&storage, &responses)?;
            write_normalized(&storage, &responses)?;
            let sql_path = storage.save_sql_script(&survey::normalize(&responses))?;
            tracing::info!("All outputs written to {} (SQL: {})", storage.base_dir().display(), sql_path.display());
        }
        Command::Check { expected_rows, supabase: config } => {
            let report = supabase::run_all(&config, expected_rows).await;
            report.log_summary();
            if !report.all_passed() {
                return Err(AppError::ChecksFailed {
                    failed: report.failed(),
                    total: report.outcomes.len(),
                });
            }
            tracing::info!("All checks passed!");
        }
    }

    Ok(())
}

/// Extracts every source document in order and merges the results.
fn parse_documents(inputs: &[PathBuf]) -> Result<Vec<CompositeResponse>, AppError> {
    let sources = storage::sources::collect_sources(inputs)?;
    if sources.is_empty() {
        return Err(AppError::Config("No markdown files found in the given inputs".to_string()));
    }

    let extractor = TableExtractor::new();
    let mut collection = SurveyCollection::new();

    for path in &sources {
        tracing::info!("Parsing file: {}", path.display());
        let text = read_document(path)?;
        let tables = extractor.extract_document(&text);
        for kind in TableKind::ALL {
            tracing::debug!("  {}: {} rows", kind, tables.rows(kind).len());
        }
        collection.add_document(tables);
    }

    let responses = collection.merge();
    tracing::info!("Parsed {} responses from {} files", responses.len(), collection.document_count());
    if let (Some(first), Some(last)) = (responses.first(), responses.last()) {
        tracing::info!("Response ID range: {} to {}", first.response_id(), last.response_id());
        tracing::info!("Fields in first response: {}", first.key_count());
    }
    Ok(responses)
}

fn read_document(path: &Path) -> Result<String, AppError> {
    let text = std::fs::read_to_string(path)?;
    tracing::debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

fn write_merged(storage: &StorageManager, responses: &[CompositeResponse]) -> Result<(), AppError> {
    storage.save_responses_json(responses)?;
    storage.save_responses_csv(responses)?;
    Ok(())
}

fn write_normalized(storage: &StorageManager, responses: &[CompositeResponse]) -> Result<(), AppError> {
    let tables = survey::normalize(responses);
    for table in &tables {
        tracing::info!("  {}: {} rows", table.name(), table.rows.len());
    }

    let csv_files = storage.save_table_csvs(&tables)?;
    let db_file = storage.save_database(&tables)?;
    let airtable_dir = storage.save_airtable_bundle(&tables)?;

    tracing::info!("Created {} CSV files (one per question)", csv_files.len());
    tracing::info!("Created SQLite database: {}", db_file.display());
    tracing::info!("Created Airtable import folder: {}", airtable_dir.display());
    Ok(())
}
