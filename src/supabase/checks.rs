// src/supabase/checks.rs
use crate::extractors::TableKind;
use crate::supabase::client::SupabaseClient;
use crate::supabase::config::SupabaseConfig;
use crate::utils::error::SupabaseError;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_postgres::NoTls;

const DB_CONNECT_TIMEOUT_SECS: u64 = 10;
const RATING_STATS_FUNCTION: &str = "get_service_rating_stats";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    fn record(&mut self, name: &'static str, passed: bool) {
        self.outcomes.push(CheckOutcome { name, passed });
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn log_summary(&self) {
        tracing::info!("Check results:");
        for outcome in &self.outcomes {
            if outcome.passed {
                tracing::info!("  {}: PASS", outcome.name);
            } else {
                tracing::warn!("  {}: FAIL", outcome.name);
            }
        }
    }
}

/// Runs every check in order. A failing check never stops the ones after it.
pub async fn run_all(config: &SupabaseConfig, expected_rows: u64) -> CheckReport {
    let mut report = CheckReport::default();

    report.record("Configuration", check_config(config));
    report.record("Supabase Connection", check_connection(config).await);
    report.record("Database Connection", check_database(config).await);
    report.record("Data Integrity", check_integrity(config, expected_rows).await);
    report.record("Sample Query", sample_query(config).await);

    report
}

fn client_for(config: &SupabaseConfig, check: &str) -> Option<SupabaseClient> {
    match SupabaseClient::new(config) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!("Cannot run {} check: {}", check, e);
            None
        }
    }
}

pub fn check_config(config: &SupabaseConfig) -> bool {
    tracing::info!("Testing configuration...");
    config.log_status();
    config.validate().is_ok()
}

pub async fn check_connection(config: &SupabaseConfig) -> bool {
    tracing::info!("Testing Supabase client connection...");
    let Some(client) = client_for(config, "connection") else {
        return false;
    };

    let root = TableKind::Summary.table_name();
    match client.select(root, "response_id", Some(1)).await {
        Ok(rows) if rows.is_empty() => {
            tracing::warn!("Connection successful but no data found in '{}' - check if data was imported", root);
            true
        }
        Ok(rows) => {
            tracing::info!("Supabase connection successful! Found {} test record(s)", rows.len());
            true
        }
        Err(e) => {
            tracing::error!("Supabase connection failed: {}", e);
            false
        }
    }
}

/// Connects straight to Postgres and counts the root table.
pub async fn check_database(config: &SupabaseConfig) -> bool {
    tracing::info!("Testing direct database connection...");
    let Some(url) = config.database_url() else {
        tracing::error!("Cannot test database connection - missing database URL");
        return false;
    };

    match count_root_rows(&url).await {
        Ok(count) => {
            tracing::info!("Database connection successful! Found {} responses in database", count);
            true
        }
        Err(e) => {
            tracing::error!("Database connection failed: {}", e);
            false
        }
    }
}

async fn count_root_rows(url: &str) -> Result<i64, SupabaseError> {
    let mut db_config: tokio_postgres::Config = url.parse()?;
    db_config.connect_timeout(Duration::from_secs(DB_CONNECT_TIMEOUT_SECS));

    let (client, connection) = db_config.connect(NoTls).await?;
    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!("Database connection closed with error: {}", e);
        }
    });

    let query = format!("SELECT COUNT(*) FROM {}", TableKind::Summary.table_name());
    let result = client.query_one(query.as_str(), &[]).await;
    drop(client);
    let _ = driver.await;

    let count: i64 = result?.try_get(0)?;
    Ok(count)
}

/// Every normalized table must hold exactly `expected_rows` rows.
pub async fn check_integrity(config: &SupabaseConfig, expected_rows: u64) -> bool {
    tracing::info!("Testing data integrity...");
    let Some(client) = client_for(config, "data integrity") else {
        return false;
    };

    let mut all_good = true;
    for kind in TableKind::ALL {
        let table = kind.table_name();
        match client.count_rows(table).await {
            Ok(count) if count == expected_rows => {
                tracing::info!("  {}: {} rows", table, count);
            }
            Ok(count) => {
                tracing::warn!("  {}: {} rows (expected {})", table, count, expected_rows);
                all_good = false;
            }
            Err(e) => {
                tracing::error!("  {}: {}", table, e);
                all_good = false;
            }
        }
    }

    if all_good {
        tracing::info!("All tables have expected {} rows!", expected_rows);
    } else {
        tracing::warn!("Some tables have unexpected row counts");
    }
    all_good
}

/// Distribution of service ratings, as a quick end-to-end query.
/// Uses the stats function when the database defines it, else a plain select.
pub async fn sample_query(config: &SupabaseConfig) -> bool {
    tracing::info!("Running sample analysis query...");
    let Some(client) = client_for(config, "sample query") else {
        return false;
    };

    match client.rpc(RATING_STATS_FUNCTION).await {
        Ok(rows) if !rows.is_empty() => {
            tracing::info!("Service rating distribution:");
            for row in &rows {
                let rating = row.get("rating").and_then(|v| v.as_str()).unwrap_or("Unknown");
                let count = row.get("count").and_then(|v| v.as_u64()).unwrap_or(0);
                tracing::info!("  {}: {} responses", rating, count);
            }
            return true;
        }
        Ok(_) => tracing::debug!("{} returned no rows", RATING_STATS_FUNCTION),
        Err(e) => tracing::debug!("{} unavailable: {}", RATING_STATS_FUNCTION, e),
    }

    let table = TableKind::Q1Q2.table_name();
    match client.select(table, "q2_service_rating", None).await {
        Ok(rows) => {
            tracing::info!("Service rating distribution (basic query):");
            for (rating, count) in tally(&rows, "q2_service_rating") {
                tracing::info!("  {}: {} responses", rating, count);
            }
            true
        }
        Err(e) => {
            tracing::error!("Sample query failed: {}", e);
            tracing::warn!("This is normal if the database views haven't been created yet");
            false
        }
    }
}

/// Counts values of `column`; nulls and missing values count as "Unknown".
pub fn tally(rows: &[serde_json::Value], column: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        let value = row
            .get(column)
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server};
    use serde_json::json;

    #[test]
    fn tally_groups_values_and_unknowns() {
        let rows = vec![
            json!({"q2_service_rating": "Good"}),
            json!({"q2_service_rating": null}),
            json!({"q2_service_rating": "Good"}),
            json!({}),
        ];
        let counts = tally(&rows, "q2_service_rating");
        assert_eq!(counts.get("Good"), Some(&2));
        assert_eq!(counts.get("Unknown"), Some(&2));
    }

    #[test]
    fn missing_credentials_fail_every_check_without_aborting() {
        let report = tokio_test::block_on(run_all(&SupabaseConfig::default(), 113));
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            vec![
                "Configuration",
                "Supabase Connection",
                "Database Connection",
                "Data Integrity",
                "Sample Query"
            ]
        );
        assert_eq!(report.failed(), 5);
        assert!(!report.all_passed());
    }

    fn config_for(url: &str) -> SupabaseConfig {
        SupabaseConfig {
            url: Some(url.to_string()),
            anon_key: Some("anon".to_string()),
            ..Default::default()
        }
    }

    async fn mock_get(server: &mut Server, table: &str, body: &str) -> Mock {
        server
            .mock("GET", format!("/rest/v1/{}", table).as_str())
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_count(server: &mut Server, table: &str, total: u64) -> Mock {
        server
            .mock("GET", format!("/rest/v1/{}", table).as_str())
            .match_query(Matcher::Any)
            .match_header("prefer", "count=exact")
            .with_header("content-range", &format!("0-0/{}", total))
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await
    }

    #[test]
    fn empty_root_table_still_passes_connection() {
        tokio_test::block_on(async {
            let mut server = Server::new_async().await;
            let _mock = mock_get(&mut server, "responses", "[]").await;
            assert!(check_connection(&config_for(&server.url())).await);
        });
    }

    #[test]
    fn rejected_request_fails_connection() {
        tokio_test::block_on(async {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("GET", "/rest/v1/responses")
                .match_query(Matcher::Any)
                .with_status(500)
                .create_async()
                .await;
            assert!(!check_connection(&config_for(&server.url())).await);
        });
    }

    #[test]
    fn integrity_passes_only_when_every_table_matches() {
        tokio_test::block_on(async {
            let mut server = Server::new_async().await;
            let mut mocks = Vec::new();
            for kind in TableKind::ALL {
                mocks.push(mock_count(&mut server, kind.table_name(), 3).await);
            }
            let config = config_for(&server.url());
            assert!(check_integrity(&config, 3).await);
            assert!(!check_integrity(&config, 113).await);
        });
    }

    #[test]
    fn integrity_fails_on_one_short_table() {
        tokio_test::block_on(async {
            let mut server = Server::new_async().await;
            let mut mocks = Vec::new();
            for kind in TableKind::ALL {
                let total = if kind == TableKind::Q7 { 2 } else { 3 };
                mocks.push(mock_count(&mut server, kind.table_name(), total).await);
            }
            assert!(!check_integrity(&config_for(&server.url()), 3).await);
        });
    }

    #[test]
    fn sample_query_uses_stats_function_when_present() {
        tokio_test::block_on(async {
            let mut server = Server::new_async().await;
            let rpc = server
                .mock("POST", "/rest/v1/rpc/get_service_rating_stats")
                .with_header("content-type", "application/json")
                .with_body(r#"[{"rating":"Good","count":2}]"#)
                .create_async()
                .await;
            let select = server
                .mock("GET", "/rest/v1/q1_q2_preference_rating")
                .match_query(Matcher::Any)
                .expect(0)
                .create_async()
                .await;

            assert!(sample_query(&config_for(&server.url())).await);
            rpc.assert_async().await;
            select.assert_async().await;
        });
    }

    #[test]
    fn sample_query_falls_back_to_plain_select() {
        tokio_test::block_on(async {
            let mut server = Server::new_async().await;
            let _rpc = server
                .mock("POST", "/rest/v1/rpc/get_service_rating_stats")
                .with_status(404)
                .create_async()
                .await;
            let select = mock_get(
                &mut server,
                "q1_q2_preference_rating",
                r#"[{"q2_service_rating":"Good"},{"q2_service_rating":"Poor"}]"#,
            )
            .await;

            assert!(sample_query(&config_for(&server.url())).await);
            select.assert_async().await;
        });
    }

    #[test]
    fn sample_query_fails_when_nothing_answers() {
        tokio_test::block_on(async {
            let server = Server::new_async().await;
            assert!(!sample_query(&config_for(&server.url())).await);
        });
    }

    #[test]
    fn database_check_fails_without_url_or_server() {
        tokio_test::block_on(async {
            assert!(!check_database(&SupabaseConfig::default()).await);

            let unreachable = SupabaseConfig {
                db_url: Some("postgresql://postgres:pw@127.0.0.1:1/postgres".to_string()),
                ..Default::default()
            };
            assert!(!check_database(&unreachable).await);
        });
    }
}
