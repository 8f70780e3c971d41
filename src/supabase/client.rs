// src/supabase/client.rs
use crate::supabase::config::SupabaseConfig;
use crate::utils::error::SupabaseError;
use reqwest::{header, Method};
use std::time::Duration;

const USER_AGENT: &str = concat!("survey_tables/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Thin client for the PostgREST interface of a Supabase project.
pub struct SupabaseClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let url = config
            .url()
            .ok_or_else(|| SupabaseError::MissingConfig("SUPABASE_URL".to_string()))?;
        let api_key = config
            .anon_key()
            .ok_or_else(|| SupabaseError::MissingConfig("SUPABASE_ANON_KEY".to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", url),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    async fn send(
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<reqwest::Response, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for: {}", status, resource);
            return Err(SupabaseError::Http {
                resource: resource.to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn rows(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<Vec<serde_json::Value>, SupabaseError> {
        response
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(format!("{}: {}", resource, e)))
    }

    /// Selects one column from `table`, optionally limited.
    pub async fn select(
        &self,
        table: &str,
        column: &str,
        limit: Option<usize>,
    ) -> Result<Vec<serde_json::Value>, SupabaseError> {
        let mut request = self.request(Method::GET, table).query(&[("select", column)]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }

        tracing::debug!("Selecting {} from {}", column, table);
        let response = Self::send(request, table).await?;
        Self::rows(response, table).await
    }

    /// Calls a database function exposed under `/rpc`, with no arguments.
    pub async fn rpc(&self, function: &str) -> Result<Vec<serde_json::Value>, SupabaseError> {
        let path = format!("rpc/{}", function);
        let request = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({}));

        tracing::debug!("Calling {}", path);
        let response = Self::send(request, &path).await?;
        Self::rows(response, &path).await
    }

    /// Exact row count of `table`, read from the `Content-Range` header
    /// (falls back to counting the returned rows).
    pub async fn count_rows(&self, table: &str) -> Result<u64, SupabaseError> {
        let request = self
            .request(Method::GET, table)
            .query(&[("select", "response_id")])
            .header("Prefer", "count=exact");
        let response = Self::send(request, table).await?;

        let from_header = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);
        if let Some(total) = from_header {
            return Ok(total);
        }

        Ok(Self::rows(response, table).await?.len() as u64)
    }
}

/// Total from a PostgREST `Content-Range` value such as `0-112/113` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}
