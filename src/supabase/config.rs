// src/supabase/config.rs
use crate::utils::error::SupabaseError;
use clap::Args;
use std::fmt;
use std::path::Path;

pub const ENV_FILE: &str = ".env";

/// Loads `path` into the process environment without overriding variables
/// that are already set. Returns `false` when the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, SupabaseError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Connection settings for the hosted Supabase project.
/// Each value can come from a flag or from its environment variable.
#[derive(Args, Clone, Default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://abcdefghijklmnop.supabase.co
    #[arg(long = "supabase-url", env = "SUPABASE_URL")]
    pub url: Option<String>,

    /// Public anon API key
    #[arg(long = "supabase-anon-key", env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Service role key (optional)
    #[arg(long = "supabase-service-key", env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    pub service_key: Option<String>,

    /// Postgres password used to derive the database URL
    #[arg(long = "supabase-db-password", env = "SUPABASE_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Explicit database URL, used when it cannot be derived
    #[arg(long = "supabase-db-url", env = "SUPABASE_DB_URL", hide_env_values = true)]
    pub db_url: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SupabaseConfig {
    pub fn url(&self) -> Option<&str> {
        present(&self.url).map(|u| u.trim_end_matches('/'))
    }

    pub fn anon_key(&self) -> Option<&str> {
        present(&self.anon_key)
    }

    /// Project reference taken from the URL host: `https://<ref>.supabase.co`.
    pub fn project_ref(&self) -> Option<String> {
        let url = self.url()?;
        let host = url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        Some(host.trim_end_matches(".supabase.co").to_string())
    }

    /// Postgres URL derived from the project URL and password, else the explicit one.
    pub fn database_url(&self) -> Option<String> {
        match (self.project_ref(), present(&self.db_password)) {
            (Some(project_ref), Some(password)) => Some(format!(
                "postgresql://postgres:{}@db.{}.supabase.co:5432/postgres",
                password, project_ref
            )),
            _ => present(&self.db_url).map(str::to_string),
        }
    }

    /// Names of required settings that are missing.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url().is_none() {
            missing.push("SUPABASE_URL");
        }
        if self.anon_key().is_none() {
            missing.push("SUPABASE_ANON_KEY");
        }
        if present(&self.db_password).is_none() {
            missing.push("SUPABASE_DB_PASSWORD");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), SupabaseError> {
        let missing = self.missing();
        if missing.is_empty() {
            tracing::info!("Configuration validation passed");
            return Ok(());
        }
        for name in &missing {
            tracing::error!("Missing required configuration: {}", name);
        }
        Err(SupabaseError::MissingConfig(missing.join(", ")))
    }

    pub fn log_status(&self) {
        let status = |set: bool| if set { "set" } else { "MISSING" };
        tracing::info!("Supabase configuration status:");
        tracing::info!("  URL: {}", status(self.url().is_some()));
        tracing::info!("  Anon key: {}", status(self.anon_key().is_some()));
        tracing::info!("  Service key: {}", status(present(&self.service_key).is_some()));
        tracing::info!("  DB password: {}", status(present(&self.db_password).is_some()));
        tracing::info!(
            "  DB URL: {}",
            if self.database_url().is_some() { "generated" } else { "cannot generate" }
        );
    }
}

// Keys stay out of logs.
impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &redact(&self.anon_key))
            .field("service_key", &redact(&self.service_key))
            .field("db_password", &redact(&self.db_password))
            .field("db_url", &redact(&self.db_url))
            .finish()
    }
}
