use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::review::SourcePlatform;
use crate::triage::DEFAULT_BATCH_SIZE;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    /// OpenAI-compatible chat-completions URL; the public API when unset.
    pub openai_endpoint: Option<String>,
    pub kbc_url: Option<String>,
    pub kbc_token: Option<String>,
    /// Local CSV directory used instead of Keboola when set.
    pub data_dir: Option<String>,
    pub source_platform: SourcePlatform,
    pub google_maps_table: Option<String>,
    pub yelp_table: Option<String>,
    pub tripadvisor_table: Option<String>,
    pub facebook_table: Option<String>,
    pub default_batch_size: i64,
    pub completion_timeout: Option<Duration>,
    pub export_timeout: Option<Duration>,
    /// Rows requested from the Storage API preview; capped at its maximum.
    pub export_row_limit: Option<u32>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = optional_env("DATA_DIR");
        let (kbc_url, kbc_token) = if data_dir.is_some() {
            (optional_env("KBC_URL"), optional_env("KBC_TOKEN"))
        } else {
            (Some(require_env("KBC_URL")?), Some(require_env("KBC_TOKEN")?))
        };

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_endpoint: optional_env("OPENAI_ENDPOINT"),
            kbc_url,
            kbc_token,
            data_dir,
            source_platform: optional_env("SOURCE_PLATFORM")
                .map(|p| p.parse::<SourcePlatform>())
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("SOURCE_PLATFORM must name a review platform")?
                .unwrap_or(SourcePlatform::GoogleMaps),
            google_maps_table: optional_env("GOOGLE_MAPS_TABLE")
                .or_else(|| optional_env("APIFY_TABLE")),
            yelp_table: optional_env("YELP_TABLE"),
            tripadvisor_table: optional_env("TRIPADVISOR_TABLE"),
            facebook_table: optional_env("FACEBOOK_TABLE"),
            default_batch_size: optional_env("DEFAULT_BATCH_SIZE")
                .map(|v| v.parse::<i64>())
                .transpose()
                .context("DEFAULT_BATCH_SIZE must be an integer")?
                .unwrap_or(DEFAULT_BATCH_SIZE),
            completion_timeout: timeout_env("COMPLETION_TIMEOUT_SECS")?,
            export_timeout: timeout_env("EXPORT_TIMEOUT_SECS")?,
            export_row_limit: optional_env("EXPORT_ROW_LIMIT")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("EXPORT_ROW_LIMIT must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Table backing `platform`, if one is configured.
    pub fn table_for(&self, platform: SourcePlatform) -> Option<String> {
        match platform {
            SourcePlatform::GoogleMaps => self.google_maps_table.clone(),
            SourcePlatform::Yelp => self.yelp_table.clone(),
            SourcePlatform::TripAdvisor => self.tripadvisor_table.clone(),
            SourcePlatform::Facebook => self.facebook_table.clone(),
            SourcePlatform::Manual => None,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Unset means no timeout.
fn timeout_env(key: &str) -> Result<Option<Duration>> {
    optional_env(key)
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{key} must be a whole number of seconds"))
        })
        .transpose()
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            openai_api_key: "sk-test".to_string(),
            openai_endpoint: None,
            kbc_url: None,
            kbc_token: None,
            data_dir: None,
            source_platform: SourcePlatform::GoogleMaps,
            google_maps_table: Some("reviews".to_string()),
            yelp_table: None,
            tripadvisor_table: None,
            facebook_table: None,
            default_batch_size: DEFAULT_BATCH_SIZE,
            completion_timeout: None,
            export_timeout: None,
            export_row_limit: None,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
