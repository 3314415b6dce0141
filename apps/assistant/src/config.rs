use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveTime;

/// Application configuration loaded from environment variables.
/// Only settings that have no sensible default fail at startup; the API key
/// is checked lazily so modes that never call the model still run without it.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub anthropic_base_url: String,
    pub llm_max_attempts: u32,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub applications_path: PathBuf,
    pub smtp_settings_path: PathBuf,
    pub reminder_time: NaiveTime,
    pub storage: Option<StorageConfig>,
    pub voyage_api_key: Option<String>,
    pub voyage_base_url: String,
}

/// S3 / MinIO settings. Present only when `S3_BUCKET` is set.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let reminder_time = env_or("REMINDER_TIME", "09:00");
        let reminder_time = NaiveTime::parse_from_str(&reminder_time, "%H:%M")
            .with_context(|| format!("REMINDER_TIME must be HH:MM, got '{reminder_time}'"))?;

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            llm_model: env_or("LLM_MODEL", crate::llm_client::DEFAULT_MODEL),
            anthropic_base_url: env_or(
                "ANTHROPIC_BASE_URL",
                crate::llm_client::DEFAULT_BASE_URL,
            ),
            llm_max_attempts: env_or("LLM_MAX_ATTEMPTS", "1")
                .parse::<u32>()
                .context("LLM_MAX_ATTEMPTS must be a positive integer")?
                .max(1),
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            applications_path: env_or("APPLICATIONS_PATH", "data/user_data/applications.json")
                .into(),
            smtp_settings_path: env_or("SMTP_SETTINGS_PATH", "config/smtp_settings.json").into(),
            reminder_time,
            storage: optional_env("S3_BUCKET").map(|bucket| StorageConfig {
                bucket,
                endpoint: optional_env("S3_ENDPOINT"),
                region: env_or("S3_REGION", "us-east-1"),
                access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
                secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            }),
            voyage_api_key: optional_env("VOYAGE_API_KEY"),
            voyage_base_url: env_or("VOYAGE_BASE_URL", crate::ml::embedding::VOYAGE_BASE_URL),
        })
    }

    /// Returns the Anthropic key, failing with a readable message when unset.
    pub fn require_api_key(&self) -> Result<String> {
        self.anthropic_api_key.clone().context(
            "Required environment variable 'ANTHROPIC_API_KEY' is not set (needed to talk to the model)",
        )
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
