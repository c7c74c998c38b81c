use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
const DEFAULT_DEPLOYMENT: &str = "gpt-4o";

/// Application configuration loaded from environment variables.
/// Fails at startup only on values that are present but unparseable.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL for the trigram index. Unset means the in-process index.
    pub database_url: Option<String>,
    /// Directory scanned for the CSV exports on first start.
    pub data_dir: PathBuf,
    pub azure: AzureOpenAiConfig,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub api_version: String,
    pub deployment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("LOG_FORMAT must be 'text' or 'json', got '{other}'"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            data_dir: optional_env("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            azure: AzureOpenAiConfig {
                api_key: optional_env("AZURE_OPENAI_API_KEY"),
                endpoint: optional_env("AZURE_OPENAI_ENDPOINT"),
                api_version: optional_env("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                deployment: optional_env("AZURE_OPENAI_DEPLOYMENT_NAME")
                    .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: std::env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .parse()?,
        })
    }
}

impl AzureOpenAiConfig {
    /// Both the key and the endpoint are needed before a completion can succeed.
    pub fn is_complete(&self) -> bool {
        self.api_key.is_some() && self.endpoint.is_some()
    }
}

/// Empty values count as unset so a blank line in `.env` does not shadow a default.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
