use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Older store variant to import from when the canonical table is empty.
    pub legacy_database_url: Option<String>,
    pub template_dir: PathBuf,
    /// JSON catalog overriding the embedded vocabulary and price tables.
    pub catalog_path: Option<PathBuf>,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://work_orders.db?mode=rwc"),
            legacy_database_url: optional_env("LEGACY_DATABASE_URL"),
            template_dir: PathBuf::from(env_or("TEMPLATE_DIR", "templates")),
            catalog_path: optional_env("CATALOG_PATH").map(PathBuf::from),
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.deepseek.com"),
            llm_model: env_or("LLM_MODEL", "deepseek-chat"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
