use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub cache_dir: String,
    pub port: u16,
    pub rust_log: String,
    pub max_workers: usize,
    pub batch_size: usize,
    pub batch_pause_secs: u64,
    pub candidate_timeout_secs: u64,
    pub stale_after_secs: u64,
    pub reclaim_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            // DEEPSEEK_API_KEY preferred; OPENAI_API_KEY accepted as a fallback
            // since the endpoint speaks the same chat-completions dialect.
            llm_api_key: std::env::var("DEEPSEEK_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .context("Required environment variable 'DEEPSEEK_API_KEY' is not set")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.deepseek.com/v1"),
            llm_model: env_or("LLM_MODEL", "deepseek-chat"),
            cache_dir: env_or("CACHE_DIR", "cache"),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            max_workers: parse_env("MAX_WORKERS", 8)?,
            batch_size: parse_env("BATCH_SIZE", 5)?,
            batch_pause_secs: parse_env("BATCH_PAUSE_SECS", 2)?,
            candidate_timeout_secs: parse_env("CANDIDATE_TIMEOUT_SECS", 180)?,
            stale_after_secs: parse_env("STALE_AFTER_SECS", 600)?,
            reclaim_interval_secs: parse_env("RECLAIM_INTERVAL_SECS", 120)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number")),
        Err(_) => Ok(default),
    }
}
