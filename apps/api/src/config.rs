use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::LlmConfig;

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Application configuration loaded from environment variables.
///
/// Generation settings are optional here: a missing key or model does not stop
/// the service from starting. They are validated lazily by the LLM client on
/// first use.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm: LlmConfig,
    /// Upper bound on simultaneous in-flight adaptation calls per request.
    pub max_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_concurrency = parse_env("ADAPTATION_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;
        if max_concurrency == 0 {
            anyhow::bail!("ADAPTATION_MAX_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm: LlmConfig {
                enabled: parse_env("LLM_ENABLED", true)?,
                api_base: optional_env("LLM_API_BASE"),
                api_key: optional_env("LLM_API_KEY"),
                model: optional_env("LLM_MODEL"),
                temperature: parse_env("LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
                timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
            },
            max_concurrency,
        })
    }
}

/// Returns the variable's value, treating unset and blank alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
