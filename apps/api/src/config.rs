use anyhow::{Context, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// Only malformed values fail startup. A missing `GOOGLE_API_KEY` is allowed so the
/// upload route and UI stay usable; the analyze route reports it per request.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub max_upload_bytes: usize,
    pub report_language: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: parse_or(get("PORT"), 8080, "PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            google_api_key: get("GOOGLE_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            llm_timeout_secs: parse_or(
                get("LLM_TIMEOUT_SECS"),
                120,
                "LLM_TIMEOUT_SECS must be a whole number of seconds",
            )?,
            llm_max_retries: parse_or(
                get("LLM_MAX_RETRIES"),
                3,
                "LLM_MAX_RETRIES must be a non-negative integer",
            )?,
            max_upload_bytes: parse_or(
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
                "MAX_UPLOAD_BYTES must be a size in bytes",
            )?,
            report_language: get("REPORT_LANGUAGE").unwrap_or_else(|| "English".to_string()),
        })
    }
}

fn parse_or<T>(raw: Option<String>, default: T, message: &'static str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value.trim().parse::<T>().context(message),
        None => Ok(default),
    }
}
