use std::path::PathBuf;

use anyhow::{Context, Result};
use secrecy::SecretString;

/// Default base URL of the Generative Language API.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
///
/// Read once in `main` and passed down explicitly. Nothing is required: a
/// missing `GEMINI_API_KEY` only puts the AI assist into unconfigured mode.
#[derive(Debug)]
pub struct Config {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_api_url: String,
    /// When set, each export is also archived here.
    pub export_dir: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY").map(SecretString::from),
            gemini_api_url: optional_env("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            export_dir: optional_env("EXPORT_DIR").map(PathBuf::from),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
