use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Base URL used when `API_BASE_URL` is not set: the analysis service running locally.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Failures already reach the user as one message on stderr; diagnostics are opt-in.
pub const DEFAULT_LOG_LEVEL: &str = "error";

const DATA_DIR_NAME: &str = "resume-analyzer";

/// Client configuration loaded from environment variables.
/// Every variable is optional; defaults target a local development setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base_url = match std::env::var("API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => normalize_base_url(&url)?,
            _ => DEFAULT_API_BASE_URL.to_string(),
        };

        let data_dir = match std::env::var("ANALYZER_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir(),
        };

        Ok(Config {
            api_base_url,
            data_dir,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

/// Trims whitespace and trailing slashes so `/analyze` can be appended directly.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("API_BASE_URL must start with http:// or https:// (got '{raw}')");
    }
    url.parse::<reqwest::Url>()
        .with_context(|| format!("API_BASE_URL '{raw}' is not a valid URL"))?;
    Ok(url.to_string())
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{DATA_DIR_NAME}")))
}
