use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client configuration loaded from environment variables.
/// Every variable is optional; malformed values fail at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub download_dir: PathBuf,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            download_dir: PathBuf::from("."),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let timeout = match lookup("VERIFIER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("VERIFIER_TIMEOUT_SECS must be a whole number, got '{raw}'"))?;
                if secs == 0 {
                    bail!("VERIFIER_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Config {
            api_url: lookup("VERIFIER_API_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.api_url),
            timeout,
            download_dir: lookup("VERIFIER_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}
