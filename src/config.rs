use anyhow::{Context, Result};
use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

/// Default shortener API endpoint when `API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the shortener API, e.g. "https://go.example.com".
    /// Never has a trailing slash. Short links are built as `{api_url}/{code}`.
    pub api_url: String,

    /// File that persists the bearer token between runs
    pub token_path: PathBuf,

    /// Number of links shown per dashboard page
    pub page_size: NonZeroUsize,

    /// Timeout applied to every API request
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into())
            .trim_end_matches('/')
            .to_owned();

        if api_url.is_empty() {
            anyhow::bail!("API_URL must not be empty");
        }

        let token_path = match std::env::var("TOKEN_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_path()?,
        };

        let page_size = std::env::var("PAGE_SIZE")
            .unwrap_or_else(|_| "5".into())
            .parse::<NonZeroUsize>()
            .context("PAGE_SIZE must be a positive integer")?;

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            api_url,
            token_path,
            page_size,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// `<data-local-dir>/linkly/token`, e.g. `~/.local/share/linkly/token`.
fn default_token_path() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .context("could not determine a local data directory; set TOKEN_PATH")?;
    Ok(base.join("linkly").join("token"))
}
