use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::SyncError;

const DEFAULT_HELP_CENTER_URL: &str = "https://support.optisigns.com";
const DEFAULT_LOCALE: &str = "en-us";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub vector_store_id: String,
    pub assistant_id: Option<String>,
    pub help_center_url: Url,
    pub locale: String,
    pub openai_base_url: Url,
}

impl Config {
    pub fn from_env() -> Result<Self, SyncError> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SyncError::ConfigMissing(key.to_string()))
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let openai_api_key = required("OPENAI_API_KEY")?;
        let vector_store_id = required("VECTOR_STORE_ID")?;
        let assistant_id = optional("ASSISTANT_ID");

        let help_center_url = parse_url(
            "HELP_CENTER_URL",
            &optional("HELP_CENTER_URL").unwrap_or_else(|| DEFAULT_HELP_CENTER_URL.to_string()),
        )?;
        let openai_base_url = parse_url(
            "OPENAI_BASE_URL",
            &optional("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        )?;
        let locale = optional("HELP_CENTER_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Ok(Self {
            openai_api_key,
            vector_store_id,
            assistant_id,
            help_center_url,
            locale,
            openai_base_url,
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/article-sync/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("article-sync").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, SyncError> {
    let url = Url::parse(raw).map_err(|e| SyncError::Config(format!("{key}={raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SyncError::Config(format!(
            "{key} must be an http(s) URL, got {raw}"
        )));
    }
    Ok(url)
}

/// Where the local mirror lives.
#[derive(Debug, Clone)]
pub struct SyncPaths {
    pub articles_dir: PathBuf,
    pub metadata_file: PathBuf,
}

impl Default for SyncPaths {
    fn default() -> Self {
        Self {
            articles_dir: PathBuf::from("articles"),
            metadata_file: PathBuf::from("articles_metadata.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of catalog entries processed per run
    pub limit: usize,
    pub per_page: u32,
    /// Pause between consecutive requests to the same service
    pub delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            per_page: 100,
            delay: Duration::from_millis(500),
        }
    }
}
