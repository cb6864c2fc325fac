//! Runtime settings read from the environment (and `.env`, loaded by the
//! binary before this runs).

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_FILE: &str = "data/traffic.csv";
pub const DEFAULT_LOG_FILE: &str = "logs/traffic_analytics.log";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_file: PathBuf,
    pub log_file_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_file: get("TRAFFIC_DATA_FILE")
                .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
                .into(),
            log_file_path: get("LOG_FILE_PATH")
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
                .into(),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_timeout: Duration::from_secs(
                get("OPENAI_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_OPENAI_TIMEOUT_SECS),
            ),
        }
    }
}
