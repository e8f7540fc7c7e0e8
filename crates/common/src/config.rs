use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::error::RelayError;

const DEFAULT_GH_API_URL: &str = "https://api.github.com";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_NOTIFICATIONS_FILE: &str = "state/notifications.json";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// GitHub personal access token used as a bearer credential
    pub gh_token: String,

    /// Telegram bot token
    pub telegram_token: String,

    /// Telegram chat that receives every relayed notification
    pub telegram_chat_id: String,

    /// GitHub REST API base URL (default: public endpoint)
    pub gh_api_url: String,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Where the already-notified ids are persisted
    pub notifications_file: PathBuf,

    /// Sleep between the end of one cycle and the start of the next (default: 10s)
    pub poll_interval: Duration,

    /// Overall timeout applied to each outbound HTTP request (default: 30s)
    pub http_timeout: Duration,

    /// Accepts tracing level names plus `warning` and `critical`.
    pub log_level: LevelFilter,

    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                RelayError::Config(format!("{key} environment variable must be set"))
            })
        };
        let seconds = |key: &str, default: u64| -> Result<Duration, RelayError> {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| RelayError::Config(format!("{key} must be a valid u64"))),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(RelayError::Config(format!(
                    "LOG_FORMAT must be `text` or `json`, got `{other}`"
                )));
            }
        };

        Ok(Self {
            gh_token: required("GH_TOKEN")?,
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
            gh_api_url: trim_url(get("GH_API_URL").unwrap_or_else(|| DEFAULT_GH_API_URL.into())),
            telegram_api_url: trim_url(
                get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.into()),
            ),
            notifications_file: get("NOTIFICATIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTIFICATIONS_FILE)),
            poll_interval: seconds("POLL_INTERVAL_SECS", 10)?,
            http_timeout: seconds("HTTP_TIMEOUT_SECS", 30)?,
            log_level: match get("LOG_LEVEL") {
                Some(raw) => parse_log_level(&raw)?,
                None => DEFAULT_LOG_LEVEL,
            },
            log_format,
        })
    }
}

/// Parse a log level, also accepting the `WARNING`/`CRITICAL` spellings
/// deployments of the old relay used.
fn parse_log_level(raw: &str) -> Result<LevelFilter, RelayError> {
    let normalized = raw.trim().to_ascii_lowercase();
    let name = match normalized.as_str() {
        "warning" => "warn",
        "critical" | "fatal" => "error",
        other => other,
    };
    LevelFilter::from_str(name).map_err(|_| {
        RelayError::Config(format!(
            "LOG_LEVEL must be one of off, error, warn, info, debug, trace; got `{raw}`"
        ))
    })
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
