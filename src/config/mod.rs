//! Configuration module for Gatekeeper bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_WELCOME_LINK: &str = "https://your-link.com";
const DEFAULT_WEBHOOK_PORT: u16 = 8443;
const DEFAULT_DATABASE: &str = "gatekeeper";
const DEFAULT_SUBSCRIBERS_FILE: &str = "users.json";

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Where subscribers are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo { uri: String, database: String },
    Json { path: PathBuf },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<Url>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// The only user allowed to broadcast and read stats.
    pub admin_id: u64,

    /// Target of the button in the welcome message.
    pub welcome_link: Url,

    pub storage: StorageBackend,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let admin_id = get("ADMIN_ID")
            .ok_or(ConfigError::Missing("ADMIN_ID"))?
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: "ADMIN_ID",
                reason: e.to_string(),
            })?;

        let welcome_link = parse_url(
            "WELCOME_LINK",
            &get("WELCOME_LINK").unwrap_or_else(|| DEFAULT_WELCOME_LINK.to_string()),
        )?;

        let bot_mode = match get("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("polling") => BotMode::Polling,
            Some("webhook") => BotMode::Webhook,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "BOT_MODE",
                    reason: format!("unknown mode '{}'", other),
                });
            }
        };

        let webhook_url = get("WEBHOOK_URL")
            .map(|u| parse_url("WEBHOOK_URL", &u))
            .transpose()?;

        // Validate webhook URL is set if mode is webhook
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        let webhook_port = match get("WEBHOOK_PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "WEBHOOK_PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_WEBHOOK_PORT,
        };

        let mongodb_uri = get("MONGODB_URI");
        let backend = get("STORAGE_BACKEND").map(|b| b.to_lowercase());
        let storage = match backend.as_deref() {
            Some("mongodb") | Some("mongo") => StorageBackend::Mongo {
                uri: mongodb_uri.ok_or(ConfigError::Missing("MONGODB_URI"))?,
                database: get("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            },
            Some("json") => StorageBackend::Json {
                path: subscribers_file(&get),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    reason: format!("unknown backend '{}'", other),
                });
            }
            None => match mongodb_uri {
                Some(uri) => StorageBackend::Mongo {
                    uri,
                    database: get("MONGODB_DATABASE")
                        .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                },
                None => StorageBackend::Json {
                    path: subscribers_file(&get),
                },
            },
        };

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: get("WEBHOOK_SECRET"),
            admin_id,
            welcome_link,
            storage,
        })
    }
}

fn subscribers_file(get: &impl Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(get("SUBSCRIBERS_FILE").unwrap_or_else(|| DEFAULT_SUBSCRIBERS_FILE.to_string()))
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
