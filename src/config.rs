//! Configuration module for the replybot service.
//!
//! This module contains configuration structures and environment variable handling
//! for the Twitter/X API integration and the polling loop. Configuration is read
//! once at startup.

use log::{debug, error, info, warn};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::{ReplySettings, DEFAULT_HANDLE};

/// Poll interval used when `POLL_INTERVAL_MINUTES` is unset or invalid.
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 2;

/// Reply used when `REPLY_MESSAGE` is unset.
pub const DEFAULT_REPLY_TEMPLATE: &str =
    "Hey @{username}! Thanks for reaching out 🤖 How can I help you?";

/// Cursor file used when `CURSOR_FILE` is unset.
pub const DEFAULT_CURSOR_FILE: &str = "last_mention_id.txt";

/// API root used when `X_API_BASE_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "https://api.x.com/2";

/// OAuth 1.0a User Context credentials (read + write).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Consumer key (`X_API_KEY`)
    pub api_key: String,
    /// Consumer secret (`X_API_SECRET`)
    pub api_secret: String,
    /// Access token of the bot account (`X_ACCESS_TOKEN`)
    pub access_token: String,
    /// Access token secret of the bot account (`X_ACCESS_TOKEN_SECRET`)
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask_secret(&self.api_key))
            .field("api_secret", &"[REDACTED]")
            .field("access_token", &mask_secret(&self.access_token))
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Everything the bot reads from its environment.
#[derive(Clone)]
pub struct BotConfig {
    /// Time between the end of one poll cycle and the start of the next
    pub poll_interval: Duration,
    /// Reply text with a `{username}` placeholder
    pub reply_template: String,
    /// Handle substituted when a mention's author cannot be resolved
    pub default_handle: String,
    /// OAuth 1.0a credentials
    pub credentials: Credentials,
    /// Where the file cursor store keeps the last mention id
    pub cursor_file: PathBuf,
    /// Selects the PostgreSQL cursor store when present
    pub database_url: Option<String>,
    /// Enables the status server when present
    pub port: Option<u16>,
    /// Root of the X API v2
    pub api_base_url: String,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("poll_interval", &self.poll_interval)
            .field("reply_template", &self.reply_template)
            .field("default_handle", &self.default_handle)
            .field("credentials", &self.credentials)
            .field("cursor_file", &self.cursor_file)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("port", &self.port)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl BotConfig {
    /// Creates a new `BotConfig` by reading environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `X_API_KEY`, `X_API_SECRET`: Consumer credentials of the app
    /// - `X_ACCESS_TOKEN`, `X_ACCESS_TOKEN_SECRET`: User Context credentials of the bot account
    ///
    /// # Optional Environment Variables
    ///
    /// - `POLL_INTERVAL_MINUTES`: Minutes between polls (default 2)
    /// - `REPLY_MESSAGE`: Reply template containing `{username}`
    /// - `DEFAULT_HANDLE`: Handle used for unresolved authors (default `friend`)
    /// - `CURSOR_FILE`: Path of the cursor file (default `last_mention_id.txt`)
    /// - `DATABASE_URL`: Store the cursor in PostgreSQL instead of a file
    /// - `PORT`: Serve `/health` and `/status` on this port
    /// - `X_API_BASE_URL`: Override the API root (default `https://api.x.com/2`)
    ///
    /// # Returns
    ///
    /// - `Ok(BotConfig)`: If all required variables are present and valid
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If a credential is missing or `PORT` is invalid
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Loading bot configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`BotConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials {
            api_key: require(&lookup, "X_API_KEY")?,
            api_secret: require(&lookup, "X_API_SECRET")?,
            access_token: require(&lookup, "X_ACCESS_TOKEN")?,
            access_token_secret: require(&lookup, "X_ACCESS_TOKEN_SECRET")?,
        };
        debug!("Credentials loaded: {:?}", credentials);

        let poll_interval = parse_poll_interval(lookup("POLL_INTERVAL_MINUTES").as_deref());

        let reply_template = match lookup("REPLY_MESSAGE").filter(|t| !t.is_empty()) {
            Some(template) => {
                if !template.contains("{username}") {
                    warn!("REPLY_MESSAGE has no {{username}} placeholder, every reply will be identical");
                }
                template
            }
            None => DEFAULT_REPLY_TEMPLATE.to_string(),
        };

        let default_handle = lookup("DEFAULT_HANDLE")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HANDLE.to_string());

        let cursor_file = lookup("CURSOR_FILE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CURSOR_FILE));

        let database_url = lookup("DATABASE_URL").filter(|u| !u.is_empty());
        if database_url.is_some() {
            info!("DATABASE_URL is set, the cursor will be stored in PostgreSQL");
        } else {
            info!("Cursor will be stored in {}", cursor_file.display());
        }

        let port = match lookup("PORT").filter(|p| !p.is_empty()) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(e) => {
                    error!("PORT must be a valid number, got '{}'", raw);
                    return Err(format!("PORT must be a valid number: {}", e).into());
                }
            },
            None => None,
        };

        let api_base_url = lookup("X_API_BASE_URL")
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        info!("Bot configuration loaded successfully");

        Ok(BotConfig {
            poll_interval,
            reply_template,
            default_handle,
            credentials,
            cursor_file,
            database_url,
            port,
            api_base_url,
        })
    }

    /// The parts of the configuration the reply dispatcher needs.
    pub fn reply_settings(&self) -> ReplySettings {
        ReplySettings {
            template: self.reply_template.clone(),
            default_handle: self.default_handle.clone(),
        }
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => {
            info!("Found {} environment variable with length: {}", key, value.len());
            Ok(value)
        }
        Some(_) => {
            error!("{} is set but empty", key);
            Err(format!("{} cannot be empty", key).into())
        }
        None => {
            error!("Make sure {} environment variable is set", key);
            Err(format!("Missing {} environment variable", key).into())
        }
    }
}

/// Minutes from `POLL_INTERVAL_MINUTES`; unparsable, zero or oversized values fall back to the default.
pub(crate) fn parse_poll_interval(raw: Option<&str>) -> Duration {
    let minutes = match raw.map(str::trim) {
        Some(value) => match value.parse::<u64>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                warn!(
                    "Invalid POLL_INTERVAL_MINUTES '{}', using {} minutes",
                    value, DEFAULT_POLL_INTERVAL_MINUTES
                );
                DEFAULT_POLL_INTERVAL_MINUTES
            }
        },
        None => DEFAULT_POLL_INTERVAL_MINUTES,
    };
    match minutes.checked_mul(60) {
        Some(secs) => Duration::from_secs(secs),
        None => {
            warn!(
                "POLL_INTERVAL_MINUTES {} is too large, using {} minutes",
                minutes, DEFAULT_POLL_INTERVAL_MINUTES
            );
            Duration::from_secs(DEFAULT_POLL_INTERVAL_MINUTES * 60)
        }
    }
}

/// Shows at most the first and last 4 characters of a secret.
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 16 {
        let prefix: String = chars[..4].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "...".to_string()
    }
}
