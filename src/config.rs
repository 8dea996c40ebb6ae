//! Configuration module for the pixelbird service.
//!
//! This module contains configuration structures and environment variable handling
//! for the Twitter/X and Unsplash API integrations.

use log::{debug, error, info, warn};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::oauth::OAuthCredentials;

/// Default location of the persisted cursor file.
pub const DEFAULT_PARAMS_PATH: &str = "params.json";
/// Default seconds between two mention polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
/// Default search expression used to find mentions of the bot.
pub const DEFAULT_MENTION_QUERY: &str = "@pixelbirdbot";
/// Default phrase that activates the image reply pipeline.
pub const DEFAULT_TRIGGER_PHRASE: &str = "find image";
/// Default seconds to wait before reconnecting a dropped filter stream.
pub const DEFAULT_STREAM_RECONNECT_SECS: u64 = 15;

/// Fixed search parameters for the mention poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// The search expression (`q`)
    pub query: String,
    /// The result ordering mode (`result_type`)
    pub result_type: String,
    /// Page size (`count`)
    pub count: u32,
}

impl SearchSettings {
    /// Mixed-type results, ten per page, for the given query.
    pub fn for_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            result_type: "mixed".to_string(),
            count: 10,
        }
    }
}

/// Configuration for the whole bot.
///
/// Holds the four OAuth 1.0a credentials for the bot account, the Unsplash API
/// key and the tunables of both the poller and the stream reactor.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// OAuth 1.0a user-context credentials for the Twitter API
    pub credentials: OAuthCredentials,
    /// Access key for the Unsplash API
    pub unsplash_access_key: String,
    /// Where the `since_id` cursor is persisted
    pub params_path: PathBuf,
    /// Period of the mention poll
    pub poll_interval: Duration,
    /// Search parameters of the mention poll
    pub search: SearchSettings,
    /// Phrase tracked on the filter stream
    pub trigger_phrase: String,
    /// Directory for downloaded images
    pub temp_dir: PathBuf,
    /// Delay before reconnecting the filter stream
    pub stream_reconnect_delay: Duration,
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let length = chars.len();
    if length > 16 {
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[length - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else if length > 8 {
        let prefix: String = chars[..8].iter().collect();
        format!("{}...", prefix)
    } else {
        "...".to_string()
    }
}

fn required_secret<F>(lookup: &F, name: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            info!(
                "Found {} environment variable with length: {}",
                name,
                value.len()
            );
            debug!("{} (masked): {}", name, mask_secret(&value));
            Ok(value.trim().to_string())
        }
        Some(_) => {
            error!("{} is set but empty", name);
            Err(format!("{} cannot be empty", name).into())
        }
        None => {
            error!("Failed to load {} from environment", name);
            Err(format!("Missing {} environment variable", name).into())
        }
    }
}

fn optional_secs<F>(
    lookup: &F,
    name: &str,
    default: u64,
) -> Result<Duration, Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| format!("{} must be a whole number of seconds: {}", name, e))?;
            if secs == 0 {
                return Err(format!("{} must be greater than zero", name).into());
            }
            Ok(Duration::from_secs(secs))
        }
        None => Ok(Duration::from_secs(default)),
    }
}

impl BotConfig {
    /// Creates a new `BotConfig` by loading values from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `TWITTER_API_KEY`, `TWITTER_API_SECRET`: consumer credentials
    /// - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`: bot account credentials
    /// - `UNSPLASH_ACCESS_KEY`: Unsplash API access key
    ///
    /// # Optional Environment Variables
    ///
    /// - `PARAMS_PATH`: cursor file (defaults to `params.json`)
    /// - `POLL_INTERVAL_SECS`: poll period (defaults to 10)
    /// - `MENTION_QUERY`: mention search expression (defaults to `@pixelbirdbot`)
    /// - `TRIGGER_PHRASE`: tracked phrase (defaults to `find image`)
    /// - `IMAGE_TEMP_DIR`: download directory (defaults to the system temp dir)
    /// - `STREAM_RECONNECT_SECS`: stream reconnect delay (defaults to 15)
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Loading bot configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// [`BotConfig::from_env`] passes `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = OAuthCredentials {
            consumer_key: required_secret(&lookup, "TWITTER_API_KEY")?,
            consumer_secret: required_secret(&lookup, "TWITTER_API_SECRET")?,
            access_token: required_secret(&lookup, "TWITTER_ACCESS_TOKEN")?,
            access_token_secret: required_secret(&lookup, "TWITTER_ACCESS_TOKEN_SECRET")?,
        };
        let unsplash_access_key = required_secret(&lookup, "UNSPLASH_ACCESS_KEY")?;

        let params_path = lookup("PARAMS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMS_PATH));

        let poll_interval = optional_secs(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let stream_reconnect_delay = optional_secs(
            &lookup,
            "STREAM_RECONNECT_SECS",
            DEFAULT_STREAM_RECONNECT_SECS,
        )?;

        let query = lookup("MENTION_QUERY").unwrap_or_else(|| DEFAULT_MENTION_QUERY.to_string());
        if query.trim().is_empty() {
            return Err("MENTION_QUERY cannot be empty".into());
        }

        let trigger_phrase =
            lookup("TRIGGER_PHRASE").unwrap_or_else(|| DEFAULT_TRIGGER_PHRASE.to_string());
        if trigger_phrase.trim().is_empty() {
            return Err("TRIGGER_PHRASE cannot be empty".into());
        }

        let temp_dir = lookup("IMAGE_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        if poll_interval < Duration::from_secs(5) {
            warn!(
                "Poll interval of {:?} is short and may hit search rate limits",
                poll_interval
            );
        }

        let config = BotConfig {
            credentials,
            unsplash_access_key,
            params_path,
            poll_interval,
            search: SearchSettings::for_query(query.trim()),
            trigger_phrase: trigger_phrase.trim().to_string(),
            temp_dir,
            stream_reconnect_delay,
        };

        info!(
            "Bot configuration loaded: cursor file {}, polling '{}' every {:?}, tracking '{}'",
            config.params_path.display(),
            config.search.query,
            config.poll_interval,
            config.trigger_phrase
        );

        Ok(config)
    }
}
