//! Twitter/X API integration module.
//!
//! This module contains the client the bot uses to talk to the Twitter/X v1.1
//! API: searching mentions, retweeting, uploading media, replying, and
//! following the filtered status stream. All requests are signed with OAuth
//! 1.0a User Context credentials.

mod api;
mod media;
mod parsing;
mod search;
mod stream;
mod tweets;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::SearchSettings;
use crate::oauth::OAuthCredentials;

// Re-export public API
pub use api::sanitize_for_logging;
pub use media::MAX_ALT_TEXT_CHARS;
pub use parsing::extract_search_term;
pub use search::parse_search_response;
pub use stream::{follow_filter_stream, parse_stream_message, run_filter_stream, LineDecoder};

/// A mention of the bot found through search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: String,
    pub author: String,
    pub text: String,
}

/// A status delivered by the filter stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// Id of the tweet that matched the tracked phrase
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author: String,
    /// Whether the status is a retweet of another status
    pub is_retweet: bool,
}

/// Base URLs of the three Twitter API hosts.
#[derive(Debug, Clone)]
pub struct TwitterEndpoints {
    pub api_base: String,
    pub upload_base: String,
    pub stream_base: String,
}

impl Default for TwitterEndpoints {
    fn default() -> Self {
        TwitterEndpoints {
            api_base: "https://api.twitter.com/1.1".to_string(),
            upload_base: "https://upload.twitter.com/1.1".to_string(),
            stream_base: "https://stream.twitter.com/1.1".to_string(),
        }
    }
}

impl TwitterEndpoints {
    /// Points all three hosts at the same base URL (used against mock servers).
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        TwitterEndpoints {
            api_base: base.clone(),
            upload_base: base.clone(),
            stream_base: base,
        }
    }
}

/// The platform operations the poller and the reactor depend on.
#[async_trait]
pub trait TwitterApi: Send + Sync {
    /// Searches for mentions newer than `since_id` (all recent ones when `None`).
    async fn search_mentions(
        &self,
        search: &SearchSettings,
        since_id: Option<&str>,
    ) -> Result<Vec<Mention>, Box<dyn std::error::Error + Send + Sync>>;

    /// Retweets the tweet with the given id.
    async fn retweet(&self, tweet_id: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Uploads an image and returns its media id.
    async fn upload_media(&self, bytes: &[u8]) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Attaches alt text to an uploaded media id.
    async fn create_media_metadata(
        &self,
        media_id: &str,
        alt_text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Posts a reply carrying the media and returns the new tweet id.
    async fn reply_with_media(
        &self,
        in_reply_to_id: &str,
        text: &str,
        media_id: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// HTTP client for the Twitter/X v1.1 API.
///
/// Constructed once at startup and shared by reference between the poller and
/// the reactor.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    http: Client,
    credentials: OAuthCredentials,
    endpoints: TwitterEndpoints,
}

impl TwitterClient {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self::with_endpoints(credentials, TwitterEndpoints::default())
    }

    pub fn with_endpoints(credentials: OAuthCredentials, endpoints: TwitterEndpoints) -> Self {
        TwitterClient {
            http: Client::new(),
            credentials,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &TwitterEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl TwitterApi for TwitterClient {
    async fn search_mentions(
        &self,
        search: &SearchSettings,
        since_id: Option<&str>,
    ) -> Result<Vec<Mention>, Box<dyn std::error::Error + Send + Sync>> {
        self.fetch_mentions(search, since_id).await
    }

    async fn retweet(&self, tweet_id: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.post_retweet(tweet_id).await
    }

    async fn upload_media(&self, bytes: &[u8]) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.post_media_upload(bytes).await
    }

    async fn create_media_metadata(
        &self,
        media_id: &str,
        alt_text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.post_media_metadata(media_id, alt_text).await
    }

    async fn reply_with_media(
        &self,
        in_reply_to_id: &str,
        text: &str,
        media_id: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.post_reply_with_media(in_reply_to_id, text, media_id).await
    }
}
