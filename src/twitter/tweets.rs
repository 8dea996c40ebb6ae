//! Tweet operations for the Twitter API.
//!
//! This module contains functions for retweeting and for replying to a tweet
//! with attached media using the v1.1 statuses endpoints.

use log::{debug, info};
use reqwest::Method;
use serde::Deserialize;

use super::TwitterClient;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    id_str: String,
}

impl TwitterClient {
    /// Retweets a tweet.
    ///
    /// # Parameters
    ///
    /// - `tweet_id`: The id of the tweet to retweet
    ///
    /// # Errors
    ///
    /// Fails on network errors and on any non-2xx status, including the 403
    /// Twitter returns for a tweet the bot has already retweeted.
    pub(crate) async fn post_retweet(
        &self,
        tweet_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!(
            "{}/statuses/retweet/{}.json",
            self.endpoints.api_base,
            urlencoding::encode(tweet_id)
        );
        info!("Retweeting tweet {}", tweet_id);

        let request_builder = self.signed_request(Method::POST, &url, &[], &[])?;
        self.execute_request(request_builder, "retweet").await?;
        Ok(())
    }

    /// Replies to a tweet with text and one attached media id.
    ///
    /// Uses `auto_populate_reply_metadata` so the reply is threaded under the
    /// original tweet without repeating the author's handle in the text.
    ///
    /// # Parameters
    ///
    /// - `in_reply_to_id`: The id of the tweet to reply to
    /// - `text`: The status text of the reply
    /// - `media_id`: A media id returned by the upload endpoint
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The id of the posted reply
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If posting fails
    pub(crate) async fn post_reply_with_media(
        &self,
        in_reply_to_id: &str,
        text: &str,
        media_id: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/statuses/update.json", self.endpoints.api_base);
        info!(
            "Replying to tweet {} with media {}",
            in_reply_to_id, media_id
        );

        let form: Vec<(&str, String)> = vec![
            ("status", text.to_string()),
            ("in_reply_to_status_id", in_reply_to_id.to_string()),
            ("auto_populate_reply_metadata", "true".to_string()),
            ("media_ids", media_id.to_string()),
        ];
        debug!("Reply form fields: {:?}", form.iter().map(|(k, _)| k).collect::<Vec<_>>());

        let request_builder = self.signed_request(Method::POST, &url, &[], &form)?;
        let response_text = self
            .execute_request(request_builder, "reply_with_media")
            .await?;

        let status: StatusResponse = serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse status update response: {}", e))?;
        info!("Posted reply {} to tweet {}", status.id_str, in_reply_to_id);
        Ok(status.id_str)
    }
}
