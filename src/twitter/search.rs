//! Mention search for the Twitter API.
//!
//! This module queries the v1.1 `search/tweets` endpoint for mentions of the
//! bot, optionally bounded below by the persisted `since_id` cursor.

use log::{debug, info};
use reqwest::Method;
use serde::Deserialize;

use crate::config::SearchSettings;

use super::api::sanitize_for_logging;
use super::{Mention, TwitterClient};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<SearchStatus>,
}

#[derive(Debug, Deserialize)]
struct SearchStatus {
    id_str: String,
    #[serde(default)]
    text: String,
    user: Option<SearchUser>,
}

#[derive(Debug, Deserialize)]
struct SearchUser {
    screen_name: String,
}

/// Parses a `search/tweets` response body into mentions, keeping the API's order.
pub fn parse_search_response(
    body: &str,
) -> Result<Vec<Mention>, Box<dyn std::error::Error + Send + Sync>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| format!("Failed to parse search response: {}", e))?;

    Ok(response
        .statuses
        .into_iter()
        .map(|status| Mention {
            id: status.id_str,
            author: status
                .user
                .map(|u| u.screen_name)
                .unwrap_or_else(|| "unknown".to_string()),
            text: status.text,
        })
        .collect())
}

impl TwitterClient {
    /// Searches for mentions of the bot.
    ///
    /// # Parameters
    ///
    /// - `search`: Query expression, result type and page size
    /// - `since_id`: Only return results newer than this id when present
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Mention>)`: Mentions in the order the API returned them
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If the request or parsing fails
    pub(crate) async fn fetch_mentions(
        &self,
        search: &SearchSettings,
        since_id: Option<&str>,
    ) -> Result<Vec<Mention>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/search/tweets.json", self.endpoints.api_base);

        let mut query: Vec<(&str, String)> = vec![
            ("q", search.query.clone()),
            ("result_type", search.result_type.clone()),
            ("count", search.count.to_string()),
        ];
        if let Some(since_id) = since_id {
            query.push(("since_id", since_id.to_string()));
        }

        info!(
            "Searching for '{}' (since_id: {})",
            search.query,
            since_id.unwrap_or("none")
        );

        let request_builder = self.signed_request(Method::GET, &url, &query, &[])?;
        let response_text = self
            .execute_request(request_builder, "search_mentions")
            .await?;

        let mentions = parse_search_response(&response_text)?;
        info!("Search returned {} mentions", mentions.len());
        for (i, mention) in mentions.iter().enumerate() {
            debug!(
                "Mention {} (ID: {}) by @{}: {}",
                i + 1,
                mention.id,
                mention.author,
                sanitize_for_logging(&mention.text, 140)
            );
        }

        Ok(mentions)
    }
}
