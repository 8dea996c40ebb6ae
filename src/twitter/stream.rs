//! Filtered status stream for the Twitter API.
//!
//! The v1.1 `statuses/filter` endpoint keeps an HTTP response open and writes
//! one JSON message per line (CRLF delimited), with blank keep-alive lines in
//! between. This module decodes that body into [`StreamEvent`]s and keeps the
//! connection alive across drops.

use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::{Method, Response};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

use super::api::sanitize_for_logging;
use super::{StreamEvent, TwitterClient};

#[derive(Debug, Deserialize)]
struct RawStatus {
    id_str: Option<String>,
    text: Option<String>,
    extended_tweet: Option<ExtendedTweet>,
    user: Option<RawUser>,
    retweeted_status: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ExtendedTweet {
    full_text: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id_str: String,
    screen_name: String,
}

/// Splits a chunked response body into complete lines.
///
/// Bytes are buffered until a `\n` arrives so that lines (and multi-byte
/// characters) split across chunks are reassembled.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every non-blank line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Returns whatever is left in the buffer once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

/// Parses one stream line into a [`StreamEvent`].
///
/// # Returns
///
/// - `Some(event)`: For status messages
/// - `None`: For keep-alives, control messages (`delete`, `limit`, ...) and malformed lines
pub fn parse_stream_message(line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let raw: RawStatus = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Ignoring malformed stream message ({}): {}",
                e,
                sanitize_for_logging(line, 200)
            );
            return None;
        }
    };

    let (Some(id), Some(user)) = (raw.id_str, raw.user) else {
        debug!(
            "Ignoring non-status stream message: {}",
            sanitize_for_logging(line, 200)
        );
        return None;
    };
    let text = raw.extended_tweet.map(|e| e.full_text).or(raw.text)?;

    Some(StreamEvent {
        id,
        text,
        author_id: user.id_str,
        author: user.screen_name,
        is_retweet: raw.retweeted_status.is_some(),
    })
}

impl TwitterClient {
    /// Opens the filter stream tracking the given phrase.
    ///
    /// # Returns
    ///
    /// - `Ok(Response)`: The open streaming response
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If the connection is refused or rejected
    pub async fn open_filter_stream(
        &self,
        track: &str,
    ) -> Result<Response, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/statuses/filter.json", self.endpoints.stream_base);
        info!("Connecting to filter stream tracking '{}'", track);

        let form: Vec<(&str, String)> = vec![("track", track.to_string())];
        let response = self
            .signed_request(Method::POST, &url, &[], &form)?
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Filter stream connection failed - Status: {}", status);
            return Err(format!(
                "Twitter API error for operation 'filter_stream' ({}): {}",
                status,
                sanitize_for_logging(&error_text, 200)
            )
            .into());
        }

        info!("Connected to filter stream");
        Ok(response)
    }
}

/// Reads the filter stream once until it ends, forwarding every status.
///
/// Returns `Ok(())` when the server closes the stream or when the receiving
/// side of `events` has gone away.
pub async fn run_filter_stream(
    client: &TwitterClient,
    track: &str,
    events: &mpsc::Sender<StreamEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let response = client.open_filter_stream(track).await?;
    let mut body = response.bytes_stream();
    let mut decoder = LineDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for line in decoder.push(&chunk) {
            if let Some(event) = parse_stream_message(&line) {
                if events.send(event).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    if let Some(event) = decoder.finish().and_then(|line| parse_stream_message(&line)) {
        let _ = events.send(event).await;
    }

    Ok(())
}

/// Follows the filter stream for as long as anyone is listening.
///
/// Whenever the connection ends or fails it is re-established after
/// `reconnect_delay`. Returns once `events` is closed.
pub async fn follow_filter_stream(
    client: &TwitterClient,
    track: &str,
    reconnect_delay: Duration,
    events: mpsc::Sender<StreamEvent>,
) {
    loop {
        match run_filter_stream(client, track, &events).await {
            Ok(()) => warn!("Filter stream ended"),
            Err(e) => error!("Filter stream failed: {}", e),
        }

        if events.is_closed() {
            info!("Event receiver closed, no longer following the filter stream");
            return;
        }

        warn!(
            "Reconnecting to filter stream in {} seconds",
            reconnect_delay.as_secs()
        );
        tokio::time::sleep(reconnect_delay).await;
    }
}
