//! # Pixelbird
//!
//! Long-running Twitter/X bot: retweets mentions on a schedule and replies to
//! trigger-phrase tweets with an image.
//!
//! ## Environment Variables
//!
//! - `TWITTER_API_KEY`, `TWITTER_API_SECRET`, `TWITTER_ACCESS_TOKEN`,
//!   `TWITTER_ACCESS_TOKEN_SECRET`: OAuth 1.0a credentials of the bot account
//! - `UNSPLASH_ACCESS_KEY`: Unsplash API key
//! - `RUST_LOG`: log filter (defaults to `info`)

use log::{error, info};
use std::sync::Arc;
use tokio::sync::mpsc;

use pixelbird::{
    follow_filter_stream, run_mention_cronjob, BotConfig, CursorStore, ImageReplyReactor,
    MentionPoller, TwitterClient, UnsplashClient,
};

/// Capacity of the channel between the filter stream and the reactor.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Main entry point for the pixelbird service.
///
/// Loads the configuration, builds the shared API clients, and runs the
/// mention cronjob, the filter stream and the stream reactor concurrently
/// until Ctrl+C.
///
/// # Example Usage
///
/// ```bash
/// # Run with credentials from .env
/// cargo run
///
/// # Run with debug logging
/// RUST_LOG=debug cargo run
/// ```
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting the twitter bot ...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = CursorStore::new(&config.params_path);
    if let Err(e) = store.ensure_exists().await {
        error!(
            "Failed to prepare cursor file {}: {}",
            config.params_path.display(),
            e
        );
        std::process::exit(1);
    }

    let twitter = Arc::new(TwitterClient::new(config.credentials.clone()));
    let images = Arc::new(UnsplashClient::new(config.unsplash_access_key.clone()));

    let poller = Arc::new(MentionPoller::new(
        twitter.clone(),
        store,
        config.search.clone(),
    ));
    let reactor = Arc::new(ImageReplyReactor::new(
        twitter.clone(),
        images,
        config.trigger_phrase.clone(),
        config.temp_dir.clone(),
    ));

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let track = config.trigger_phrase.clone();
    let reconnect_delay = config.stream_reconnect_delay;
    let stream_handle = tokio::spawn(async move {
        follow_filter_stream(&twitter, &track, reconnect_delay, event_tx).await;
    });
    let reactor_handle = tokio::spawn(reactor.run(event_rx));

    tokio::select! {
        result = run_mention_cronjob(poller, config.poll_interval) => {
            match result {
                Ok(()) => info!("Shutting down"),
                Err(e) => error!("Mention cronjob failed: {}", e),
            }
        }
        _ = stream_handle => {
            error!("Filter stream task exited");
        }
        _ = reactor_handle => {
            error!("Stream reactor task exited");
        }
    }
}
