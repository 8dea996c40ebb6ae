//! # Pixelbird Library
//!
//! A Twitter/X bot with two independent activities:
//!
//! - a **mention poller** that periodically searches for mentions of the bot,
//!   retweets each one, and persists a `since_id` cursor so nothing is
//!   processed twice across restarts;
//! - a **stream reactor** that follows the filtered status stream for a
//!   trigger phrase and replies to matching tweets with an image found on
//!   Unsplash.
//!
//! ## Configuration
//!
//! Credentials come from the environment (optionally a `.env` file):
//! - `TWITTER_API_KEY`, `TWITTER_API_SECRET`
//! - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
//! - `UNSPLASH_ACCESS_KEY`
//!
//! See [`BotConfig::from_env`] for the optional tunables.

pub mod config;
pub mod cronjob;
pub mod cursor;
pub mod images;
pub mod oauth;
pub mod poller;
pub mod reactor;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{BotConfig, SearchSettings};
pub use cronjob::{run_mention_cronjob, start_mention_cronjob};
pub use cursor::{Cursor, CursorStore};
pub use images::{ImageCandidate, ImageSearch, UnsplashClient};
pub use oauth::OAuthCredentials;
pub use poller::{CycleReport, MentionPoller, TickOutcome};
pub use reactor::{ImageReplyReactor, ReplyOutcome};
pub use twitter::{follow_filter_stream, Mention, StreamEvent, TwitterApi, TwitterClient};
