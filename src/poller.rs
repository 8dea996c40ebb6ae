//! Cursor-tracked mention poller.
//!
//! Each cycle reads the persisted `since_id`, searches for newer mentions,
//! retweets them one by one in the order returned, and writes back the id of
//! the last mention seen. A failed retweet never stops the cursor from
//! advancing; a failed search leaves the cursor file untouched.
//!
//! Mixed search results are not strictly chronological, so the stored id is
//! the last one processed, not necessarily the largest.

use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::SearchSettings;
use crate::cursor::CursorStore;
use crate::twitter::TwitterApi;

/// Summary of one completed poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Mentions returned by the search
    pub fetched: usize,
    pub retweeted: usize,
    pub failed: usize,
    /// Cursor value written at the end of the cycle
    pub since_id: Option<String>,
}

/// What happened when the scheduler fired.
#[derive(Debug)]
pub enum TickOutcome {
    Completed(CycleReport),
    Failed(String),
    /// Another cycle was still running
    Skipped,
}

/// Polls for mentions and retweets them.
pub struct MentionPoller {
    twitter: Arc<dyn TwitterApi>,
    store: CursorStore,
    search: SearchSettings,
    in_flight: Mutex<()>,
}

impl MentionPoller {
    pub fn new(twitter: Arc<dyn TwitterApi>, store: CursorStore, search: SearchSettings) -> Self {
        MentionPoller {
            twitter,
            store,
            search,
            in_flight: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &CursorStore {
        &self.store
    }

    /// Runs one poll cycle.
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: The cycle ran and the cursor was persisted
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: Reading the cursor, the
    ///   search, or writing the cursor failed
    pub async fn run_cycle(&self) -> Result<CycleReport, Box<dyn std::error::Error + Send + Sync>> {
        let mut cursor = self.store.read().await?;

        let mentions = self
            .twitter
            .search_mentions(&self.search, cursor.since_id.as_deref())
            .await?;
        info!("Got {} mentions to retweet", mentions.len());

        let mut report = CycleReport {
            fetched: mentions.len(),
            ..CycleReport::default()
        };

        for mention in &mentions {
            match self.twitter.retweet(&mention.id).await {
                Ok(()) => {
                    info!("Successful retweet {} (@{})", mention.id, mention.author);
                    report.retweeted += 1;
                }
                Err(e) => {
                    warn!("Unsuccessful retweet {} (@{}): {}", mention.id, mention.author, e);
                    report.failed += 1;
                }
            }
            cursor.since_id = Some(mention.id.clone());
        }

        self.store.write(&cursor).await?;
        report.since_id = cursor.since_id;
        Ok(report)
    }

    /// Runs a cycle unless one is already in flight.
    ///
    /// Errors are logged here and never returned, so a scheduler can call this
    /// on every firing.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Previous poll cycle is still running, skipping this one");
            return TickOutcome::Skipped;
        };

        match self.run_cycle().await {
            Ok(report) => {
                info!(
                    "Poll cycle completed: {} fetched, {} retweeted, {} failed, since_id={:?}",
                    report.fetched, report.retweeted, report.failed, report.since_id
                );
                TickOutcome::Completed(report)
            }
            Err(e) => {
                error!("Poll cycle failed: {}", e);
                TickOutcome::Failed(e.to_string())
            }
        }
    }
}
