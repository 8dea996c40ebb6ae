//! Cronjob module for scheduled tasks.
//!
//! This module schedules the mention poller on a fixed period using
//! `tokio-cron-scheduler`. Every firing calls [`MentionPoller::tick`], which
//! skips the run when the previous cycle has not finished yet.

use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::poller::MentionPoller;

/// Creates a scheduler with a repeated job that polls for mentions.
///
/// # Parameters
///
/// - `poller`: The poller to tick on every firing
/// - `interval`: The period between two firings
///
/// # Returns
///
/// - `Ok(JobScheduler)`: The configured (not yet started) job scheduler
/// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If the scheduler or job cannot be created
///
/// # Example
///
/// ```rust,no_run
/// use pixelbird::{start_mention_cronjob, BotConfig, CursorStore, MentionPoller, TwitterClient};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let config = BotConfig::from_env().unwrap();
///     let twitter = Arc::new(TwitterClient::new(config.credentials.clone()));
///     let poller = Arc::new(MentionPoller::new(
///         twitter,
///         CursorStore::new(&config.params_path),
///         config.search.clone(),
///     ));
///     let scheduler = start_mention_cronjob(poller, config.poll_interval).await.unwrap();
///     scheduler.start().await.unwrap();
///
///     tokio::signal::ctrl_c().await.unwrap();
/// }
/// ```
pub async fn start_mention_cronjob(
    poller: Arc<MentionPoller>,
    interval: Duration,
) -> Result<JobScheduler, Box<dyn std::error::Error + Send + Sync>> {
    let sched = JobScheduler::new().await?;

    sched
        .add(Job::new_repeated_async(interval, move |_uuid, _l| {
            let poller = Arc::clone(&poller);
            Box::pin(async move {
                poller.tick().await;
            })
        })?)
        .await?;

    info!(
        "Cronjob scheduler configured to poll for mentions every {} seconds",
        interval.as_secs()
    );
    Ok(sched)
}

/// Starts the mention cronjob and keeps it running until Ctrl+C.
///
/// # Returns
///
/// - `Ok(())`: If the scheduler ran until shutdown
/// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If there's an error starting or stopping the scheduler
pub async fn run_mention_cronjob(
    poller: Arc<MentionPoller>,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut sched = start_mention_cronjob(poller, interval).await?;
    sched.start().await?;

    info!("Cronjob scheduler started successfully");

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, stopping cronjob scheduler");

    sched.shutdown().await?;
    info!("Cronjob scheduler stopped");

    Ok(())
}
