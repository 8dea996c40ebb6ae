//! Stream reactor: replies to trigger-phrase tweets with a matching image.
//!
//! For every status from the filter stream that contains the trigger phrase,
//! the text after the phrase is used as an image search term. A random result
//! is downloaded, uploaded to Twitter with alt text, and posted as a reply to
//! the triggering tweet. The downloaded file is removed afterwards whatever
//! the outcome.

use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::images::{pick_candidate, ImageCandidate, ImageSearch};
use crate::twitter::{
    extract_search_term, sanitize_for_logging, StreamEvent, TwitterApi, MAX_ALT_TEXT_CHARS,
};

/// Maximum length of a reply's status text.
pub const MAX_REPLY_CHARS: usize = 280;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Builds a download path that is unique within this process.
///
/// The name is derived from the search term, the current time in milliseconds
/// and a process-wide sequence number.
pub fn temp_image_path(dir: &Path, term: &str) -> PathBuf {
    let slug: String = term
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .take(40)
        .collect();
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "image" } else { slug };

    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "{}-{}-{}.jpg",
        slug,
        chrono::Utc::now().timestamp_millis(),
        sequence
    ))
}

/// A downloaded image on local disk.
///
/// Call [`TempImage::remove`] when done; if the guard is dropped without it
/// (for example because the task was cancelled) the file is removed
/// synchronously.
#[derive(Debug)]
pub struct TempImage {
    path: PathBuf,
    removed: bool,
}

impl TempImage {
    pub fn new(path: PathBuf) -> Self {
        TempImage {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file. A file that was never created is not an error.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed temporary image {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove temporary image {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// What the reactor did with one stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Not a trigger tweet (or a retweet of one)
    Ignored,
    Replied { media_id: String, reply_id: String },
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Alt text for the uploaded image: the provider's alt text, then the description, then the term.
pub fn alt_text_for(candidate: &ImageCandidate, term: &str) -> String {
    let text = candidate
        .alt_text
        .as_deref()
        .or(candidate.description.as_deref())
        .unwrap_or(term);
    truncate_chars(text, MAX_ALT_TEXT_CHARS)
}

/// Status text for the reply: the description, then the alt text, then the term.
pub fn reply_text_for(candidate: &ImageCandidate, term: &str) -> String {
    let text = candidate
        .description
        .as_deref()
        .or(candidate.alt_text.as_deref())
        .unwrap_or(term);
    truncate_chars(text, MAX_REPLY_CHARS)
}

/// Reacts to filter-stream events with image replies.
pub struct ImageReplyReactor {
    twitter: Arc<dyn TwitterApi>,
    images: Arc<dyn ImageSearch>,
    trigger_phrase: String,
    temp_dir: PathBuf,
}

impl ImageReplyReactor {
    pub fn new(
        twitter: Arc<dyn TwitterApi>,
        images: Arc<dyn ImageSearch>,
        trigger_phrase: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        ImageReplyReactor {
            twitter,
            images,
            trigger_phrase: trigger_phrase.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Runs the image reply pipeline for one event.
    ///
    /// # Returns
    ///
    /// - `Ok(ReplyOutcome::Ignored)`: The event carries no usable search term
    /// - `Ok(ReplyOutcome::Replied { .. })`: The reply was posted
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: Any step failed; the
    ///   temporary file has been removed
    pub async fn handle_event(
        &self,
        event: &StreamEvent,
    ) -> Result<ReplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        if event.is_retweet {
            debug!("Ignoring retweet {}", event.id);
            return Ok(ReplyOutcome::Ignored);
        }

        let Some(term) = extract_search_term(&event.text, &self.trigger_phrase) else {
            debug!(
                "Ignoring tweet {} without a search term: {}",
                event.id,
                sanitize_for_logging(&event.text, 140)
            );
            return Ok(ReplyOutcome::Ignored);
        };
        info!(
            "Tweet {} from @{} asks for an image of '{}'",
            event.id, event.author, term
        );

        let candidates = self.images.search(&term).await?;
        let candidate = {
            let mut rng = rand::thread_rng();
            pick_candidate(&candidates, &mut rng).cloned()
        }
        .ok_or_else(|| format!("No images found for '{}'", term))?;
        debug!(
            "Picked image {} out of {} candidates",
            candidate.id,
            candidates.len()
        );

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let temp = TempImage::new(temp_image_path(&self.temp_dir, &term));
        let result = self
            .reply_with_image(event, &term, &candidate, temp.path())
            .await;
        temp.remove().await;
        result
    }

    async fn reply_with_image(
        &self,
        event: &StreamEvent,
        term: &str,
        candidate: &ImageCandidate,
        path: &Path,
    ) -> Result<ReplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        self.images.download(candidate, path).await?;
        let bytes = tokio::fs::read(path).await?;

        let media_id = self.twitter.upload_media(&bytes).await?;
        self.twitter
            .create_media_metadata(&media_id, &alt_text_for(candidate, term))
            .await?;

        let reply_id = self
            .twitter
            .reply_with_media(&event.id, &reply_text_for(candidate, term), &media_id)
            .await?;

        Ok(ReplyOutcome::Replied { media_id, reply_id })
    }

    async fn process(&self, event: StreamEvent) {
        match self.handle_event(&event).await {
            Ok(ReplyOutcome::Replied { reply_id, .. }) => {
                info!("Replied to tweet {} with {}", event.id, reply_id);
            }
            Ok(ReplyOutcome::Ignored) => {}
            Err(e) => {
                error!("Image reply to tweet {} failed: {}", event.id, e);
            }
        }
    }

    /// Consumes events until the channel closes, one task per event.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<StreamEvent>) {
        info!("Stream reactor waiting for '{}'", self.trigger_phrase);
        while let Some(event) = events.recv().await {
            let reactor = Arc::clone(&self);
            tokio::spawn(async move {
                reactor.process(event).await;
            });
        }
        info!("Stream event channel closed, reactor stopping");
    }
}
