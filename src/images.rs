//! Image search integration.
//!
//! The stream reactor looks up a picture for the requested term through the
//! Unsplash search API and downloads the full-resolution asset to disk before
//! uploading it to Twitter.

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use rand::Rng;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Number of results requested per image search.
pub const RESULTS_PER_SEARCH: u32 = 10;

/// An image returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub id: String,
    /// URL of the full-resolution asset
    pub url: String,
    pub alt_text: Option<String>,
    pub description: Option<String>,
    /// Link the provider asks to be hit whenever the image is downloaded
    pub download_location: Option<String>,
}

/// An image search provider.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Returns candidates matching `term`; an empty list when nothing matched.
    async fn search(
        &self,
        term: &str,
    ) -> Result<Vec<ImageCandidate>, Box<dyn std::error::Error + Send + Sync>>;

    /// Downloads the candidate's asset to `dest`.
    async fn download(
        &self,
        candidate: &ImageCandidate,
        dest: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Picks a candidate uniformly at random.
///
/// Returns `None` for an empty slice; otherwise the index is drawn from
/// `0..len`, so every element can be chosen and none past the end.
pub fn pick_candidate<'a, T, R>(candidates: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..candidates.len());
    candidates.get(index)
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    description: Option<String>,
    alt_description: Option<String>,
    urls: UnsplashUrls,
    links: Option<UnsplashLinks>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    full: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashLinks {
    download_location: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Client for the Unsplash API.
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    http: Client,
    access_key: String,
    api_base: String,
}

impl UnsplashClient {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self::with_base_url(access_key, "https://api.unsplash.com")
    }

    pub fn with_base_url(access_key: impl Into<String>, api_base: &str) -> Self {
        UnsplashClient {
            http: Client::new(),
            access_key: access_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Client-ID {}", self.access_key)
    }

    /// Pings the photo's download tracking link. Failures are only logged.
    async fn track_download(&self, candidate: &ImageCandidate) {
        let Some(location) = &candidate.download_location else {
            return;
        };
        let result = self
            .http
            .get(location)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(e) = result {
            warn!(
                "Failed to register download of image {}: {}",
                candidate.id, e
            );
        }
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search(
        &self,
        term: &str,
    ) -> Result<Vec<ImageCandidate>, Box<dyn std::error::Error + Send + Sync>> {
        let url = Url::parse_with_params(
            &format!("{}/search/photos", self.api_base),
            &[
                ("query", term.to_string()),
                ("per_page", RESULTS_PER_SEARCH.to_string()),
            ],
        )?;
        info!("Searching images for '{}'", term);
        debug!("Image search URL: {}", url);

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.auth_header())
            .header("Accept-Version", "v1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!(
                "Image search for '{}' failed ({}): {}",
                term,
                status,
                crate::twitter::sanitize_for_logging(&error_text, 200)
            )
            .into());
        }

        let body: UnsplashSearchResponse = response.json().await?;
        let candidates: Vec<ImageCandidate> = body
            .results
            .into_iter()
            .map(|photo| ImageCandidate {
                id: photo.id,
                url: photo.urls.full,
                alt_text: non_blank(photo.alt_description),
                description: non_blank(photo.description),
                download_location: photo.links.and_then(|l| l.download_location),
            })
            .collect();

        info!("Found {} images for '{}'", candidates.len(), term);
        Ok(candidates)
    }

    async fn download(
        &self,
        candidate: &ImageCandidate,
        dest: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Downloading image {} to {}", candidate.id, dest.display());
        self.track_download(candidate).await;

        let response = self
            .http
            .get(&candidate.url)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = response.bytes_stream();
        let mut written: usize = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        debug!("Downloaded {} bytes for image {}", written, candidate.id);
        Ok(())
    }
}
