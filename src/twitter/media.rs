//! Media upload for the Twitter API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::oauth::build_oauth1_header;

use super::TwitterClient;

/// Maximum alt text length accepted by `media/metadata/create`.
pub const MAX_ALT_TEXT_CHARS: usize = 1000;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    media_id_string: String,
}

impl TwitterClient {
    /// Uploads an image as base64 `media_data` and returns its media id.
    pub(crate) async fn post_media_upload(
        &self,
        bytes: &[u8],
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/media/upload.json", self.endpoints.upload_base);
        info!("Uploading {} bytes of media", bytes.len());

        let form: Vec<(&str, String)> = vec![("media_data", STANDARD.encode(bytes))];
        let request_builder = self.signed_request(Method::POST, &url, &[], &form)?;
        let response_text = self.execute_request(request_builder, "upload_media").await?;

        let upload: UploadResponse = serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse media upload response: {}", e))?;
        info!("Media uploaded with id {}", upload.media_id_string);
        Ok(upload.media_id_string)
    }

    /// Attaches alt text to an uploaded media id.
    ///
    /// The endpoint takes a JSON body, which is not part of the OAuth
    /// signature.
    pub(crate) async fn post_media_metadata(
        &self,
        media_id: &str,
        alt_text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/media/metadata/create.json", self.endpoints.upload_base);
        let alt_text: String = alt_text.chars().take(MAX_ALT_TEXT_CHARS).collect();

        let payload = json!({
            "media_id": media_id,
            "alt_text": { "text": alt_text }
        });
        debug!("Media metadata payload: {}", payload);

        let auth_header = build_oauth1_header(&self.credentials, "POST", &url, &[])?;
        let request_builder = self
            .http
            .request(Method::POST, &url)
            .header(AUTHORIZATION, auth_header)
            .json(&payload);

        self.execute_request(request_builder, "create_media_metadata")
            .await?;
        info!("Alt text attached to media {}", media_id);
        Ok(())
    }
}
