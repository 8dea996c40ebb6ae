//! Core Twitter API utilities.
//!
//! This module contains low-level utilities for building OAuth 1.0a signed
//! requests and executing them against the Twitter API.

use log::{debug, error, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};

use crate::oauth::{build_oauth1_header, encode_pairs};

use super::TwitterClient;

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_len`: Maximum number of characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!(
            "{}... [truncated, {} total bytes]",
            truncated,
            text.len()
        )
    } else {
        sanitized
    }
}

impl TwitterClient {
    /// Builds a signed request.
    ///
    /// Query parameters are appended to `url`; form parameters become an
    /// `application/x-www-form-urlencoded` body. Both take part in the OAuth
    /// signature.
    pub(crate) fn signed_request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        form: &[(&str, String)],
    ) -> Result<RequestBuilder, Box<dyn std::error::Error + Send + Sync>> {
        let mut signed_params: Vec<(&str, String)> = query.to_vec();
        signed_params.extend_from_slice(form);
        let auth_header =
            build_oauth1_header(&self.credentials, method.as_str(), url, &signed_params)?;

        let full_url = if query.is_empty() {
            url.to_string()
        } else {
            format!("{}?{}", url, encode_pairs(query))
        };
        debug!("Request URL: {} {}", method, full_url);
        debug!("Request headers: Authorization: OAuth [REDACTED]");

        let mut request_builder = self
            .http
            .request(method, &full_url)
            .header(AUTHORIZATION, auth_header);

        if !form.is_empty() {
            request_builder = request_builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_pairs(form));
        }

        Ok(request_builder)
    }

    /// Sends a request and returns the response body on success.
    ///
    /// # Parameters
    ///
    /// - `request_builder`: A signed request ready to send
    /// - `operation_name`: Human-readable name for the operation (for logging)
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The API response body on success
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: On transport failure or a non-2xx status
    pub(crate) async fn execute_request(
        &self,
        request_builder: RequestBuilder,
        operation_name: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        debug!("Sending request for operation: {}", operation_name);

        let response = request_builder.send().await?;
        let status = response.status();
        debug!(
            "Received response with status: {} for operation: {}",
            status, operation_name
        );

        if status.is_success() {
            let response_text = response.text().await?;
            debug!(
                "Response summary for '{}': {} bytes received",
                operation_name,
                response_text.len()
            );
            return Ok(response_text);
        }

        let error_text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => {
                error!(
                    "Operation '{}' was rejected as unauthorized - check the Twitter credentials",
                    operation_name
                );
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Operation '{}' was rate limited", operation_name);
            }
            _ => {
                warn!("Operation '{}' failed - Status: {}", operation_name, status);
            }
        }
        debug!(
            "Error response for '{}': {}",
            operation_name,
            sanitize_for_logging(&error_text, 200)
        );

        Err(format!(
            "Twitter API error for operation '{}' ({}): {}",
            operation_name,
            status,
            sanitize_for_logging(&error_text, 200)
        )
        .into())
    }
}
