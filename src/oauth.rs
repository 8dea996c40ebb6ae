//! OAuth authentication module for Twitter/X API integration.
//!
//! The v1.1 endpoints used by the bot (search, retweet, media upload, status
//! update and the filter stream) all require OAuth 1.0a User Context
//! authentication. This module builds the signed `Authorization` header for
//! those requests using HMAC-SHA1.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// The four user-context credentials issued by the Twitter developer portal.
#[derive(Clone)]
pub struct OAuthCredentials {
    /// API key (consumer key)
    pub consumer_key: String,
    /// API secret (consumer secret)
    pub consumer_secret: String,
    /// Access token of the bot account
    pub access_token: String,
    /// Access token secret of the bot account
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Percent-encodes a value as required by RFC 3986 for OAuth 1.0a signing.
///
/// Only `A-Z a-z 0-9 - . _ ~` are left untouched; a space becomes `%20`.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Encodes key/value pairs as `k=v&k=v` using [`percent_encode`].
///
/// Used for query strings and form bodies so that the bytes on the wire match
/// the values that went into the signature.
pub fn encode_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the OAuth 1.0a signature base string.
///
/// # Parameters
///
/// - `method`: HTTP method, e.g. `POST`
/// - `base_url`: The request URL without query string
/// - `params`: All query, form and `oauth_*` parameters (unencoded)
///
/// # Returns
///
/// `METHOD&encoded(url)&encoded(sorted parameter string)`
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&parameter_string)
    )
}

/// Signs a base string with HMAC-SHA1 and returns the base64 signature.
pub fn sign(
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| format!("Invalid OAuth signing key: {}", e))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Builds the Authorization header for OAuth 1.0a with an explicit nonce and timestamp.
///
/// # Parameters
///
/// - `credentials`: Consumer and access token credentials
/// - `method`: HTTP method of the request
/// - `base_url`: Request URL without query string
/// - `request_params`: Query and form-encoded body parameters (unencoded)
/// - `nonce`: A unique random string for this request
/// - `timestamp`: Seconds since the Unix epoch
///
/// # Returns
///
/// A header value of the form `OAuth oauth_consumer_key="...", ...`
///
/// # Example
///
/// ```rust
/// use pixelbird::oauth::{build_oauth1_header_with, OAuthCredentials};
///
/// let credentials = OAuthCredentials {
///     consumer_key: "key".to_string(),
///     consumer_secret: "secret".to_string(),
///     access_token: "token".to_string(),
///     access_token_secret: "token_secret".to_string(),
/// };
/// let header = build_oauth1_header_with(
///     &credentials,
///     "GET",
///     "https://api.twitter.com/1.1/search/tweets.json",
///     &[("q", "@pixelbirdbot".to_string())],
///     "nonce",
///     1_700_000_000,
/// )
/// .unwrap();
/// assert!(header.starts_with("OAuth "));
/// ```
pub fn build_oauth1_header_with(
    credentials: &OAuthCredentials,
    method: &str,
    base_url: &str,
    request_params: &[(&str, String)],
    nonce: &str,
    timestamp: i64,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut oauth_params: Vec<(String, String)> = vec![
        (
            "oauth_consumer_key".to_string(),
            credentials.consumer_key.clone(),
        ),
        ("oauth_nonce".to_string(), nonce.to_string()),
        (
            "oauth_signature_method".to_string(),
            "HMAC-SHA1".to_string(),
        ),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend(
        request_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone())),
    );

    let base_string = signature_base_string(method, base_url, &all_params);
    let signature = sign(
        &base_string,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    )?;
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let header_params = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", header_params))
}

/// Builds the Authorization header for OAuth 1.0a User Context authentication.
///
/// Generates a fresh 32-character nonce and uses the current time as the
/// timestamp, then delegates to [`build_oauth1_header_with`].
pub fn build_oauth1_header(
    credentials: &OAuthCredentials,
    method: &str,
    base_url: &str,
    request_params: &[(&str, String)],
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let timestamp = chrono::Utc::now().timestamp();
    build_oauth1_header_with(
        credentials,
        method,
        base_url,
        request_params,
        &nonce,
        timestamp,
    )
}
