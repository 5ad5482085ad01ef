//! Core Twitter API utilities.
//!
//! This module contains the signed HTTP client, the [`XApi`] seam the reply
//! dispatcher talks to, and the classification of upstream failures into
//! [`ApiError`].

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{Client, Method, StatusCode};

use crate::config::Credentials;
use crate::cursor::MentionId;
use crate::error::ApiError;
use crate::oauth::build_oauth1_header;

use super::mentions::MentionBatch;
use super::tweets::PostedTweet;
use super::users::BotIdentity;

/// The three X API operations the bot needs.
#[async_trait]
pub trait XApi: Send + Sync {
    /// Resolves the authenticated account (`GET /2/users/me`).
    async fn me(&self) -> Result<BotIdentity, ApiError>;

    /// Fetches up to one page of mentions strictly newer than `since`, newest first.
    async fn fetch_mentions_since(
        &self,
        bot_id: &str,
        since: Option<&MentionId>,
    ) -> Result<MentionBatch, ApiError>;

    /// Posts `text` as a reply to `in_reply_to`.
    async fn post_reply(&self, text: &str, in_reply_to: &MentionId)
        -> Result<PostedTweet, ApiError>;
}

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_chars`: Maximum number of characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_chars: usize) -> String {
    // Replace control characters and newlines to prevent log injection
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_chars {
        let truncated: String = sanitized.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        sanitized
    }
}

/// Maps a non-success response onto the error taxonomy.
pub(crate) fn classify_failure(
    status: StatusCode,
    reset_at: Option<i64>,
    body: &str,
    operation: &str,
) -> ApiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { reset_at },
        StatusCode::FORBIDDEN => ApiError::Forbidden(format!(
            "{} returned 403: {}",
            operation,
            sanitize_for_logging(body, 200)
        )),
        _ => ApiError::Request(format!(
            "{} returned {}: {}",
            operation,
            status,
            sanitize_for_logging(body, 200)
        )),
    }
}

/// HTTP client for the X API v2, signing every request with OAuth 1.0a.
#[derive(Debug, Clone)]
pub struct XClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl XClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a signed request and returns the response body on success.
    ///
    /// # Parameters
    ///
    /// - `method`: HTTP method
    /// - `url`: Full endpoint URL without query string
    /// - `query`: Query parameters (signed)
    /// - `body`: Optional JSON body (not signed)
    /// - `operation_name`: Human-readable name for the operation (for logging)
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The API response body on success
    /// - `Err(ApiError)`: The classified failure
    pub(crate) async fn send_signed(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
        operation_name: &str,
    ) -> Result<String, ApiError> {
        debug!(
            "Making signed {} request for operation: {}",
            method, operation_name
        );

        let auth_header = build_oauth1_header(method.as_str(), url, query, &self.credentials);
        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", auth_header);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Request for operation '{}' failed: {}", operation_name, e);
                return Err(ApiError::Request(format!("{}: {}", operation_name, e)));
            }
        };

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

        let reset_at = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        let error_text = response.text().await.unwrap_or_default();

        warn!("Operation '{}' failed - Status: {}", operation_name, status);
        debug!(
            "Error response for '{}': {}",
            operation_name,
            sanitize_for_logging(&error_text, 200)
        );

        Err(classify_failure(status, reset_at, &error_text, operation_name))
    }
}

#[async_trait]
impl XApi for XClient {
    async fn me(&self) -> Result<BotIdentity, ApiError> {
        self.lookup_me().await
    }

    async fn fetch_mentions_since(
        &self,
        bot_id: &str,
        since: Option<&MentionId>,
    ) -> Result<MentionBatch, ApiError> {
        info!(
            "Fetching mentions for {} since {}",
            bot_id,
            since.map(MentionId::as_str).unwrap_or("the beginning")
        );
        self.user_mentions(bot_id, since).await
    }

    async fn post_reply(
        &self,
        text: &str,
        in_reply_to: &MentionId,
    ) -> Result<PostedTweet, ApiError> {
        self.reply_to_tweet(text, in_reply_to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            Some(1_700_000_000),
            "{}",
            "post_reply",
        );
        assert_eq!(
            err,
            ApiError::RateLimited {
                reset_at: Some(1_700_000_000)
            }
        );
    }

    #[test]
    fn test_classify_forbidden() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            None,
            r#"{"detail":"You are not allowed to create a Tweet with duplicate content."}"#,
            "post_reply",
        );
        match err {
            ApiError::Forbidden(detail) => assert!(detail.contains("duplicate content")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_everything_else_as_request() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = classify_failure(status, None, "oops", "fetch_mentions");
            assert!(matches!(err, ApiError::Request(_)), "{}", status);
        }
    }

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(sanitize_for_logging("hi\nthere\t!", 60), "hi there !");
        assert_eq!(sanitize_for_logging("a\u{7}b", 60), "a?b");
        assert_eq!(sanitize_for_logging("abcdef", 3), "abc...");
        // Never splits a multi-byte character
        assert_eq!(sanitize_for_logging("🤖🤖🤖", 2), "🤖🤖...");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = XClient::new(
            "https://api.x.com/2",
            Credentials {
                api_key: "k".into(),
                api_secret: "s".into(),
                access_token: "t".into(),
                access_token_secret: "ts".into(),
            },
        );
        assert_eq!(client.endpoint("/users/me"), "https://api.x.com/2/users/me");
    }
}
