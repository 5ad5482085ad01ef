//! Tweet operations for Twitter API.
//!
//! This module contains the reply operation using the Twitter API v2.

use log::{debug, info};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::cursor::MentionId;
use crate::error::ApiError;

use super::api::XClient;

/// The tweet created by a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct PostTweetResponse {
    data: Option<PostedTweet>,
}

/// Parses the body of `POST /2/tweets`.
pub(crate) fn parse_post_response(body: &str) -> Result<PostedTweet, ApiError> {
    let response: PostTweetResponse = serde_json::from_str(body)?;
    response
        .data
        .ok_or_else(|| ApiError::Request("tweets returned no tweet data".to_string()))
}

/// JSON payload of a reply.
pub(crate) fn reply_payload(text: &str, in_reply_to: &MentionId) -> serde_json::Value {
    json!({
        "text": text,
        "reply": {
            "in_reply_to_tweet_id": in_reply_to.as_str()
        }
    })
}

impl XClient {
    /// Replies to a tweet using the Twitter/X API v2 endpoint.
    ///
    /// # Parameters
    ///
    /// - `text`: The text content of the reply tweet
    /// - `reply_to_tweet_id`: The ID of the tweet to reply to
    ///
    /// # Returns
    ///
    /// - `Ok(PostedTweet)`: The created reply
    /// - `Err(ApiError)`: `RateLimited` on 429, `Forbidden` on 403, `Request` otherwise
    pub(crate) async fn reply_to_tweet(
        &self,
        text: &str,
        reply_to_tweet_id: &MentionId,
    ) -> Result<PostedTweet, ApiError> {
        let url = self.endpoint("/tweets");
        let payload = reply_payload(text, reply_to_tweet_id);
        debug!("Reply payload: {}", payload);

        let body = self
            .send_signed(Method::POST, &url, &[], Some(&payload), "post_reply")
            .await?;
        let posted = parse_post_response(&body)?;

        info!("Posted reply {} to tweet {}", posted.id, reply_to_tweet_id);
        Ok(posted)
    }
}
