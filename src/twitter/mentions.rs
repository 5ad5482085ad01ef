//! Mention timeline fetching.
//!
//! One call per poll cycle to `GET /2/users/{id}/mentions`, capped at a single
//! page. Anything beyond the page is picked up by a later cycle.

use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::Method;
use serde::Deserialize;
use std::collections::HashMap;

use crate::cursor::MentionId;
use crate::error::ApiError;

use super::api::XClient;

/// Mentions requested per cycle.
pub const MENTIONS_PAGE_SIZE: u32 = 10;

/// A tweet that mentions the bot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Mention {
    pub id: MentionId,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author id to handle, built from one response's `includes.users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityLookup {
    handles: HashMap<String, String>,
}

impl IdentityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, author_id: impl Into<String>, handle: impl Into<String>) {
        self.handles.insert(author_id.into(), handle.into());
    }

    /// The handle of `author_id`, if the batch carried one.
    pub fn handle_for(&self, author_id: Option<&str>) -> Option<&str> {
        author_id
            .and_then(|id| self.handles.get(id))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// One page of mentions, newest first as delivered upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionBatch {
    pub mentions: Vec<Mention>,
    pub identities: IdentityLookup,
}

impl MentionBatch {
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct MentionsResponse {
    #[serde(default)]
    data: Vec<Mention>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<IncludedUser>,
}

#[derive(Debug, Deserialize)]
struct IncludedUser {
    id: String,
    username: String,
}

/// Parses the body of `GET /2/users/{id}/mentions`.
///
/// A response without `data` (the API omits it when `result_count` is 0) is an
/// empty batch.
pub(crate) fn parse_mentions_response(body: &str) -> Result<MentionBatch, ApiError> {
    let response: MentionsResponse = serde_json::from_str(body)?;

    let mut identities = IdentityLookup::new();
    for user in response.includes.map(|i| i.users).unwrap_or_default() {
        identities.insert(user.id, user.username);
    }

    Ok(MentionBatch {
        mentions: response.data,
        identities,
    })
}

/// Query parameters for one mentions page.
pub(crate) fn mentions_query(since: Option<&MentionId>) -> Vec<(String, String)> {
    let mut query = vec![
        ("max_results".to_string(), MENTIONS_PAGE_SIZE.to_string()),
        (
            "tweet.fields".to_string(),
            "author_id,conversation_id,created_at".to_string(),
        ),
        ("expansions".to_string(), "author_id".to_string()),
        ("user.fields".to_string(), "username".to_string()),
    ];
    if let Some(since) = since {
        query.push(("since_id".to_string(), since.to_string()));
    }
    query
}

impl XClient {
    /// Fetches the newest page of mentions of `bot_id` strictly after `since`.
    pub(crate) async fn user_mentions(
        &self,
        bot_id: &str,
        since: Option<&MentionId>,
    ) -> Result<MentionBatch, ApiError> {
        let url = self.endpoint(&format!("/users/{}/mentions", bot_id));
        let query = mentions_query(since);
        debug!("Mentions request: {} {:?}", url, query);

        let body = self
            .send_signed(Method::GET, &url, &query, None, "fetch_mentions")
            .await?;
        let batch = parse_mentions_response(&body)?;

        info!(
            "Fetched {} mentions ({} authors resolved)",
            batch.mentions.len(),
            batch.identities.len()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENTIONS_BODY: &str = r#"{
        "data": [
            {
                "id": "1850000000000000003",
                "text": "@replybot hello again",
                "author_id": "42",
                "conversation_id": "1850000000000000003",
                "created_at": "2024-10-26T12:00:03.000Z",
                "edit_history_tweet_ids": ["1850000000000000003"]
            },
            {
                "id": "1850000000000000001",
                "text": "@replybot hi",
                "author_id": "77",
                "conversation_id": "1850000000000000001",
                "created_at": "2024-10-26T12:00:01.000Z"
            }
        ],
        "includes": {
            "users": [
                {"id": "42", "name": "Alice", "username": "alice"}
            ]
        },
        "meta": {"result_count": 2, "newest_id": "1850000000000000003", "oldest_id": "1850000000000000001"}
    }"#;

    #[test]
    fn test_parse_mentions_keeps_upstream_order() {
        let batch = parse_mentions_response(MENTIONS_BODY).unwrap();
        let ids: Vec<&str> = batch.mentions.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1850000000000000003", "1850000000000000001"]);

        let first = &batch.mentions[0];
        assert_eq!(first.author_id.as_deref(), Some("42"));
        assert_eq!(first.text, "@replybot hello again");
        assert_eq!(
            first.created_at.unwrap().to_rfc3339(),
            "2024-10-26T12:00:03+00:00"
        );
    }

    #[test]
    fn test_parse_mentions_builds_identity_lookup() {
        let batch = parse_mentions_response(MENTIONS_BODY).unwrap();
        assert_eq!(batch.identities.handle_for(Some("42")), Some("alice"));
        assert_eq!(batch.identities.handle_for(Some("77")), None);
        assert_eq!(batch.identities.handle_for(None), None);
    }

    #[test]
    fn test_parse_empty_mentions() {
        let batch = parse_mentions_response(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(batch.is_empty());
        assert!(batch.identities.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_numeric_ids() {
        let body = r#"{"data":[{"id":"abc","text":"x","author_id":"1"}]}"#;
        assert!(matches!(
            parse_mentions_response(body),
            Err(ApiError::Request(_))
        ));
    }

    #[test]
    fn test_mentions_query() {
        let query = mentions_query(None);
        assert!(query.contains(&("max_results".to_string(), "10".to_string())));
        assert!(query.contains(&(
            "tweet.fields".to_string(),
            "author_id,conversation_id,created_at".to_string()
        )));
        assert!(query.contains(&("expansions".to_string(), "author_id".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "since_id"));

        let since = MentionId::parse("1850000000000000001").unwrap();
        let query = mentions_query(Some(&since));
        assert!(query.contains(&("since_id".to_string(), "1850000000000000001".to_string())));
    }
}
