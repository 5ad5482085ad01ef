//! Identity lookup for the authenticated account.

use log::info;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::api::XClient;

/// The bot's own account, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    data: Option<BotIdentity>,
}

/// Parses the body of `GET /2/users/me`.
pub(crate) fn parse_me_response(body: &str) -> Result<BotIdentity, ApiError> {
    let response: MeResponse = serde_json::from_str(body)?;
    response
        .data
        .ok_or_else(|| ApiError::Request("users/me returned no user data".to_string()))
}

impl XClient {
    /// Looks up the authenticated account via `GET /2/users/me`.
    pub(crate) async fn lookup_me(&self) -> Result<BotIdentity, ApiError> {
        let url = self.endpoint("/users/me");
        let body = self
            .send_signed(Method::GET, &url, &[], None, "users_me")
            .await?;
        let identity = parse_me_response(&body)?;
        info!("Resolved bot identity @{} ({})", identity.username, identity.id);
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_me_response() {
        let body = r#"{"data":{"id":"1234567890","name":"Reply Bot","username":"replybot"}}"#;
        assert_eq!(
            parse_me_response(body).unwrap(),
            BotIdentity {
                id: "1234567890".to_string(),
                username: "replybot".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_me_response_without_data() {
        let body = r#"{"errors":[{"message":"Unauthorized"}]}"#;
        assert!(matches!(parse_me_response(body), Err(ApiError::Request(_))));
        assert!(matches!(parse_me_response("nope"), Err(ApiError::Request(_))));
    }
}
