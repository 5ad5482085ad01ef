//! OAuth authentication module for Twitter/X API integration.
//!
//! Every request the bot makes is signed with OAuth 1.0a User Context
//! (HMAC-SHA1), which is what grants write access for posting replies.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;

use crate::config::Credentials;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Percent-encodes per RFC 3986: everything except `A-Z a-z 0-9 - . _ ~`.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Builds the Authorization header for an OAuth 1.0a User Context request.
///
/// # Parameters
///
/// - `method`: HTTP method, e.g. `GET`
/// - `url`: Request URL without query string
/// - `params`: Query (or form) parameters; they are part of the signature.
///   JSON bodies are not signed and must not be passed here.
/// - `credentials`: Consumer key/secret and access token/secret
///
/// # Returns
///
/// A header value of the form `OAuth oauth_consumer_key="...", ...`.
pub fn build_oauth1_header(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &Credentials,
) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let timestamp = chrono::Utc::now().timestamp().to_string();

    build_oauth1_header_with(method, url, params, credentials, &nonce, &timestamp)
}

/// Deterministic core of [`build_oauth1_header`].
pub(crate) fn build_oauth1_header_with(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &Credentials,
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut oauth_params: Vec<(&str, &str)> = vec![
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let signature = sign(method, url, params, &oauth_params, credentials);
    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    oauth_params: &[(&str, &str)],
    credentials: &Credentials,
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .chain(
            oauth_params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    );

    let signing_key = format!(
        "{}&{}",
        percent_encode(&credentials.api_secret),
        percent_encode(&credentials.access_token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(signing_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
