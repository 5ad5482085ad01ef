//! Twitter/X API integration module.
//!
//! This module contains the OAuth 1.0a signed client used to resolve the bot's
//! identity, fetch its mention timeline and post replies.

mod api;
mod mentions;
mod tweets;
mod users;

pub use api::{XApi, XClient};
pub use mentions::{IdentityLookup, Mention, MentionBatch, MENTIONS_PAGE_SIZE};
pub use tweets::PostedTweet;
pub use users::BotIdentity;

pub(crate) use api::sanitize_for_logging;
