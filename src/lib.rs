//! # Replybot Library
//!
//! A Rust service library that polls the Twitter/X mention timeline of the
//! authenticated account and replies to every new mention from someone else,
//! once. Requests are signed with OAuth 1.0a User Context credentials.
//!
//! ## Features
//!
//! - Mention polling on a fixed interval, plus one run at startup
//! - Exactly one reply attempt per mention, tracked by a monotonic cursor
//! - Cursor persisted in a text file, or in PostgreSQL when `DATABASE_URL` is set
//! - Rate-limit aware: a throttled reply stops the batch and is retried next poll
//! - Optional `/health` and `/status` endpoints
//! - Structured logging
//!
//! ## Configuration
//!
//! The following configuration is required:
//! - `X_API_KEY`, `X_API_SECRET`: App consumer credentials
//! - `X_ACCESS_TOKEN`, `X_ACCESS_TOKEN_SECRET`: Bot account credentials
//!
//! Optional:
//! - `POLL_INTERVAL_MINUTES`: Minutes between polls (defaults to 2)
//! - `REPLY_MESSAGE`: Reply template with a `{username}` placeholder
//! - `CURSOR_FILE`, `DATABASE_URL`: Where the cursor lives
//! - `PORT`: Port of the status server (disabled when unset)

pub mod config;
pub mod cursor;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod scheduler;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{BotConfig, Credentials};
pub use cursor::{CursorStore, FileCursorStore, MemoryCursorStore, MentionId};
pub use db::PgCursorStore;
pub use dispatcher::{
    render_reply, CycleOutcome, CycleReport, MentionOutcome, ReplyDispatcher, ReplySettings,
};
pub use error::{ApiError, CursorError};
pub use handlers::{handle_health, handle_status, router, AppState};
pub use oauth::build_oauth1_header;
pub use scheduler::{run_cycle, run_polling_loop, run_polling_loop_until};
pub use twitter::{BotIdentity, Mention, MentionBatch, XApi, XClient};

#[cfg(test)]
mod tests;
