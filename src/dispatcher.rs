//! Reply dispatcher: the mention de-duplication and cursor-advancement loop body.
//!
//! One call to [`ReplyDispatcher::poll_cycle`] loads the cursor, fetches the
//! mentions newer than it, and resolves them oldest first. The cursor is saved
//! after every resolved mention, so the stored value is always the end of a
//! contiguous processed prefix. A rate-limited reply stops the batch without
//! advancing past the throttled mention, which is then retried next cycle.

use log::{error, info, warn};

use crate::cursor::{CursorStore, MentionId};
use crate::error::{ApiError, CursorError};
use crate::twitter::{
    sanitize_for_logging, BotIdentity, IdentityLookup, Mention, MentionBatch, XApi,
};

/// Handle substituted when a mention's author is not in the identity lookup.
pub const DEFAULT_HANDLE: &str = "friend";

/// Placeholder replaced by the author's handle in the reply template.
pub const HANDLE_PLACEHOLDER: &str = "{username}";

/// Substitutes `handle` at the first `{username}` of `template`.
pub fn render_reply(template: &str, handle: &str) -> String {
    template.replacen(HANDLE_PLACEHOLDER, handle, 1)
}

/// How replies are worded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySettings {
    pub template: String,
    pub default_handle: String,
}

/// Terminal state of one mention within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionOutcome {
    /// Posted by the bot itself; cursor advanced, no reply.
    SkippedSelf,
    /// At or below the stored cursor; nothing written.
    SkippedAlreadyProcessed,
    Replied,
    /// Reply refused with 403; cursor advanced, never retried.
    SkippedForbidden,
    /// Reply failed for another reason; cursor advanced, never retried.
    SkippedOtherError,
    /// Reply throttled; the batch stops here and the cursor stays put.
    AbortedRateLimited,
}

impl MentionOutcome {
    /// Whether resolving a mention this way moves the cursor to its id.
    pub fn advances_cursor(self) -> bool {
        !matches!(
            self,
            MentionOutcome::SkippedAlreadyProcessed | MentionOutcome::AbortedRateLimited
        )
    }
}

/// What happened to each mention of a processed batch, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcomes: Vec<(MentionId, MentionOutcome)>,
}

impl CycleReport {
    pub fn count(&self, outcome: MentionOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn rate_limited(&self) -> bool {
        self.count(MentionOutcome::AbortedRateLimited) > 0
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoMentions,
    /// The mentions fetch was throttled; nothing processed.
    FetchRateLimited,
    /// The mentions fetch failed; nothing processed.
    FetchFailed(String),
    Processed(CycleReport),
}

/// Decides, per mention, whether to reply, and advances the cursor.
pub struct ReplyDispatcher<A, S> {
    api: A,
    store: S,
    bot: BotIdentity,
    settings: ReplySettings,
}

impl<A: XApi, S: CursorStore> ReplyDispatcher<A, S> {
    pub fn new(api: A, store: S, bot: BotIdentity, settings: ReplySettings) -> Self {
        Self {
            api,
            store,
            bot,
            settings,
        }
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one fetch-and-reply cycle.
    ///
    /// Fetch failures are logged and reported in the outcome; only a failure to
    /// persist the cursor is returned as an error.
    pub async fn poll_cycle(&self) -> Result<CycleOutcome, CursorError> {
        let since = self.store.load().await;

        let batch = match self.api.fetch_mentions_since(&self.bot.id, since.as_ref()).await {
            Ok(batch) => batch,
            Err(ApiError::RateLimited { reset_at }) => {
                warn!(
                    "Rate limited on mentions fetch (reset at {:?}). Waiting for next cycle.",
                    reset_at
                );
                return Ok(CycleOutcome::FetchRateLimited);
            }
            Err(e) => {
                error!("Error polling mentions: {}", e);
                return Ok(CycleOutcome::FetchFailed(e.to_string()));
            }
        };

        if batch.is_empty() {
            info!("No new mentions.");
            return Ok(CycleOutcome::NoMentions);
        }

        let report = self.process_batch(batch).await?;
        Ok(CycleOutcome::Processed(report))
    }

    /// Resolves a newest-first batch oldest first.
    pub async fn process_batch(&self, batch: MentionBatch) -> Result<CycleReport, CursorError> {
        let MentionBatch {
            mut mentions,
            identities,
        } = batch;
        mentions.reverse();

        let mut report = CycleReport::default();
        for mention in &mentions {
            let outcome = self.process_mention(mention, &identities).await?;
            report.outcomes.push((mention.id.clone(), outcome));
            if outcome == MentionOutcome::AbortedRateLimited {
                break;
            }
        }

        info!(
            "Cycle done: {} replied, {} skipped, rate limited: {}",
            report.count(MentionOutcome::Replied),
            report.outcomes.len() - report.count(MentionOutcome::Replied),
            report.rate_limited()
        );
        Ok(report)
    }

    async fn process_mention(
        &self,
        mention: &Mention,
        identities: &IdentityLookup,
    ) -> Result<MentionOutcome, CursorError> {
        let outcome = self.resolve_mention(mention, identities).await;
        if outcome.advances_cursor() {
            self.advance_cursor(&mention.id).await?;
        }
        Ok(outcome)
    }

    /// Decides what happens to one mention, posting the reply if due. Never writes the cursor.
    async fn resolve_mention(
        &self,
        mention: &Mention,
        identities: &IdentityLookup,
    ) -> MentionOutcome {
        let handle = identities
            .handle_for(mention.author_id.as_deref())
            .unwrap_or(self.settings.default_handle.as_str());

        if mention.author_id.as_deref() == Some(self.bot.id.as_str()) {
            return MentionOutcome::SkippedSelf;
        }

        // Another process sharing the store may have handled it already.
        if let Some(current) = self.store.load().await {
            if mention.id <= current {
                info!(
                    "Skipping mention {} - already processed (cursor {})",
                    mention.id, current
                );
                return MentionOutcome::SkippedAlreadyProcessed;
            }
        }

        let reply_text = render_reply(&self.settings.template, handle);
        info!(
            "Replying to @{} (tweet {}): \"{}\"",
            handle,
            mention.id,
            sanitize_for_logging(&mention.text, 60)
        );

        match self.api.post_reply(&reply_text, &mention.id).await {
            Ok(posted) => {
                info!("Reply sent ({}).", posted.id);
                MentionOutcome::Replied
            }
            Err(ApiError::RateLimited { reset_at }) => {
                warn!(
                    "Rate limited replying to {} (reset at {:?}). Will retry next cycle.",
                    mention.id, reset_at
                );
                MentionOutcome::AbortedRateLimited
            }
            Err(ApiError::Forbidden(detail)) => {
                warn!(
                    "Forbidden replying to {} (duplicate, blocked or protected). Skipping: {}",
                    mention.id, detail
                );
                MentionOutcome::SkippedForbidden
            }
            Err(e) => {
                error!("Failed to reply to {}: {}", mention.id, e);
                MentionOutcome::SkippedOtherError
            }
        }
    }

    /// Saves `id` unless the stored cursor is already at or past it.
    async fn advance_cursor(&self, id: &MentionId) -> Result<(), CursorError> {
        match self.store.load().await {
            Some(current) if current >= *id => Ok(()),
            _ => self.store.save(id).await,
        }
    }
}
