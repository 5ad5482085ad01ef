//! Polling loop for the reply dispatcher.
//!
//! Runs one cycle immediately, then one cycle per interval. The next sleep
//! only starts once the previous cycle has finished, so cycles never overlap.

use log::{error, info};
use std::future::Future;
use std::time::Duration;

use crate::cursor::CursorStore;
use crate::dispatcher::{CycleOutcome, ReplyDispatcher};
use crate::twitter::XApi;

/// Runs a single cycle and logs its outcome; never fails.
///
/// A cursor persistence failure aborts the cycle but not the loop: the next
/// cycle reloads the cursor and re-fetches from wherever it last stood.
pub async fn run_cycle<A: XApi, S: CursorStore>(dispatcher: &ReplyDispatcher<A, S>) {
    match dispatcher.poll_cycle().await {
        Ok(CycleOutcome::Processed(report)) if report.rate_limited() => {
            info!("Cycle stopped early on rate limit, remaining mentions wait for the next poll");
        }
        Ok(_) => {}
        Err(e) => {
            error!("Failed to persist mention cursor: {}", e);
        }
    }
}

/// Polls until Ctrl+C is received.
///
/// # Parameters
///
/// - `dispatcher`: The configured reply dispatcher
/// - `interval`: Pause between the end of one cycle and the start of the next
///
/// # Example
///
/// ```rust,no_run
/// use replybot::{run_polling_loop, BotConfig, FileCursorStore, ReplyDispatcher, XApi, XClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let config = BotConfig::from_env()?;
///     let client = XClient::new(config.api_base_url.clone(), config.credentials.clone());
///     let bot = client.me().await?;
///     let store = FileCursorStore::new(&config.cursor_file);
///     let dispatcher = ReplyDispatcher::new(client, store, bot, config.reply_settings());
///     run_polling_loop(&dispatcher, config.poll_interval).await;
///     Ok(())
/// }
/// ```
pub async fn run_polling_loop<A: XApi, S: CursorStore>(
    dispatcher: &ReplyDispatcher<A, S>,
    interval: Duration,
) {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    };
    run_polling_loop_until(dispatcher, interval, shutdown).await;
}

/// Polls until `shutdown` completes.
///
/// `shutdown` is polled for the whole run, so a signal that arrives during a
/// cycle stops the loop as soon as that cycle finishes.
pub async fn run_polling_loop_until<A, S, F>(
    dispatcher: &ReplyDispatcher<A, S>,
    interval: Duration,
    shutdown: F,
) where
    A: XApi,
    S: CursorStore,
    F: Future<Output = ()>,
{
    info!(
        "Polling mentions of @{} every {}s",
        dispatcher.bot().username,
        interval.as_secs()
    );
    tokio::pin!(shutdown);

    loop {
        run_cycle(dispatcher).await;

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Received shutdown signal, stopping mention polling");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
