//! # Replybot
//!
//! Polls the Twitter/X mention timeline and replies to each new mention once.
//!
//! ## Environment Variables
//!
//! - `X_API_KEY`, `X_API_SECRET`, `X_ACCESS_TOKEN`, `X_ACCESS_TOKEN_SECRET`: OAuth 1.0a credentials
//! - `POLL_INTERVAL_MINUTES`: Minutes between polls (defaults to 2)
//! - `REPLY_MESSAGE`: Reply template with a `{username}` placeholder
//! - `CURSOR_FILE`: Cursor file path (defaults to `last_mention_id.txt`)
//! - `DATABASE_URL`: Store the cursor in PostgreSQL instead
//! - `PORT`: Serve `/health` and `/status` on this port
//!
//! A `.env` file in the working directory is loaded first, if present.

use log::{error, info};
use replybot::{
    router, AppState, BotConfig, CursorStore, FileCursorStore, PgCursorStore, ReplyDispatcher,
    XApi, XClient,
};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Main entry point for the reply bot.
///
/// Startup (configuration, identity resolution, cursor store) is the only
/// fatal path; once the polling loop runs, cycle errors are logged only.
///
/// # Logging
///
/// The application uses the `env_logger` crate for structured logging. Log levels
/// can be controlled via the `RUST_LOG` environment variable (defaults to `info`).
///
/// # Example Usage
///
/// ```bash
/// # Run with the default 2 minute interval
/// cargo run
///
/// # Poll every 5 minutes with the status server on 8080
/// POLL_INTERVAL_MINUTES=5 PORT=8080 cargo run
///
/// # Run with debug logging
/// RUST_LOG=debug cargo run
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("X reply bot starting");

    let config = BotConfig::from_env()?;
    info!("Polling every {}s", config.poll_interval.as_secs());

    let client = XClient::new(config.api_base_url.clone(), config.credentials.clone());
    let bot = client.me().await?;
    info!("Bot authenticated as @{} (ID: {})", bot.username, bot.id);

    let store: Arc<dyn CursorStore> = match &config.database_url {
        Some(database_url) => Arc::new(PgCursorStore::connect(database_url, &bot.id).await?),
        None => Arc::new(FileCursorStore::new(&config.cursor_file)),
    };

    if let Some(port) = config.port {
        let state = AppState {
            bot: bot.clone(),
            store: Arc::clone(&store),
            poll_interval: config.poll_interval,
        };
        let app = router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Starting status server on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Status server error: {}", e);
            }
        });
    }

    let dispatcher = ReplyDispatcher::new(client, store, bot, config.reply_settings());
    replybot::run_polling_loop(&dispatcher, config.poll_interval).await;

    Ok(())
}
