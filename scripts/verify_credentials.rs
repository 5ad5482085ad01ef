//! Credential Verification Script
//!
//! Loads the bot configuration the same way the service does, resolves the
//! authenticated account and prints the cursor the next poll would start from.
//! Run it after rotating credentials or before a first deployment.

use replybot::{BotConfig, CursorStore, FileCursorStore, PgCursorStore, XApi, XClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("🔐 Loading configuration from environment");
    let config = BotConfig::from_env()?;

    println!("🚀 Calling {}/users/me", config.api_base_url);
    let client = XClient::new(config.api_base_url.clone(), config.credentials.clone());
    let bot = match client.me().await {
        Ok(bot) => bot,
        Err(e) => {
            eprintln!("❌ Credentials rejected: {}", e);
            std::process::exit(1);
        }
    };
    println!("✅ Authenticated as @{} (ID: {})", bot.username, bot.id);

    let cursor = match &config.database_url {
        Some(database_url) => PgCursorStore::connect(database_url, &bot.id).await?.load().await,
        None => FileCursorStore::new(&config.cursor_file).load().await,
    };
    match cursor {
        Some(id) => println!("📍 Next poll fetches mentions after {}", id),
        None => println!("📍 No cursor stored yet, the next poll starts from the newest page"),
    }

    Ok(())
}
