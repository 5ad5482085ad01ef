//! Database module for storing the mention cursor in PostgreSQL.
//!
//! When `DATABASE_URL` is set the cursor lives in the `mention_cursor` table,
//! one row per bot account. This lets several bot processes share progress,
//! and the upsert refuses to move a stored cursor backwards.

use async_trait::async_trait;
use log::{debug, info, warn};
use sqlx::{PgPool, Row};

use crate::cursor::{CursorStore, MentionId};
use crate::error::CursorError;

/// Establishes a connection to the PostgreSQL database.
///
/// # Parameters
///
/// - `database_url`: PostgreSQL connection string
///
/// # Returns
///
/// - `Ok(PgPool)`: A connection pool to the database
/// - `Err(sqlx::Error)`: If the connection fails
pub async fn get_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to PostgreSQL database");
    debug!(
        "Database URL (masked): {}...",
        database_url.chars().take(20).collect::<String>()
    );

    let pool = PgPool::connect(database_url).await?;
    info!("Successfully connected to PostgreSQL database");

    Ok(pool)
}

/// Creates the mention_cursor table if it does not exist yet.
///
/// Ids are stored as unbounded `NUMERIC` so `GREATEST` compares them as numbers
/// and no id is too wide to save.
pub async fn create_mention_cursor_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mention_cursor (
            bot_id TEXT PRIMARY KEY,
            last_mention_id NUMERIC NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tables created with a bounded precision would reject wider ids.
    sqlx::query("ALTER TABLE mention_cursor ALTER COLUMN last_mention_id TYPE NUMERIC")
        .execute(pool)
        .await?;

    debug!("mention_cursor table is ready");
    Ok(())
}

/// Cursor store backed by the `mention_cursor` table.
#[derive(Debug, Clone)]
pub struct PgCursorStore {
    pool: PgPool,
    bot_id: String,
}

impl PgCursorStore {
    /// Wraps an existing pool; the table must already exist.
    pub fn new(pool: PgPool, bot_id: impl Into<String>) -> Self {
        Self {
            pool,
            bot_id: bot_id.into(),
        }
    }

    /// Connects, ensures the table exists and scopes the store to `bot_id`.
    pub async fn connect(database_url: &str, bot_id: &str) -> Result<Self, CursorError> {
        let pool = get_db_pool(database_url).await?;
        create_mention_cursor_table(&pool).await?;
        Ok(Self::new(pool, bot_id))
    }
}

#[async_trait]
impl CursorStore for PgCursorStore {
    async fn load(&self) -> Option<MentionId> {
        let row = sqlx::query(
            r#"
            SELECT last_mention_id::TEXT AS last_mention_id
            FROM mention_cursor
            WHERE bot_id = $1
            "#,
        )
        .bind(&self.bot_id)
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some(row)) => match row.try_get::<String, _>("last_mention_id") {
                Ok(raw) => match MentionId::parse(&raw) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("Ignoring unreadable cursor for bot {}: {}", self.bot_id, e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Failed to decode cursor row for bot {}: {}", self.bot_id, e);
                    None
                }
            },
            Ok(None) => {
                debug!("No stored cursor for bot {} yet", self.bot_id);
                None
            }
            Err(e) => {
                warn!("Failed to query cursor for bot {}: {}", self.bot_id, e);
                None
            }
        }
    }

    async fn save(&self, cursor: &MentionId) -> Result<(), CursorError> {
        sqlx::query(
            r#"
            INSERT INTO mention_cursor (bot_id, last_mention_id, updated_at)
            VALUES ($1, $2::NUMERIC, NOW())
            ON CONFLICT (bot_id) DO UPDATE
            SET last_mention_id = GREATEST(mention_cursor.last_mention_id, EXCLUDED.last_mention_id),
                updated_at = NOW()
            "#,
        )
        .bind(&self.bot_id)
        .bind(cursor.as_str())
        .execute(&self.pool)
        .await?;

        info!("Saved last mention id {} for bot {}", cursor, self.bot_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs against a real database only when DATABASE_URL is set.
    #[tokio::test]
    async fn test_pg_store_keeps_greatest_cursor() {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };

        let bot_id = format!("test-bot-{}", chrono::Utc::now().timestamp_micros());
        let store = PgCursorStore::connect(&database_url, &bot_id).await.unwrap();
        assert_eq!(store.load().await, None);

        let high = MentionId::parse("18446744073709551616").unwrap();
        let low = MentionId::parse("9").unwrap();
        store.save(&high).await.unwrap();
        store.save(&low).await.unwrap();
        assert_eq!(store.load().await, Some(high));

        let wide = MentionId::parse(&format!("1{}", "0".repeat(60))).unwrap();
        store.save(&wide).await.unwrap();
        assert_eq!(store.load().await, Some(wide));

        sqlx::query("DELETE FROM mention_cursor WHERE bot_id = $1")
            .bind(&bot_id)
            .execute(&store.pool)
            .await
            .unwrap();
    }
}
