//! Mention cursor persistence.
//!
//! The cursor is the identifier of the most recently processed mention. It is
//! the only state the bot carries across restarts, and it only ever moves
//! forward. This module defines the identifier type, the [`CursorStore`]
//! seam, and the file-backed and in-memory stores. The Postgres store lives in
//! [`crate::db`].

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{CursorError, InvalidMentionId};

/// A tweet identifier, compared numerically at any width.
///
/// Snowflake ids do not fit in an `f64` and nothing guarantees they stay
/// within `u64`, so the id is kept as its canonical decimal string (no leading
/// zeros). Numeric order is then length first, digits second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MentionId(String);

impl MentionId {
    /// Parses a decimal identifier, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, InvalidMentionId> {
        let digits = raw.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidMentionId(raw.to_string()));
        }
        let canonical = digits.trim_start_matches('0');
        if canonical.is_empty() {
            Ok(MentionId("0".to_string()))
        } else {
            Ok(MentionId(canonical.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for MentionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for MentionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MentionId {
    type Err = InvalidMentionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MentionId::parse(s)
    }
}

impl TryFrom<String> for MentionId {
    type Error = InvalidMentionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MentionId::parse(&value)
    }
}

impl From<MentionId> for String {
    fn from(id: MentionId) -> Self {
        id.0
    }
}

/// Storage for the last processed mention id.
///
/// `load` never fails: a store that was never written and a store that cannot
/// be read both report `None`. `save` overwrites the previous value and
/// surfaces persistence failures to the caller.
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self) -> Option<MentionId>;
    async fn save(&self, cursor: &MentionId) -> Result<(), CursorError>;
}

#[async_trait]
impl<T: CursorStore + ?Sized> CursorStore for Arc<T> {
    async fn load(&self) -> Option<MentionId> {
        (**self).load().await
    }

    async fn save(&self, cursor: &MentionId) -> Result<(), CursorError> {
        (**self).save(cursor).await
    }
}

/// Keeps the cursor as a bare decimal string in a text file.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> CursorError {
        CursorError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self) -> Option<MentionId> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cursor file at {} yet", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read cursor file {}: {}", self.path.display(), e);
                return None;
            }
        };

        if contents.trim().is_empty() {
            return None;
        }

        match MentionId::parse(&contents) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(
                    "Ignoring unreadable cursor file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    async fn save(&self, cursor: &MentionId) -> Result<(), CursorError> {
        // Write a sibling file and rename it so a crash never leaves a torn id.
        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(cursor.as_str().as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        info!("Saved last mention id {} to {}", cursor, self.path.display());
        Ok(())
    }
}

/// Keeps the cursor in memory, recording every write.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    current: Mutex<Option<MentionId>>,
    writes: Mutex<Vec<MentionId>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(cursor: MentionId) -> Self {
        Self {
            current: Mutex::new(Some(cursor)),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every value passed to `save`, oldest first.
    pub async fn writes(&self) -> Vec<MentionId> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self) -> Option<MentionId> {
        self.current.lock().await.clone()
    }

    async fn save(&self, cursor: &MentionId) -> Result<(), CursorError> {
        *self.current.lock().await = Some(cursor.clone());
        self.writes.lock().await.push(cursor.clone());
        Ok(())
    }
}
