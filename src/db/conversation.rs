//! Conversation repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use super::DbPool;
use crate::dialogue::{ConversationEntry, ConversationStore};
use crate::{Error, Result};

/// A conversation row as stored
#[derive(Debug, Clone)]
pub struct StoredConversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub utterance: String,
    pub reply: String,
    pub language: String,
    pub mood: String,
    pub artifact_id: Option<String>,
}

/// Conversation repository
#[derive(Clone)]
pub struct ConversationRepo {
    pool: DbPool,
}

impl ConversationRepo {
    /// Create a new conversation repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append an entry, returning the row id
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn append(&self, entry: &ConversationEntry) -> Result<String> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO conversations (id, created_at, utterance, reply, language, mood, artifact_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                entry.timestamp.to_rfc3339(),
                entry.utterance_text,
                entry.reply_text,
                entry.language.code(),
                entry.mood.as_str(),
                entry.artifact_id,
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(id)
    }

    /// Number of stored conversations
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<u64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| {
            row.get(0)
        })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Most recent conversations, newest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredConversation>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, created_at, utterance, reply, language, mood, artifact_id
             FROM conversations ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit], |row| {
                Ok(StoredConversation {
                    id: row.get(0)?,
                    created_at: parse_datetime(&row.get::<_, String>(1)?),
                    utterance: row.get(2)?,
                    reply: row.get(3)?,
                    language: row.get(4)?,
                    mood: row.get(5)?,
                    artifact_id: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Check that the database answers
    ///
    /// # Errors
    ///
    /// Returns error if no connection can be obtained or the query fails
    pub fn ping(&self) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for ConversationRepo {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, entry: &ConversationEntry) -> Result<()> {
        let repo = self.clone();
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || repo.append(&entry))
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?
            .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
