//! Conversation store backed by SQLite
//!
//! Holds conversations, message exchanges, rolling summaries, analysis
//! snapshots and meta-points. Every call opens its own connection and
//! round-trips to the database; nothing is cached in process.

use crate::config::StorageConfig;
use crate::error::{CoboardError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub mod types;
pub use types::{Analysis, Category, ChatMessage, Conversation, MetaPoint, Summary};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS chat_messages (
    id TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    user_message TEXT NOT NULL,
    assistant_message TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation
    ON chat_messages (conversation_id, timestamp);
CREATE TABLE IF NOT EXISTS conversation_summary (
    conversation_id TEXT PRIMARY KEY,
    summary_text TEXT,
    message_count INTEGER,
    meta_analysis TEXT,
    meta_message_count INTEGER,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS meta_points (
    id TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    type TEXT NOT NULL,
    text TEXT NOT NULL,
    hidden INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_meta_points_conversation
    ON meta_points (conversation_id, hidden);
";

/// Which points a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFilter {
    /// Only points that are not hidden
    Active,
    /// Only hidden points
    Hidden,
    /// Every point
    All,
}

/// Maps rusqlite failures into `CoboardError::Storage` with a short context
trait StorageResultExt<T> {
    fn storage(self, context: &str) -> Result<T>;
}

impl<T> StorageResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn storage(self, context: &str) -> Result<T> {
        self.map_err(|e| CoboardError::Storage(format!("{}: {}", context, e)).into())
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    let created_at: String = row.get(2)?;
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: parse_timestamp(2, &created_at)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let timestamp: String = row.get(4)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        user_message: row.get(2)?,
        assistant_message: row.get(3)?,
        timestamp: parse_timestamp(4, &timestamp)?,
    })
}

fn point_from_row(row: &Row<'_>) -> rusqlite::Result<MetaPoint> {
    let category: String = row.get(2)?;
    let created_at: String = row.get(5)?;
    Ok(MetaPoint {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        category: category.parse().map_err(|e: CoboardError| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        text: row.get(3)?,
        hidden: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}

const MESSAGE_COLUMNS: &str = "id, conversation_id, user_message, assistant_message, timestamp";
const POINT_COLUMNS: &str = "id, conversation_id, type, text, hidden, created_at";

/// Storage backend for the board
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Open the store configured in `config`
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(config.resolve_db_path()?)
    }

    /// Create a storage instance that uses the specified database path
    ///
    /// Creates the parent directory and the schema when missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use coboard::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("board.db")).unwrap();
    /// assert!(storage.list_conversations().unwrap().is_empty());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CoboardError::Storage(format!(
                        "Failed to create parent directory for database: {}",
                        e
                    ))
                })?;
            }
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::debug!("Opened conversation store at {}", storage.db_path.display());
        Ok(storage)
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path).storage("Failed to open database")
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)
            .storage("Failed to create tables")?;
        Ok(())
    }

    // ── Conversations ────────────────────────────────────────────────

    /// Create a conversation and return the stored record
    pub fn create_conversation(&self, title: &str) -> Result<Conversation> {
        let conn = self.connect()?;
        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();

        conn.execute(
            "INSERT INTO conversations (id, title, created_at) VALUES (?, ?, ?)",
            params![id, title, created_at],
        )
        .storage("Failed to insert conversation")?;

        Ok(Conversation {
            id,
            title: title.to_string(),
            created_at: parse_timestamp(2, &created_at).storage("Invalid timestamp")?,
        })
    }

    /// List all conversations, newest first
    pub fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, created_at FROM conversations
                ORDER BY created_at DESC, rowid DESC",
            )
            .storage("Failed to prepare statement")?;

        let rows = stmt
            .query_map([], conversation_from_row)
            .storage("Failed to query conversations")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .storage("Failed to read conversation")
    }

    /// Load one conversation by id
    pub fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, title, created_at FROM conversations WHERE id = ?",
            params![id],
            conversation_from_row,
        )
        .optional()
        .storage("Failed to query conversation")
    }

    /// Load one conversation, failing with `NotFound` when absent
    pub fn require_conversation(&self, id: &str) -> Result<Conversation> {
        self.get_conversation(id)?
            .ok_or_else(|| CoboardError::NotFound(format!("Conversation {}", id)).into())
    }

    /// Change a conversation's title and return the updated record
    pub fn rename_conversation(&self, id: &str, title: &str) -> Result<Conversation> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE conversations SET title = ? WHERE id = ?",
                params![title, id],
            )
            .storage("Failed to rename conversation")?;

        if changed == 0 {
            return Err(CoboardError::NotFound(format!("Conversation {}", id)).into());
        }

        self.require_conversation(id)
    }

    /// Delete a conversation with its messages, summary and points
    ///
    /// Returns the removed conversation.
    pub fn delete_conversation(&self, id: &str) -> Result<Conversation> {
        let conversation = self.require_conversation(id)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction().storage("Failed to start transaction")?;
        for sql in [
            "DELETE FROM chat_messages WHERE conversation_id = ?",
            "DELETE FROM conversation_summary WHERE conversation_id = ?",
            "DELETE FROM meta_points WHERE conversation_id = ?",
            "DELETE FROM conversations WHERE id = ?",
        ] {
            tx.execute(sql, params![id])
                .storage("Failed to delete conversation")?;
        }
        tx.commit().storage("Failed to commit transaction")?;

        Ok(conversation)
    }

    // ── Messages ─────────────────────────────────────────────────────

    /// Store one (user, assistant) exchange
    pub fn insert_message(
        &self,
        conversation_id: &str,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<ChatMessage> {
        let conn = self.connect()?;
        let id = Uuid::new_v4().to_string();
        let timestamp = now_timestamp();

        conn.execute(
            "INSERT INTO chat_messages (id, conversation_id, user_message, assistant_message, timestamp)
            VALUES (?, ?, ?, ?, ?)",
            params![id, conversation_id, user_message, assistant_message, timestamp],
        )
        .storage("Failed to insert message")?;

        Ok(ChatMessage {
            id,
            conversation_id: conversation_id.to_string(),
            user_message: user_message.to_string(),
            assistant_message: assistant_message.to_string(),
            timestamp: parse_timestamp(4, &timestamp).storage("Invalid timestamp")?,
        })
    }

    /// The most recent `limit` exchanges, newest first
    pub fn recent_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM chat_messages WHERE conversation_id = ?
                ORDER BY timestamp DESC, rowid DESC LIMIT ?",
                MESSAGE_COLUMNS
            ))
            .storage("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params![conversation_id, limit as i64], message_from_row)
            .storage("Failed to query messages")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .storage("Failed to read message")
    }

    /// Every exchange of a conversation, oldest first
    pub fn messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM chat_messages WHERE conversation_id = ?
                ORDER BY timestamp ASC, rowid ASC",
                MESSAGE_COLUMNS
            ))
            .storage("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params![conversation_id], message_from_row)
            .storage("Failed to query messages")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .storage("Failed to read message")
    }

    /// Number of exchanges stored for a conversation
    pub fn count_messages(&self, conversation_id: &str) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chat_messages WHERE conversation_id = ?",
                params![conversation_id],
                |row| row.get(0),
            )
            .storage("Failed to count messages")?;
        Ok(count as usize)
    }

    // ── Summary and analysis snapshot ────────────────────────────────

    /// Current rolling summary, if one was ever computed
    pub fn get_summary(&self, conversation_id: &str) -> Result<Option<Summary>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT conversation_id, summary_text, message_count, updated_at
            FROM conversation_summary
            WHERE conversation_id = ? AND summary_text IS NOT NULL",
            params![conversation_id],
            |row| {
                let count: Option<i64> = row.get(2)?;
                let updated_at: String = row.get(3)?;
                Ok(Summary {
                    conversation_id: row.get(0)?,
                    summary_text: row.get(1)?,
                    message_count: count.unwrap_or(0) as usize,
                    updated_at: parse_timestamp(3, &updated_at)?,
                })
            },
        )
        .optional()
        .storage("Failed to query summary")
    }

    /// Write the rolling summary, leaving any analysis snapshot in place
    pub fn upsert_summary(
        &self,
        conversation_id: &str,
        summary_text: &str,
        message_count: usize,
    ) -> Result<Summary> {
        let conn = self.connect()?;
        let updated_at = now_timestamp();

        conn.execute(
            "INSERT INTO conversation_summary (conversation_id, summary_text, message_count, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(conversation_id) DO UPDATE SET
                summary_text = excluded.summary_text,
                message_count = excluded.message_count,
                updated_at = excluded.updated_at",
            params![conversation_id, summary_text, message_count as i64, updated_at],
        )
        .storage("Failed to upsert summary")?;

        Ok(Summary {
            conversation_id: conversation_id.to_string(),
            summary_text: summary_text.to_string(),
            message_count,
            updated_at: parse_timestamp(3, &updated_at).storage("Invalid timestamp")?,
        })
    }

    /// Last persisted analysis and the message count it was computed from
    pub fn load_analysis(&self, conversation_id: &str) -> Result<Option<(Analysis, usize)>> {
        let conn = self.connect()?;
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT meta_analysis, meta_message_count FROM conversation_summary
                WHERE conversation_id = ? AND meta_analysis IS NOT NULL",
                params![conversation_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .storage("Failed to query analysis")?;

        match row {
            Some((json, count)) => {
                let analysis: Analysis = serde_json::from_str(&json).map_err(|e| {
                    CoboardError::Storage(format!("Failed to deserialize analysis: {}", e))
                })?;
                Ok(Some((analysis, count.unwrap_or(0) as usize)))
            }
            None => Ok(None),
        }
    }

    /// Write the analysis snapshot, leaving the rolling summary in place
    pub fn save_analysis(
        &self,
        conversation_id: &str,
        analysis: &Analysis,
        message_count: usize,
    ) -> Result<()> {
        let conn = self.connect()?;
        let json = serde_json::to_string(analysis)
            .map_err(|e| CoboardError::Storage(format!("Failed to serialize analysis: {}", e)))?;

        conn.execute(
            "INSERT INTO conversation_summary (conversation_id, meta_analysis, meta_message_count, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(conversation_id) DO UPDATE SET
                meta_analysis = excluded.meta_analysis,
                meta_message_count = excluded.meta_message_count,
                updated_at = excluded.updated_at",
            params![conversation_id, json, message_count as i64, now_timestamp()],
        )
        .storage("Failed to save analysis")?;

        Ok(())
    }

    // ── Meta-points ──────────────────────────────────────────────────

    /// Points of a conversation in extraction order
    pub fn list_points(&self, conversation_id: &str, filter: PointFilter) -> Result<Vec<MetaPoint>> {
        let condition = match filter {
            PointFilter::Active => "AND hidden = 0",
            PointFilter::Hidden => "AND hidden = 1",
            PointFilter::All => "",
        };

        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM meta_points WHERE conversation_id = ? {}
                ORDER BY created_at ASC, rowid ASC",
                POINT_COLUMNS, condition
            ))
            .storage("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params![conversation_id], point_from_row)
            .storage("Failed to query points")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .storage("Failed to read point")
    }

    /// Load one point by id
    pub fn get_point(&self, id: &str) -> Result<Option<MetaPoint>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {} FROM meta_points WHERE id = ?", POINT_COLUMNS),
            params![id],
            point_from_row,
        )
        .optional()
        .storage("Failed to query point")
    }

    /// Replace the active points of one category in a single transaction
    ///
    /// Hidden points of the category are kept. Returns the inserted points.
    pub fn replace_active_points(
        &self,
        conversation_id: &str,
        category: Category,
        texts: &[String],
    ) -> Result<Vec<MetaPoint>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().storage("Failed to start transaction")?;

        tx.execute(
            "DELETE FROM meta_points WHERE conversation_id = ? AND type = ? AND hidden = 0",
            params![conversation_id, category.as_db_str()],
        )
        .storage("Failed to clear points")?;

        let mut inserted = Vec::with_capacity(texts.len());
        for text in texts {
            let id = Uuid::new_v4().to_string();
            let created_at = now_timestamp();
            tx.execute(
                "INSERT INTO meta_points (id, conversation_id, type, text, hidden, created_at)
                VALUES (?, ?, ?, ?, 0, ?)",
                params![id, conversation_id, category.as_db_str(), text, created_at],
            )
            .storage("Failed to insert point")?;

            inserted.push(MetaPoint {
                id,
                conversation_id: conversation_id.to_string(),
                category,
                text: text.clone(),
                hidden: false,
                created_at: parse_timestamp(5, &created_at).storage("Invalid timestamp")?,
            });
        }

        tx.commit().storage("Failed to commit transaction")?;
        Ok(inserted)
    }

    /// Set a point's hidden flag and return the updated point
    pub fn set_point_hidden(&self, id: &str, hidden: bool) -> Result<MetaPoint> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE meta_points SET hidden = ? WHERE id = ?",
                params![hidden, id],
            )
            .storage("Failed to update point")?;

        if changed == 0 {
            return Err(CoboardError::NotFound(format!("Point {}", id)).into());
        }

        self.get_point(id)?
            .ok_or_else(|| CoboardError::NotFound(format!("Point {}", id)).into())
    }

    /// Permanently delete a point and return it
    pub fn delete_point(&self, id: &str) -> Result<MetaPoint> {
        let point = self
            .get_point(id)?
            .ok_or_else(|| CoboardError::NotFound(format!("Point {}", id)))?;

        let conn = self.connect()?;
        conn.execute("DELETE FROM meta_points WHERE id = ?", params![id])
            .storage("Failed to delete point")?;

        Ok(point)
    }
}
