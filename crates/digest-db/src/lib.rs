//! Storage layer for chat digests.
//!
//! Persists per-conversation settings and delivery cursors using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Conversations
//!
//! A conversation is whatever identity the caller groups settings by (a chat
//! id, a user, or simply `default`). Rows are created lazily on first write;
//! reading an unknown conversation yields default settings.
//!
//! ## Cursor Format
//!
//! Cursors are stored as TEXT in naive ISO 8601 format
//! (e.g., `2024-01-15T10:30:00`). Chat exports carry wall-clock times without
//! a zone, so no offset is stored. Lexicographic order matches chronological
//! order.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use digest_core::{TimeWindow, UnknownTimeWindow};

const CURSOR_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// An instruction index was outside the stored list.
    #[error("no instruction at index {index} (have {len})")]
    InstructionIndex { index: usize, len: usize },
    /// A stored time window label is not recognized.
    #[error("invalid stored time window: {0}")]
    InvalidWindow(#[from] UnknownTimeWindow),
    /// A stored cursor could not be parsed.
    #[error("invalid cursor for {chat:?}: {value}")]
    CursorParse {
        chat: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Settings that shape the next summary for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationSettings {
    pub window: TimeWindow,
    pub instructions: Vec<String>,
    pub onetime_instruction: Option<String>,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                time_window TEXT NOT NULL DEFAULT 'auto',
                onetime_instruction TEXT
            );

            -- Ordered by rowid; list position is the user-facing index.
            CREATE TABLE IF NOT EXISTS instructions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                text TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_instructions_conversation
                ON instructions(conversation_id);

            -- last_seen: naive ISO 8601 (e.g., '2024-01-15T10:30:00')
            CREATE TABLE IF NOT EXISTS cursors (
                conversation_id TEXT NOT NULL,
                chat_name TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                PRIMARY KEY (conversation_id, chat_name),
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    fn ensure_conversation(&self, conversation: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO conversations (id) VALUES (?)",
            [conversation],
        )?;
        Ok(())
    }

    /// Loads settings for a conversation, defaulting when none are stored.
    pub fn settings(&self, conversation: &str) -> Result<ConversationSettings, DbError> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT time_window, onetime_instruction FROM conversations WHERE id = ?",
                [conversation],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((window, onetime_instruction)) = row else {
            return Ok(ConversationSettings::default());
        };

        Ok(ConversationSettings {
            window: window.parse()?,
            instructions: self.instructions(conversation)?,
            onetime_instruction,
        })
    }

    /// Sets the summary window for a conversation.
    pub fn set_window(&self, conversation: &str, window: TimeWindow) -> Result<(), DbError> {
        self.ensure_conversation(conversation)?;
        self.conn.execute(
            "UPDATE conversations SET time_window = ? WHERE id = ?",
            params![window.label(), conversation],
        )?;
        Ok(())
    }

    /// Lists standing instructions in the order they were added.
    pub fn instructions(&self, conversation: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT text FROM instructions WHERE conversation_id = ? ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([conversation], |row| row.get(0))?;
        let mut instructions = Vec::new();
        for row in rows {
            instructions.push(row?);
        }
        Ok(instructions)
    }

    /// Appends a standing instruction.
    pub fn add_instruction(&self, conversation: &str, text: &str) -> Result<(), DbError> {
        self.ensure_conversation(conversation)?;
        self.conn.execute(
            "INSERT INTO instructions (conversation_id, text) VALUES (?, ?)",
            params![conversation, text],
        )?;
        Ok(())
    }

    /// Replaces the instruction at `index`.
    pub fn replace_instruction(
        &self,
        conversation: &str,
        index: usize,
        text: &str,
    ) -> Result<(), DbError> {
        let id = self.instruction_id(conversation, index)?;
        self.conn
            .execute("UPDATE instructions SET text = ? WHERE id = ?", params![text, id])?;
        Ok(())
    }

    /// Removes the instruction at `index`; later instructions shift down.
    pub fn remove_instruction(&self, conversation: &str, index: usize) -> Result<(), DbError> {
        let id = self.instruction_id(conversation, index)?;
        self.conn
            .execute("DELETE FROM instructions WHERE id = ?", [id])?;
        Ok(())
    }

    fn instruction_id(&self, conversation: &str, index: usize) -> Result<i64, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM instructions WHERE conversation_id = ? ORDER BY id ASC",
        )?;
        let ids = stmt
            .query_map([conversation], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids.get(index).copied().ok_or(DbError::InstructionIndex {
            index,
            len: ids.len(),
        })
    }

    /// Sets or clears the instruction used for the next summary only.
    pub fn set_onetime_instruction(
        &self,
        conversation: &str,
        text: Option<&str>,
    ) -> Result<(), DbError> {
        self.ensure_conversation(conversation)?;
        self.conn.execute(
            "UPDATE conversations SET onetime_instruction = ? WHERE id = ?",
            params![text, conversation],
        )?;
        Ok(())
    }

    /// Reads and clears the one-time instruction in a single transaction.
    pub fn take_onetime_instruction(
        &mut self,
        conversation: &str,
    ) -> Result<Option<String>, DbError> {
        let tx = self.conn.transaction()?;
        let taken: Option<String> = tx
            .query_row(
                "SELECT onetime_instruction FROM conversations WHERE id = ?",
                [conversation],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        if taken.is_some() {
            tx.execute(
                "UPDATE conversations SET onetime_instruction = NULL WHERE id = ?",
                [conversation],
            )?;
        }
        tx.commit()?;
        Ok(taken)
    }

    /// Returns the last delivered instant for a chat within a conversation.
    pub fn cursor(
        &self,
        conversation: &str,
        chat_name: &str,
    ) -> Result<Option<NaiveDateTime>, DbError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT last_seen FROM cursors WHERE conversation_id = ? AND chat_name = ?",
                params![conversation, chat_name],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|value| {
                NaiveDateTime::parse_from_str(&value, CURSOR_FORMAT).map_err(|source| {
                    DbError::CursorParse {
                        chat: chat_name.to_string(),
                        value,
                        source,
                    }
                })
            })
            .transpose()
    }

    /// Stores the last delivered instant for a chat, replacing any previous one.
    pub fn store_cursor(
        &self,
        conversation: &str,
        chat_name: &str,
        last_seen: NaiveDateTime,
    ) -> Result<(), DbError> {
        self.ensure_conversation(conversation)?;
        let value = last_seen.format(CURSOR_FORMAT).to_string();
        self.conn.execute(
            "
            INSERT INTO cursors (conversation_id, chat_name, last_seen)
            VALUES (?, ?, ?)
            ON CONFLICT (conversation_id, chat_name) DO UPDATE SET last_seen = excluded.last_seen
            ",
            params![conversation, chat_name, value],
        )?;
        tracing::debug!(conversation, chat_name, %value, "stored cursor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|date| date.and_hms_opt(h, m, s))
            .expect("valid test timestamp")
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info")
            .collect::<Result<Vec<_>, _>>()
            .expect("collect columns");
        columns
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            table_columns(&db.conn, "conversations"),
            vec!["id", "time_window", "onetime_instruction"]
        );
        assert_eq!(
            table_columns(&db.conn, "instructions"),
            vec!["id", "conversation_id", "text"]
        );
        assert_eq!(
            table_columns(&db.conn, "cursors"),
            vec!["conversation_id", "chat_name", "last_seen"]
        );
    }

    #[test]
    fn unknown_conversation_has_default_settings() {
        let db = Database::open_in_memory().unwrap();
        let settings = db.settings("nobody").unwrap();
        assert_eq!(settings, ConversationSettings::default());
        assert_eq!(settings.window, TimeWindow::Auto);
    }

    #[test]
    fn window_roundtrips() {
        let db = Database::open_in_memory().unwrap();
        db.set_window("chat-1", TimeWindow::TwoWeeks).unwrap();
        assert_eq!(db.settings("chat-1").unwrap().window, TimeWindow::TwoWeeks);
        assert_eq!(db.settings("chat-2").unwrap().window, TimeWindow::Auto);
    }

    #[test]
    fn instructions_keep_order_and_shift_on_remove() {
        let db = Database::open_in_memory().unwrap();
        db.add_instruction("c", "first").unwrap();
        db.add_instruction("c", "second").unwrap();
        db.add_instruction("c", "third").unwrap();

        db.replace_instruction("c", 1, "middle").unwrap();
        assert_eq!(db.instructions("c").unwrap(), vec!["first", "middle", "third"]);

        db.remove_instruction("c", 0).unwrap();
        assert_eq!(db.instructions("c").unwrap(), vec!["middle", "third"]);

        let err = db.remove_instruction("c", 5).unwrap_err();
        assert!(matches!(err, DbError::InstructionIndex { index: 5, len: 2 }));
    }

    #[test]
    fn instructions_are_scoped_per_conversation() {
        let db = Database::open_in_memory().unwrap();
        db.add_instruction("a", "only a").unwrap();
        assert!(db.instructions("b").unwrap().is_empty());
        assert_eq!(db.settings("a").unwrap().instructions, vec!["only a"]);
    }

    #[test]
    fn onetime_instruction_is_consumed() {
        let mut db = Database::open_in_memory().unwrap();
        db.set_onetime_instruction("c", Some("focus on dates")).unwrap();
        assert_eq!(
            db.settings("c").unwrap().onetime_instruction.as_deref(),
            Some("focus on dates")
        );

        assert_eq!(
            db.take_onetime_instruction("c").unwrap().as_deref(),
            Some("focus on dates")
        );
        assert_eq!(db.take_onetime_instruction("c").unwrap(), None);
        assert_eq!(db.take_onetime_instruction("missing").unwrap(), None);
    }

    #[test]
    fn cursor_upserts_per_chat() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.cursor("c", "Family").unwrap(), None);

        db.store_cursor("c", "Family", at(9, 0, 0)).unwrap();
        db.store_cursor("c", "Work", at(10, 0, 0)).unwrap();
        db.store_cursor("c", "Family", at(11, 30, 15)).unwrap();

        assert_eq!(db.cursor("c", "Family").unwrap(), Some(at(11, 30, 15)));
        assert_eq!(db.cursor("c", "Work").unwrap(), Some(at(10, 0, 0)));
        assert_eq!(db.cursor("other", "Family").unwrap(), None);
    }

    #[test]
    fn cursor_keeps_subsecond_precision() {
        let db = Database::open_in_memory().unwrap();
        let precise = at(9, 0, 0) + chrono::Duration::milliseconds(250);
        db.store_cursor("c", "", precise).unwrap();
        assert_eq!(db.cursor("c", "").unwrap(), Some(precise));
    }

    #[test]
    fn corrupt_cursor_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.store_cursor("c", "Family", at(9, 0, 0)).unwrap();
        db.conn
            .execute("UPDATE cursors SET last_seen = 'yesterday'", [])
            .unwrap();
        let err = db.cursor("c", "Family").unwrap_err();
        assert!(matches!(err, DbError::CursorParse { .. }));
    }

    #[test]
    fn reopening_file_database_keeps_settings() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("digest.db");
        {
            let db = Database::open(&path).unwrap();
            db.set_window("c", TimeWindow::Week).unwrap();
            db.store_cursor("c", "Family", at(9, 0, 0)).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.settings("c").unwrap().window, TimeWindow::Week);
        assert_eq!(db.cursor("c", "Family").unwrap(), Some(at(9, 0, 0)));
    }
}
