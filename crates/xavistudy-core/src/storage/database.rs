//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - A local history of finished study sessions
//! - History statistics (daily and all-time)
//! - Key-value store for application state (e.g. the streak memo)
//!
//! The backend remains the source of truth; this is a device-local log.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::Result;
use crate::session::StudySession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub remote_id: String,
    pub deck_category: String,
    pub deck_math_topic: Option<String>,
    pub goal_minutes: u32,
    pub elapsed_secs: u64,
    pub cards_studied: u32,
    pub xavicoins: u32,
    pub goal_reached: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_study_secs: u64,
    pub total_cards: u64,
    pub total_xavicoins: u64,
    pub goals_reached: u64,
    pub today_sessions: u64,
    pub today_study_secs: u64,
}

/// SQLite database for local session history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/xavistudy/xavistudy.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("xavistudy.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                remote_id     TEXT NOT NULL,
                deck_category TEXT NOT NULL,
                deck_math_topic TEXT,
                goal_minutes  INTEGER NOT NULL,
                elapsed_secs  INTEGER NOT NULL,
                cards_studied INTEGER NOT NULL,
                xavicoins     INTEGER NOT NULL,
                goal_reached  INTEGER NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    /// Record a finished session. Sessions without a committed outcome
    /// (cancelled, still running) are not recorded.
    ///
    /// Returns the new row id, or `None` if there was nothing to record.
    pub fn record_session(
        &self,
        session: &StudySession,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let Some(outcome) = session.outcome.as_ref() else {
            return Ok(None);
        };
        self.conn.execute(
            "INSERT INTO sessions (remote_id, deck_category, deck_math_topic, goal_minutes,
                                   elapsed_secs, cards_studied, xavicoins, goal_reached, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                outcome.remote_id.0,
                session.deck_category,
                session.deck_math_topic,
                session.session_goal_minutes,
                outcome.elapsed_seconds as i64,
                outcome.cards_studied,
                outcome.reward.xavicoins,
                outcome.reward.time_bonus_achieved,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(Some(self.conn.last_insert_rowid()))
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, remote_id, deck_category, deck_math_topic, goal_minutes, elapsed_secs,
                    cards_studied, xavicoins, goal_reached, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let completed: String = row.get(9)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        9,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(SessionRecord {
                id: row.get(0)?,
                remote_id: row.get(1)?,
                deck_category: row.get(2)?,
                deck_math_topic: row.get(3)?,
                goal_minutes: row.get(4)?,
                elapsed_secs: row.get::<_, i64>(5)? as u64,
                cards_studied: row.get(6)?,
                xavicoins: row.get(7)?,
                goal_reached: row.get(8)?,
                completed_at,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// All-time and today's totals. "Today" starts at UTC midnight of `now`.
    pub fn stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let mut stats = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(elapsed_secs), 0), COALESCE(SUM(cards_studied), 0),
                    COALESCE(SUM(xavicoins), 0), COALESCE(SUM(goal_reached), 0)
             FROM sessions",
            [],
            |row| {
                Ok(Stats {
                    total_sessions: row.get::<_, i64>(0)? as u64,
                    total_study_secs: row.get::<_, i64>(1)? as u64,
                    total_cards: row.get::<_, i64>(2)? as u64,
                    total_xavicoins: row.get::<_, i64>(3)? as u64,
                    goals_reached: row.get::<_, i64>(4)? as u64,
                    ..Stats::default()
                })
            },
        )?;

        let today = now.format("%Y-%m-%d").to_string();
        let (count, secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(elapsed_secs), 0)
             FROM sessions
             WHERE completed_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        stats.today_sessions = count as u64;
        stats.today_study_secs = secs as u64;
        Ok(stats)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
