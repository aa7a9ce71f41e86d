//! Memo of the last day a streak update was attempted.
//!
//! The key is `"{user_id}-{YYYY-MM-DD}"`, so a new calendar day (or a
//! different user) never matches the stored key and the memo clears itself
//! implicitly.

use std::sync::Mutex;

use chrono::NaiveDate;

use crate::ports::UserId;
use crate::storage::Database;

const KV_KEY: &str = "streak_last_update_key";

pub fn update_key(user_id: &UserId, date: NaiveDate) -> String {
    format!("{}-{}", user_id, date.format("%Y-%m-%d"))
}

pub trait StreakMemo: Send + Sync {
    fn last_update_key(&self) -> Option<String>;
    fn set_last_update_key(&self, key: &str);
}

/// Process-lifetime memo.
#[derive(Debug, Default)]
pub struct InMemoryMemo {
    key: Mutex<Option<String>>,
}

impl InMemoryMemo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreakMemo for InMemoryMemo {
    fn last_update_key(&self) -> Option<String> {
        self.key.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_last_update_key(&self, key: &str) {
        *self.key.lock().unwrap_or_else(|e| e.into_inner()) = Some(key.to_string());
    }
}

/// Memo persisted in the local kv table, so separate CLI runs on the same
/// day share it.
pub struct KvStreakMemo {
    db: Mutex<Database>,
}

impl KvStreakMemo {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl StreakMemo for KvStreakMemo {
    fn last_update_key(&self) -> Option<String> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        match db.kv_get(KV_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read streak memo");
                None
            }
        }
    }

    fn set_last_update_key(&self, key: &str) {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = db.kv_set(KV_KEY, key) {
            tracing::warn!(error = %e, "failed to persist streak memo");
        }
    }
}
