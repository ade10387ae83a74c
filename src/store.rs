use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::{DigestRecord, Preferences, StatusMap, CHECKLIST};
use crate::scoring::MAX_SCORE;

pub const PREFERENCES_KEY: &str = "preferences";
pub const JOB_STATUS_KEY: &str = "jobStatus";
pub const CHECKLIST_KEY: &str = "testChecklistState";
pub const SAVED_JOBS_KEY: &str = "savedJobs";

pub fn digest_key(date: NaiveDate) -> String {
    format!("digest:{}", date.format("%Y-%m-%d"))
}

/// Key-value store backed by a single SQLite table. Every write is one
/// statement, so each slot is replaced atomically and nothing more.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    // --- Raw slots ---

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read '{}'", key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                params![key, value],
            )
            .with_context(|| format!("Failed to write '{}'", key))?;
        tracing::debug!(key, bytes = value.len(), "store write");
        Ok(())
    }

    /// Absent or unparseable slots read as `None`; the caller substitutes its default.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed stored value");
                Ok(None)
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode '{}'", key))?;
        self.set(key, &raw)
    }

    // --- Typed slots ---

    /// A minimum score outside 0..=100 resets to the default threshold.
    pub fn load_preferences(&self) -> Result<Preferences> {
        let mut prefs: Preferences = self.get_json(PREFERENCES_KEY)?.unwrap_or_default();
        if prefs.min_match_score > MAX_SCORE {
            tracing::warn!(stored = prefs.min_match_score, "minimum match score out of range, using default");
            prefs.min_match_score = Preferences::default().min_match_score;
        }
        Ok(prefs)
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        self.set_json(PREFERENCES_KEY, prefs)
    }

    pub fn load_statuses(&self) -> Result<StatusMap> {
        Ok(self.get_json(JOB_STATUS_KEY)?.unwrap_or_default())
    }

    pub fn save_statuses(&self, statuses: &StatusMap) -> Result<()> {
        self.set_json(JOB_STATUS_KEY, statuses)
    }

    pub fn load_digest(&self, date: NaiveDate) -> Result<Option<DigestRecord>> {
        self.get_json(&digest_key(date))
    }

    pub fn save_digest(&self, record: &DigestRecord) -> Result<()> {
        self.set_json(&digest_key(record.date), record)
    }

    /// One flag per checklist item; resized if the stored list is the wrong length.
    pub fn load_checklist(&self) -> Result<Vec<bool>> {
        let mut flags: Vec<bool> = self.get_json(CHECKLIST_KEY)?.unwrap_or_default();
        if flags.len() != CHECKLIST.len() {
            if !flags.is_empty() {
                tracing::warn!(stored = flags.len(), expected = CHECKLIST.len(), "resizing checklist state");
            }
            flags.resize(CHECKLIST.len(), false);
        }
        Ok(flags)
    }

    pub fn save_checklist(&self, flags: &[bool]) -> Result<()> {
        self.set_json(CHECKLIST_KEY, &flags)
    }

    pub fn load_saved_jobs(&self) -> Result<Vec<i64>> {
        Ok(self.get_json(SAVED_JOBS_KEY)?.unwrap_or_default())
    }

    pub fn save_saved_jobs(&self, ids: &[i64]) -> Result<()> {
        self.set_json(SAVED_JOBS_KEY, &ids)
    }
}

#[cfg(test)]
impl Store {
    /// Make every later write fail while reads keep working.
    pub(crate) fn reject_writes(&self) {
        self.conn.execute_batch("PRAGMA query_only = ON;").unwrap();
    }
}
