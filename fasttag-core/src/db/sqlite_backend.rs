//! SQLite storage backend
//!
//! Mirrors browser local storage: a single key/value table in which the
//! company collection is stored as one JSON document under [`STORAGE_KEY`].

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::migration::normalize_legacy;
use super::traits::{BackendType, PersistencePort};
use crate::models::{Company, STORAGE_KEY};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

/// SQLite backend implementation
pub struct SqliteBackend {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Opens (or creates) the database and ensures the table exists
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open SQLite database {:?}", path))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }

    /// Reads a raw value from the key/value table
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Writes a raw value, replacing any previous one
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

impl PersistencePort for SqliteBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Sqlite
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn load(&self) -> Result<Vec<Company>> {
        let Some(json) = self.get_value(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        let raw: serde_json::Value =
            serde_json::from_str(&json).context("Failed to parse stored company JSON")?;
        normalize_legacy(raw)
    }

    fn save(&self, companies: &[Company]) -> Result<()> {
        let json = serde_json::to_string(companies).context("Failed to serialize companies")?;
        self.set_value(STORAGE_KEY, &json)
    }

    fn exists(&self) -> bool {
        matches!(self.get_value(STORAGE_KEY), Ok(Some(_)))
    }
}
