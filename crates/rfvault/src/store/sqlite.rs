//! `SQLite`-backed durable key-value store.
//!
//! The on-device flash filesystem hosts a single small database holding one
//! `settings` table of key/value pairs. Batched snapshot rewrites run inside
//! a transaction so a power loss mid-save leaves the previous snapshot
//! intact.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::{Batch, KvStore};

/// SQL statement to create the settings table.
const CREATE_SETTINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// The current store layout version.
const CURRENT_VERSION: i64 = 1;

/// Key holding the layout version inside the settings table itself.
const VERSION_KEY: &str = "schemaVersion";

/// A durable key-value store backed by a `SQLite` database file.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates parent directories and the settings table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, or if it was
    /// written by an incompatible version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::StoreOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps the previous snapshot readable while a new one commits
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        initialize(&conn)?;

        info!("Store opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::StoreOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        initialize(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create the table and check the layout version.
fn initialize(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_SETTINGS_TABLE, [])?;

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match version {
        None => {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)",
                (VERSION_KEY, CURRENT_VERSION.to_string()),
            )?;
            Ok(())
        }
        Some(raw) => {
            let found: i64 = raw.parse().map_err(|_| Error::StoreValue {
                key: VERSION_KEY.to_string(),
                value: raw.clone(),
            })?;
            if found == CURRENT_VERSION {
                Ok(())
            } else {
                Err(Error::StoreVersion { found })
            }
        }
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }

    fn apply(&mut self, batch: &Batch) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut put = tx.prepare("INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)")?;
            for (key, value) in batch.puts() {
                put.execute((key, value))?;
            }
            let mut remove = tx.prepare("DELETE FROM settings WHERE key = ?1")?;
            for key in batch.removes() {
                remove.execute([key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
