//! Durable key-value storage.
//!
//! The archive persists itself as a flat set of string keys in a durable
//! map. This module defines the [`KvStore`] trait that abstracts the map,
//! the [`Batch`] type for atomic full-snapshot rewrites, and an in-memory
//! implementation for tests. The SQLite-backed implementation used on real
//! devices lives in [`sqlite`].

pub mod sqlite;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

pub use sqlite::SqliteStore;

/// Store key names.
///
/// The layout is one counter (`signalCount`), the name/key counter
/// (`nextId`), a fixed set of fields per archived entry (`sig{i}_*`), and
/// three independent flags. Every save rewrites the whole entry range.
pub mod keys {
    /// Number of persisted archive entries.
    pub const SIGNAL_COUNT: &str = "signalCount";
    /// The auto-name / stable-key counter.
    pub const NEXT_ID: &str = "nextId";
    /// Buzzer feedback flag.
    pub const BUZZER_ENABLED: &str = "buzzerEnabled";
    /// LED feedback flag.
    pub const LED_ENABLED: &str = "ledEnabled";
    /// Capture-armed flag.
    pub const SNIFFING_ENABLED: &str = "sniffingEnabled";

    /// Per-entry field suffixes.
    pub const FIELD_NAME: &str = "name";
    /// Code payload field.
    pub const FIELD_VALUE: &str = "val";
    /// Bit-length field.
    pub const FIELD_BITS: &str = "bits";
    /// Protocol identifier field.
    pub const FIELD_PROTO: &str = "proto";
    /// Capture timestamp field.
    pub const FIELD_TIME: &str = "time";
    /// Favorite flag field.
    pub const FIELD_FAV: &str = "fav";
    /// Stable key field.
    pub const FIELD_KEY: &str = "key";

    /// All per-entry field suffixes, used when clearing stale entries.
    pub const ENTRY_FIELDS: &[&str] = &[
        FIELD_NAME,
        FIELD_VALUE,
        FIELD_BITS,
        FIELD_PROTO,
        FIELD_TIME,
        FIELD_FAV,
        FIELD_KEY,
    ];

    /// Build the store key for field `field` of entry `index`.
    #[must_use]
    pub fn entry(index: usize, field: &str) -> String {
        format!("sig{index}_{field}")
    }
}

/// A set of puts and removals applied as one durable unit.
#[derive(Debug, Default)]
pub struct Batch {
    puts: Vec<(String, String)>,
    removes: Vec<String>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a string put.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.puts.push((key.into(), value.into()));
    }

    /// Queue an integer put.
    pub fn put_u64(&mut self, key: impl Into<String>, value: u64) {
        self.put(key, value.to_string());
    }

    /// Queue a boolean put.
    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.put(key, if value { "true" } else { "false" });
    }

    /// Queue a removal.
    pub fn remove(&mut self, key: impl Into<String>) {
        self.removes.push(key.into());
    }

    /// The queued puts.
    #[must_use]
    pub fn puts(&self) -> &[(String, String)] {
        &self.puts
    }

    /// The queued removals.
    #[must_use]
    pub fn removes(&self) -> &[String] {
        &self.removes
    }

    /// Check whether the batch contains no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.removes.is_empty()
    }
}

/// A durable map of string keys to string values.
///
/// Values survive power loss. Typed accessors parse on read; a value that
/// fails to parse surfaces as [`Error::StoreValue`] so callers can decide
/// whether to skip or abort.
pub trait KvStore: Send + std::fmt::Debug {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Apply a batch of puts and removals as one durable unit.
    ///
    /// The default implementation applies the operations one by one;
    /// implementations with transactions should override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn apply(&mut self, batch: &Batch) -> Result<()> {
        for (key, value) in batch.puts() {
            self.put(key, value)?;
        }
        for key in batch.removes() {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Read a value as a `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreValue`] if the stored value does not parse.
    fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| Error::StoreValue {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// Read a value as a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreValue`] if the stored value does not parse.
    fn get_u32(&self, key: &str) -> Result<Option<u32>> {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| Error::StoreValue {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// Read a value as a bool (`"true"` / `"false"`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreValue`] if the stored value is neither.
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => match raw.as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(Error::StoreValue {
                    key: key.to_string(),
                    value: raw,
                }),
            },
        }
    }

    /// Write a `u64` value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn put_u64(&mut self, key: &str, value: u64) -> Result<()> {
        self.put(key, &value.to_string())
    }

    /// Write a boolean value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn put_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.put(key, if value { "true" } else { "false" })
    }
}

/// An in-memory store for tests.
///
/// Clones share the same underlying map, so a test can keep a handle while
/// the archive owns another and later "reboot" against the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
