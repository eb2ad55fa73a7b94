//! The signal archive.
//!
//! This module holds the bounded, deduplicated, ordered collection of
//! captured signals together with its eviction, purge, and persistence
//! logic. The archive is the single shared mutable resource of the service:
//! callers wrap it in `Arc<Mutex<Archive>>` and every operation, including
//! its store write, runs under that one lock.
//!
//! Persistence is a full snapshot after every mutation. A failed store
//! write is logged and the in-memory state stays authoritative, so the
//! archive keeps working when flash is degraded.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::signal::{RfCode, Signal};
use crate::store::{keys, Batch, KvStore};

/// Capacity bounds for the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Hard capacity; the archive never grows past this.
    pub max_signals: usize,
    /// Soft watermark; reaching it triggers eviction before the next insert.
    pub cleanup_threshold: usize,
}

impl Limits {
    /// Default hard capacity.
    pub const DEFAULT_MAX_SIGNALS: usize = 1000;
    /// Default soft watermark (95% of capacity).
    pub const DEFAULT_CLEANUP_THRESHOLD: usize = 950;

    /// How many signals one eviction pass tries to remove (20% of capacity).
    #[must_use]
    pub fn evict_quota(&self) -> usize {
        self.max_signals / 5
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_signals: Self::DEFAULT_MAX_SIGNALS,
            cleanup_threshold: Self::DEFAULT_CLEANUP_THRESHOLD,
        }
    }
}

/// What happened to an insert candidate.
///
/// `Duplicate` and `StorageFull` are normal outcomes, not errors: capture
/// keeps running either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The code was appended; carries the new archive size.
    Stored(usize),
    /// An equal triple is already archived; nothing changed.
    Duplicate,
    /// Capacity exhausted even after eviction; nothing changed.
    StorageFull,
}

impl InsertOutcome {
    /// Check whether the candidate was actually stored.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// The bounded, deduplicated collection of captured signals.
///
/// Insertion order is significant: it drives display ids and survives
/// eviction (victims are selected by age, survivors keep their relative
/// order). Each signal also carries an immutable key from a monotonic
/// counter, which is what delete/rename/favorite look up — display
/// positions shift after a delete, keys never do.
pub struct Archive {
    signals: Vec<Signal>,
    next_key: u64,
    limits: Limits,
    store: Box<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("signals", &self.signals.len())
            .field("next_key", &self.next_key)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Archive {
    /// Rehydrate the archive from the durable store.
    ///
    /// Entries with missing fields, a zero code value, or unparsable values
    /// are skipped with a warning; they never reach the collection. The key
    /// counter self-heals to stay above every loaded key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself fails (not if individual
    /// entries are malformed).
    pub fn load(store: Box<dyn KvStore>, clock: Arc<dyn Clock>, limits: Limits) -> Result<Self> {
        let count = store
            .get_u64(keys::SIGNAL_COUNT)?
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let mut next_key = store.get_u64(keys::NEXT_ID)?.unwrap_or(0);

        let mut signals = Vec::with_capacity(count.min(limits.max_signals));
        for index in 0..count {
            match read_entry(store.as_ref(), index) {
                Ok(Some(signal)) => signals.push(signal),
                Ok(None) => warn!(index, "skipping stored entry with missing fields"),
                Err(err @ Error::StoreValue { .. }) => {
                    warn!(index, %err, "skipping malformed stored entry");
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(max_key) = signals.iter().map(|s| s.key).max() {
            if max_key >= next_key {
                next_key = max_key + 1;
            }
        }

        info!("Loaded {} signals from store", signals.len());
        Ok(Self {
            signals,
            next_key,
            limits,
            store,
            clock,
        })
    }

    /// Insert a freshly decoded code.
    ///
    /// Runs the dedup scan, evicts at the watermark, and appends with an
    /// auto-generated name. The candidate must not be decode noise (zero
    /// value); the capture pipeline filters noise before calling this.
    pub fn insert(&mut self, code: RfCode) -> InsertOutcome {
        debug_assert!(!code.is_noise());

        if self.signals.iter().any(|s| s.code == code) {
            debug!(%code, "duplicate code ignored");
            return InsertOutcome::Duplicate;
        }

        if self.signals.len() >= self.limits.cleanup_threshold {
            let evicted = self.evict();
            debug!(evicted, "watermark reached, evicted before insert");
        }

        if self.signals.len() >= self.limits.max_signals {
            warn!(%code, "archive full, code not stored");
            return InsertOutcome::StorageFull;
        }

        let key = self.next_key;
        self.next_key += 1;
        let signal = Signal::new(key, Signal::auto_name(key), code, self.clock.now_ms());
        info!(key, %code, "stored signal");
        self.signals.push(signal);
        self.persist();
        InsertOutcome::Stored(self.signals.len())
    }

    /// Evict the oldest non-favorite signals.
    ///
    /// Removes up to 20% of capacity, fewer if there aren't that many
    /// non-favorites. Favorites are never touched, so the quota may go
    /// under-filled. Returns how many signals were removed.
    pub fn evict(&mut self) -> usize {
        let quota = self.limits.evict_quota();
        let mut candidates: Vec<(u64, u64)> = self
            .signals
            .iter()
            .filter(|s| !s.favorite)
            .map(|s| (s.captured_at_ms, s.key))
            .collect();
        candidates.sort_unstable();
        candidates.truncate(quota);
        if candidates.is_empty() {
            return 0;
        }

        let victims: HashSet<u64> = candidates.into_iter().map(|(_, key)| key).collect();
        let before = self.signals.len();
        self.signals.retain(|s| !victims.contains(&s.key));
        let evicted = before - self.signals.len();

        info!(evicted, remaining = self.signals.len(), "evicted oldest non-favorite signals");
        self.persist();
        evicted
    }

    /// Remove all non-favorite signals older than `max_age_ms`.
    ///
    /// Age is measured on the monotonic uptime clock with saturating
    /// arithmetic, so entries stamped before the current boot simply read
    /// as very old. Returns how many signals were removed.
    pub fn purge_older_than(&mut self, max_age_ms: u64) -> usize {
        let now = self.clock.now_ms();
        let before = self.signals.len();
        self.signals
            .retain(|s| s.favorite || now.saturating_sub(s.captured_at_ms) <= max_age_ms);
        let removed = before - self.signals.len();
        if removed > 0 {
            info!(removed, max_age_ms, "purged old signals");
            self.persist();
        }
        removed
    }

    /// Delete the signal with the given key.
    ///
    /// Display positions of later signals shift down by one; keys are
    /// unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if no signal has that key.
    pub fn delete(&mut self, key: u64) -> Result<()> {
        let index = self.position(key)?;
        self.signals.remove(index);
        self.persist();
        Ok(())
    }

    /// Rename the signal with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] if the name is empty and
    /// [`Error::InvalidId`] if no signal has that key.
    pub fn rename(&mut self, key: u64, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::MissingParameter { name: "name" });
        }
        let index = self.position(key)?;
        self.signals[index].name = name.to_string();
        self.persist();
        Ok(())
    }

    /// Set or clear the favorite flag of the signal with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if no signal has that key.
    pub fn set_favorite(&mut self, key: u64, favorite: bool) -> Result<()> {
        let index = self.position(key)?;
        self.signals[index].favorite = favorite;
        self.persist();
        Ok(())
    }

    /// Empty the archive and reset the key counter.
    pub fn clear(&mut self) {
        self.signals.clear();
        self.next_key = 0;
        info!("archive cleared");
        self.persist();
    }

    /// The archived signals in display order.
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Look up a signal by its key.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<&Signal> {
        self.signals.iter().find(|s| s.key == key)
    }

    /// Number of archived signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Check whether the archive is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Number of favorites.
    #[must_use]
    pub fn favorite_count(&self) -> usize {
        self.signals.iter().filter(|s| s.favorite).count()
    }

    /// The configured capacity bounds.
    #[must_use]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Write a process-wide flag to the store.
    ///
    /// The archive owns the store handle, so flag writes funnel through it
    /// under the same lock as snapshots. A failed write is logged and the
    /// in-memory value stays authoritative.
    pub fn persist_flag(&mut self, key: &'static str, value: bool) {
        if let Err(err) = self.store.put_bool(key, value) {
            warn!(%err, key, "flag write failed, keeping in-memory value");
        }
    }

    fn position(&self, key: u64) -> Result<usize> {
        self.signals
            .iter()
            .position(|s| s.key == key)
            .ok_or(Error::InvalidId { key })
    }

    /// Persist a full snapshot, logging instead of failing.
    fn persist(&mut self) {
        if let Err(err) = self.write_snapshot() {
            warn!(%err, "store write failed, keeping in-memory archive authoritative");
        }
    }

    /// Rewrite the whole snapshot: counters, every entry, and removal of
    /// stale per-index keys left over from a previously larger snapshot.
    fn write_snapshot(&mut self) -> Result<()> {
        let previous = self
            .store
            .get_u64(keys::SIGNAL_COUNT)
            .ok()
            .flatten()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);

        let mut batch = Batch::new();
        batch.put_u64(
            keys::SIGNAL_COUNT,
            u64::try_from(self.signals.len()).unwrap_or(u64::MAX),
        );
        batch.put_u64(keys::NEXT_ID, self.next_key);

        for (index, signal) in self.signals.iter().enumerate() {
            batch.put(keys::entry(index, keys::FIELD_NAME), signal.name.clone());
            batch.put_u64(keys::entry(index, keys::FIELD_VALUE), signal.code.value);
            batch.put_u64(
                keys::entry(index, keys::FIELD_BITS),
                u64::from(signal.code.bit_length),
            );
            batch.put_u64(
                keys::entry(index, keys::FIELD_PROTO),
                u64::from(signal.code.protocol),
            );
            batch.put_u64(keys::entry(index, keys::FIELD_TIME), signal.captured_at_ms);
            batch.put_bool(keys::entry(index, keys::FIELD_FAV), signal.favorite);
            batch.put_u64(keys::entry(index, keys::FIELD_KEY), signal.key);
        }

        for index in self.signals.len()..previous {
            for field in keys::ENTRY_FIELDS {
                batch.remove(keys::entry(index, field));
            }
        }

        self.store.apply(&batch)
    }
}

/// Read one persisted entry, returning `None` when fields are missing or
/// the value is zero (a noise reading that must never rehydrate).
fn read_entry(store: &dyn KvStore, index: usize) -> Result<Option<Signal>> {
    let Some(value) = store.get_u64(&keys::entry(index, keys::FIELD_VALUE))? else {
        return Ok(None);
    };
    if value == 0 {
        return Ok(None);
    }
    let Some(bit_length) = store.get_u32(&keys::entry(index, keys::FIELD_BITS))? else {
        return Ok(None);
    };
    let Some(protocol) = store.get_u32(&keys::entry(index, keys::FIELD_PROTO))? else {
        return Ok(None);
    };
    let Some(captured_at_ms) = store.get_u64(&keys::entry(index, keys::FIELD_TIME))? else {
        return Ok(None);
    };
    let Some(key) = store.get_u64(&keys::entry(index, keys::FIELD_KEY))? else {
        return Ok(None);
    };
    let name = store
        .get(&keys::entry(index, keys::FIELD_NAME))?
        .unwrap_or_else(|| Signal::auto_name(key));
    let favorite = store
        .get_bool(&keys::entry(index, keys::FIELD_FAV))?
        .unwrap_or(false);

    Ok(Some(Signal {
        key,
        name,
        code: RfCode::new(value, bit_length, protocol),
        captured_at_ms,
        favorite,
    }))
}
