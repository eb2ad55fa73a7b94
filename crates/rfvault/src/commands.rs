//! The command surface.
//!
//! A flat set of operations the request router (or the maintenance CLI)
//! invokes on behalf of the operator. Each operation validates its inputs
//! and delegates to the archive or the toggles; the views it returns are
//! serializable so the router can hand them straight to the wire.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::archive::Archive;
use crate::error::{Error, Result};
use crate::feedback::{Feedback, TRANSMIT_FLASH};
use crate::pipeline::LastSeen;
use crate::radio::Transceiver;
use crate::signal::Signal;
use crate::store::keys;
use crate::toggles::Toggles;

/// Default age threshold for the purge operation, in days.
pub const DEFAULT_PURGE_DAYS: u64 = 7;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// A point-in-time view of the service, as reported by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Whether capture is armed.
    pub sniffing: bool,
    /// Whether the buzzer feedback channel is enabled.
    pub buzzer: bool,
    /// Whether the LED feedback channel is enabled.
    pub led: bool,
    /// Number of archived signals.
    pub signal_count: usize,
    /// Hard archive capacity.
    pub max_signals: usize,
    /// Archive fill level as a percentage of capacity.
    pub storage_used: f32,
    /// Number of favorites.
    pub favorite_count: usize,
    /// Uptime of the last real decode, absent when none seen since boot.
    pub last_signal: Option<u64>,
}

/// One archived signal as presented to the operator.
///
/// `id` is the display position, which shifts after deletes; `key` is the
/// stable identity every mutating operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalView {
    /// Display position in the archive.
    pub id: usize,
    /// Stable signal key.
    pub key: u64,
    /// Display label.
    pub name: String,
    /// Code payload.
    pub value: u64,
    /// Number of significant bits in `value`.
    pub bit_length: u32,
    /// Transceiver protocol identifier.
    pub protocol: u32,
    /// Capture time in milliseconds of device uptime.
    pub timestamp: u64,
    /// Whether the signal is exempt from eviction and purge.
    pub is_favorite: bool,
}

impl SignalView {
    fn new(id: usize, signal: &Signal) -> Self {
        Self {
            id,
            key: signal.key,
            name: signal.name.clone(),
            value: signal.code.value,
            bit_length: signal.code.bit_length,
            protocol: signal.code.protocol,
            timestamp: signal.captured_at_ms,
            is_favorite: signal.favorite,
        }
    }
}

/// The operations exposed to the request router.
///
/// Cloneable; clones share the same archive, toggles, and transceiver.
#[derive(Debug, Clone)]
pub struct Commands {
    archive: Arc<Mutex<Archive>>,
    toggles: Arc<Toggles>,
    feedback: Arc<dyn Feedback>,
    last_seen: Arc<LastSeen>,
    radio: Option<Arc<Mutex<dyn Transceiver>>>,
}

impl Commands {
    /// Assemble the command surface around the shared service state.
    ///
    /// Without a transceiver (the maintenance CLI runs with none attached),
    /// every operation works except `transmit`.
    #[must_use]
    pub fn new(
        archive: Arc<Mutex<Archive>>,
        toggles: Arc<Toggles>,
        feedback: Arc<dyn Feedback>,
        last_seen: Arc<LastSeen>,
    ) -> Self {
        Self {
            archive,
            toggles,
            feedback,
            last_seen,
            radio: None,
        }
    }

    /// Attach the transceiver used by `transmit`.
    #[must_use]
    pub fn with_transceiver(mut self, radio: Arc<Mutex<dyn Transceiver>>) -> Self {
        self.radio = Some(radio);
        self
    }

    /// Report the service state.
    #[must_use]
    pub fn status(&self) -> Status {
        let archive = self.archive.lock();
        let limits = archive.limits();
        #[allow(clippy::cast_precision_loss)]
        let storage_used = archive.len() as f32 / limits.max_signals as f32 * 100.0;

        Status {
            sniffing: self.toggles.sniffing(),
            buzzer: self.toggles.buzzer(),
            led: self.toggles.led(),
            signal_count: archive.len(),
            max_signals: limits.max_signals,
            storage_used,
            favorite_count: archive.favorite_count(),
            last_signal: self.last_seen.get(),
        }
    }

    /// The archived signals in display order.
    #[must_use]
    pub fn list(&self) -> Vec<SignalView> {
        self.archive
            .lock()
            .signals()
            .iter()
            .enumerate()
            .map(|(id, signal)| SignalView::new(id, signal))
            .collect()
    }

    /// Arm or disarm capture, persisting the flag.
    pub fn set_sniffing(&self, enabled: bool) {
        self.toggles.set_sniffing(enabled);
        self.archive
            .lock()
            .persist_flag(keys::SNIFFING_ENABLED, enabled);
        info!(enabled, "sniffing toggled");
    }

    /// Enable or disable the buzzer, persisting the flag.
    pub fn set_buzzer(&self, enabled: bool) {
        self.toggles.set_buzzer(enabled);
        self.archive
            .lock()
            .persist_flag(keys::BUZZER_ENABLED, enabled);
        info!(enabled, "buzzer toggled");
    }

    /// Enable or disable the LED, persisting the flag.
    pub fn set_led(&self, enabled: bool) {
        self.toggles.set_led(enabled);
        self.archive.lock().persist_flag(keys::LED_ENABLED, enabled);
        info!(enabled, "LED toggled");
    }

    /// Encode and send the signal with the given key over the air.
    ///
    /// The code is resolved under the archive lock; the lock is released
    /// before the transceiver is driven and feedback fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if no signal has that key, and
    /// [`Error::Transmit`] if no transceiver is attached or the driver
    /// fails.
    pub async fn transmit(&self, key: u64) -> Result<()> {
        let code = {
            let archive = self.archive.lock();
            archive
                .get(key)
                .map(|signal| signal.code)
                .ok_or(Error::InvalidId { key })?
        };

        let radio = self
            .radio
            .as_ref()
            .ok_or_else(|| Error::transmit("no transceiver attached"))?;
        radio.lock().transmit(&code)?;
        info!(key, %code, "transmitted signal");

        if self.toggles.buzzer() {
            self.feedback.transmit_tone().await;
        }
        if self.toggles.led() {
            let (duration, times) = TRANSMIT_FLASH;
            self.feedback.flash(duration, times).await;
        }
        Ok(())
    }

    /// Delete the signal with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if no signal has that key.
    pub fn delete(&self, key: u64) -> Result<()> {
        self.archive.lock().delete(key)
    }

    /// Rename the signal with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] if the name is empty and
    /// [`Error::InvalidId`] if no signal has that key.
    pub fn rename(&self, key: u64, name: &str) -> Result<()> {
        self.archive.lock().rename(key, name)
    }

    /// Set or clear the favorite flag of the signal with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if no signal has that key.
    pub fn set_favorite(&self, key: u64, favorite: bool) -> Result<()> {
        self.archive.lock().set_favorite(key, favorite)
    }

    /// Empty the archive.
    pub fn clear_all(&self) {
        self.archive.lock().clear();
    }

    /// Run one manual eviction pass. Returns how many signals were removed.
    pub fn cleanup_now(&self) -> usize {
        self.archive.lock().evict()
    }

    /// Remove non-favorite signals older than the given number of days
    /// (default 7). Returns how many signals were removed.
    pub fn purge_older_than(&self, days: Option<u64>) -> usize {
        let days = days.unwrap_or(DEFAULT_PURGE_DAYS);
        self.archive
            .lock()
            .purge_older_than(days.saturating_mul(MS_PER_DAY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Limits;
    use crate::clock::ManualClock;
    use crate::feedback::testing::CountingFeedback;
    use crate::radio::testing::ScriptedRadio;
    use crate::signal::RfCode;
    use crate::store::{KvStore, MemoryStore};

    struct Harness {
        commands: Commands,
        archive: Arc<Mutex<Archive>>,
        toggles: Arc<Toggles>,
        feedback: Arc<CountingFeedback>,
        last_seen: Arc<LastSeen>,
        radio: Arc<Mutex<ScriptedRadio>>,
        store: MemoryStore,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(0));
        let archive = Arc::new(Mutex::new(
            Archive::load(Box::new(store.clone()), clock.clone(), Limits::default()).unwrap(),
        ));
        let toggles = Arc::new(Toggles::default());
        let feedback = Arc::new(CountingFeedback::default());
        let last_seen = Arc::new(LastSeen::new());
        let radio = Arc::new(Mutex::new(ScriptedRadio::default()));

        let commands = Commands::new(
            archive.clone(),
            toggles.clone(),
            feedback.clone(),
            last_seen.clone(),
        )
        .with_transceiver(radio.clone());

        Harness {
            commands,
            archive,
            toggles,
            feedback,
            last_seen,
            radio,
            store,
            clock,
        }
    }

    fn code(n: u64) -> RfCode {
        RfCode::new(n, 24, 1)
    }

    fn insert(h: &Harness, n: u64) {
        assert!(h.archive.lock().insert(code(n)).is_stored());
    }

    #[test]
    fn test_status_on_empty_service() {
        let h = harness();
        let status = h.commands.status();

        assert!(status.sniffing);
        assert!(status.buzzer);
        assert!(status.led);
        assert_eq!(status.signal_count, 0);
        assert_eq!(status.max_signals, 1000);
        assert_eq!(status.storage_used, 0.0);
        assert_eq!(status.favorite_count, 0);
        assert_eq!(status.last_signal, None);
    }

    #[test]
    fn test_status_reflects_archive_and_last_seen() {
        let h = harness();
        for n in 1..=10 {
            insert(&h, n);
        }
        h.commands.set_favorite(3, true).unwrap();
        h.last_seen.mark(4_000);

        let status = h.commands.status();
        assert_eq!(status.signal_count, 10);
        assert_eq!(status.storage_used, 1.0);
        assert_eq!(status.favorite_count, 1);
        assert_eq!(status.last_signal, Some(4_000));
    }

    #[test]
    fn test_list_assigns_display_ids_in_order() {
        let h = harness();
        for n in 1..=3 {
            insert(&h, n);
        }
        h.commands.delete(0).unwrap();

        let views = h.commands.list();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, 0);
        assert_eq!(views[0].key, 1);
        assert_eq!(views[1].id, 1);
        assert_eq!(views[1].key, 2);
        assert_eq!(views[1].name, "Signal_2");
        assert_eq!(views[1].value, 3);
    }

    #[test]
    fn test_toggle_setters_persist_flags() {
        let h = harness();

        h.commands.set_sniffing(false);
        h.commands.set_buzzer(false);
        h.commands.set_led(false);

        assert!(!h.toggles.sniffing());
        assert_eq!(h.store.get_bool(keys::SNIFFING_ENABLED).unwrap(), Some(false));
        assert_eq!(h.store.get_bool(keys::BUZZER_ENABLED).unwrap(), Some(false));
        assert_eq!(h.store.get_bool(keys::LED_ENABLED).unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_transmit_sends_and_fires_feedback() {
        let h = harness();
        insert(&h, 42);

        h.commands.transmit(0).await.unwrap();

        assert_eq!(h.radio.lock().sent, vec![code(42)]);
        assert_eq!(h.feedback.transmit_tones(), 1);
        assert_eq!(h.feedback.flashes(), 1);
    }

    #[tokio::test]
    async fn test_transmit_feedback_respects_toggles() {
        let h = harness();
        insert(&h, 42);
        h.toggles.set_buzzer(false);
        h.toggles.set_led(false);

        h.commands.transmit(0).await.unwrap();

        assert_eq!(h.radio.lock().sent.len(), 1);
        assert_eq!(h.feedback.transmit_tones(), 0);
        assert_eq!(h.feedback.flashes(), 0);
    }

    #[tokio::test]
    async fn test_transmit_unknown_key() {
        let h = harness();

        let err = h.commands.transmit(7).await.unwrap_err();
        assert!(err.is_invalid_id());
        assert!(h.radio.lock().sent.is_empty());
    }

    #[tokio::test]
    async fn test_transmit_without_transceiver() {
        let h = harness();
        insert(&h, 42);

        let headless = Commands::new(
            h.archive.clone(),
            h.toggles.clone(),
            h.feedback.clone(),
            h.last_seen.clone(),
        );

        let err = headless.transmit(0).await.unwrap_err();
        assert!(matches!(err, Error::Transmit(_)));
    }

    #[test]
    fn test_delete_rename_favorite_validate_keys() {
        let h = harness();
        insert(&h, 1);

        assert!(h.commands.delete(9).unwrap_err().is_invalid_id());
        assert!(h.commands.rename(9, "x").unwrap_err().is_invalid_id());
        assert!(h.commands.set_favorite(9, true).unwrap_err().is_invalid_id());

        h.commands.rename(0, "Gate").unwrap();
        assert_eq!(h.commands.list()[0].name, "Gate");
    }

    #[test]
    fn test_rename_requires_name() {
        let h = harness();
        insert(&h, 1);

        let err = h.commands.rename(0, "").unwrap_err();
        assert!(matches!(err, Error::MissingParameter { name: "name" }));
    }

    #[test]
    fn test_clear_all() {
        let h = harness();
        for n in 1..=4 {
            insert(&h, n);
        }

        h.commands.clear_all();
        assert_eq!(h.commands.status().signal_count, 0);
    }

    #[test]
    fn test_cleanup_now_reports_evicted_count() {
        let h = harness();
        for n in 1..=10 {
            insert(&h, n);
            h.clock.advance(1);
        }

        // Quota for the default limits is 200, capped by what exists.
        assert_eq!(h.commands.cleanup_now(), 10);
        assert_eq!(h.commands.cleanup_now(), 0);
    }

    #[test]
    fn test_purge_defaults_to_seven_days() {
        let h = harness();
        insert(&h, 1);
        h.clock.advance(8 * MS_PER_DAY);
        insert(&h, 2);

        assert_eq!(h.commands.purge_older_than(None), 1);
        assert_eq!(h.commands.list()[0].key, 1);
    }

    #[test]
    fn test_purge_with_explicit_days_spares_favorites() {
        let h = harness();
        insert(&h, 1);
        insert(&h, 2);
        h.commands.set_favorite(0, true).unwrap();
        h.clock.advance(2 * MS_PER_DAY);

        assert_eq!(h.commands.purge_older_than(Some(1)), 1);
        let views = h.commands.list();
        assert_eq!(views.len(), 1);
        assert!(views[0].is_favorite);
    }

    #[test]
    fn test_status_serializes_with_wire_names() {
        let h = harness();
        let json = serde_json::to_string(&h.commands.status()).unwrap();

        assert!(json.contains("\"signalCount\""));
        assert!(json.contains("\"storageUsed\""));
        assert!(json.contains("\"lastSignal\""));
    }

    #[test]
    fn test_signal_view_serializes_with_wire_names() {
        let h = harness();
        insert(&h, 1);
        let json = serde_json::to_string(&h.commands.list()).unwrap();

        assert!(json.contains("\"bitLength\""));
        assert!(json.contains("\"isFavorite\""));
        assert!(json.contains("\"timestamp\""));
    }
}
