//! Antenna selection state machine.
//!
//! The [`Selector`] owns the pin driver and the selection store and
//! keeps them in agreement: exactly one pin is high, and it is the pin
//! of the antenna recorded in the store.
//!
//! # Transitions
//!
//! - **Startup** ([`Selector::initialize`]): a valid stored index is
//!   re-asserted on the pins without touching the store. A missing,
//!   non-numeric or out-of-range value is healed by driving antenna 1
//!   and storing `"1"`.
//! - **Select** ([`Selector::select`]): a request equal to the stored
//!   value is a no-op. Anything else drives the pins first and persists
//!   only once every pin write has succeeded.
//!
//! The selector does no locking of its own. Callers that share it
//! between tasks must hold a lock across each call.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{AntennaConfig, AntennaIndex, SwitchOrder};
use crate::pins::{Level, PinDriver, PinError};
use crate::store::{SelectionStore, StoreError};

/// Errors that can occur while changing or reading the selection.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// A pin could not be configured or driven.
    #[error("pin driver error: {0}")]
    Pins(#[from] PinError),

    /// The selection store could not be read or written.
    #[error("selection store error: {0}")]
    Store(#[from] StoreError),

    /// The index does not address a configured antenna.
    #[error("antenna {index} is outside 1..={count}")]
    OutOfRange {
        /// The rejected index.
        index: String,
        /// Number of configured antennas.
        count: usize,
    },
}

/// Drives antenna selection and keeps the persisted record in sync.
pub struct Selector {
    config: Arc<AntennaConfig>,
    pins: Box<dyn PinDriver>,
    store: Box<dyn SelectionStore>,
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Selector {
    /// Create a selector and declare every configured pin as an output.
    ///
    /// Pins are declared exactly once, here. No levels are written until
    /// [`initialize`](Self::initialize) runs.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::Pins`] if any pin cannot be claimed.
    pub fn new(
        config: Arc<AntennaConfig>,
        mut pins: impl PinDriver + 'static,
        store: impl SelectionStore + 'static,
    ) -> Result<Self, SelectError> {
        for &pin in config.pins() {
            pins.declare_output(pin)?;
        }
        debug!(pins = ?config.pins(), "antenna pins configured as outputs");
        Ok(Self {
            config,
            pins: Box::new(pins),
            store: Box::new(store),
        })
    }

    /// The configuration this selector was built with.
    pub fn config(&self) -> &AntennaConfig {
        &self.config
    }

    /// A shared handle to the configuration.
    pub fn shared_config(&self) -> Arc<AntennaConfig> {
        Arc::clone(&self.config)
    }

    /// Bring the pins in line with the persisted selection.
    ///
    /// Returns the antenna that is active afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written, or the
    /// pins cannot be driven. Either is fatal at startup.
    pub fn initialize(&mut self) -> Result<AntennaIndex, SelectError> {
        let stored = self.store.read()?;

        if let Some(index) = stored.as_deref().and_then(|v| self.config.parse_index(v)) {
            self.drive(&index)?;
            info!(antenna = %index, "restored persisted antenna selection");
            return Ok(index);
        }

        let first = AntennaConfig::first_antenna();
        match stored.as_deref() {
            None => info!("no persisted selection, starting on antenna 1"),
            Some(value) => warn!(
                stored = value,
                count = self.config.antenna_count(),
                "persisted selection is invalid, resetting to antenna 1"
            ),
        }
        self.drive(&first)?;
        self.store.write(first.as_str())?;
        Ok(first)
    }

    /// Switch to `requested`.
    ///
    /// If the stored value already equals `requested` (exact string
    /// comparison) nothing is written. Otherwise the pins are driven and
    /// then the store is updated. Returns the selected index.
    ///
    /// # Errors
    ///
    /// On a pin failure the store is left untouched but the pins may be
    /// partially driven. On a store write failure the pins already show
    /// the new antenna. Both leave the selection inconsistent until the
    /// next successful switch or restart.
    pub fn select(&mut self, requested: &AntennaIndex) -> Result<String, SelectError> {
        let current = self.store.read()?;
        if current.as_deref() == Some(requested.as_str()) {
            debug!(antenna = %requested, "antenna already selected");
            return Ok(requested.as_str().to_owned());
        }

        if let Err(e) = self.drive(requested) {
            error!(antenna = %requested, error = %e, "failed to drive antenna pins");
            return Err(e);
        }
        self.store.write(requested.as_str())?;

        info!(
            antenna = %requested,
            previous = current.as_deref().unwrap_or("none"),
            "antenna switched"
        );
        Ok(requested.as_str().to_owned())
    }

    /// The persisted selection, or `None` if nothing has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::Store`] if the store cannot be read.
    pub fn current(&self) -> Result<Option<String>, SelectError> {
        Ok(self.store.read()?)
    }

    /// The antenna count formatted as `n:<count>`.
    pub fn count(&self) -> String {
        format!("n:{}", self.config.antenna_count())
    }

    /// Set the target antenna's pin high and every other pin low, in the
    /// configured [`SwitchOrder`].
    fn drive(&mut self, index: &AntennaIndex) -> Result<(), SelectError> {
        let target = index.position();
        let Some(&target_pin) = self.config.pins().get(target) else {
            return Err(SelectError::OutOfRange {
                index: index.as_str().to_owned(),
                count: self.config.antenna_count(),
            });
        };

        match self.config.switch_order() {
            SwitchOrder::BreakBeforeMake => {
                self.lower_all_except(target)?;
                self.pins.set_level(target_pin, Level::High)?;
            }
            SwitchOrder::MakeBeforeBreak => {
                self.pins.set_level(target_pin, Level::High)?;
                self.lower_all_except(target)?;
            }
        }
        Ok(())
    }

    fn lower_all_except(&mut self, target: usize) -> Result<(), PinError> {
        for (position, &pin) in self.config.pins().iter().enumerate() {
            if position != target {
                self.pins.set_level(pin, Level::Low)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::pins::SimulatedPins;
    use crate::store::{DEFAULT_STATE_FILE, FileStore, MemoryStore};

    const PINS: [u8; 4] = [17, 18, 27, 22];

    fn setup(order: SwitchOrder, store: MemoryStore) -> (Selector, SimulatedPins, MemoryStore) {
        let config = Arc::new(AntennaConfig::new(PINS.to_vec(), order).unwrap());
        let pins = SimulatedPins::new();
        let selector = Selector::new(config, pins.clone(), store.clone()).unwrap();
        (selector, pins, store)
    }

    fn index(selector: &Selector, raw: &str) -> AntennaIndex {
        selector.config().parse_index(raw).unwrap()
    }

    #[test]
    fn new_declares_every_pin_without_writing() {
        let (_selector, pins, _store) = setup(SwitchOrder::default(), MemoryStore::new());
        for pin in PINS {
            assert!(pins.is_output(pin));
        }
        assert_eq!(pins.write_count(), 0);
    }

    #[test]
    fn fresh_start_selects_first_antenna() {
        let (mut selector, pins, store) = setup(SwitchOrder::default(), MemoryStore::new());
        let active = selector.initialize().unwrap();

        assert_eq!(active.as_str(), "1");
        assert_eq!(pins.high_pins(), vec![17]);
        for pin in [18, 27, 22] {
            assert_eq!(pins.level(pin), Some(Level::Low));
        }
        assert_eq!(store.value().as_deref(), Some("1"));
    }

    #[test]
    fn valid_persisted_selection_is_reasserted_without_rewrite() {
        let (mut selector, pins, store) =
            setup(SwitchOrder::default(), MemoryStore::with_value("4"));
        let active = selector.initialize().unwrap();

        assert_eq!(active.as_str(), "4");
        assert_eq!(pins.high_pins(), vec![22]);
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.value().as_deref(), Some("4"));
    }

    #[test]
    fn invalid_persisted_selection_heals_to_first_antenna() {
        for corrupt in ["0", "5", "abc", "", "-2", "1.5"] {
            let (mut selector, pins, store) =
                setup(SwitchOrder::default(), MemoryStore::with_value(corrupt));
            let active = selector.initialize().unwrap();

            assert_eq!(active.as_str(), "1", "stored {corrupt:?}");
            assert_eq!(pins.high_pins(), vec![17], "stored {corrupt:?}");
            assert_eq!(store.value().as_deref(), Some("1"), "stored {corrupt:?}");
            assert_eq!(store.write_count(), 1, "stored {corrupt:?}");
        }
    }

    #[test]
    fn non_utf8_state_file_heals_to_first_antenna() {
        let dir = std::env::temp_dir().join(format!(
            "antenna_switch_selector_binary_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DEFAULT_STATE_FILE);
        std::fs::write(&path, [0xff, 0xfe, b'3']).unwrap();

        let config = Arc::new(AntennaConfig::new(PINS.to_vec(), SwitchOrder::default()).unwrap());
        let pins = SimulatedPins::new();
        let mut selector = Selector::new(config, pins.clone(), FileStore::new(&path)).unwrap();
        let active = selector.initialize().unwrap();

        assert_eq!(active.as_str(), "1");
        assert_eq!(pins.high_pins(), vec![17]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1");
    }

    #[test]
    fn select_then_current_round_trips_for_every_antenna() {
        let (mut selector, pins, _store) = setup(SwitchOrder::default(), MemoryStore::new());
        selector.initialize().unwrap();

        for (position, raw) in ["1", "2", "3", "4"].into_iter().enumerate() {
            let requested = index(&selector, raw);
            assert_eq!(selector.select(&requested).unwrap(), raw);
            assert_eq!(selector.current().unwrap().as_deref(), Some(raw));
            assert_eq!(pins.high_pins(), vec![PINS[position]]);
        }
    }

    #[test]
    fn repeated_select_is_a_no_op() {
        let (mut selector, pins, store) = setup(SwitchOrder::default(), MemoryStore::new());
        selector.initialize().unwrap();
        let writes_after_init = pins.write_count();

        let three = index(&selector, "3");
        assert_eq!(selector.select(&three).unwrap(), "3");
        let pin_writes = pins.write_count();
        let store_writes = store.write_count();
        assert!(pin_writes > writes_after_init);

        assert_eq!(selector.select(&three).unwrap(), "3");
        assert_eq!(pins.write_count(), pin_writes);
        assert_eq!(store.write_count(), store_writes);
        assert_eq!(pins.high_pins(), vec![27]);
    }

    #[test]
    fn comparison_is_on_the_raw_string() {
        let (mut selector, pins, store) =
            setup(SwitchOrder::default(), MemoryStore::with_value("3"));
        selector.initialize().unwrap();
        let before = store.write_count();

        let padded = index(&selector, "03");
        assert_eq!(selector.select(&padded).unwrap(), "03");
        assert_eq!(store.value().as_deref(), Some("03"));
        assert_eq!(store.write_count(), before + 1);
        assert_eq!(pins.high_pins(), vec![27]);
    }

    #[test]
    fn current_is_none_before_anything_is_stored() {
        let (selector, _pins, _store) = setup(SwitchOrder::default(), MemoryStore::new());
        assert_eq!(selector.current().unwrap(), None);
    }

    #[test]
    fn count_reports_configured_antennas() {
        let (mut selector, _pins, _store) = setup(SwitchOrder::default(), MemoryStore::new());
        assert_eq!(selector.count(), "n:4");
        selector.initialize().unwrap();
        let two = index(&selector, "2");
        selector.select(&two).unwrap();
        assert_eq!(selector.count(), "n:4");
    }

    #[test]
    fn pin_failure_leaves_store_untouched() {
        let (mut selector, pins, store) = setup(SwitchOrder::default(), MemoryStore::new());
        selector.initialize().unwrap();

        pins.fail_pin(27);
        let three = index(&selector, "3");
        assert!(matches!(
            selector.select(&three),
            Err(SelectError::Pins(PinError::Hardware { pin: 27, .. }))
        ));
        assert_eq!(store.value().as_deref(), Some("1"));

        pins.clear_faults();
        assert_eq!(selector.select(&three).unwrap(), "3");
        assert_eq!(pins.high_pins(), vec![27]);
    }

    #[test]
    fn declare_failure_is_reported() {
        let config = Arc::new(AntennaConfig::new(PINS.to_vec(), SwitchOrder::default()).unwrap());
        let pins = SimulatedPins::new();
        pins.fail_pin(18);
        let result = Selector::new(config, pins, MemoryStore::new());
        assert!(matches!(result, Err(SelectError::Pins(_))));
    }

    #[test]
    fn index_from_a_larger_config_is_out_of_range() {
        let (mut selector, _pins, _store) = setup(SwitchOrder::default(), MemoryStore::new());
        let wide = AntennaConfig::new(vec![1, 2, 3, 4, 5, 6], SwitchOrder::default()).unwrap();
        let six = wide.parse_index("6").unwrap();
        assert!(matches!(
            selector.select(&six),
            Err(SelectError::OutOfRange { count: 4, .. })
        ));
    }

    #[test]
    fn break_before_make_lowers_before_raising() {
        let (mut selector, pins, _store) =
            setup(SwitchOrder::BreakBeforeMake, MemoryStore::with_value("1"));
        selector.initialize().unwrap();
        let start = pins.write_count();

        let two = index(&selector, "2");
        selector.select(&two).unwrap();

        let switch_writes: Vec<_> = pins.writes().into_iter().skip(start).collect();
        assert_eq!(
            switch_writes,
            vec![
                (17, Level::Low),
                (27, Level::Low),
                (22, Level::Low),
                (18, Level::High),
            ]
        );
    }

    #[test]
    fn make_before_break_raises_before_lowering() {
        let (mut selector, pins, _store) =
            setup(SwitchOrder::MakeBeforeBreak, MemoryStore::with_value("1"));
        selector.initialize().unwrap();
        let start = pins.write_count();

        let two = index(&selector, "2");
        selector.select(&two).unwrap();

        let switch_writes: Vec<_> = pins.writes().into_iter().skip(start).collect();
        assert_eq!(
            switch_writes,
            vec![
                (18, Level::High),
                (17, Level::Low),
                (27, Level::Low),
                (22, Level::Low),
            ]
        );
        assert_eq!(pins.high_pins(), vec![18]);
    }
}
