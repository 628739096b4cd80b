//! Digital output pin drivers.
//!
//! The selector only needs two capabilities from the host: declare a
//! pin as an output, and set it high or low. [`PinDriver`] captures
//! exactly that. Two implementations are provided:
//!
//! - [`GpioPins`] (feature `gpio`) drives Raspberry Pi GPIO lines via
//!   `rppal`, using BCM pin numbering.
//! - [`SimulatedPins`] keeps levels in memory, records every write, and
//!   can be told to fail on a given pin.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Logic level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logic low (antenna disconnected).
    Low,
    /// Logic high (antenna connected).
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Errors raised while talking to the pin hardware.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// A write was issued to a pin that was never declared as an output.
    #[error("pin {0} has not been configured as an output")]
    NotOutput(u8),

    /// The GPIO controller could not be opened.
    #[error("gpio unavailable: {0}")]
    Unavailable(String),

    /// The GPIO controller rejected an operation.
    #[error("gpio error on pin {pin}: {message}")]
    Hardware {
        /// The pin involved.
        pin: u8,
        /// Description from the underlying driver.
        message: String,
    },
}

/// Capability to drive named digital output pins.
pub trait PinDriver: Send {
    /// Configure `pin` as a digital output.
    fn declare_output(&mut self, pin: u8) -> Result<(), PinError>;

    /// Drive a previously declared output pin to `level`.
    fn set_level(&mut self, pin: u8, level: Level) -> Result<(), PinError>;
}

// ---------------------------------------------------------------------------
// Simulated pins
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SimulatedInner {
    outputs: BTreeSet<u8>,
    levels: BTreeMap<u8, Level>,
    writes: Vec<(u8, Level)>,
    faulty: BTreeSet<u8>,
}

/// In-memory [`PinDriver`].
///
/// Clones share state: hand one clone to the selector and keep another
/// to observe levels and the write log.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPins {
    inner: Arc<Mutex<SimulatedInner>>,
}

impl SimulatedPins {
    /// Create a driver with no declared pins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of `pin`, or `None` if it was never written.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.lock().levels.get(&pin).copied()
    }

    /// All pins currently driven high, in ascending order.
    pub fn high_pins(&self) -> Vec<u8> {
        self.lock()
            .levels
            .iter()
            .filter(|(_, level)| **level == Level::High)
            .map(|(pin, _)| *pin)
            .collect()
    }

    /// Whether `pin` has been declared as an output.
    pub fn is_output(&self, pin: u8) -> bool {
        self.lock().outputs.contains(&pin)
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> Vec<(u8, Level)> {
        self.lock().writes.clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Make every subsequent operation on `pin` fail.
    pub fn fail_pin(&self, pin: u8) {
        self.lock().faulty.insert(pin);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.lock().faulty.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PinDriver for SimulatedPins {
    fn declare_output(&mut self, pin: u8) -> Result<(), PinError> {
        let mut inner = self.lock();
        if inner.faulty.contains(&pin) {
            return Err(PinError::Hardware {
                pin,
                message: String::from("simulated fault"),
            });
        }
        inner.outputs.insert(pin);
        Ok(())
    }

    fn set_level(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
        let mut inner = self.lock();
        if !inner.outputs.contains(&pin) {
            return Err(PinError::NotOutput(pin));
        }
        if inner.faulty.contains(&pin) {
            return Err(PinError::Hardware {
                pin,
                message: String::from("simulated fault"),
            });
        }
        tracing::debug!(pin, %level, "simulated pin write");
        inner.levels.insert(pin, level);
        inner.writes.push((pin, level));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Raspberry Pi GPIO
// ---------------------------------------------------------------------------

#[cfg(feature = "gpio")]
pub use gpio::GpioPins;

#[cfg(feature = "gpio")]
mod gpio {
    use std::collections::BTreeMap;

    use rppal::gpio::{Gpio, OutputPin};

    use super::{Level, PinDriver, PinError};

    /// [`PinDriver`] backed by the Raspberry Pi GPIO peripheral.
    ///
    /// Pins use BCM numbering. Claimed outputs keep their level when the
    /// driver is dropped, so the antenna stays connected across a
    /// restart of the service.
    pub struct GpioPins {
        gpio: Gpio,
        outputs: BTreeMap<u8, OutputPin>,
    }

    impl std::fmt::Debug for GpioPins {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("GpioPins")
                .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
                .finish_non_exhaustive()
        }
    }

    impl GpioPins {
        /// Open the GPIO peripheral.
        pub fn new() -> Result<Self, PinError> {
            let gpio = Gpio::new().map_err(|e| PinError::Unavailable(e.to_string()))?;
            Ok(Self {
                gpio,
                outputs: BTreeMap::new(),
            })
        }
    }

    impl PinDriver for GpioPins {
        fn declare_output(&mut self, pin: u8) -> Result<(), PinError> {
            let mut output = self
                .gpio
                .get(pin)
                .map_err(|e| PinError::Hardware {
                    pin,
                    message: e.to_string(),
                })?
                .into_output();
            output.set_reset_on_drop(false);
            self.outputs.insert(pin, output);
            Ok(())
        }

        fn set_level(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
            let output = self.outputs.get_mut(&pin).ok_or(PinError::NotOutput(pin))?;
            match level {
                Level::High => output.set_high(),
                Level::Low => output.set_low(),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_recorded_and_observable_through_clones() {
        let observer = SimulatedPins::new();
        let mut driver = observer.clone();

        assert!(driver.declare_output(17).is_ok());
        assert!(driver.declare_output(18).is_ok());
        assert!(driver.set_level(17, Level::High).is_ok());
        assert!(driver.set_level(18, Level::Low).is_ok());

        assert!(observer.is_output(17));
        assert_eq!(observer.level(17), Some(Level::High));
        assert_eq!(observer.level(18), Some(Level::Low));
        assert_eq!(observer.high_pins(), vec![17]);
        assert_eq!(observer.writes(), vec![(17, Level::High), (18, Level::Low)]);
    }

    #[test]
    fn undeclared_pin_is_rejected() {
        let mut driver = SimulatedPins::new();
        assert!(matches!(
            driver.set_level(4, Level::High),
            Err(PinError::NotOutput(4))
        ));
    }

    #[test]
    fn injected_fault_fails_until_cleared() {
        let mut driver = SimulatedPins::new();
        assert!(driver.declare_output(27).is_ok());
        driver.fail_pin(27);
        assert!(matches!(
            driver.set_level(27, Level::High),
            Err(PinError::Hardware { pin: 27, .. })
        ));
        assert_eq!(driver.write_count(), 0);

        driver.clear_faults();
        assert!(driver.set_level(27, Level::High).is_ok());
        assert_eq!(driver.level(27), Some(Level::High));
    }
}
