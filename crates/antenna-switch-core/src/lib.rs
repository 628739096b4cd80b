//! Core antenna selection logic for the antenna switch.
//!
//! This crate knows nothing about HTTP. It provides:
//!
//! - **Configuration** ([`config`]) -- the `antenna_switcher.cfg` pin
//!   map, validated into an immutable [`AntennaConfig`]
//! - **Commands** ([`command`]) -- parsing of the `"1"`..`"N"`, `"s"`
//!   and `"n"` command strings
//! - **Persistence** ([`store`]) -- the active antenna index on disk
//! - **Pin drivers** ([`pins`]) -- real GPIO (feature `gpio`) or a
//!   simulated driver
//! - **Selection** ([`selector`]) -- the state machine that keeps the
//!   driven pins and the persisted index in agreement
//!
//! # Invariant
//!
//! After every successful [`Selector`] operation exactly one configured
//! pin is high, and it belongs to the antenna recorded in the store.

pub mod command;
pub mod config;
pub mod pins;
pub mod selector;
pub mod store;

// Re-export primary types for convenience.
pub use command::Command;
pub use config::{AntennaConfig, AntennaIndex, ConfigError, SwitchOrder};
pub use pins::{Level, PinDriver, PinError, SimulatedPins};
pub use selector::{SelectError, Selector};
pub use store::{FileStore, MemoryStore, SelectionStore, StoreError};

#[cfg(feature = "gpio")]
pub use pins::GpioPins;
