//! Loading and validation of the antenna pin map.
//!
//! The pin map lives in `antenna_switcher.cfg`, a plain text file of
//! `key=value` lines:
//!
//! ```text
//! num_antennas=4
//! antenna_pins=[17, 18, 27, 22]
//! switch_order=break_before_make
//! ```
//!
//! `num_antennas` and `antenna_pins` are required and must agree in
//! length. `switch_order` is optional. Unknown keys are ignored, blank
//! lines and `#` comments are skipped. Loading is all-or-nothing: any
//! problem is a [`ConfigError`] and the service must not start.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default file name of the pin map, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "antenna_switcher.cfg";

const KEY_NUM_ANTENNAS: &str = "num_antennas";
const KEY_ANTENNA_PINS: &str = "antenna_pins";
const KEY_SWITCH_ORDER: &str = "switch_order";

/// Errors that can occur when loading the pin map.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A non-blank line did not have the `key=value` shape.
    #[error("line {line}: expected key=value, found {content:?}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },

    /// A required key was not present.
    #[error("configuration file is missing required key `{0}`")]
    MissingKey(&'static str),

    /// A recognized key carried a value that could not be parsed.
    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue {
        /// The key whose value was rejected.
        key: &'static str,
        /// The raw value.
        value: String,
    },

    /// `num_antennas` was zero.
    #[error("num_antennas must be at least 1")]
    NoAntennas,

    /// The pin list length disagrees with `num_antennas`.
    #[error("the number of antenna pins ({pins}) does not match the number of antennas ({antennas})")]
    PinCountMismatch {
        /// Declared antenna count.
        antennas: usize,
        /// Number of pins listed.
        pins: usize,
    },

    /// The same pin was listed for more than one antenna.
    #[error("pin {0} is assigned to more than one antenna")]
    DuplicatePin(u8),
}

/// Order in which pin writes are issued during a switch.
///
/// The end state is the same for both policies. What differs is the
/// transient: with [`BreakBeforeMake`](Self::BreakBeforeMake) no two
/// antennas are ever connected at once (a brief moment with none);
/// with [`MakeBeforeBreak`](Self::MakeBeforeBreak) there is never a
/// moment without an antenna (a brief moment with two).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwitchOrder {
    /// Drive every other pin low, then the target pin high.
    #[default]
    BreakBeforeMake,
    /// Drive the target pin high, then every other pin low.
    MakeBeforeBreak,
}

impl FromStr for SwitchOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "break_before_make" => Ok(Self::BreakBeforeMake),
            "make_before_break" => Ok(Self::MakeBeforeBreak),
            other => Err(ConfigError::InvalidValue {
                key: KEY_SWITCH_ORDER,
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SwitchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BreakBeforeMake => f.write_str("break_before_make"),
            Self::MakeBeforeBreak => f.write_str("make_before_break"),
        }
    }
}

/// A validated antenna index, as requested by a client.
///
/// Keeps the exact string the client sent alongside its 0-based pin
/// position. The raw string is what gets persisted and echoed back, so
/// `"03"` and `"3"` address the same antenna but are distinct values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaIndex {
    raw: String,
    position: usize,
}

impl AntennaIndex {
    /// The index exactly as the client supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 0-based position of this antenna's pin in the pin list.
    pub const fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for AntennaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Immutable antenna-to-pin mapping, built once at startup.
///
/// Invariant: `pins` is non-empty, free of duplicates, and its length
/// is the antenna count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaConfig {
    pins: Vec<u8>,
    switch_order: SwitchOrder,
}

impl AntennaConfig {
    /// Build a configuration from an ordered pin list.
    ///
    /// Pin `k` (0-based) drives antenna `k + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoAntennas`] for an empty list and
    /// [`ConfigError::DuplicatePin`] if a pin appears twice.
    pub fn new(pins: Vec<u8>, switch_order: SwitchOrder) -> Result<Self, ConfigError> {
        if pins.is_empty() {
            return Err(ConfigError::NoAntennas);
        }
        let mut seen = BTreeSet::new();
        for &pin in &pins {
            if !seen.insert(pin) {
                return Err(ConfigError::DuplicatePin(pin));
            }
        }
        Ok(Self { pins, switch_order })
    }

    /// Load the pin map from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or any
    /// parse/validation error from [`AntennaConfig::parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse the pin map from `key=value` text.
    ///
    /// When a key repeats, the last occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a line is malformed, a required key
    /// is missing, a value does not parse, or the pin list disagrees
    /// with the antenna count.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut num_antennas: Option<usize> = None;
        let mut antenna_pins: Option<Vec<u8>> = None;
        let mut switch_order = SwitchOrder::default();

        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine {
                    line: number.saturating_add(1),
                    content: line.to_owned(),
                });
            };
            let value = value.trim();
            match key.trim() {
                KEY_NUM_ANTENNAS => {
                    num_antennas =
                        Some(value.parse().ok().ok_or_else(|| ConfigError::InvalidValue {
                            key: KEY_NUM_ANTENNAS,
                            value: value.to_owned(),
                        })?);
                }
                KEY_ANTENNA_PINS => antenna_pins = Some(parse_pin_list(value)?),
                KEY_SWITCH_ORDER => switch_order = value.parse()?,
                _ => {}
            }
        }

        let antennas = num_antennas.ok_or(ConfigError::MissingKey(KEY_NUM_ANTENNAS))?;
        let pins = antenna_pins.ok_or(ConfigError::MissingKey(KEY_ANTENNA_PINS))?;

        if antennas == 0 {
            return Err(ConfigError::NoAntennas);
        }
        if pins.len() != antennas {
            return Err(ConfigError::PinCountMismatch {
                antennas,
                pins: pins.len(),
            });
        }

        Self::new(pins, switch_order)
    }

    /// Number of selectable antennas.
    pub fn antenna_count(&self) -> usize {
        self.pins.len()
    }

    /// The pins, in antenna order.
    pub fn pins(&self) -> &[u8] {
        &self.pins
    }

    /// The configured write ordering for switches.
    pub const fn switch_order(&self) -> SwitchOrder {
        self.switch_order
    }

    /// Validate a client-supplied antenna index.
    ///
    /// Accepts a non-empty string of ASCII digits whose value lies in
    /// `[1, antenna_count]`. Returns `None` for anything else.
    pub fn parse_index(&self, raw: &str) -> Option<AntennaIndex> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: usize = raw.parse().ok()?;
        if value == 0 || value > self.antenna_count() {
            return None;
        }
        Some(AntennaIndex {
            raw: raw.to_owned(),
            position: value.checked_sub(1)?,
        })
    }

    /// The canonical index of the first antenna (`"1"`).
    pub fn first_antenna() -> AntennaIndex {
        AntennaIndex {
            raw: String::from("1"),
            position: 0,
        }
    }
}

/// Parse a sequence literal such as `[17, 18, 27]` or `(17, 18)`.
fn parse_pin_list(value: &str) -> Result<Vec<u8>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: KEY_ANTENNA_PINS,
        value: value.to_owned(),
    };

    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .or_else(|| value.strip_prefix('(').and_then(|v| v.strip_suffix(')')))
        .ok_or_else(invalid)?
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(str::trim)
        // Tolerate a trailing comma, as in `(17,)`.
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<u8>().ok().ok_or_else(invalid))
        .collect()
}
