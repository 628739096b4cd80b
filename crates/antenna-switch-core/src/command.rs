//! Command strings accepted by the switch.
//!
//! | Command | Meaning |
//! |---------|---------|
//! | `"1"`..`"N"` | Select antenna N |
//! | `"s"` | Report the active antenna |
//! | `"n"` | Report the antenna count |

use crate::config::{AntennaConfig, AntennaIndex};

/// A parsed, validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch to the given antenna.
    Select(AntennaIndex),
    /// Report the active antenna.
    Status,
    /// Report how many antennas are configured.
    Count,
}

impl Command {
    /// Parse a raw command against the configured antenna range.
    ///
    /// Returns `None` for anything that is not a valid command,
    /// including out-of-range indices and the empty string.
    pub fn parse(raw: &str, config: &AntennaConfig) -> Option<Self> {
        match raw {
            "s" => Some(Self::Status),
            "n" => Some(Self::Count),
            other => config.parse_index(other).map(Self::Select),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SwitchOrder;

    fn config() -> AntennaConfig {
        AntennaConfig::new(vec![17, 18, 27, 22], SwitchOrder::default()).unwrap()
    }

    #[test]
    fn recognizes_queries() {
        let config = config();
        assert_eq!(Command::parse("s", &config), Some(Command::Status));
        assert_eq!(Command::parse("n", &config), Some(Command::Count));
    }

    #[test]
    fn recognizes_selection() {
        let config = config();
        let Some(Command::Select(index)) = Command::parse("3", &config) else {
            panic!("expected a selection");
        };
        assert_eq!(index.as_str(), "3");
        assert_eq!(index.position(), 2);
    }

    #[test]
    fn rejects_everything_else() {
        let config = config();
        for raw in ["0", "5", "abc", "", "S", "N", "status", "1 "] {
            assert_eq!(Command::parse(raw, &config), None, "{raw:?}");
        }
    }
}
