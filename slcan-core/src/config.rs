//! Adapter configuration
//!
//! Board crates build an [`AdapterConfig`] at startup; everything else in
//! the adapter reads its constants from here instead of hard-coding them.

use slcan_protocol::Bitrate;

/// Peripheral clock feeding the CAN controller on the reference board
pub const DEFAULT_PERIPHERAL_CLOCK_HZ: u32 = 48_000_000;

/// Minimum time an activity LED stays lit once flashed
pub const DEFAULT_ACTIVITY_ON_MS: u32 = 10;

/// Minimum time an activity LED stays dark before it may flash again
pub const DEFAULT_ACTIVITY_OFF_MS: u32 = 10;

/// Status-bit polls allowed per controller mode transition
pub const DEFAULT_HW_WAIT_ITERATIONS: u32 = 100_000;

/// Static adapter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdapterConfig {
    /// Clock feeding the CAN controller (Hz)
    pub peripheral_clock_hz: u32,
    /// Bitrate selected at power-up
    pub default_bitrate: Bitrate,
    /// Activity LED minimum on time (ms)
    pub activity_on_ms: u32,
    /// Activity LED minimum off time (ms)
    pub activity_off_ms: u32,
    /// Polls of a status bit before a mode transition is abandoned
    pub hw_wait_iterations: u32,
    /// Reply to `V`, sent with a trailing `\r`; `None` keeps `V` silent
    pub version_line: Option<&'static [u8]>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            peripheral_clock_hz: DEFAULT_PERIPHERAL_CLOCK_HZ,
            default_bitrate: Bitrate::Kbit125,
            activity_on_ms: DEFAULT_ACTIVITY_ON_MS,
            activity_off_ms: DEFAULT_ACTIVITY_OFF_MS,
            hw_wait_iterations: DEFAULT_HW_WAIT_ITERATIONS,
            version_line: None,
        }
    }
}

impl AdapterConfig {
    /// Same configuration with a `V` reply
    pub fn with_version_line(mut self, line: &'static [u8]) -> Self {
        self.version_line = Some(line);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.peripheral_clock_hz, 48_000_000);
        assert_eq!(config.default_bitrate, Bitrate::Kbit125);
        assert_eq!(config.version_line, None);
    }

    #[test]
    fn test_with_version_line() {
        let config = AdapterConfig::default().with_version_line(b"V1010");
        assert_eq!(config.version_line, Some(&b"V1010"[..]));
    }
}
