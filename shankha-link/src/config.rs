//! Link and gamepad configuration
//!
//! Loaded from TOML by the daemon; every field has a default so a minimal
//! config file (or none at all) gives a working 50 Hz / 115200 baud link.

use crate::joystick::GamepadMap;
use serde::{Deserialize, Serialize};

/// Serial link configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    /// Serial port path; `None` auto-selects when exactly one port exists
    #[serde(default)]
    pub port: Option<String>,

    /// Baud rate (the MCU sketch runs the link at 115200)
    #[serde(default = "default_baud")]
    pub baud_rate: u32,

    /// Frame transmit rate in Hz (matches the MCU's 20 ms control loop)
    #[serde(default = "default_rate")]
    pub send_rate_hz: u32,

    /// Send 5-field frames with actuator flags instead of 3-field frames
    #[serde(default)]
    pub extended_frames: bool,
}

/// Gamepad configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GamepadConfig {
    /// joydev device path
    #[serde(default = "default_device")]
    pub device: String,

    /// Stick deadzone in frame units (-255..=255 scale)
    #[serde(default = "default_deadzone")]
    pub deadzone: i16,

    /// Axis/button assignment
    #[serde(default)]
    pub map: GamepadMap,
}

fn default_baud() -> u32 {
    115_200
}
fn default_rate() -> u32 {
    50
}
fn default_device() -> String {
    "/dev/input/js0".to_string()
}
fn default_deadzone() -> i16 {
    10
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud(),
            send_rate_hz: default_rate(),
            extended_frames: false,
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            deadzone: default_deadzone(),
            map: GamepadMap::default(),
        }
    }
}

impl LinkConfig {
    /// Transmit period derived from the configured rate.
    pub fn send_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / self.send_rate_hz.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mcu_loop() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.send_rate_hz, 50);
        assert_eq!(cfg.send_interval(), std::time::Duration::from_millis(20));
        assert!(!cfg.extended_frames);
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: LinkConfig = toml::from_str("port = \"/dev/ttyACM0\"\nextended_frames = true\n").unwrap();
        assert_eq!(cfg.port.as_deref(), Some("/dev/ttyACM0"));
        assert!(cfg.extended_frames);
        assert_eq!(cfg.baud_rate, 115_200);
    }

    #[test]
    fn gamepad_defaults() {
        let cfg: GamepadConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.device, "/dev/input/js0");
        assert_eq!(cfg.deadzone, 10);
        assert_eq!(cfg.map.axis_lx, 0);
        assert_eq!(cfg.map.button_r1, 10);
    }
}
