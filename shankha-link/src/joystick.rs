//! Gamepad input via the Linux joydev interface
//!
//! The kernel joystick device (`/dev/input/js0`) emits fixed 8-byte
//! little-endian records:
//!
//! ```text
//! offset  size  field
//! 0       4     event timestamp, ms (u32)
//! 4       2     value (i16): axis position or button state
//! 6       1     type: 0x01 button, 0x02 axis, | 0x80 for init events
//! 7       1     axis/button number
//! ```
//!
//! On open the driver replays the current state of every axis and button as
//! init events, so a freshly attached reader starts from a consistent state.
//!
//! [`StickState`] folds the event stream into the three axes and two bumper
//! buttons the drive frame carries, applying deadzone and range scaling.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Event type bit: button press/release
const JS_EVENT_BUTTON: u8 = 0x01;
/// Event type bit: axis motion
const JS_EVENT_AXIS: u8 = 0x02;
/// Event type bit: synthetic initial-state replay
const JS_EVENT_INIT: u8 = 0x80;

/// Full scale of a joydev axis value
const AXIS_RAW_MAX: i32 = 32767;

/// Decoded joydev event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoyEvent {
    /// Event timestamp in milliseconds (driver clock)
    pub time_ms: u32,
    /// Axis position (-32767..=32767) or button state (0/1)
    pub value: i16,
    /// Which axis or button
    pub number: u8,
    /// Event kind
    pub kind: JoyEventKind,
    /// True for the initial-state replay emitted at open
    pub init: bool,
}

/// Kind of a joydev event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoyEventKind {
    Button,
    Axis,
}

/// Decode one raw 8-byte joydev record.
pub fn decode_event(raw: &[u8; 8]) -> Result<JoyEvent> {
    let time_ms = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let value = i16::from_le_bytes([raw[4], raw[5]]);
    let kind_raw = raw[6];
    let number = raw[7];

    let kind = match kind_raw & !JS_EVENT_INIT {
        JS_EVENT_BUTTON => JoyEventKind::Button,
        JS_EVENT_AXIS => JoyEventKind::Axis,
        other => {
            return Err(Error::Joystick(format!("unknown event type {other:#04x}")));
        }
    };

    Ok(JoyEvent {
        time_ms,
        value,
        number,
        kind,
        init: kind_raw & JS_EVENT_INIT != 0,
    })
}

/// Source of joystick events
///
/// `poll` blocks until the next event for device-backed sources; scripted
/// sources return `Ok(None)` when exhausted.
pub trait JoystickSource: Send {
    /// Next event, or `None` if the source has no more events.
    fn poll(&mut self) -> Result<Option<JoyEvent>>;
}

/// Joystick reader backed by a joydev character device
pub struct JoydevSource {
    file: File,
}

impl JoydevSource {
    /// Open a joydev device (e.g. `/dev/input/js0`).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Joystick(format!("cannot open {}: {e}", path.display()))
        })?;
        log::info!("Opened joystick device {}", path.display());
        Ok(Self { file })
    }
}

impl JoystickSource for JoydevSource {
    fn poll(&mut self) -> Result<Option<JoyEvent>> {
        let mut raw = [0u8; 8];
        match self.file.read_exact(&mut raw) {
            Ok(()) => Ok(Some(decode_event(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::Disconnected),
            Err(e) => Err(e.into()),
        }
    }
}

/// Scripted joystick source for tests and mock runs
#[derive(Default)]
pub struct MockJoystick {
    events: VecDeque<JoyEvent>,
}

impl MockJoystick {
    /// Create an empty scripted source
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an axis motion event
    pub fn push_axis(&mut self, number: u8, value: i16) {
        self.events.push_back(JoyEvent {
            time_ms: 0,
            value,
            number,
            kind: JoyEventKind::Axis,
            init: false,
        });
    }

    /// Queue a button press/release event
    pub fn push_button(&mut self, number: u8, pressed: bool) {
        self.events.push_back(JoyEvent {
            time_ms: 0,
            value: pressed as i16,
            number,
            kind: JoyEventKind::Button,
            init: false,
        });
    }
}

impl JoystickSource for MockJoystick {
    fn poll(&mut self) -> Result<Option<JoyEvent>> {
        Ok(self.events.pop_front())
    }
}

/// Axis/button assignment for a controller
///
/// Defaults match a PS4 pad over Bluetooth: left stick on axes 0/1, right
/// stick X on axis 2, bumpers on buttons 9/10.
#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct GamepadMap {
    #[serde(default = "default_axis_lx")]
    pub axis_lx: u8,
    #[serde(default = "default_axis_ly")]
    pub axis_ly: u8,
    #[serde(default = "default_axis_rx")]
    pub axis_rx: u8,
    #[serde(default = "default_btn_l1")]
    pub button_l1: u8,
    #[serde(default = "default_btn_r1")]
    pub button_r1: u8,
}

fn default_axis_lx() -> u8 {
    0
}
fn default_axis_ly() -> u8 {
    1
}
fn default_axis_rx() -> u8 {
    2
}
fn default_btn_l1() -> u8 {
    9
}
fn default_btn_r1() -> u8 {
    10
}

impl Default for GamepadMap {
    fn default() -> Self {
        Self {
            axis_lx: default_axis_lx(),
            axis_ly: default_axis_ly(),
            axis_rx: default_axis_rx(),
            button_l1: default_btn_l1(),
            button_r1: default_btn_r1(),
        }
    }
}

/// Scale a raw joydev axis value (-32767..=32767) to the frame range
/// (-255..=255), zeroing values inside the deadzone.
///
/// `deadzone` is in frame units: with the default of 10, stick drift below
/// ~4 % of full deflection is ignored.
pub fn scale_axis(raw: i16, deadzone: i16) -> i16 {
    let scaled = (raw as i32 * 255 / AXIS_RAW_MAX) as i16;
    if scaled.abs() <= deadzone { 0 } else { scaled }
}

/// Current stick/button state folded from the event stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StickState {
    /// Left stick X in frame units, positive = right
    pub lx: i16,
    /// Left stick Y in frame units, positive = forward (sign already flipped)
    pub ly: i16,
    /// Right stick X in frame units, positive = clockwise
    pub rx: i16,
    /// Left bumper held
    pub l1: bool,
    /// Right bumper held
    pub r1: bool,
}

impl StickState {
    /// Fold one event into the state. Returns true when the event mapped to
    /// a tracked control. Unmapped axes/buttons are ignored so extra
    /// controller features don't disturb the drive state.
    pub fn apply(&mut self, event: &JoyEvent, map: &GamepadMap, deadzone: i16) -> bool {
        match event.kind {
            JoyEventKind::Axis => {
                if event.number == map.axis_lx {
                    self.lx = scale_axis(event.value, deadzone);
                } else if event.number == map.axis_ly {
                    // joydev reports stick-forward as negative; frames want
                    // positive = forward
                    self.ly = scale_axis(event.value.saturating_neg(), deadzone);
                } else if event.number == map.axis_rx {
                    self.rx = scale_axis(event.value, deadzone);
                } else {
                    return false;
                }
                true
            }
            JoyEventKind::Button => {
                if event.number == map.button_l1 {
                    self.l1 = event.value != 0;
                } else if event.number == map.button_r1 {
                    self.r1 = event.value != 0;
                } else {
                    return false;
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_axis_event() {
        // time=0x01020304, value=-32767, axis 2
        let raw = [0x04, 0x03, 0x02, 0x01, 0x01, 0x80, 0x02, 0x02];
        let ev = decode_event(&raw).unwrap();
        assert_eq!(ev.time_ms, 0x0102_0304);
        assert_eq!(ev.value, -32767);
        assert_eq!(ev.kind, JoyEventKind::Axis);
        assert_eq!(ev.number, 2);
        assert!(!ev.init);
    }

    #[test]
    fn decodes_init_button_event() {
        let raw = [0, 0, 0, 0, 0x01, 0x00, 0x81, 0x09];
        let ev = decode_event(&raw).unwrap();
        assert_eq!(ev.kind, JoyEventKind::Button);
        assert_eq!(ev.value, 1);
        assert_eq!(ev.number, 9);
        assert!(ev.init);
    }

    #[test]
    fn rejects_unknown_event_type() {
        let raw = [0, 0, 0, 0, 0, 0, 0x04, 0];
        assert!(decode_event(&raw).is_err());
    }

    #[test]
    fn axis_scaling_covers_range() {
        assert_eq!(scale_axis(32767, 0), 255);
        assert_eq!(scale_axis(-32767, 0), -255);
        assert_eq!(scale_axis(0, 0), 0);
        assert_eq!(scale_axis(16384, 0), 127);
    }

    #[test]
    fn deadzone_zeroes_small_values() {
        assert_eq!(scale_axis(1000, 10), 0); // ~7 frame units
        assert_eq!(scale_axis(2000, 10), 15);
        assert_eq!(scale_axis(-1000, 10), 0);
    }

    #[test]
    fn stick_state_flips_forward_axis() {
        let map = GamepadMap::default();
        let mut state = StickState::default();
        let mut ev = JoyEvent {
            time_ms: 0,
            value: -32767, // stick pushed forward
            number: map.axis_ly,
            kind: JoyEventKind::Axis,
            init: false,
        };
        assert!(state.apply(&ev, &map, 0));
        assert_eq!(state.ly, 255);

        ev.value = 32767;
        state.apply(&ev, &map, 0);
        assert_eq!(state.ly, -255);
    }

    #[test]
    fn stick_state_tracks_buttons_and_ignores_unmapped() {
        let map = GamepadMap::default();
        let mut state = StickState::default();

        let press = JoyEvent {
            time_ms: 0,
            value: 1,
            number: map.button_l1,
            kind: JoyEventKind::Button,
            init: false,
        };
        assert!(state.apply(&press, &map, 0));
        assert!(state.l1);

        let other = JoyEvent {
            number: 4,
            ..press
        };
        assert!(!state.apply(&other, &map, 0));
        assert!(!state.r1);
    }
}
