//! End-to-end relay tests: scripted joystick in, exact wire bytes out.

use shankha_link::config::LinkConfig;
use shankha_link::frame::{DriveFrame, FrameParser};
use shankha_link::joystick::{GamepadMap, MockJoystick};
use shankha_link::relay::TeleopRelay;
use shankha_link::transport::MockTransport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn build_relay(
    joystick: MockJoystick,
    extended: bool,
) -> (
    TeleopRelay<MockJoystick, MockTransport>,
    MockTransport,
    Arc<AtomicBool>,
) {
    let transport = MockTransport::new();
    let capture = transport.clone();
    let hold = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(AtomicBool::new(false));
    let config = LinkConfig {
        extended_frames: extended,
        ..LinkConfig::default()
    };
    let relay = TeleopRelay::new(
        joystick,
        transport,
        config,
        GamepadMap::default(),
        10,
        Arc::clone(&hold),
        shutdown,
    );
    (relay, capture, hold)
}

#[test]
fn stick_sweep_produces_parseable_stream() {
    let mut joystick = MockJoystick::new();
    joystick.push_axis(0, 16384);
    joystick.push_axis(1, -32767);
    joystick.push_axis(2, -8192);

    let (mut relay, capture, _) = build_relay(joystick, false);
    relay.tick().unwrap();
    relay.tick().unwrap();

    // Everything on the wire must round-trip through the frame parser
    let mut parser = FrameParser::new();
    let mut frames = Vec::new();
    parser.push_bytes(&capture.written(), &mut frames);

    assert_eq!(parser.error_count(), 0);
    assert_eq!(frames.len(), 2);
    // 16384 * 255 / 32767 = 127, -8192 * 255 / 32767 = -63
    assert_eq!(frames[0], DriveFrame::new(127, 255, -63));
    // State persists between ticks with no new events
    assert_eq!(frames[1], frames[0]);
}

#[test]
fn deadzone_suppresses_stick_drift() {
    let mut joystick = MockJoystick::new();
    joystick.push_axis(0, 900); // ~7 frame units of drift, inside deadzone 10
    let (mut relay, capture, _) = build_relay(joystick, false);
    relay.tick().unwrap();
    assert_eq!(capture.written(), b"<0,0,0>\n");
}

#[test]
fn bumpers_only_appear_in_extended_frames() {
    let mut joystick = MockJoystick::new();
    joystick.push_button(9, true);
    joystick.push_button(10, true);
    let (mut relay, capture, _) = build_relay(joystick, true);
    relay.tick().unwrap();
    assert_eq!(capture.written(), b"<0,0,0,1,1>\n");
}

#[test]
fn hold_then_release_sequence() {
    let mut joystick = MockJoystick::new();
    joystick.push_axis(1, -32767);
    let (mut relay, capture, hold) = build_relay(joystick, false);

    relay.tick().unwrap();
    hold.store(true, Ordering::Release);
    relay.tick().unwrap();
    relay.tick().unwrap();
    hold.store(false, Ordering::Release);
    relay.tick().unwrap();

    assert_eq!(
        capture.written(),
        b"<0,255,0>\n<0,0,0>\n<0,0,0>\n<0,255,0>\n".as_slice()
    );
}
