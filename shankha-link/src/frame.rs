//! Drive-frame protocol for the motor controller link
//!
//! The MCU accepts newline-terminated ASCII frames:
//!
//! ```text
//! <LX,LY,RX>\n            basic drive frame
//! <LX,LY,RX,L1,R1>\n      drive frame with actuator flags
//! ```
//!
//! - `LX`: left stick X, -255..=255, positive = right
//! - `LY`: left stick Y, -255..=255, positive = forward (already flipped)
//! - `RX`: right stick X, -255..=255, positive = clockwise
//! - `L1`/`R1`: actuator flags, 0 or 1, active while held
//!
//! Frames are sent at a fixed rate (nominally 50 Hz at 115200 baud) and the
//! MCU treats the stream as idempotent state updates, so a dropped frame is
//! harmless and a repeated one is a no-op.
//!
//! This module provides:
//! - [`DriveFrame`]: one decoded frame
//! - [`FrameBuffer`]: single reusable encode buffer for the transmit loop
//! - [`FrameParser`]: incremental decoder tolerant of partial reads and
//!   inter-frame garbage

use crate::error::{Error, Result};
use std::io::{self, Write};

/// Axis value bound. Values outside are clamped on encode, rejected on decode.
pub const AXIS_LIMIT: i16 = 255;

/// Largest possible frame: `<-255,-255,-255,1,1>\n`
pub const MAX_FRAME_LEN: usize = 21;

/// Actuator flags carried by the extended 5-field frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actuators {
    /// Left actuator (L1 bumper), active while held
    pub left: bool,
    /// Right actuator (R1 bumper), active while held
    pub right: bool,
}

/// One drive frame as carried on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriveFrame {
    /// Left stick X, -255..=255, positive = right
    pub lx: i16,
    /// Left stick Y, -255..=255, positive = forward
    pub ly: i16,
    /// Right stick X, -255..=255, positive = clockwise
    pub rx: i16,
    /// Actuator flags; `None` encodes the basic 3-field frame
    pub actuators: Option<Actuators>,
}

impl DriveFrame {
    /// Basic 3-field frame. Axes are clamped to [-255, 255].
    pub fn new(lx: i16, ly: i16, rx: i16) -> Self {
        Self {
            lx: lx.clamp(-AXIS_LIMIT, AXIS_LIMIT),
            ly: ly.clamp(-AXIS_LIMIT, AXIS_LIMIT),
            rx: rx.clamp(-AXIS_LIMIT, AXIS_LIMIT),
            actuators: None,
        }
    }

    /// Extended 5-field frame with actuator flags.
    pub fn with_actuators(lx: i16, ly: i16, rx: i16, left: bool, right: bool) -> Self {
        Self {
            actuators: Some(Actuators { left, right }),
            ..Self::new(lx, ly, rx)
        }
    }

    /// All-zero frame. The MCU stops the motors (and releases the
    /// actuators, in the 5-field format) on receiving it.
    pub fn neutral(extended: bool) -> Self {
        Self {
            lx: 0,
            ly: 0,
            rx: 0,
            actuators: extended.then(Actuators::default),
        }
    }

    /// True when all axes are zero and no actuator is held.
    pub fn is_neutral(&self) -> bool {
        self.lx == 0 && self.ly == 0 && self.rx == 0 && self.actuators.unwrap_or_default() == Actuators::default()
    }
}

/// Reusable TX buffer for drive frames
///
/// Encodes any frame into a fixed internal buffer, so the 50 Hz transmit
/// loop never allocates. Create once, reuse for every send:
///
/// ```
/// use shankha_link::frame::{DriveFrame, FrameBuffer};
///
/// let mut buf = FrameBuffer::new();
/// let bytes = buf.encode(&DriveFrame::new(12, -200, 3));
/// assert_eq!(bytes, b"<12,-200,3>\n");
/// ```
pub struct FrameBuffer {
    data: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl FrameBuffer {
    /// Create an empty frame buffer
    pub const fn new() -> Self {
        Self {
            data: [0u8; MAX_FRAME_LEN],
            len: 0,
        }
    }

    /// Encode a frame, returning the wire bytes
    pub fn encode(&mut self, frame: &DriveFrame) -> &[u8] {
        self.len = 0;
        self.push(b'<');
        self.push_i16(frame.lx.clamp(-AXIS_LIMIT, AXIS_LIMIT));
        self.push(b',');
        self.push_i16(frame.ly.clamp(-AXIS_LIMIT, AXIS_LIMIT));
        self.push(b',');
        self.push_i16(frame.rx.clamp(-AXIS_LIMIT, AXIS_LIMIT));
        if let Some(act) = frame.actuators {
            self.push(b',');
            self.push(if act.left { b'1' } else { b'0' });
            self.push(b',');
            self.push(if act.right { b'1' } else { b'0' });
        }
        self.push(b'>');
        self.push(b'\n');
        self.as_bytes()
    }

    /// Bytes of the last encoded frame
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Encode and write a frame to any writer (serial port, etc.)
    pub fn send_to<W: Write>(&mut self, frame: &DriveFrame, writer: &mut W) -> io::Result<()> {
        self.encode(frame);
        writer.write_all(self.as_bytes())
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.data[self.len] = byte;
        self.len += 1;
    }

    fn push_i16(&mut self, value: i16) {
        if value < 0 {
            self.push(b'-');
        }
        let mut v = value.unsigned_abs();
        // 3 digits max after clamping to +-255
        let mut digits = [0u8; 3];
        let mut n = 0;
        loop {
            digits[n] = b'0' + (v % 10) as u8;
            v /= 10;
            n += 1;
            if v == 0 {
                break;
            }
        }
        while n > 0 {
            n -= 1;
            self.push(digits[n]);
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental drive-frame decoder
///
/// Feed it raw bytes as they arrive; it scans for `<`, accumulates until
/// `>`, and yields complete frames. Anything between frames is discarded,
/// so the parser resynchronizes after line noise or a partial first frame.
/// An over-long accumulation (missing `>`) is dropped and counted as a
/// framing error rather than growing without bound.
pub struct FrameParser {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
    in_frame: bool,
    errors: u64,
}

impl FrameParser {
    /// Create a parser with empty state
    pub fn new() -> Self {
        Self {
            buf: [0u8; MAX_FRAME_LEN],
            len: 0,
            in_frame: false,
            errors: 0,
        }
    }

    /// Number of framing/parse errors seen so far
    pub fn error_count(&self) -> u64 {
        self.errors
    }

    /// Consume raw bytes, appending any completed frames to `out`.
    pub fn push_bytes(&mut self, bytes: &[u8], out: &mut Vec<DriveFrame>) {
        for &b in bytes {
            match b {
                b'<' => {
                    // A '<' inside a frame means the previous one was cut short
                    if self.in_frame {
                        self.errors += 1;
                    }
                    self.in_frame = true;
                    self.len = 0;
                }
                b'>' if self.in_frame => {
                    self.in_frame = false;
                    match parse_fields(&self.buf[..self.len]) {
                        Ok(frame) => out.push(frame),
                        Err(_) => self.errors += 1,
                    }
                    self.len = 0;
                }
                _ if self.in_frame => {
                    if self.len >= self.buf.len() {
                        // Frame body longer than any legal frame
                        self.in_frame = false;
                        self.len = 0;
                        self.errors += 1;
                    } else {
                        self.buf[self.len] = b;
                        self.len += 1;
                    }
                }
                // Bytes outside a frame ('\n' terminators, noise) are skipped
                _ => {}
            }
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the comma-separated body between `<` and `>`.
fn parse_fields(body: &[u8]) -> Result<DriveFrame> {
    let text = std::str::from_utf8(body)
        .map_err(|_| Error::InvalidFrame("non-ASCII frame body".into()))?;

    let mut fields = [0i16; 5];
    let mut count = 0;
    for part in text.split(',') {
        if count >= fields.len() {
            return Err(Error::InvalidFrame(format!("too many fields: {text:?}")));
        }
        fields[count] = part
            .parse::<i16>()
            .map_err(|_| Error::InvalidFrame(format!("bad field {part:?}")))?;
        count += 1;
    }

    let check_axis = |v: i16| -> Result<i16> {
        if (-AXIS_LIMIT..=AXIS_LIMIT).contains(&v) {
            Ok(v)
        } else {
            Err(Error::InvalidFrame(format!("axis out of range: {v}")))
        }
    };
    let check_flag = |v: i16| -> Result<bool> {
        match v {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidFrame(format!("actuator flag not 0/1: {v}"))),
        }
    };

    match count {
        3 => Ok(DriveFrame {
            lx: check_axis(fields[0])?,
            ly: check_axis(fields[1])?,
            rx: check_axis(fields[2])?,
            actuators: None,
        }),
        5 => Ok(DriveFrame {
            lx: check_axis(fields[0])?,
            ly: check_axis(fields[1])?,
            rx: check_axis(fields[2])?,
            actuators: Some(Actuators {
                left: check_flag(fields[3])?,
                right: check_flag(fields[4])?,
            }),
        }),
        n => Err(Error::InvalidFrame(format!("expected 3 or 5 fields, got {n}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(bytes: &[u8]) -> Option<DriveFrame> {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        parser.push_bytes(bytes, &mut out);
        out.pop()
    }

    #[test]
    fn encodes_basic_frame() {
        let mut buf = FrameBuffer::new();
        assert_eq!(buf.encode(&DriveFrame::new(0, 0, 0)), b"<0,0,0>\n");
        assert_eq!(buf.encode(&DriveFrame::new(12, -200, 3)), b"<12,-200,3>\n");
        assert_eq!(
            buf.encode(&DriveFrame::new(-255, 255, -255)),
            b"<-255,255,-255>\n"
        );
    }

    #[test]
    fn encodes_extended_frame() {
        let mut buf = FrameBuffer::new();
        assert_eq!(
            buf.encode(&DriveFrame::with_actuators(1, 2, 3, true, false)),
            b"<1,2,3,1,0>\n"
        );
        assert_eq!(
            buf.encode(&DriveFrame::neutral(true)),
            b"<0,0,0,0,0>\n"
        );
    }

    #[test]
    fn encode_clamps_out_of_range_axes() {
        let mut buf = FrameBuffer::new();
        assert_eq!(
            buf.encode(&DriveFrame::new(300, -300, 256)),
            b"<255,-255,255>\n"
        );
    }

    #[test]
    fn worst_case_frame_fits_buffer() {
        let mut buf = FrameBuffer::new();
        let bytes = buf.encode(&DriveFrame::with_actuators(-255, -255, -255, true, true));
        assert_eq!(bytes.len(), MAX_FRAME_LEN);
        assert_eq!(bytes, b"<-255,-255,-255,1,1>\n");
    }

    #[test]
    fn parses_basic_and_extended() {
        assert_eq!(
            parse_one(b"<12,-200,3>\n"),
            Some(DriveFrame::new(12, -200, 3))
        );
        assert_eq!(
            parse_one(b"<1,2,3,1,0>\n"),
            Some(DriveFrame::with_actuators(1, 2, 3, true, false))
        );
    }

    #[test]
    fn parser_resynchronizes_after_garbage() {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        parser.push_bytes(b"xx,3>junk<4,5,6>\n\xff<7,8,9>", &mut out);
        assert_eq!(
            out,
            vec![DriveFrame::new(4, 5, 6), DriveFrame::new(7, 8, 9)]
        );
    }

    #[test]
    fn parser_handles_split_reads() {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        parser.push_bytes(b"<10,-", &mut out);
        assert!(out.is_empty());
        parser.push_bytes(b"20,30>\n<1,", &mut out);
        assert_eq!(out, vec![DriveFrame::new(10, -20, 30)]);
        parser.push_bytes(b"1,1>", &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], DriveFrame::new(1, 1, 1));
    }

    #[test]
    fn parser_rejects_bad_frames() {
        assert_eq!(parse_one(b"<1,2>"), None);
        assert_eq!(parse_one(b"<1,2,3,4>"), None);
        assert_eq!(parse_one(b"<1,2,3,0,2>"), None);
        assert_eq!(parse_one(b"<256,0,0>"), None);
        assert_eq!(parse_one(b"<a,b,c>"), None);
        assert_eq!(parse_one(b"<1,2,3,0,1,0>"), None);
    }

    #[test]
    fn parser_counts_errors_and_recovers() {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        parser.push_bytes(b"<1,2<3,4,5>", &mut out);
        // First frame truncated by the second '<'
        assert_eq!(parser.error_count(), 1);
        assert_eq!(out, vec![DriveFrame::new(3, 4, 5)]);
    }

    #[test]
    fn parser_drops_overlong_frame() {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        let long = [b'1'; MAX_FRAME_LEN + 4];
        parser.push_bytes(b"<", &mut out);
        parser.push_bytes(&long, &mut out);
        parser.push_bytes(b"><0,0,0>", &mut out);
        assert_eq!(parser.error_count(), 1);
        assert_eq!(out, vec![DriveFrame::new(0, 0, 0)]);
    }

    #[test]
    fn neutral_roundtrip() {
        let mut buf = FrameBuffer::new();
        let frame = DriveFrame::neutral(true);
        assert!(frame.is_neutral());
        let parsed = parse_one(&buf.encode(&frame).to_vec()).unwrap();
        assert_eq!(parsed, frame);
    }
}
