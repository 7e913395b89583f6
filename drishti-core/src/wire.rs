//! Wire codec for streaming frame features between processes
//!
//! The camera front-end (capture + extraction) runs as its own process and
//! streams [`FrameFeatures`] to the control daemon over TCP. Each message
//! is a u32 length prefix followed by a payload (all little-endian):
//!
//! - Magic: "DRFR" (4 bytes)
//! - Version: u8
//! - Flags: u8 (bit 0: eye-landmark block present)
//! - Width: u16, Height: u16
//! - Keypoint count: u32
//! - Keypoints: count × (f32 x, f32 y)
//! - Descriptors: count × 32 bytes
//! - Eye block (when flagged): 2 eyes × 6 landmarks × (f32 x, f32 y)

use crate::error::{Error, Result};
use crate::types::{
    DESCRIPTOR_LEN, Descriptor, EyeLandmarks, EyePair, FrameFeatures, Point2f,
};
use std::io::{Read, Write};

/// Magic bytes for a feature frame
const MAGIC: &[u8; 4] = b"DRFR";

/// Current wire version
const VERSION: u8 = 1;

/// Flag bit: payload carries an eye-landmark block
const FLAG_EYES: u8 = 0x01;

/// Upper bound on features per frame, to reject corrupt counts before
/// allocating
const MAX_FRAME_FEATURES: u32 = 50_000;

/// Upper bound on a message length prefix
const MAX_MESSAGE_LEN: u32 = 8 * 1024 * 1024;

/// Encode a frame into a payload (without the length prefix).
pub fn encode_frame(frame: &FrameFeatures) -> Vec<u8> {
    let n = frame.keypoints.len();
    let mut out = Vec::with_capacity(14 + n * (8 + DESCRIPTOR_LEN) + 96);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(if frame.eyes.is_some() { FLAG_EYES } else { 0 });
    out.extend_from_slice(&frame.width.to_le_bytes());
    out.extend_from_slice(&frame.height.to_le_bytes());
    out.extend_from_slice(&(n as u32).to_le_bytes());
    for kp in &frame.keypoints {
        out.extend_from_slice(&kp.x.to_le_bytes());
        out.extend_from_slice(&kp.y.to_le_bytes());
    }
    for d in &frame.descriptors {
        out.extend_from_slice(&d.0);
    }
    if let Some(eyes) = &frame.eyes {
        for eye in [&eyes.left, &eyes.right] {
            for p in eye {
                out.extend_from_slice(&p.x.to_le_bytes());
                out.extend_from_slice(&p.y.to_le_bytes());
            }
        }
    }
    out
}

/// Decode a payload produced by [`encode_frame`].
pub fn decode_frame(payload: &[u8]) -> Result<FrameFeatures> {
    let mut cursor = Cursor { data: payload, pos: 0 };

    let magic = cursor.take(4)?;
    if magic != MAGIC {
        return Err(Error::InvalidFormat("bad magic, not a feature frame".into()));
    }
    let version = cursor.u8()?;
    if version != VERSION {
        return Err(Error::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }
    let flags = cursor.u8()?;
    let width = cursor.u16()?;
    let height = cursor.u16()?;

    let count = cursor.u32()?;
    if count > MAX_FRAME_FEATURES {
        return Err(Error::InvalidFormat(format!(
            "feature count {count} exceeds limit"
        )));
    }
    let count = count as usize;

    let mut frame = FrameFeatures::new(width, height);
    frame.keypoints.reserve(count);
    frame.descriptors.reserve(count);
    for _ in 0..count {
        let x = cursor.f32()?;
        let y = cursor.f32()?;
        frame.keypoints.push(Point2f::new(x, y));
    }
    for _ in 0..count {
        let bytes = cursor.take(DESCRIPTOR_LEN)?;
        let mut d = [0u8; DESCRIPTOR_LEN];
        d.copy_from_slice(bytes);
        frame.descriptors.push(Descriptor(d));
    }

    if flags & FLAG_EYES != 0 {
        let mut read_eye = || -> Result<EyeLandmarks> {
            let mut eye = [Point2f::default(); 6];
            for p in &mut eye {
                p.x = cursor.f32()?;
                p.y = cursor.f32()?;
            }
            Ok(eye)
        };
        let left = read_eye()?;
        let right = read_eye()?;
        frame.eyes = Some(EyePair { left, right });
    }

    if cursor.pos != payload.len() {
        return Err(Error::InvalidFormat(format!(
            "{} trailing bytes",
            payload.len() - cursor.pos
        )));
    }

    Ok(frame)
}

/// Write one length-prefixed frame message.
pub fn write_frame<W: Write>(writer: &mut W, frame: &FrameFeatures) -> Result<()> {
    let payload = encode_frame(frame);
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&payload)?;
    Ok(())
}

/// Read one length-prefixed frame message. Returns `Ok(None)` on a clean
/// EOF at a message boundary.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<FrameFeatures>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_buf);
    if len > MAX_MESSAGE_LEN {
        return Err(Error::InvalidFormat(format!(
            "message length {len} exceeds limit"
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    decode_frame(&payload).map(Some)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Error::InvalidFormat("truncated frame".into()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
