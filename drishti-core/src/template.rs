//! Symbol template store and the native `.drsh` pack format
//!
//! A template pack bundles every symbol the robot must recognize, produced
//! offline by the extractor tool from the printed symbol cards.
//!
//! Format (all multi-byte values little-endian):
//! - Header:
//!   - Magic: "DRSHT" (5 bytes)
//!   - Version: u8
//!   - Template count: u16
//! - Per template:
//!   - Name length: u8, then name bytes (UTF-8)
//!   - Width: u16, Height: u16 (template image dimensions, px)
//!   - Keypoint count: u32
//!   - Keypoints: count × (f32 x, f32 y)
//!   - Descriptors: count × 32 bytes

use crate::error::{Error, Result};
use crate::types::{DESCRIPTOR_LEN, Descriptor, Point2f};
use std::io::{Read, Write};
use std::path::Path;

/// Magic bytes for the .drsh pack format
const MAGIC: &[u8; 5] = b"DRSHT";

/// Current format version
const VERSION: u8 = 1;

/// Templates with fewer keypoints than this cannot produce a reliable
/// homography and are rejected at load time.
pub const MIN_TEMPLATE_KEYPOINTS: usize = 8;

/// Upper bound on keypoints per template, to reject corrupt counts before
/// allocating.
const MAX_TEMPLATE_KEYPOINTS: u32 = 100_000;

/// One symbol template: the features of a reference card image
#[derive(Clone, Debug)]
pub struct SymbolTemplate {
    /// Symbol name (file stem of the card image)
    pub name: String,
    /// Template image width in pixels
    pub width: u16,
    /// Template image height in pixels
    pub height: u16,
    /// Keypoint positions, parallel to `descriptors`
    pub keypoints: Vec<Point2f>,
    /// Binary descriptors, parallel to `keypoints`
    pub descriptors: Vec<Descriptor>,
}

impl SymbolTemplate {
    /// Template image corners, clockwise from the origin. Projecting these
    /// through a homography gives the detected quad in the frame.
    pub fn corners(&self) -> [Point2f; 4] {
        let w = self.width as f32;
        let h = self.height as f32;
        [
            Point2f::new(0.0, 0.0),
            Point2f::new(w, 0.0),
            Point2f::new(w, h),
            Point2f::new(0.0, h),
        ]
    }

    fn validate(&self) -> Result<()> {
        if self.keypoints.len() != self.descriptors.len() {
            return Err(Error::BadTemplate {
                name: self.name.clone(),
                reason: format!(
                    "{} keypoints vs {} descriptors",
                    self.keypoints.len(),
                    self.descriptors.len()
                ),
            });
        }
        if self.keypoints.len() < MIN_TEMPLATE_KEYPOINTS {
            return Err(Error::BadTemplate {
                name: self.name.clone(),
                reason: format!(
                    "only {} keypoints (need {})",
                    self.keypoints.len(),
                    MIN_TEMPLATE_KEYPOINTS
                ),
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::BadTemplate {
                name: self.name.clone(),
                reason: "zero-sized template".to_string(),
            });
        }
        Ok(())
    }
}

/// An ordered set of symbol templates
#[derive(Clone, Debug, Default)]
pub struct TemplateSet {
    templates: Vec<SymbolTemplate>,
}

impl TemplateSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, validating it first
    pub fn push(&mut self, template: SymbolTemplate) -> Result<()> {
        template.validate()?;
        self.templates.push(template);
        Ok(())
    }

    /// Templates in load order
    pub fn templates(&self) -> &[SymbolTemplate] {
        &self.templates
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when the set holds no templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template by index
    pub fn get(&self, index: usize) -> Option<&SymbolTemplate> {
        self.templates.get(index)
    }

    /// Name of the template at `index`, or `"?"` for a stale index
    pub fn name(&self, index: usize) -> &str {
        self.templates.get(index).map_or("?", |t| t.name.as_str())
    }

    /// Load a pack from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Save the pack to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_to(&mut file)
    }

    /// Read a pack from any reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 5];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::InvalidFormat("bad magic, not a .drsh pack".into()));
        }

        let version = read_u8(reader)?;
        if version != VERSION {
            return Err(Error::VersionMismatch {
                expected: VERSION,
                found: version,
            });
        }

        let count = read_u16(reader)?;
        let mut set = TemplateSet::new();
        for _ in 0..count {
            set.push(read_template(reader)?)?;
        }
        Ok(set)
    }

    /// Write the pack to any writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&[VERSION])?;
        let count = u16::try_from(self.templates.len())
            .map_err(|_| Error::InvalidParameter("too many templates for pack".into()))?;
        writer.write_all(&count.to_le_bytes())?;
        for t in &self.templates {
            write_template(writer, t)?;
        }
        Ok(())
    }
}

fn read_template<R: Read>(reader: &mut R) -> Result<SymbolTemplate> {
    let name_len = read_u8(reader)? as usize;
    let mut name_bytes = vec![0u8; name_len];
    reader.read_exact(&mut name_bytes)?;
    let name = String::from_utf8(name_bytes)
        .map_err(|_| Error::InvalidFormat("template name is not UTF-8".into()))?;

    let width = read_u16(reader)?;
    let height = read_u16(reader)?;

    let kp_count = read_u32(reader)?;
    if kp_count > MAX_TEMPLATE_KEYPOINTS {
        return Err(Error::InvalidFormat(format!(
            "keypoint count {kp_count} exceeds limit"
        )));
    }
    let kp_count = kp_count as usize;

    let mut keypoints = Vec::with_capacity(kp_count);
    for _ in 0..kp_count {
        let x = read_f32(reader)?;
        let y = read_f32(reader)?;
        keypoints.push(Point2f::new(x, y));
    }

    let mut descriptors = Vec::with_capacity(kp_count);
    for _ in 0..kp_count {
        let mut buf = [0u8; DESCRIPTOR_LEN];
        reader.read_exact(&mut buf)?;
        descriptors.push(Descriptor(buf));
    }

    Ok(SymbolTemplate {
        name,
        width,
        height,
        keypoints,
        descriptors,
    })
}

fn write_template<W: Write>(writer: &mut W, t: &SymbolTemplate) -> Result<()> {
    let name_len = u8::try_from(t.name.len())
        .map_err(|_| Error::InvalidParameter(format!("template name too long: {:?}", t.name)))?;
    writer.write_all(&[name_len])?;
    writer.write_all(t.name.as_bytes())?;
    writer.write_all(&t.width.to_le_bytes())?;
    writer.write_all(&t.height.to_le_bytes())?;
    writer.write_all(&(t.keypoints.len() as u32).to_le_bytes())?;
    for kp in &t.keypoints {
        writer.write_all(&kp.x.to_le_bytes())?;
        writer.write_all(&kp.y.to_le_bytes())?;
    }
    for d in &t.descriptors {
        writer.write_all(&d.0)?;
    }
    Ok(())
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_template(name: &str) -> SymbolTemplate {
        let keypoints: Vec<Point2f> = (0..12)
            .map(|i| Point2f::new(i as f32 * 3.0, i as f32 * 5.0))
            .collect();
        let descriptors: Vec<Descriptor> = (0..12)
            .map(|i| {
                let mut d = [0u8; DESCRIPTOR_LEN];
                d[0] = i as u8;
                Descriptor(d)
            })
            .collect();
        SymbolTemplate {
            name: name.to_string(),
            width: 200,
            height: 160,
            keypoints,
            descriptors,
        }
    }

    #[test]
    fn pack_roundtrip() {
        let mut set = TemplateSet::new();
        set.push(sample_template("circle")).unwrap();
        set.push(sample_template("triangle")).unwrap();

        let mut bytes = Vec::new();
        set.write_to(&mut bytes).unwrap();

        let loaded = TemplateSet::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.name(0), "circle");
        assert_eq!(loaded.name(1), "triangle");
        assert_eq!(loaded.get(0).unwrap().keypoints.len(), 12);
        assert_eq!(
            loaded.get(1).unwrap().descriptors[3],
            set.get(1).unwrap().descriptors[3]
        );
    }

    #[test]
    fn pack_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.drsh");

        let mut set = TemplateSet::new();
        set.push(sample_template("square")).unwrap();
        set.save(&path).unwrap();

        let loaded = TemplateSet::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.name(0), "square");
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = b"NOPEx\x01\x00\x00";
        assert!(matches!(
            TemplateSet::read_from(&mut bytes.as_slice()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.push(9);
        bytes.extend_from_slice(&0u16.to_le_bytes());
        assert!(matches!(
            TemplateSet::read_from(&mut bytes.as_slice()),
            Err(Error::VersionMismatch {
                expected: 1,
                found: 9
            })
        ));
    }

    #[test]
    fn rejects_truncated_pack() {
        let mut set = TemplateSet::new();
        set.push(sample_template("circle")).unwrap();
        let mut bytes = Vec::new();
        set.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(TemplateSet::read_from(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn rejects_sparse_template() {
        let mut t = sample_template("thin");
        t.keypoints.truncate(3);
        t.descriptors.truncate(3);
        let mut set = TemplateSet::new();
        assert!(matches!(set.push(t), Err(Error::BadTemplate { .. })));
    }

    #[test]
    fn corners_follow_dimensions() {
        let t = sample_template("c");
        let corners = t.corners();
        assert_eq!(corners[2], Point2f::new(200.0, 160.0));
    }
}
