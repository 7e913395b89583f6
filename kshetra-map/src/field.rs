//! Field layout: zones, forest blocks and spatial queries
//!
//! The standard layout transcribes the rulebook field drawing: a 6000 ×
//! 12100 mm frame split into the Martial Club zone, the pathway network,
//! the Meihua forest (12 raised blocks) and the arena with its ramp. Each
//! zone carries a grid class so snapping density can differ between the
//! open zones (100 mm) and the forest blocks (120 mm).

use crate::error::{Error, Result};
use crate::geometry::{MmPoint, MmRect};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid class of a zone, selecting its snapping pitch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneClass {
    MartialClub,
    Pathway,
    Arena,
    Ramp,
}

/// Grid pitch per zone class, in millimetres
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GridPitch {
    #[serde(default = "default_pitch_open")]
    pub martial_club: f32,
    #[serde(default = "default_pitch_open")]
    pub pathway: f32,
    #[serde(default = "default_pitch_forest")]
    pub forest: f32,
    #[serde(default = "default_pitch_open")]
    pub arena: f32,
    #[serde(default = "default_pitch_open")]
    pub ramp: f32,
}

fn default_pitch_open() -> f32 {
    100.0
}
fn default_pitch_forest() -> f32 {
    120.0
}

impl Default for GridPitch {
    fn default() -> Self {
        Self {
            martial_club: default_pitch_open(),
            pathway: default_pitch_open(),
            forest: default_pitch_forest(),
            arena: default_pitch_open(),
            ramp: default_pitch_open(),
        }
    }
}

/// A gridded zone of the field
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Zone {
    pub name: String,
    pub class: ZoneClass,
    pub rect: MmRect,
}

/// One raised forest block
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ForestBlock {
    /// Block number from the rulebook (1..=12)
    pub id: u8,
    /// Block height in millimetres (200, 400 or 600)
    pub height_mm: u16,
    pub rect: MmRect,
}

/// Ungridded field furniture: start zones, racks, retry zones
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Landmark {
    pub name: String,
    pub rect: MmRect,
}

/// The complete field layout
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FieldLayout {
    /// Field frame width in millimetres
    pub width_mm: f32,
    /// Field frame height in millimetres
    pub height_mm: f32,
    #[serde(default)]
    pub grid: GridPitch,
    pub zones: Vec<Zone>,
    pub forest: Vec<ForestBlock>,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl FieldLayout {
    /// The standard competition field.
    pub fn standard() -> Self {
        let zone = |name: &str, x, y, w, h, class| Zone {
            name: name.to_string(),
            class,
            rect: MmRect::new(x, y, w, h),
        };
        let landmark = |name: &str, x, y, w, h| Landmark {
            name: name.to_string(),
            rect: MmRect::new(x, y, w, h),
        };
        let block = |id, x, y, height_mm| ForestBlock {
            id,
            height_mm,
            rect: MmRect::new(x, y, 1200.0, 1200.0),
        };

        Self {
            width_mm: 6000.0,
            height_mm: 12100.0,
            grid: GridPitch::default(),
            zones: vec![
                zone("Zone 1 - Martial Club", 25.0, 50.0, 6000.0, 1970.0, ZoneClass::MartialClub),
                zone("R1 Pathway (L)", 25.0, 2050.0, 1200.0, 7450.0, ZoneClass::Pathway),
                zone("R1 Pathway (R)", 4825.0, 2050.0, 1200.0, 5970.0, ZoneClass::Pathway),
                zone("R2 Entrance", 1255.0, 2050.0, 3540.0, 1200.0, ZoneClass::Pathway),
                zone("R2 Exit", 1255.0, 8050.0, 4770.0, 1450.0, ZoneClass::Pathway),
                zone("Zone 3 - Arena", 25.0, 9550.0, 6000.0, 2500.0, ZoneClass::Arena),
                zone("Ramp", 4525.0, 9350.0, 1500.0, 1500.0, ZoneClass::Ramp),
            ],
            forest: vec![
                block(1, 3625.0, 3250.0, 400),
                block(2, 2425.0, 3250.0, 200),
                block(3, 1225.0, 3250.0, 400),
                block(4, 3625.0, 4450.0, 200),
                block(5, 2425.0, 4450.0, 400),
                block(6, 1225.0, 4450.0, 600),
                block(7, 3625.0, 5650.0, 400),
                block(8, 2425.0, 5650.0, 600),
                block(9, 1225.0, 5650.0, 400),
                block(10, 3625.0, 6850.0, 200),
                block(11, 2425.0, 6850.0, 400),
                block(12, 1225.0, 6850.0, 200),
            ],
            landmarks: vec![
                landmark("R1 Start Zone", 5025.0, 50.0, 1000.0, 1000.0),
                landmark("R2 Start Zone", 1025.0, 50.0, 800.0, 800.0),
                landmark("Staff Rack", 3025.0, 50.0, 800.0, 300.0),
                landmark("Arena Retry Zone", 5030.0, 11050.0, 1000.0, 1000.0),
                landmark("Used Weapon Area", 1015.0, 9550.0, 1500.0, 300.0),
            ],
        }
    }

    /// Load a custom layout from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let layout: FieldLayout = toml::from_str(&contents)?;
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> Result<()> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(Error::Layout("non-positive field dimensions".into()));
        }
        for block in &self.forest {
            if !matches!(block.height_mm, 200 | 400 | 600) {
                return Err(Error::Layout(format!(
                    "forest block {} has height {} (expected 200/400/600)",
                    block.id, block.height_mm
                )));
            }
        }
        Ok(())
    }

    /// True when the point lies inside the field frame.
    pub fn contains(&self, p: MmPoint) -> bool {
        p.x >= 0.0 && p.x < self.width_mm && p.y >= 0.0 && p.y < self.height_mm
    }

    /// Forest block under a point, if any. Blocks sit on top of the
    /// pathway zones, so they are checked before zones.
    pub fn forest_block_at(&self, p: MmPoint) -> Option<&ForestBlock> {
        self.forest.iter().find(|b| b.rect.contains(p))
    }

    /// Zone under a point. The ramp overlaps the arena and wins.
    pub fn zone_at(&self, p: MmPoint) -> Option<&Zone> {
        if let Some(ramp) = self
            .zones
            .iter()
            .find(|z| z.class == ZoneClass::Ramp && z.rect.contains(p))
        {
            return Some(ramp);
        }
        self.zones.iter().find(|z| z.rect.contains(p))
    }

    /// True when the point is on the ramp.
    pub fn is_on_ramp(&self, p: MmPoint) -> bool {
        self.zone_at(p).is_some_and(|z| z.class == ZoneClass::Ramp)
    }

    /// Grid pitch at a point. Forest blocks override their underlying
    /// zone; elsewhere the zone class decides; off-zone points fall back
    /// to the open pitch.
    pub fn grid_pitch_at(&self, p: MmPoint) -> f32 {
        if self.forest_block_at(p).is_some() {
            return self.grid.forest;
        }
        match self.zone_at(p).map(|z| z.class) {
            Some(ZoneClass::MartialClub) => self.grid.martial_club,
            Some(ZoneClass::Pathway) => self.grid.pathway,
            Some(ZoneClass::Arena) => self.grid.arena,
            Some(ZoneClass::Ramp) => self.grid.ramp,
            None => self.grid.martial_club,
        }
    }

    /// Snap a point to the centre of its grid cell, using the local pitch.
    pub fn snap_to_grid(&self, p: MmPoint) -> Result<MmPoint> {
        if !self.contains(p) {
            return Err(Error::OutOfField { x: p.x, y: p.y });
        }
        let pitch = self.grid_pitch_at(p);
        let snap = |v: f32| (v / pitch).floor() * pitch + pitch / 2.0;
        Ok(MmPoint::new(snap(p.x), snap(p.y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_is_valid() {
        let layout = FieldLayout::standard();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.zones.len(), 7);
        assert_eq!(layout.forest.len(), 12);
        assert_eq!(layout.landmarks.len(), 5);
    }

    #[test]
    fn zone_lookup_prefers_ramp_over_arena() {
        let layout = FieldLayout::standard();
        // Inside both the arena and the ramp footprint
        let p = MmPoint::new(5000.0, 10000.0);
        assert_eq!(layout.zone_at(p).unwrap().class, ZoneClass::Ramp);
        assert!(layout.is_on_ramp(p));

        // Arena floor away from the ramp
        let p = MmPoint::new(1000.0, 10500.0);
        assert_eq!(layout.zone_at(p).unwrap().class, ZoneClass::Arena);
        assert!(!layout.is_on_ramp(p));
    }

    #[test]
    fn forest_blocks_override_grid_pitch() {
        let layout = FieldLayout::standard();
        // Centre of block 5
        let p = MmPoint::new(3025.0, 5050.0);
        let block = layout.forest_block_at(p).unwrap();
        assert_eq!(block.id, 5);
        assert_eq!(block.height_mm, 400);
        assert_eq!(layout.grid_pitch_at(p), 120.0);

        // Martial Club floor
        let p = MmPoint::new(3000.0, 1000.0);
        assert!(layout.forest_block_at(p).is_none());
        assert_eq!(layout.grid_pitch_at(p), 100.0);
    }

    #[test]
    fn snapping_uses_local_pitch() {
        let layout = FieldLayout::standard();

        // 100 mm pitch: 1234 -> cell 12 -> centre 1250
        let p = layout.snap_to_grid(MmPoint::new(1234.0, 1111.0)).unwrap();
        assert_eq!(p, MmPoint::new(1250.0, 1150.0));

        // 120 mm pitch inside a forest block
        let p = layout.snap_to_grid(MmPoint::new(2500.0, 3300.0)).unwrap();
        assert_eq!(p, MmPoint::new(2460.0, 3300.0));
    }

    #[test]
    fn snapping_rejects_out_of_field_points() {
        let layout = FieldLayout::standard();
        assert!(matches!(
            layout.snap_to_grid(MmPoint::new(-1.0, 100.0)),
            Err(Error::OutOfField { .. })
        ));
        assert!(layout.snap_to_grid(MmPoint::new(5999.0, 12099.0)).is_ok());
    }

    #[test]
    fn layout_toml_roundtrip() {
        let layout = FieldLayout::standard();
        let text = toml::to_string_pretty(&layout).unwrap();
        let parsed: FieldLayout = toml::from_str(&text).unwrap();
        assert_eq!(parsed.zones.len(), layout.zones.len());
        assert_eq!(parsed.forest[7].height_mm, 600);
    }

    #[test]
    fn custom_layout_file_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.toml");
        let layout = FieldLayout::standard();
        std::fs::write(&path, toml::to_string_pretty(&layout).unwrap()).unwrap();

        let loaded = FieldLayout::from_file(&path).unwrap();
        assert_eq!(loaded.width_mm, 6000.0);
    }

    #[test]
    fn bad_forest_height_is_rejected() {
        let mut layout = FieldLayout::standard();
        layout.forest[0].height_mm = 300;
        assert!(layout.validate().is_err());
    }
}
