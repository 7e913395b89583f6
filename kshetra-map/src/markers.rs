//! KFS marker registry
//!
//! KFS markers are the collectible flags placed on the field before a run.
//! The rulebook allows at most 8; placement snaps to the local grid so a
//! marker and a route waypoint targeting the same cell coincide exactly.

use crate::error::{Error, Result};
use crate::field::FieldLayout;
use crate::geometry::MmPoint;

/// Maximum number of KFS markers on the field
pub const MAX_KFS: usize = 8;

/// Placed KFS markers
#[derive(Clone, Debug, Default)]
pub struct KfsRegistry {
    markers: Vec<MmPoint>,
}

impl KfsRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a marker, snapping to the local grid cell.
    pub fn place(&mut self, layout: &FieldLayout, p: MmPoint) -> Result<MmPoint> {
        if self.markers.len() >= MAX_KFS {
            return Err(Error::MarkerLimit(MAX_KFS));
        }
        let snapped = layout.snap_to_grid(p)?;
        if self.markers.contains(&snapped) {
            return Err(Error::DuplicateMarker {
                x: snapped.x,
                y: snapped.y,
            });
        }
        self.markers.push(snapped);
        Ok(snapped)
    }

    /// Remove the marker nearest to `p` within `radius_mm`, returning it.
    pub fn remove_near(&mut self, p: MmPoint, radius_mm: f32) -> Option<MmPoint> {
        let (index, _) = self
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m.distance(&p)))
            .filter(|(_, d)| *d <= radius_mm)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        Some(self.markers.swap_remove(index))
    }

    /// Marker at (or within `radius_mm` of) a point, without removing it.
    pub fn find_near(&self, p: MmPoint, radius_mm: f32) -> Option<MmPoint> {
        self.markers
            .iter()
            .copied()
            .filter(|m| m.distance(&p) <= radius_mm)
            .min_by(|a, b| a.distance(&p).total_cmp(&b.distance(&p)))
    }

    /// Placed markers
    pub fn markers(&self) -> &[MmPoint] {
        &self.markers
    }

    /// Number of placed markers
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// True when no markers are placed
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Remove all markers
    pub fn clear(&mut self) {
        self.markers.clear();
    }
}
