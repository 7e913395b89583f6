//! Waypoint routes over the field grid
//!
//! A route is an ordered list of grid-cell centres the robot visits in
//! sequence. Points are snapped to the local grid when added, so a route
//! built from rough clicks or config values still lands on cell centres.

use crate::error::Result;
use crate::field::FieldLayout;
use crate::geometry::MmPoint;

/// An ordered list of snapped waypoints
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    waypoints: Vec<MmPoint>,
}

impl Route {
    /// Empty route
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a route by snapping each point to its local grid cell.
    /// Consecutive duplicates (two clicks in the same cell) collapse.
    pub fn from_points(layout: &FieldLayout, points: &[MmPoint]) -> Result<Self> {
        let mut route = Self::new();
        for &p in points {
            route.push_snapped(layout, p)?;
        }
        Ok(route)
    }

    /// Snap and append one waypoint.
    pub fn push_snapped(&mut self, layout: &FieldLayout, p: MmPoint) -> Result<()> {
        let snapped = layout.snap_to_grid(p)?;
        if self.waypoints.last() != Some(&snapped) {
            self.waypoints.push(snapped);
        }
        Ok(())
    }

    /// The waypoints in visit order
    pub fn waypoints(&self) -> &[MmPoint] {
        &self.waypoints
    }

    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True when the route has no waypoints
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Straight-line length of the route in millimetres
    pub fn length_mm(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum()
    }
}
