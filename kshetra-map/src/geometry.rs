//! Millimetre geometry and the viewport transform

use serde::{Deserialize, Serialize};

/// A point on the field in millimetres, origin at the field's top-left
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MmPoint {
    pub x: f32,
    pub y: f32,
}

impl MmPoint {
    /// Create a point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &MmPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned rectangle in millimetres
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MmRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl MmRect {
    /// Create a rectangle from its top-left corner and size
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Containment test (right/bottom edges exclusive)
    #[inline]
    pub fn contains(&self, p: MmPoint) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }

    /// Centre of the rectangle
    pub fn center(&self) -> MmPoint {
        MmPoint::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// mm → pixel transform for rendering the field
///
/// The default scale of 0.08 maps 1000 mm to 80 px, which fits the full
/// field (6000 × 12100 mm) on a laptop screen with the margin included.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Viewport {
    /// Pixels per millimetre
    pub scale: f32,
    /// Margin around the field in pixels
    pub margin: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 0.08,
            margin: 20,
        }
    }
}

impl Viewport {
    /// Field point to screen pixel
    pub fn to_px(&self, p: MmPoint) -> (i32, i32) {
        (
            self.margin + (p.x * self.scale).round() as i32,
            self.margin + (p.y * self.scale).round() as i32,
        )
    }

    /// Screen pixel back to field point
    pub fn to_mm(&self, px: i32, py: i32) -> MmPoint {
        MmPoint::new(
            (px - self.margin) as f32 / self.scale,
            (py - self.margin) as f32 / self.scale,
        )
    }

    /// Size of a mm extent in pixels, at least 1 px so thin features stay
    /// visible
    pub fn size_px(&self, w_mm: f32, h_mm: f32) -> (i32, i32) {
        (
            ((w_mm * self.scale) as i32).max(1),
            ((h_mm * self.scale) as i32).max(1),
        )
    }
}
