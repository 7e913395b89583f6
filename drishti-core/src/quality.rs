//! Geometric sanity gate for detected quads
//!
//! A homography fit to matches on background clutter still produces *some*
//! quad; this gate rejects the ones that cannot be a symbol card seen by a
//! real camera: degenerate area, concave outlines, or wildly uneven sides.

use crate::types::Point2f;

/// Quad acceptance parameters
#[derive(Clone, Copy, Debug)]
pub struct QualityConfig {
    /// Minimum quad area as a fraction of the frame area
    pub min_area_fraction: f32,
    /// Maximum quad area as a fraction of the frame area
    pub max_area_fraction: f32,
    /// Minimum side length in pixels
    pub min_side_px: f32,
    /// Maximum allowed ratio of longest to shortest side
    pub max_side_ratio: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_area_fraction: 0.005,
            max_area_fraction: 0.8,
            min_side_px: 15.0,
            max_side_ratio: 8.0,
        }
    }
}

/// Check whether a projected quad makes geometric sense within a frame of
/// the given dimensions.
pub fn is_plausible_quad(
    quad: &[Point2f; 4],
    frame_width: u16,
    frame_height: u16,
    config: &QualityConfig,
) -> bool {
    let frame_area = frame_width as f32 * frame_height as f32;
    if frame_area <= 0.0 {
        return false;
    }

    let area = quad_area(quad);
    if area < frame_area * config.min_area_fraction || area > frame_area * config.max_area_fraction
    {
        return false;
    }

    if !is_convex(quad) {
        return false;
    }

    let mut min_side = f32::MAX;
    let mut max_side = 0.0f32;
    for i in 0..4 {
        let side = quad[i].distance(&quad[(i + 1) % 4]);
        min_side = min_side.min(side);
        max_side = max_side.max(side);
    }
    if min_side < config.min_side_px {
        return false;
    }
    if max_side / (min_side + 1e-6) > config.max_side_ratio {
        return false;
    }

    true
}

/// Quad area by the shoelace formula (orientation-independent).
fn quad_area(quad: &[Point2f; 4]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum / 2.0).abs()
}

/// Convexity: all cross products of consecutive edges share a sign.
fn is_convex(quad: &[Point2f; 4]) -> bool {
    let mut sign = 0i8;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < 1e-6 {
            continue;
        }
        let s = if cross > 0.0 { 1 } else { -1 };
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    sign != 0
}
