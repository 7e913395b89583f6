//! Planar homography estimation
//!
//! The symbol cards are flat, so a correct set of correspondences between a
//! template and a frame is explained by a 3x3 projective transform. An
//! exact solve from 4 correspondences (direct linear transform, h33 fixed
//! at 1) sits inside a RANSAC loop that scores models by reprojection
//! error; the inlier count and ratio of the best model are the raw
//! confidence signal for detection.

use crate::types::Point2f;
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// RANSAC parameters
#[derive(Clone, Copy, Debug)]
pub struct RansacConfig {
    /// Sampling iterations
    pub iterations: usize,
    /// Reprojection error threshold in pixels
    pub inlier_threshold: f32,
    /// RNG seed; fixed so a given input always yields the same model
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            inlier_threshold: 5.0,
            seed: 0x5eed,
        }
    }
}

/// A 3x3 projective transform, row-major with h33 = 1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography(pub [f32; 9]);

impl Homography {
    /// Identity transform
    pub const fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// Apply the transform to a point.
    ///
    /// Returns `None` when the point maps to the line at infinity
    /// (degenerate for any physically plausible card pose).
    pub fn apply(&self, p: Point2f) -> Option<Point2f> {
        let h = &self.0;
        let w = h[6] * p.x + h[7] * p.y + h[8];
        if w.abs() < 1e-8 {
            return None;
        }
        Some(Point2f::new(
            (h[0] * p.x + h[1] * p.y + h[2]) / w,
            (h[3] * p.x + h[4] * p.y + h[5]) / w,
        ))
    }

    /// Project a quad (e.g. template corners) through the transform.
    pub fn project_quad(&self, corners: &[Point2f; 4]) -> Option<[Point2f; 4]> {
        Some([
            self.apply(corners[0])?,
            self.apply(corners[1])?,
            self.apply(corners[2])?,
            self.apply(corners[3])?,
        ])
    }

    /// Exact solve from 4 correspondences via DLT.
    ///
    /// Returns `None` for degenerate configurations (3 collinear points or
    /// a singular system).
    pub fn from_points4(src: &[Point2f; 4], dst: &[Point2f; 4]) -> Option<Self> {
        if has_collinear_triple(src) || has_collinear_triple(dst) {
            return None;
        }

        // Two equations per correspondence in the unknowns h11..h32:
        //   [x y 1 0 0 0 -ux -uy] h = u
        //   [0 0 0 x y 1 -vx -vy] h = v
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (src[i].x as f64, src[i].y as f64);
            let (u, v) = (dst[i].x as f64, dst[i].y as f64);
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
        }

        let h = solve8(&mut a)?;
        Some(Self([
            h[0] as f32,
            h[1] as f32,
            h[2] as f32,
            h[3] as f32,
            h[4] as f32,
            h[5] as f32,
            h[6] as f32,
            h[7] as f32,
            1.0,
        ]))
    }
}

/// Result of RANSAC estimation
#[derive(Clone, Debug)]
pub struct RansacResult {
    /// Best model found
    pub homography: Homography,
    /// Per-correspondence inlier mask
    pub inlier_mask: Vec<bool>,
    /// Number of inliers
    pub inliers: usize,
}

impl RansacResult {
    /// Inliers as a fraction of all correspondences
    pub fn inlier_ratio(&self) -> f32 {
        if self.inlier_mask.is_empty() {
            0.0
        } else {
            self.inliers as f32 / self.inlier_mask.len() as f32
        }
    }
}

/// Estimate a homography from noisy correspondences with RANSAC.
///
/// `src` and `dst` are parallel arrays. Returns `None` with fewer than 4
/// correspondences or when no sample produces a model with at least 4
/// inliers.
pub fn ransac_homography(
    src: &[Point2f],
    dst: &[Point2f],
    config: &RansacConfig,
) -> Option<RansacResult> {
    let n = src.len().min(dst.len());
    if n < 4 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let threshold_sq = config.inlier_threshold * config.inlier_threshold;

    let mut best: Option<RansacResult> = None;

    for _ in 0..config.iterations {
        let idx = sample4(&mut rng, n);
        let sample_src = [src[idx[0]], src[idx[1]], src[idx[2]], src[idx[3]]];
        let sample_dst = [dst[idx[0]], dst[idx[1]], dst[idx[2]], dst[idx[3]]];

        let Some(h) = Homography::from_points4(&sample_src, &sample_dst) else {
            continue;
        };

        let mut mask = vec![false; n];
        let mut inliers = 0usize;
        for i in 0..n {
            if let Some(p) = h.apply(src[i]) {
                let dx = p.x - dst[i].x;
                let dy = p.y - dst[i].y;
                if dx * dx + dy * dy <= threshold_sq {
                    mask[i] = true;
                    inliers += 1;
                }
            }
        }

        if inliers >= 4 && best.as_ref().is_none_or(|b| inliers > b.inliers) {
            best = Some(RansacResult {
                homography: h,
                inlier_mask: mask,
                inliers,
            });
        }
    }

    best
}

/// Draw 4 distinct indices in [0, n)
fn sample4(rng: &mut StdRng, n: usize) -> [usize; 4] {
    let mut idx = [0usize; 4];
    let mut count = 0;
    while count < 4 {
        let candidate = rng.gen_range(0..n);
        if !idx[..count].contains(&candidate) {
            idx[count] = candidate;
            count += 1;
        }
    }
    idx
}

/// True when any 3 of the 4 points are (nearly) collinear
fn has_collinear_triple(pts: &[Point2f; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|t| {
        let (a, b, c) = (pts[t[0]], pts[t[1]], pts[t[2]]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        cross.abs() < 1e-3
    })
}

/// Solve an 8x8 linear system (augmented column 9) by Gaussian elimination
/// with partial pivoting.
fn solve8(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        // Pivot: largest magnitude in this column
        let mut pivot = col;
        for row in (col + 1)..8 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot);

        // Eliminate below
        for row in (col + 1)..8 {
            let factor = a[row][col] / a[col][col];
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    // Back substitution
    let mut x = [0.0f64; 8];
    for col in (0..8).rev() {
        let mut sum = a[col][8];
        for k in (col + 1)..8 {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    Some(x)
}
