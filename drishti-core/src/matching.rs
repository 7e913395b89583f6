//! Brute-force descriptor matching with ratio-test filtering
//!
//! For every template descriptor the two nearest frame descriptors (by
//! Hamming distance) are found; a match is kept only when the best is
//! clearly better than the runner-up (Lowe's ratio test). This rejects the
//! ambiguous matches that repeated texture produces.

use crate::types::Descriptor;

/// Matching parameters
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Ratio test threshold: keep when best < ratio * second-best
    pub ratio_test: f32,
    /// Minimum surviving matches for a template to stay a candidate
    pub min_good_matches: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ratio_test: 0.75,
            min_good_matches: 8,
        }
    }
}

/// One accepted correspondence: template feature index -> frame feature index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMatch {
    /// Index into the template's keypoints/descriptors
    pub template_idx: usize,
    /// Index into the frame's keypoints/descriptors
    pub frame_idx: usize,
    /// Hamming distance of the accepted match
    pub distance: u32,
}

/// Match template descriptors against frame descriptors.
///
/// Returns correspondences surviving the ratio test, in template order.
/// Fewer than two frame descriptors cannot pass the ratio test, so the
/// result is empty.
pub fn match_features(
    template: &[Descriptor],
    frame: &[Descriptor],
    config: &MatchConfig,
) -> Vec<FeatureMatch> {
    if frame.len() < 2 {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for (ti, td) in template.iter().enumerate() {
        let mut best = u32::MAX;
        let mut second = u32::MAX;
        let mut best_idx = 0usize;
        for (fi, fd) in frame.iter().enumerate() {
            let d = td.hamming(fd);
            if d < best {
                second = best;
                best = d;
                best_idx = fi;
            } else if d < second {
                second = d;
            }
        }
        if (best as f32) < config.ratio_test * second as f32 {
            matches.push(FeatureMatch {
                template_idx: ti,
                frame_idx: best_idx,
                distance: best,
            });
        }
    }
    matches
}
