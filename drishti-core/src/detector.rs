//! Per-frame symbol detection
//!
//! Runs every template against a frame's features and keeps the best
//! geometrically verified candidate. The confidence score is
//! `inliers * inlier_ratio`: high only when many matches agree *and* few
//! disagree, which separates a real card in view from scattered
//! coincidental matches.

use crate::homography::{Homography, RansacConfig, ransac_homography};
use crate::matching::{MatchConfig, match_features};
use crate::quality::{QualityConfig, is_plausible_quad};
use crate::template::TemplateSet;
use crate::types::{FrameFeatures, Point2f};

/// Detector parameters
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    /// Descriptor matching parameters
    pub matching: MatchConfig,
    /// RANSAC parameters
    pub ransac: RansacConfig,
    /// Quad sanity gate
    pub quality: QualityConfig,
    /// Minimum geometric inliers to accept a candidate
    pub min_inliers: usize,
    /// Minimum inlier ratio to accept a candidate
    pub min_inlier_ratio: f32,
    /// Frames with fewer features than this are skipped outright
    pub min_frame_features: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            ransac: RansacConfig::default(),
            quality: QualityConfig::default(),
            min_inliers: 6,
            min_inlier_ratio: 0.35,
            min_frame_features: 6,
        }
    }
}

/// One accepted detection
#[derive(Clone, Debug)]
pub struct Detection {
    /// Index of the matched template in the set
    pub template: usize,
    /// Confidence score: inliers * inlier_ratio
    pub score: f32,
    /// Geometric inliers
    pub inliers: usize,
    /// Matches that survived the ratio test
    pub good_matches: usize,
    /// Template corners projected into the frame
    pub quad: [Point2f; 4],
    /// Estimated template-to-frame transform
    pub homography: Homography,
}

/// Symbol detector over a template set
pub struct SymbolDetector {
    templates: TemplateSet,
    config: DetectorConfig,
}

impl SymbolDetector {
    /// Create a detector
    pub fn new(templates: TemplateSet, config: DetectorConfig) -> Self {
        Self { templates, config }
    }

    /// The template set this detector searches
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Find the best symbol candidate in a frame, if any.
    pub fn detect(&self, frame: &FrameFeatures) -> Option<Detection> {
        if frame.len() < self.config.min_frame_features {
            return None;
        }

        let mut best: Option<Detection> = None;

        for (index, template) in self.templates.templates().iter().enumerate() {
            let matches = match_features(
                &template.descriptors,
                &frame.descriptors,
                &self.config.matching,
            );
            if matches.len() < self.config.matching.min_good_matches {
                continue;
            }

            let src: Vec<Point2f> = matches
                .iter()
                .map(|m| template.keypoints[m.template_idx])
                .collect();
            let dst: Vec<Point2f> = matches.iter().map(|m| frame.keypoints[m.frame_idx]).collect();

            let Some(fit) = ransac_homography(&src, &dst, &self.config.ransac) else {
                continue;
            };
            let ratio = fit.inlier_ratio();
            if fit.inliers < self.config.min_inliers || ratio < self.config.min_inlier_ratio {
                continue;
            }

            let Some(quad) = fit.homography.project_quad(&template.corners()) else {
                continue;
            };
            if !is_plausible_quad(&quad, frame.width, frame.height, &self.config.quality) {
                log::debug!(
                    "{}: quad rejected (inliers={} ratio={:.2})",
                    self.templates.name(index),
                    fit.inliers,
                    ratio
                );
                continue;
            }

            let score = fit.inliers as f32 * ratio;
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Detection {
                    template: index,
                    score,
                    inliers: fit.inliers,
                    good_matches: matches.len(),
                    quad,
                    homography: fit.homography,
                });
            }
        }

        best
    }
}
