//! Synthetic scenes for hardware-free testing
//!
//! Generates a template set and camera frames with a known ground-truth
//! warp, controllable noise and clutter. Everything is seeded, so a failing
//! test reproduces exactly.

use crate::homography::Homography;
use crate::template::{SymbolTemplate, TemplateSet};
use crate::types::{DESCRIPTOR_LEN, Descriptor, EyeLandmarks, EyePair, FrameFeatures, Point2f};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scene generation parameters
#[derive(Clone, Copy, Debug)]
pub struct SceneConfig {
    /// Frame dimensions in pixels
    pub frame_width: u16,
    pub frame_height: u16,
    /// Template card dimensions in pixels
    pub template_width: u16,
    pub template_height: u16,
    /// Number of templates in the generated set
    pub template_count: usize,
    /// Keypoints per template
    pub template_keypoints: usize,
    /// Background clutter features per frame
    pub clutter_features: usize,
    /// Descriptor bits flipped between template and frame view
    pub descriptor_bit_flips: usize,
    /// Keypoint position jitter in pixels
    pub jitter_px: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frame_width: 800,
            frame_height: 450,
            template_width: 200,
            template_height: 160,
            template_count: 2,
            template_keypoints: 60,
            clutter_features: 80,
            descriptor_bit_flips: 4,
            jitter_px: 1.0,
        }
    }
}

/// A generated scene: templates plus the machinery to render frames of them
pub struct SyntheticScene {
    /// The generated template set
    pub templates: TemplateSet,
    config: SceneConfig,
    seed: u64,
    /// Ground-truth card placement per template
    warps: Vec<Homography>,
}

impl SyntheticScene {
    /// Generate a scene from a seed.
    pub fn generate(config: &SceneConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut templates = TemplateSet::new();
        let mut warps = Vec::new();

        for i in 0..config.template_count {
            let template = random_template(&mut rng, config, i);
            let warp = card_placement(config, i, &template);
            templates
                .push(template)
                .expect("generated template is always valid");
            warps.push(warp);
        }

        Self {
            templates,
            config: *config,
            seed,
            warps,
        }
    }

    /// Ground-truth template-to-frame transform for a template.
    pub fn truth_warp(&self, template: usize) -> &Homography {
        &self.warps[template]
    }

    /// Frame showing the given template under its ground-truth warp, with
    /// noise, bit flips and background clutter mixed in.
    pub fn frame_with_symbol(&self, template: usize) -> FrameFeatures {
        let mut rng = StdRng::seed_from_u64(self.seed ^ 0x00F0_0F00 ^ template as u64);
        let mut frame = self.frame_without_symbol();

        let t = self.templates.get(template).expect("template index");
        let warp = &self.warps[template];
        for (kp, desc) in t.keypoints.iter().zip(&t.descriptors) {
            let Some(p) = warp.apply(*kp) else { continue };
            let jitter = self.config.jitter_px;
            let p = Point2f::new(
                p.x + rng.gen_range(-jitter..=jitter),
                p.y + rng.gen_range(-jitter..=jitter),
            );
            if p.x < 0.0
                || p.y < 0.0
                || p.x >= self.config.frame_width as f32
                || p.y >= self.config.frame_height as f32
            {
                continue;
            }
            frame.keypoints.push(p);
            frame
                .descriptors
                .push(flip_bits(desc, self.config.descriptor_bit_flips, &mut rng));
        }
        frame
    }

    /// Frame of pure background clutter.
    pub fn frame_without_symbol(&self) -> FrameFeatures {
        let mut rng = StdRng::seed_from_u64(self.seed ^ 0xC1_077E0);
        let mut frame = FrameFeatures::new(self.config.frame_width, self.config.frame_height);
        for _ in 0..self.config.clutter_features {
            frame.keypoints.push(Point2f::new(
                rng.gen_range(0.0..self.config.frame_width as f32),
                rng.gen_range(0.0..self.config.frame_height as f32),
            ));
            frame.descriptors.push(random_descriptor(&mut rng));
        }
        frame
    }
}

/// Eye landmarks with a chosen openness, for attention-monitor testing.
/// `openness` is the vertical/horizontal extent ratio, i.e. the EAR the
/// landmarks will produce.
pub fn eyes_with_ear(openness: f32) -> EyePair {
    let eye = |x0: f32| -> EyeLandmarks {
        let half = openness * 30.0 / 2.0;
        [
            Point2f::new(x0, 0.0),
            Point2f::new(x0 + 10.0, -half),
            Point2f::new(x0 + 20.0, -half),
            Point2f::new(x0 + 30.0, 0.0),
            Point2f::new(x0 + 20.0, half),
            Point2f::new(x0 + 10.0, half),
        ]
    };
    EyePair {
        left: eye(100.0),
        right: eye(200.0),
    }
}

fn random_template(rng: &mut StdRng, config: &SceneConfig, index: usize) -> SymbolTemplate {
    let w = config.template_width as f32;
    let h = config.template_height as f32;
    let mut keypoints = Vec::with_capacity(config.template_keypoints);
    let mut descriptors = Vec::with_capacity(config.template_keypoints);
    for _ in 0..config.template_keypoints {
        keypoints.push(Point2f::new(
            rng.gen_range(4.0..w - 4.0),
            rng.gen_range(4.0..h - 4.0),
        ));
        descriptors.push(random_descriptor(rng));
    }
    SymbolTemplate {
        name: format!("symbol_{}", index + 1),
        width: config.template_width,
        height: config.template_height,
        keypoints,
        descriptors,
    }
}

/// A mild, template-specific perspective placement that keeps the card
/// well inside the frame (so the quality gate sees a plausible quad).
fn card_placement(config: &SceneConfig, index: usize, template: &SymbolTemplate) -> Homography {
    let w = template.width as f32;
    let h = template.height as f32;
    let ox = 0.25 * config.frame_width as f32 + index as f32 * 40.0;
    let oy = 0.2 * config.frame_height as f32 + index as f32 * 15.0;

    let src = template.corners();
    // Slight keystone: top edge a touch narrower than the bottom
    let dst = [
        Point2f::new(ox + 12.0, oy + 6.0),
        Point2f::new(ox + w - 10.0, oy),
        Point2f::new(ox + w, oy + h - 4.0),
        Point2f::new(ox, oy + h),
    ];
    Homography::from_points4(&src, &dst).expect("card placement corners are non-degenerate")
}

fn random_descriptor(rng: &mut StdRng) -> Descriptor {
    let mut bytes = [0u8; DESCRIPTOR_LEN];
    rng.fill(&mut bytes[..]);
    Descriptor(bytes)
}

fn flip_bits(desc: &Descriptor, flips: usize, rng: &mut StdRng) -> Descriptor {
    let mut out = *desc;
    for _ in 0..flips {
        let bit = rng.gen_range(0..DESCRIPTOR_LEN * 8);
        out.0[bit / 8] ^= 1 << (bit % 8);
    }
    Descriptor(out.0)
}
