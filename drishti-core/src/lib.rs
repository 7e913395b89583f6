//! DrishtiCore - symbol detection engine for the Panchjanya robots
//!
//! The camera front-end (capture + feature extraction) lives in a separate
//! process; this crate takes extracted frame features and turns them into a
//! drive verdict:
//!
//! ```text
//! FrameFeatures ──► SymbolDetector ──► DetectionWindow ──► DetectionPipeline ──► Verdict
//!                   (match + RANSAC)   (debounce)          (lock / revalidate)
//! ```
//!
//! - [`types`]: keypoints, 256-bit binary descriptors, frame features
//! - [`template`]: symbol template store and the `.drsh` pack format
//! - [`matching`]: brute-force 2-NN Hamming matching with ratio test
//! - [`homography`]: 4-point DLT and RANSAC estimation
//! - [`quality`]: geometric sanity gate on projected template quads
//! - [`detector`]: per-frame best-candidate search across templates
//! - [`debounce`]: sliding-window temporal stability filter
//! - [`pipeline`]: detect/lock state machine producing [`pipeline::Verdict`]
//! - [`attention`]: operator eye-closure (drowsiness) monitor
//! - [`wire`]: binary codec for streaming features between processes
//! - [`source`]: the [`source::FeatureSource`] seam the daemon consumes
//! - [`sim`]: seeded synthetic scenes for tests, benches and mock runs

pub mod attention;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod homography;
pub mod matching;
pub mod pipeline;
pub mod quality;
pub mod sim;
pub mod source;
pub mod template;
pub mod types;
pub mod wire;

pub use detector::{Detection, DetectorConfig, SymbolDetector};
pub use error::{Error, Result};
pub use pipeline::{DetectionPipeline, PipelineConfig, Verdict};
pub use template::{SymbolTemplate, TemplateSet};
pub use types::{Descriptor, FrameFeatures, Point2f};
