//! End-to-end detection tests: synthetic frames through detector, debounce
//! and the lock state machine.

use drishti_core::detector::{DetectorConfig, SymbolDetector};
use drishti_core::pipeline::{DetectionPipeline, PipelineConfig, Verdict};
use drishti_core::sim::{SceneConfig, SyntheticScene};
use drishti_core::source::{FeatureSource, SyntheticSource};
use std::time::{Duration, Instant};

#[test]
fn symbol_appearance_locks_and_disappearance_releases() {
    let scene = SyntheticScene::generate(&SceneConfig::default(), 11);
    let detector = SymbolDetector::new(scene.templates.clone(), DetectorConfig::default());
    let mut source = SyntheticSource::new(scene).empty(8).show(1, 12).empty(80);
    let mut pipeline = DetectionPipeline::new(PipelineConfig::default());

    // Frames nominally 100ms apart; revalidation happens every 800ms
    let t0 = Instant::now();
    let mut tick = 0u64;
    let mut saw_hold = false;
    let mut released_after_hold = false;

    while let Some(frame) = source.next_frame().unwrap() {
        let detection = detector.detect(&frame);
        let now = t0 + Duration::from_millis(100 * tick);
        tick += 1;

        match pipeline.step(detection.as_ref(), now) {
            Verdict::Hold { template, score } => {
                assert_eq!(template, 1, "locked the template actually shown");
                assert!(score >= 8.0);
                saw_hold = true;
            }
            Verdict::Proceed => {
                if saw_hold {
                    released_after_hold = true;
                }
            }
        }
    }

    assert!(saw_hold, "pipeline should lock while the symbol is visible");
    assert!(
        released_after_hold,
        "pipeline should release after the symbol goes away"
    );
}

#[test]
fn clutter_only_stream_never_holds() {
    let scene = SyntheticScene::generate(&SceneConfig::default(), 23);
    let detector = SymbolDetector::new(scene.templates.clone(), DetectorConfig::default());
    let mut source = SyntheticSource::new(scene).empty(30);
    let mut pipeline = DetectionPipeline::new(PipelineConfig::default());

    let t0 = Instant::now();
    let mut tick = 0u64;
    while let Some(frame) = source.next_frame().unwrap() {
        let detection = detector.detect(&frame);
        let now = t0 + Duration::from_millis(100 * tick);
        tick += 1;
        assert_eq!(pipeline.step(detection.as_ref(), now), Verdict::Proceed);
    }
}

#[test]
fn detector_recovers_truth_warp_corners() {
    let scene = SyntheticScene::generate(&SceneConfig::default(), 5);
    let detector = SymbolDetector::new(scene.templates.clone(), DetectorConfig::default());

    let frame = scene.frame_with_symbol(0);
    let detection = detector.detect(&frame).expect("symbol in view");

    let template = scene.templates.get(0).unwrap();
    let truth = scene.truth_warp(0);
    for (i, corner) in template.corners().iter().enumerate() {
        let expected = truth.apply(*corner).unwrap();
        let got = detection.quad[i];
        let err = expected.distance(&got);
        assert!(err < 10.0, "corner {i} off by {err:.1}px");
    }
}
