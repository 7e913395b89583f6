//! Matching + RANSAC hot-path benchmark on a synthetic frame.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use drishti_core::detector::{DetectorConfig, SymbolDetector};
use drishti_core::matching::{MatchConfig, match_features};
use drishti_core::sim::{SceneConfig, SyntheticScene};

fn bench_matching(c: &mut Criterion) {
    let config = SceneConfig {
        template_keypoints: 500,
        clutter_features: 500,
        ..SceneConfig::default()
    };
    let scene = SyntheticScene::generate(&config, 99);
    let frame = scene.frame_with_symbol(0);
    let template = scene.templates.get(0).unwrap();

    c.bench_function("match_features_500x1000", |b| {
        b.iter(|| {
            match_features(
                black_box(&template.descriptors),
                black_box(&frame.descriptors),
                &MatchConfig::default(),
            )
        })
    });

    let detector = SymbolDetector::new(scene.templates.clone(), DetectorConfig::default());
    c.bench_function("detect_full_frame", |b| {
        b.iter(|| detector.detect(black_box(&frame)))
    });
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
