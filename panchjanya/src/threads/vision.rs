//! Vision thread: frames in, verdicts out
//!
//! Pulls frames from the feature source, runs detection and the lock state
//! machine, folds operator eye landmarks into the attention monitor, and
//! ships a compact update to the supervisor after every frame. Updates go
//! over a bounded channel with `try_send`; if the supervisor falls behind,
//! stale updates are dropped rather than queued.

use crate::shared::SharedState;
use crossbeam_channel::Sender;
use drishti_core::attention::{AttentionMonitor, AttentionState};
use drishti_core::detector::SymbolDetector;
use drishti_core::pipeline::{DetectionPipeline, Verdict};
use drishti_core::source::FeatureSource;
use std::sync::Arc;
use std::time::Instant;

/// One per-frame result for the supervisor
#[derive(Clone, Debug)]
pub struct VisionUpdate {
    /// Drive verdict from the lock state machine
    pub verdict: Verdict,
    /// Name of the held symbol, when holding
    pub symbol: Option<String>,
    /// Operator attention state
    pub attention: AttentionState,
}

/// The vision processing thread
pub struct VisionThread {
    source: Box<dyn FeatureSource>,
    detector: SymbolDetector,
    pipeline: DetectionPipeline,
    monitor: AttentionMonitor,
    updates_tx: Sender<VisionUpdate>,
    shared: Arc<SharedState>,
    frames_seen: u64,
}

impl VisionThread {
    /// Create the thread state
    pub fn new(
        source: Box<dyn FeatureSource>,
        detector: SymbolDetector,
        pipeline: DetectionPipeline,
        monitor: AttentionMonitor,
        updates_tx: Sender<VisionUpdate>,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            source,
            detector,
            pipeline,
            monitor,
            updates_tx,
            shared,
            frames_seen: 0,
        }
    }

    /// Run until the source ends or shutdown is signaled.
    pub fn run(&mut self) {
        log::info!(
            "Vision thread started ({} templates)",
            self.detector.templates().len()
        );

        loop {
            if self.shared.should_shutdown() {
                break;
            }
            if SharedState::take(&self.shared.clear_requested) {
                self.pipeline.clear();
                log::info!("Detection state cleared");
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("Feature source ended after {} frames", self.frames_seen);
                    break;
                }
                Err(e) => {
                    log::error!("Feature source failed: {}", e);
                    break;
                }
            };
            self.frames_seen += 1;

            let now = Instant::now();
            let detection = self.detector.detect(&frame);
            let verdict = self.pipeline.step(detection.as_ref(), now);
            let attention = self.monitor.update(frame.eyes.as_ref(), now);

            let symbol = match verdict {
                Verdict::Hold { template, .. } => {
                    Some(self.detector.templates().name(template).to_string())
                }
                Verdict::Proceed => None,
            };

            let update = VisionUpdate {
                verdict,
                symbol,
                attention,
            };
            // Drop on a full channel: the supervisor only needs the latest
            let _ = self.updates_tx.try_send(update);
        }

        // Whatever ends the thread, do not leave the drive frozen on a
        // verdict nobody will refresh
        let _ = self.updates_tx.try_send(VisionUpdate {
            verdict: Verdict::Proceed,
            symbol: None,
            attention: AttentionState::NoFace,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisionConfig;
    use drishti_core::attention::AttentionConfig;
    use drishti_core::sim::{SceneConfig, SyntheticScene};
    use drishti_core::source::SyntheticSource;

    #[test]
    fn emits_hold_then_release_for_a_symbol_pass() {
        let scene = SyntheticScene::generate(&SceneConfig::default(), 77);
        let templates = scene.templates.clone();
        let source = SyntheticSource::new(scene).empty(6).show(0, 10).empty(70);

        let vision_cfg = VisionConfig::default();
        let (tx, rx) = crossbeam_channel::bounded(256);
        let shared = Arc::new(SharedState::new());

        let mut thread = VisionThread::new(
            Box::new(source),
            SymbolDetector::new(templates, vision_cfg.detector_config()),
            DetectionPipeline::new(vision_cfg.pipeline_config()),
            AttentionMonitor::new(AttentionConfig::default()),
            tx,
            Arc::clone(&shared),
        );
        thread.run();

        let updates: Vec<VisionUpdate> = rx.try_iter().collect();
        assert!(!updates.is_empty());
        let held: Vec<&VisionUpdate> = updates
            .iter()
            .filter(|u| matches!(u.verdict, Verdict::Hold { .. }))
            .collect();
        assert!(!held.is_empty(), "should hold while the symbol is shown");
        assert_eq!(held[0].symbol.as_deref(), Some("symbol_1"));
        // The final update releases the drive
        assert_eq!(updates.last().unwrap().verdict, Verdict::Proceed);
    }

    #[test]
    fn clear_request_is_consumed() {
        let scene = SyntheticScene::generate(&SceneConfig::default(), 78);
        let templates = scene.templates.clone();
        let source = SyntheticSource::new(scene).empty(2);

        let vision_cfg = VisionConfig::default();
        let (tx, _rx) = crossbeam_channel::bounded(16);
        let shared = Arc::new(SharedState::new());
        shared
            .clear_requested
            .store(true, std::sync::atomic::Ordering::Release);

        let mut thread = VisionThread::new(
            Box::new(source),
            SymbolDetector::new(templates, vision_cfg.detector_config()),
            DetectionPipeline::new(vision_cfg.pipeline_config()),
            AttentionMonitor::new(AttentionConfig::default()),
            tx,
            Arc::clone(&shared),
        );
        thread.run();
        assert!(!SharedState::take(&shared.clear_requested));
    }
}
