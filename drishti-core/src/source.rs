//! Feature sources
//!
//! The vision thread consumes frames through [`FeatureSource`], so the
//! daemon runs identically whether features arrive from the extractor
//! process over TCP or from a scripted synthetic scene.

use crate::error::Result;
use crate::sim::SyntheticScene;
use crate::types::FrameFeatures;

/// Source of extracted frame features
pub trait FeatureSource: Send {
    /// Next frame, or `None` when the source is exhausted or closed.
    fn next_frame(&mut self) -> Result<Option<FrameFeatures>>;
}

/// One segment of a synthetic playback plan
#[derive(Clone, Copy, Debug)]
struct Segment {
    /// Template shown during the segment, `None` for clutter-only frames
    symbol: Option<usize>,
    /// Segment length in frames
    frames: usize,
}

/// Scripted playback of a synthetic scene
///
/// Frames are served according to a plan of segments, optionally looping,
/// which is enough to exercise lock acquisition and loss end to end
/// without a camera.
pub struct SyntheticSource {
    scene: SyntheticScene,
    plan: Vec<Segment>,
    looping: bool,
    segment: usize,
    position: usize,
}

impl SyntheticSource {
    /// Create a source with an empty plan
    pub fn new(scene: SyntheticScene) -> Self {
        Self {
            scene,
            plan: Vec::new(),
            looping: false,
            segment: 0,
            position: 0,
        }
    }

    /// Append a segment showing a template
    pub fn show(mut self, symbol: usize, frames: usize) -> Self {
        self.plan.push(Segment {
            symbol: Some(symbol),
            frames,
        });
        self
    }

    /// Append a clutter-only segment
    pub fn empty(mut self, frames: usize) -> Self {
        self.plan.push(Segment {
            symbol: None,
            frames,
        });
        self
    }

    /// Repeat the plan forever instead of ending after one pass
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// The scene backing this source
    pub fn scene(&self) -> &SyntheticScene {
        &self.scene
    }
}

impl FeatureSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<FrameFeatures>> {
        loop {
            let Some(seg) = self.plan.get(self.segment) else {
                if self.looping && !self.plan.is_empty() {
                    self.segment = 0;
                    self.position = 0;
                    continue;
                }
                return Ok(None);
            };
            if self.position >= seg.frames {
                self.segment += 1;
                self.position = 0;
                continue;
            }
            self.position += 1;
            let frame = match seg.symbol {
                Some(idx) => self.scene.frame_with_symbol(idx),
                None => self.scene.frame_without_symbol(),
            };
            return Ok(Some(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SceneConfig;

    #[test]
    fn plan_plays_in_order_then_ends() {
        let scene = SyntheticScene::generate(&SceneConfig::default(), 1);
        let clutter_len = scene.frame_without_symbol().len();
        let mut source = SyntheticSource::new(scene).empty(2).show(0, 1);

        for _ in 0..2 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.len(), clutter_len);
        }
        let frame = source.next_frame().unwrap().unwrap();
        assert!(frame.len() > clutter_len);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn looping_plan_never_ends() {
        let scene = SyntheticScene::generate(&SceneConfig::default(), 1);
        let mut source = SyntheticSource::new(scene).empty(1).looping();
        for _ in 0..10 {
            assert!(source.next_frame().unwrap().is_some());
        }
    }
}
