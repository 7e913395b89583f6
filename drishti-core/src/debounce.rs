//! Temporal stability filter for detections
//!
//! A single-frame match is cheap to fake: motion blur, a glancing angle, or
//! background clutter can all produce one. Announcing a symbol therefore
//! requires the same template to win several of the last few frames with a
//! healthy average score.

use std::collections::VecDeque;

/// Debounce parameters
#[derive(Clone, Copy, Debug)]
pub struct DebounceConfig {
    /// How many recent frame results to keep
    pub window: usize,
    /// How many of them must name the same template
    pub required_count: usize,
    /// Minimum average score of those frames
    pub score_threshold: f32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window: 6,
            required_count: 4,
            score_threshold: 8.0,
        }
    }
}

/// A detection that held steady across the window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StableDetection {
    /// Winning template index
    pub template: usize,
    /// Frames in the window that named it
    pub count: usize,
    /// Average score of those frames
    pub avg_score: f32,
}

/// Sliding-window debounce filter
#[derive(Debug)]
pub struct DetectionWindow {
    config: DebounceConfig,
    recent: VecDeque<Option<(usize, f32)>>,
}

impl DetectionWindow {
    /// Create a window
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            recent: VecDeque::with_capacity(config.window),
            config,
        }
    }

    /// Record one frame's best candidate (or `None` for a miss) and return
    /// the stable detection if the window now supports one.
    pub fn push(&mut self, candidate: Option<(usize, f32)>) -> Option<StableDetection> {
        if self.recent.len() == self.config.window {
            self.recent.pop_front();
        }
        self.recent.push_back(candidate);
        self.evaluate()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.recent.clear();
    }

    fn evaluate(&self) -> Option<StableDetection> {
        // Majority template among the hits in the window
        let mut best: Option<(usize, usize)> = None; // (template, count)
        for &entry in self.recent.iter().flatten() {
            let count = self
                .recent
                .iter()
                .flatten()
                .filter(|(t, _)| *t == entry.0)
                .count();
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((entry.0, count));
            }
        }
        let (template, count) = best?;
        if count < self.config.required_count {
            return None;
        }

        let scores: Vec<f32> = self
            .recent
            .iter()
            .flatten()
            .filter(|(t, _)| *t == template)
            .map(|(_, s)| *s)
            .collect();
        let avg_score = scores.iter().sum::<f32>() / scores.len() as f32;
        if avg_score < self.config.score_threshold {
            return None;
        }

        Some(StableDetection {
            template,
            count,
            avg_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> DetectionWindow {
        DetectionWindow::new(DebounceConfig::default())
    }

    #[test]
    fn stable_after_enough_agreeing_frames() {
        let mut w = window();
        assert_eq!(w.push(Some((0, 10.0))), None);
        assert_eq!(w.push(Some((0, 12.0))), None);
        assert_eq!(w.push(Some((0, 9.0))), None);
        let stable = w.push(Some((0, 11.0))).expect("4 agreeing frames");
        assert_eq!(stable.template, 0);
        assert_eq!(stable.count, 4);
        assert!((stable.avg_score - 10.5).abs() < 1e-4);
    }

    #[test]
    fn misses_break_the_streak() {
        let mut w = window();
        w.push(Some((0, 10.0)));
        w.push(None);
        w.push(Some((0, 10.0)));
        w.push(None);
        w.push(Some((0, 10.0)));
        // Only 3 hits fit in the window alongside the misses
        assert_eq!(w.push(None), None);
    }

    #[test]
    fn low_scores_do_not_stabilize() {
        let mut w = window();
        for _ in 0..5 {
            assert_eq!(w.push(Some((0, 3.0))), None);
        }
    }

    #[test]
    fn competing_templates_need_their_own_majority() {
        let mut w = window();
        w.push(Some((0, 10.0)));
        w.push(Some((1, 10.0)));
        w.push(Some((0, 10.0)));
        w.push(Some((1, 10.0)));
        w.push(Some((0, 10.0)));
        // 3 vs 2: neither reaches the required 4
        assert_eq!(w.push(Some((1, 10.0))), None);
        // Window slides: the oldest template-0 entry falls out, template 1
        // reaches 4 of the last 6
        let stable = w.push(Some((1, 10.0))).expect("template 1 majority");
        assert_eq!(stable.template, 1);
    }

    #[test]
    fn clear_resets_history() {
        let mut w = window();
        for _ in 0..3 {
            w.push(Some((0, 10.0)));
        }
        w.clear();
        assert_eq!(w.push(Some((0, 10.0))), None);
    }

    #[test]
    fn old_frames_slide_out() {
        let mut w = window();
        for _ in 0..4 {
            w.push(Some((0, 10.0)));
        }
        // 6 misses flush the window entirely
        for _ in 0..6 {
            w.push(None);
        }
        assert_eq!(w.push(Some((0, 10.0))), None);
    }
}
