//! Detect/lock pipeline
//!
//! Ties the per-frame detector output and the debounce window into the
//! two-mode state machine the auto-stop supervisor consumes:
//!
//! - `Searching`: every frame's best candidate feeds the debounce window;
//!   a stable detection locks onto that symbol.
//! - `Locked`: the symbol is held and the verdict stays `Hold`. At a fixed
//!   cadence the lock is revalidated against the latest detector result;
//!   enough consecutive misses drop the lock and detection starts over.
//!
//! The caller supplies `now`, so the machine is deterministic under test
//! and indifferent to frame-rate jitter in production.

use crate::debounce::{DebounceConfig, DetectionWindow};
use crate::detector::Detection;
use std::time::{Duration, Instant};

/// Pipeline parameters
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    /// Debounce window parameters
    pub debounce: DebounceConfig,
    /// How often a held lock is revalidated
    pub revalidate_interval: Duration,
    /// Consecutive failed revalidations before the lock is dropped
    pub max_lost: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::default(),
            revalidate_interval: Duration::from_millis(800),
            max_lost: 6,
        }
    }
}

/// What the supervisor should do right now
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    /// No symbol held: drive commands pass through
    Proceed,
    /// Symbol held: freeze the drive
    Hold {
        /// Held template index
        template: usize,
        /// Score at lock/last confirmation
        score: f32,
    },
}

#[derive(Debug)]
enum State {
    Searching,
    Locked {
        template: usize,
        score: f32,
        last_revalidate: Instant,
        lost: u32,
    },
}

/// The detect/lock state machine
pub struct DetectionPipeline {
    config: PipelineConfig,
    window: DetectionWindow,
    state: State,
}

impl DetectionPipeline {
    /// Create a pipeline in `Searching`
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            window: DetectionWindow::new(config.debounce),
            config,
            state: State::Searching,
        }
    }

    /// Template currently held, if any
    pub fn locked_template(&self) -> Option<usize> {
        match self.state {
            State::Locked { template, .. } => Some(template),
            State::Searching => None,
        }
    }

    /// Fold one frame result (or a frame-less poll) into the machine.
    pub fn step(&mut self, detection: Option<&Detection>, now: Instant) -> Verdict {
        match &mut self.state {
            State::Searching => {
                let candidate = detection.map(|d| (d.template, d.score));
                if let Some(stable) = self.window.push(candidate) {
                    log::info!(
                        "Symbol lock: template {} (count {}, avg score {:.1})",
                        stable.template,
                        stable.count,
                        stable.avg_score
                    );
                    self.state = State::Locked {
                        template: stable.template,
                        score: stable.avg_score,
                        last_revalidate: now,
                        lost: 0,
                    };
                    Verdict::Hold {
                        template: stable.template,
                        score: stable.avg_score,
                    }
                } else {
                    Verdict::Proceed
                }
            }
            State::Locked {
                template,
                score,
                last_revalidate,
                lost,
            } => {
                if now.duration_since(*last_revalidate) >= self.config.revalidate_interval {
                    *last_revalidate = now;
                    match detection {
                        Some(d) if d.template == *template => {
                            *lost = 0;
                            *score = d.score;
                        }
                        _ => {
                            *lost += 1;
                            log::debug!(
                                "Lock revalidation miss {}/{} on template {}",
                                lost,
                                self.config.max_lost,
                                template
                            );
                        }
                    }
                    if *lost > self.config.max_lost {
                        log::info!("Symbol lock dropped: template {}", template);
                        self.window.clear();
                        self.state = State::Searching;
                        return Verdict::Proceed;
                    }
                }
                Verdict::Hold {
                    template: *template,
                    score: *score,
                }
            }
        }
    }

    /// Operator override: forget everything and go back to `Searching`.
    pub fn clear(&mut self) {
        self.window.clear();
        self.state = State::Searching;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homography::Homography;
    use crate::types::Point2f;

    fn detection(template: usize, score: f32) -> Detection {
        Detection {
            template,
            score,
            inliers: 10,
            good_matches: 14,
            quad: [Point2f::default(); 4],
            homography: Homography::identity(),
        }
    }

    fn locked_pipeline(t0: Instant) -> DetectionPipeline {
        let mut p = DetectionPipeline::new(PipelineConfig::default());
        let d = detection(0, 12.0);
        for i in 0..4 {
            p.step(Some(&d), t0 + Duration::from_millis(50 * i));
        }
        assert_eq!(p.locked_template(), Some(0));
        p
    }

    #[test]
    fn locks_after_stable_detections() {
        let t0 = Instant::now();
        let mut p = DetectionPipeline::new(PipelineConfig::default());
        let d = detection(0, 12.0);

        assert_eq!(p.step(Some(&d), t0), Verdict::Proceed);
        assert_eq!(p.step(Some(&d), t0 + Duration::from_millis(50)), Verdict::Proceed);
        assert_eq!(p.step(Some(&d), t0 + Duration::from_millis(100)), Verdict::Proceed);
        let verdict = p.step(Some(&d), t0 + Duration::from_millis(150));
        assert!(matches!(verdict, Verdict::Hold { template: 0, .. }));
    }

    #[test]
    fn one_frame_blip_does_not_lock() {
        let t0 = Instant::now();
        let mut p = DetectionPipeline::new(PipelineConfig::default());
        let d = detection(1, 20.0);

        assert_eq!(p.step(Some(&d), t0), Verdict::Proceed);
        for i in 1..10 {
            let v = p.step(None, t0 + Duration::from_millis(50 * i));
            assert_eq!(v, Verdict::Proceed);
        }
    }

    #[test]
    fn lock_survives_between_revalidations() {
        let t0 = Instant::now();
        let mut p = locked_pipeline(t0);

        // Misses inside the revalidation interval don't count against the lock
        for i in 0..5 {
            let v = p.step(None, t0 + Duration::from_millis(200 + 50 * i));
            assert!(matches!(v, Verdict::Hold { template: 0, .. }));
        }
        assert_eq!(p.locked_template(), Some(0));
    }

    #[test]
    fn lock_drops_after_enough_missed_revalidations() {
        let t0 = Instant::now();
        let mut p = locked_pipeline(t0);

        // 7 revalidation misses at 800ms cadence
        let mut t = t0 + Duration::from_secs(1);
        let mut released = false;
        for _ in 0..8 {
            if p.step(None, t) == Verdict::Proceed {
                released = true;
                break;
            }
            t += Duration::from_millis(800);
        }
        assert!(released, "lock should drop after max_lost misses");
        assert_eq!(p.locked_template(), None);
    }

    #[test]
    fn confirmations_keep_the_lock_alive() {
        let t0 = Instant::now();
        let mut p = locked_pipeline(t0);
        let d = detection(0, 15.0);

        let mut t = t0 + Duration::from_secs(1);
        for _ in 0..20 {
            let v = p.step(Some(&d), t);
            assert!(matches!(v, Verdict::Hold { template: 0, .. }));
            t += Duration::from_millis(800);
        }
    }

    #[test]
    fn wrong_symbol_counts_as_miss() {
        let t0 = Instant::now();
        let mut p = locked_pipeline(t0);
        let other = detection(1, 30.0);

        let mut t = t0 + Duration::from_secs(1);
        let mut released = false;
        for _ in 0..8 {
            if p.step(Some(&other), t) == Verdict::Proceed {
                released = true;
                break;
            }
            t += Duration::from_millis(800);
        }
        assert!(released);
    }

    #[test]
    fn clear_releases_immediately() {
        let t0 = Instant::now();
        let mut p = locked_pipeline(t0);
        p.clear();
        assert_eq!(p.locked_template(), None);
        assert_eq!(
            p.step(None, t0 + Duration::from_secs(1)),
            Verdict::Proceed
        );
    }

    #[test]
    fn relocks_after_drop_when_symbol_returns() {
        let t0 = Instant::now();
        let mut p = locked_pipeline(t0);

        // Drop the lock
        let mut t = t0 + Duration::from_secs(1);
        while p.locked_template().is_some() {
            p.step(None, t);
            t += Duration::from_millis(800);
        }

        // Symbol comes back: fresh debounce, fresh lock
        let d = detection(0, 12.0);
        for _ in 0..4 {
            p.step(Some(&d), t);
            t += Duration::from_millis(50);
        }
        assert_eq!(p.locked_template(), Some(0));
    }
}
