//! Operator attention monitor
//!
//! Watches the eye aspect ratio (EAR) of the operator's face landmarks and
//! flags drowsiness when the eyes stay closed too long. A blink dips the
//! EAR for a few frames; genuine eye closure holds it below threshold for
//! seconds, which is what the duration gate keys on.

use crate::types::{EyeLandmarks, EyePair};
use std::time::{Duration, Instant};

/// Attention monitor parameters
#[derive(Clone, Copy, Debug)]
pub struct AttentionConfig {
    /// EAR below this counts as eyes closed
    pub ear_threshold: f32,
    /// Continuous closure longer than this flags drowsiness
    pub drowsy_after: Duration,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            drowsy_after: Duration::from_secs(3),
        }
    }
}

/// Operator state as judged from the latest landmark update
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttentionState {
    /// No face/landmarks in view
    NoFace,
    /// Eyes open
    Alert,
    /// Eyes closed, but not yet past the drowsiness gate
    EyesClosed(Duration),
    /// Eyes closed past the gate
    Drowsy(Duration),
}

/// Eye aspect ratio of one eye from its 6 landmarks:
/// `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`.
pub fn eye_aspect_ratio(eye: &EyeLandmarks) -> f32 {
    let a = eye[1].distance(&eye[5]);
    let b = eye[2].distance(&eye[4]);
    let c = eye[0].distance(&eye[3]);
    (a + b) / (2.0 * c.max(1e-6))
}

/// Mean EAR over both eyes
pub fn mean_ear(eyes: &EyePair) -> f32 {
    (eye_aspect_ratio(&eyes.left) + eye_aspect_ratio(&eyes.right)) / 2.0
}

/// Drowsiness state machine
pub struct AttentionMonitor {
    config: AttentionConfig,
    closed_since: Option<Instant>,
}

impl AttentionMonitor {
    /// Create a monitor
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            config,
            closed_since: None,
        }
    }

    /// Fold one landmark update into the state.
    ///
    /// `eyes = None` (face lost) resets the closure timer: without
    /// landmarks there is no evidence either way, and a stale timer must
    /// not trip the alarm when the face comes back.
    pub fn update(&mut self, eyes: Option<&EyePair>, now: Instant) -> AttentionState {
        let Some(eyes) = eyes else {
            self.closed_since = None;
            return AttentionState::NoFace;
        };

        let ear = mean_ear(eyes);
        if ear >= self.config.ear_threshold {
            self.closed_since = None;
            return AttentionState::Alert;
        }

        let since = *self.closed_since.get_or_insert(now);
        let closed_for = now.duration_since(since);
        if closed_for >= self.config.drowsy_after {
            AttentionState::Drowsy(closed_for)
        } else {
            AttentionState::EyesClosed(closed_for)
        }
    }
}
