//! Shared state between the daemon threads
//!
//! All hot flags are atomics; only the human-readable stop reason sits
//! behind a lock, and that is read at logging frequency, not in the 50 Hz
//! relay path.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Why the drive is currently frozen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// A symbol lock is held
    Symbol(String),
    /// The operator looks drowsy
    Drowsy,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Symbol(name) => write!(f, "symbol {name}"),
            StopReason::Drowsy => write!(f, "operator drowsy"),
        }
    }
}

/// Shared daemon state
///
/// `hold` and `shutdown` are `Arc`s so the relay, which only understands
/// those two flags, can hold its own clones without seeing the rest.
#[derive(Default)]
pub struct SharedState {
    /// Combined hold flag consumed by the relay (vision OR attention)
    pub hold: Arc<AtomicBool>,
    /// Hold requested by the symbol pipeline
    pub vision_hold: AtomicBool,
    /// Hold requested by the attention monitor
    pub attention_hold: AtomicBool,
    /// Operator pressed the resume button; consumed by the supervisor
    pub resume_requested: AtomicBool,
    /// Supervisor asks the vision thread to clear its detection state;
    /// consumed by the vision thread
    pub clear_requested: AtomicBool,
    /// Daemon shutdown flag
    pub shutdown: Arc<AtomicBool>,
    /// Human-readable reasons for the active holds
    reasons: RwLock<Vec<StopReason>>,
}

impl SharedState {
    /// Create fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the combined hold flag from the per-source flags and the
    /// reason list. Returns the new value.
    pub fn refresh_hold(&self, reasons: Vec<StopReason>) -> bool {
        let hold = self.vision_hold.load(Ordering::Acquire)
            || self.attention_hold.load(Ordering::Acquire);
        *self.reasons.write() = reasons;
        self.hold.store(hold, Ordering::Release);
        hold
    }

    /// Reasons for the active holds
    pub fn reasons(&self) -> Vec<StopReason> {
        self.reasons.read().clone()
    }

    /// Signal daemon shutdown
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Check the shutdown flag
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Atomically consume a request flag (resume/clear), returning whether
    /// it was set.
    pub fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_combines_sources() {
        let s = SharedState::new();
        assert!(!s.refresh_hold(vec![]));

        s.vision_hold.store(true, Ordering::Release);
        assert!(s.refresh_hold(vec![StopReason::Symbol("one".into())]));
        assert!(s.hold.load(Ordering::Acquire));

        s.vision_hold.store(false, Ordering::Release);
        s.attention_hold.store(true, Ordering::Release);
        assert!(s.refresh_hold(vec![StopReason::Drowsy]));

        s.attention_hold.store(false, Ordering::Release);
        assert!(!s.refresh_hold(vec![]));
        assert!(s.reasons().is_empty());
    }

    #[test]
    fn take_consumes_request_flags() {
        let s = SharedState::new();
        s.resume_requested.store(true, Ordering::Release);
        assert!(SharedState::take(&s.resume_requested));
        assert!(!SharedState::take(&s.resume_requested));
    }
}
