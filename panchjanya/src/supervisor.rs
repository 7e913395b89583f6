//! Auto-stop supervisor
//!
//! Arbitrates the hold-stop flag the relay obeys. Holds come from two
//! sources: a symbol lock (the robot must stop at a detected symbol) and
//! the operator attention monitor. Either engages the hold; each source
//! releases only itself. The resume button clears everything, including
//! the vision thread's detection state, so the operator always has the
//! last word.

use crate::config::SupervisorConfig;
use crate::shared::{SharedState, StopReason};
use crate::threads::VisionUpdate;
use drishti_core::attention::AttentionState;
use drishti_core::pipeline::Verdict;
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// The supervisor state machine
pub struct Supervisor {
    config: SupervisorConfig,
    shared: Arc<SharedState>,
    /// Last combined hold value, for edge-triggered logging
    was_holding: bool,
    /// Name of the held symbol, for the release log line
    held_symbol: Option<String>,
}

impl Supervisor {
    /// Create a supervisor
    pub fn new(config: SupervisorConfig, shared: Arc<SharedState>) -> Self {
        Self {
            config,
            shared,
            was_holding: false,
            held_symbol: None,
        }
    }

    /// Fold one vision update into the hold flags.
    pub fn apply_update(&mut self, update: &VisionUpdate) {
        match &update.verdict {
            Verdict::Hold { score, .. } => {
                self.shared.vision_hold.store(true, Ordering::Release);
                if self.held_symbol != update.symbol {
                    self.held_symbol = update.symbol.clone();
                    log::warn!(
                        "STOP: symbol {} (score {:.1})",
                        update.symbol.as_deref().unwrap_or("?"),
                        score
                    );
                }
            }
            Verdict::Proceed => {
                self.shared.vision_hold.store(false, Ordering::Release);
                if let Some(name) = self.held_symbol.take() {
                    log::info!("Symbol {} released", name);
                }
            }
        }

        if self.config.attention_stop {
            match update.attention {
                AttentionState::Drowsy(for_) => {
                    if !self.shared.attention_hold.swap(true, Ordering::AcqRel) {
                        log::warn!("STOP: operator drowsy ({:.1}s eyes closed)", for_.as_secs_f32());
                    }
                }
                // Eyes open releases; a lost face keeps an engaged hold
                AttentionState::Alert => {
                    self.shared.attention_hold.store(false, Ordering::Release);
                }
                AttentionState::NoFace | AttentionState::EyesClosed(_) => {}
            }
        }

        self.refresh();
    }

    /// Handle a pending resume request, if any. Returns true when one was
    /// consumed.
    pub fn handle_resume(&mut self) -> bool {
        if !SharedState::take(&self.shared.resume_requested) {
            return false;
        }
        log::info!("Operator resume: releasing holds and clearing detection");
        self.shared.vision_hold.store(false, Ordering::Release);
        self.shared.attention_hold.store(false, Ordering::Release);
        self.shared.clear_requested.store(true, Ordering::Release);
        self.held_symbol = None;
        self.refresh();
        true
    }

    /// Recompute the combined flag and log hold/release edges.
    fn refresh(&mut self) {
        let mut reasons = Vec::new();
        if self.shared.vision_hold.load(Ordering::Acquire) {
            reasons.push(StopReason::Symbol(
                self.held_symbol.clone().unwrap_or_else(|| "?".into()),
            ));
        }
        if self.shared.attention_hold.load(Ordering::Acquire) {
            reasons.push(StopReason::Drowsy);
        }

        let holding = self.shared.refresh_hold(reasons);
        if holding != self.was_holding {
            if holding {
                let reasons = self.shared.reasons();
                let text: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
                log::warn!("Drive hold engaged ({})", text.join(", "));
            } else {
                log::info!("Drive hold released");
            }
            self.was_holding = holding;
        }
    }
}
