//! Input thread: joystick event pump
//!
//! Reads the (blocking) joystick source, forwards every event to the relay
//! and watches for the resume button on the side. The thread is detached;
//! it ends when the device disappears or the relay end hangs up.

use crate::shared::SharedState;
use shankha_link::joystick::{JoyEvent, JoyEventKind, JoystickSource};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Sender;

/// The joystick event pump
pub struct InputThread {
    source: Box<dyn JoystickSource>,
    events_tx: Sender<JoyEvent>,
    resume_button: u8,
    shared: Arc<SharedState>,
}

impl InputThread {
    /// Create the pump
    pub fn new(
        source: Box<dyn JoystickSource>,
        events_tx: Sender<JoyEvent>,
        resume_button: u8,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            source,
            events_tx,
            resume_button,
            shared,
        }
    }

    /// Run until shutdown, a device error, or the relay hanging up.
    ///
    /// `Ok(None)` from the source means "no event right now" (a scripted
    /// source between events); the thread keeps polling so the relay's
    /// channel stays open and the last stick state stays in force.
    pub fn run(&mut self) {
        log::debug!("Input thread started (resume button {})", self.resume_button);
        loop {
            if self.shared.should_shutdown() {
                break;
            }
            match self.source.poll() {
                Ok(Some(event)) => {
                    self.watch_resume(&event);
                    if self.events_tx.send(event).is_err() {
                        log::debug!("Relay hung up, input thread exiting");
                        break;
                    }
                }
                Ok(None) => {
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
                Err(e) => {
                    log::error!("Joystick error: {}", e);
                    break;
                }
            }
        }
    }

    /// Resume is a press edge, not a hold; init-replay events don't count.
    fn watch_resume(&self, event: &JoyEvent) {
        if event.kind == JoyEventKind::Button
            && event.number == self.resume_button
            && event.value != 0
            && !event.init
        {
            log::info!("Resume button pressed");
            self.shared.resume_requested.store(true, Ordering::Release);
        }
    }
}
