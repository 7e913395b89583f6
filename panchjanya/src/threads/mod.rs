//! Daemon thread plumbing
//!
//! Three threads plus the supervising main loop:
//! - Input: blocking joystick reads, resume-button watch
//! - Relay: 50 Hz drive-frame transmit (shankha-link's loop)
//! - Vision: frame processing and verdicts

mod input;
mod vision;

pub use input::InputThread;
pub use vision::{VisionThread, VisionUpdate};

use crate::config::PanchjanyaConfig;
use crate::shared::SharedState;
use crossbeam_channel::Receiver;
use drishti_core::attention::{AttentionConfig, AttentionMonitor};
use drishti_core::detector::SymbolDetector;
use drishti_core::pipeline::DetectionPipeline;
use drishti_core::source::FeatureSource;
use shankha_link::joystick::JoystickSource;
use shankha_link::relay::{ChannelSource, RelayStats, TeleopRelay};
use shankha_link::transport::LinkTransport;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

/// Handles and channels for the running threads
pub struct ThreadHandles {
    pub relay: JoinHandle<()>,
    pub vision: JoinHandle<()>,
    /// Input thread handle; detached reads mean this may only join once
    /// the device produces a final event or goes away
    pub input: JoinHandle<()>,
    /// Relay statistics counters
    pub relay_stats: Arc<RelayStats>,
    /// Vision updates for the supervisor
    pub updates_rx: Receiver<VisionUpdate>,
}

/// Spawn all daemon threads.
pub fn spawn_threads(
    config: &PanchjanyaConfig,
    shared: Arc<SharedState>,
    joystick: Box<dyn JoystickSource>,
    transport: Box<dyn LinkTransport>,
    features: Box<dyn FeatureSource>,
    detector: SymbolDetector,
) -> std::io::Result<ThreadHandles> {
    let (events_tx, events_rx) = mpsc::channel();
    let (updates_tx, updates_rx) = crossbeam_channel::bounded(64);

    // Input thread
    let mut input_thread = InputThread::new(
        joystick,
        events_tx,
        config.supervisor.resume_button,
        Arc::clone(&shared),
    );
    let input = std::thread::Builder::new()
        .name("input".into())
        .spawn(move || input_thread.run())?;

    // Relay thread
    let mut relay = TeleopRelay::new(
        ChannelSource::new(events_rx),
        transport,
        config.link.clone(),
        config.gamepad.map,
        config.gamepad.deadzone,
        Arc::clone(&shared.hold),
        Arc::clone(&shared.shutdown),
    );
    let relay_stats = relay.stats();
    let relay_shared = Arc::clone(&shared);
    let relay = std::thread::Builder::new().name("relay".into()).spawn(move || {
        if let Err(e) = relay.run() {
            log::error!("Relay failed: {}", e);
        }
        // A dead link means no way to stop the robot remotely; bring the
        // whole daemon down so the failure is loud
        relay_shared.signal_shutdown();
    })?;

    // Vision thread
    let mut vision_thread = VisionThread::new(
        features,
        detector,
        DetectionPipeline::new(config.vision.pipeline_config()),
        AttentionMonitor::new(AttentionConfig::default()),
        updates_tx,
        Arc::clone(&shared),
    );
    let vision = std::thread::Builder::new()
        .name("vision".into())
        .spawn(move || vision_thread.run())?;

    Ok(ThreadHandles {
        relay,
        vision,
        input,
        relay_stats,
        updates_rx,
    })
}
