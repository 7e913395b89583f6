//! Daemon orchestration
//!
//! Builds the device stack (real or mock), spawns the threads and runs the
//! supervising main loop until shutdown.

use crate::config::PanchjanyaConfig;
use crate::shared::SharedState;
use crate::sources::{PacedSource, TcpFeatureSource};
use crate::supervisor::Supervisor;
use crate::threads::{ThreadHandles, spawn_threads};
use drishti_core::detector::SymbolDetector;
use drishti_core::sim::{SceneConfig, SyntheticScene};
use drishti_core::source::{FeatureSource, SyntheticSource};
use drishti_core::template::TemplateSet;
use shankha_link::joystick::{JoydevSource, JoystickSource, MockJoystick};
use shankha_link::transport::{LinkTransport, MockTransport, SerialLink, resolve_port};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// Seed for the mock scene, fixed so mock runs behave the same every time
const MOCK_SCENE_SEED: u64 = 2024;

/// Mock camera frame interval (~30 fps)
const MOCK_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// How long the main loop waits for a vision update per iteration
const SUPERVISOR_TICK: Duration = Duration::from_millis(100);

/// Stats logging interval
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// The assembled daemon
pub struct PanchjanyaApp {
    config: PanchjanyaConfig,
    shared: Arc<SharedState>,
    handles: ThreadHandles,
    supervisor: Supervisor,
}

impl PanchjanyaApp {
    /// Build the daemon against real hardware.
    pub fn new(config: PanchjanyaConfig) -> Result<Self, Box<dyn std::error::Error>> {
        log::info!("Loading template pack {}", config.vision.template_pack);
        let templates = TemplateSet::load(&config.vision.template_pack)?;
        if templates.is_empty() {
            return Err("template pack is empty".into());
        }
        log::info!("{} symbol templates loaded", templates.len());

        let port = resolve_port(config.link.port.as_deref())?;
        let transport: Box<dyn LinkTransport> =
            Box::new(SerialLink::open(&port, config.link.baud_rate)?);

        let joystick: Box<dyn JoystickSource> =
            Box::new(JoydevSource::open(&config.gamepad.device)?);

        let shared = Arc::new(SharedState::new());
        let features: Box<dyn FeatureSource> = Box::new(TcpFeatureSource::new(
            config.vision.extractor_addr.clone(),
            Duration::from_secs(5),
            Arc::clone(&shared.shutdown),
        ));

        Self::assemble(config, shared, joystick, transport, features, templates)
    }

    /// Build the daemon fully mocked: scripted joystick, captured serial,
    /// synthetic camera. Useful for bring-up and demos on a dev machine.
    pub fn new_mock(config: PanchjanyaConfig) -> Result<Self, Box<dyn std::error::Error>> {
        log::info!("Mock mode: synthetic devices, no hardware touched");

        let scene = SyntheticScene::generate(&SceneConfig::default(), MOCK_SCENE_SEED);
        let templates = scene.templates.clone();

        // Drive around, meet a symbol, drive on; repeats forever
        let source = SyntheticSource::new(scene)
            .empty(90)
            .show(0, 60)
            .empty(90)
            .looping();
        let features: Box<dyn FeatureSource> =
            Box::new(PacedSource::new(source, MOCK_FRAME_INTERVAL));

        let mut joystick = MockJoystick::new();
        joystick.push_axis(1, -16000); // gentle forward
        let joystick: Box<dyn JoystickSource> = Box::new(joystick);

        let transport: Box<dyn LinkTransport> = Box::new(MockTransport::new());

        let shared = Arc::new(SharedState::new());
        Self::assemble(config, shared, joystick, transport, features, templates)
    }

    fn assemble(
        config: PanchjanyaConfig,
        shared: Arc<SharedState>,
        joystick: Box<dyn JoystickSource>,
        transport: Box<dyn LinkTransport>,
        features: Box<dyn FeatureSource>,
        templates: TemplateSet,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = SymbolDetector::new(templates, config.vision.detector_config());
        let handles = spawn_threads(
            &config,
            Arc::clone(&shared),
            joystick,
            transport,
            features,
            detector,
        )?;
        let supervisor = Supervisor::new(config.supervisor.clone(), Arc::clone(&shared));

        Ok(Self {
            config,
            shared,
            handles,
            supervisor,
        })
    }

    /// Shared state handle (for the signal handler).
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    /// Run the supervising loop until shutdown.
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::info!(
            "Panchjanya running: {} Hz relay, extractor {}",
            self.config.link.send_rate_hz,
            self.config.vision.extractor_addr
        );

        let mut last_stats = Instant::now();

        while !self.shared.should_shutdown() {
            match self.handles.updates_rx.recv_timeout(SUPERVISOR_TICK) {
                Ok(update) => self.supervisor.apply_update(&update),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    log::warn!("Vision thread gone");
                    break;
                }
            }
            self.supervisor.handle_resume();

            if last_stats.elapsed() >= STATS_INTERVAL {
                self.log_stats();
                last_stats = Instant::now();
            }
        }

        log::info!("Shutting down");
        self.shared.signal_shutdown();

        // The relay sends its final neutral frame on the way out
        let _ = self.handles.relay.join();
        // Vision ends at the next source read/shutdown check
        let _ = self.handles.vision.join();
        // The input thread may be parked in a blocking device read; it is
        // detached by design and exits with the process

        log::info!("Stopped");
        Ok(())
    }

    fn log_stats(&self) {
        let frames = self.handles.relay_stats.frames_sent.load(Ordering::Relaxed);
        let events = self.handles.relay_stats.events_seen.load(Ordering::Relaxed);
        let holding = self.shared.hold.load(Ordering::Acquire);
        let reasons = self.shared.reasons();
        if holding {
            let text: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
            log::info!(
                "Stats: {} frames sent, {} stick events, HOLDING ({})",
                frames,
                events,
                text.join(", ")
            );
        } else {
            log::info!("Stats: {} frames sent, {} stick events, driving", frames, events);
        }
    }
}
