//! Fixed-rate teleop relay loop
//!
//! Folds joystick events into a [`StickState`] and transmits one drive
//! frame per period (20 ms at the default 50 Hz). While the hold-stop flag
//! is set the sticks are ignored and neutral frames go out instead, which
//! is how the auto-stop supervisor freezes the robot without touching the
//! serial path. On shutdown or write failure the relay makes a best-effort
//! attempt to leave the motors stopped.

use crate::config::LinkConfig;
use crate::error::{Error, Result};
use crate::frame::{DriveFrame, FrameBuffer};
use crate::joystick::{GamepadMap, JoyEvent, JoystickSource, StickState};
use crate::transport::LinkTransport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

/// Joystick source fed by a reader thread
///
/// Device-backed sources block in `poll`, which would stall the transmit
/// loop. [`spawn_reader`] moves the blocking reads onto their own thread
/// and hands the relay this non-blocking channel end instead.
pub struct ChannelSource {
    rx: mpsc::Receiver<JoyEvent>,
}

impl ChannelSource {
    /// Wrap a receiver fed by an external event pump
    pub fn new(rx: mpsc::Receiver<JoyEvent>) -> Self {
        Self { rx }
    }
}

impl JoystickSource for ChannelSource {
    fn poll(&mut self) -> Result<Option<JoyEvent>> {
        match self.rx.try_recv() {
            Ok(ev) => Ok(Some(ev)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(Error::Disconnected),
        }
    }
}

/// Spawn a reader thread pumping a blocking source into a [`ChannelSource`].
///
/// The thread exits when the source errors out (device unplugged) or when
/// the receiving end is dropped.
pub fn spawn_reader<S: JoystickSource + 'static>(mut source: S) -> Result<ChannelSource> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("joystick-reader".to_string())
        .spawn(move || {
            loop {
                match source.poll() {
                    Ok(Some(ev)) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::warn!("Joystick reader stopping: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(ChannelSource::new(rx))
}

/// Relay statistics, shared with whoever wants to report them
#[derive(Default)]
pub struct RelayStats {
    /// Frames written to the transport
    pub frames_sent: AtomicU64,
    /// Joystick events folded into the stick state
    pub events_seen: AtomicU64,
}

/// The teleop relay: joystick events in, drive frames out
pub struct TeleopRelay<S, T> {
    source: S,
    transport: T,
    config: LinkConfig,
    map: GamepadMap,
    deadzone: i16,
    state: StickState,
    buffer: FrameBuffer,
    hold: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<RelayStats>,
}

impl<S: JoystickSource, T: LinkTransport> TeleopRelay<S, T> {
    /// Create a relay.
    ///
    /// `hold` forces neutral frames while set; `shutdown` ends [`run`].
    pub fn new(
        source: S,
        transport: T,
        config: LinkConfig,
        map: GamepadMap,
        deadzone: i16,
        hold: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            transport,
            config,
            map,
            deadzone,
            state: StickState::default(),
            buffer: FrameBuffer::new(),
            hold,
            shutdown,
            stats: Arc::new(RelayStats::default()),
        }
    }

    /// Handle to the relay statistics counters.
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Current folded stick state.
    pub fn stick_state(&self) -> StickState {
        self.state
    }

    /// Drain pending joystick events into the stick state.
    ///
    /// Returns false once the source reports no further events will come.
    fn drain_events(&mut self) -> Result<bool> {
        loop {
            match self.source.poll() {
                Ok(Some(ev)) => {
                    if self.state.apply(&ev, &self.map, self.deadzone) {
                        self.stats.events_seen.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(None) => return Ok(true),
                Err(Error::Disconnected) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }

    /// Frame for the current state, honoring the hold-stop flag.
    fn current_frame(&self) -> DriveFrame {
        if self.hold.load(Ordering::Acquire) {
            return DriveFrame::neutral(self.config.extended_frames);
        }
        if self.config.extended_frames {
            DriveFrame::with_actuators(
                self.state.lx,
                self.state.ly,
                self.state.rx,
                self.state.l1,
                self.state.r1,
            )
        } else {
            DriveFrame::new(self.state.lx, self.state.ly, self.state.rx)
        }
    }

    /// Drain events and transmit one frame. Exposed for tests and for
    /// callers driving their own loop.
    pub fn tick(&mut self) -> Result<DriveFrame> {
        let alive = self.drain_events()?;
        let frame = self.current_frame();
        self.buffer
            .send_to(&frame, &mut WriterAdapter(&mut self.transport))?;
        self.stats.frames_sent.fetch_add(1, Ordering::Relaxed);
        if !alive {
            return Err(Error::Disconnected);
        }
        Ok(frame)
    }

    /// Run the transmit loop until shutdown or a link failure.
    ///
    /// Whatever the exit path, a final neutral frame is attempted so the
    /// robot is not left running the last commanded speed.
    pub fn run(&mut self) -> Result<()> {
        let interval = self.config.send_interval();
        let mut next_send = Instant::now();
        log::info!(
            "Relay running at {} Hz ({} frames)",
            self.config.send_rate_hz,
            if self.config.extended_frames { "5-field" } else { "3-field" },
        );

        let result = loop {
            if self.shutdown.load(Ordering::Relaxed) {
                log::info!("Relay shutting down");
                break Ok(());
            }

            let now = Instant::now();
            if now >= next_send {
                next_send = now + interval;
                if let Err(e) = self.tick() {
                    log::error!("Relay stopping: {}", e);
                    break Err(e);
                }
            }

            std::thread::sleep(Duration::from_millis(1));
        };

        self.send_neutral();
        result
    }

    /// Best-effort neutral frame; failures are logged and swallowed since
    /// this runs on paths where the link may already be gone.
    fn send_neutral(&mut self) {
        let frame = DriveFrame::neutral(self.config.extended_frames);
        if let Err(e) = self
            .buffer
            .send_to(&frame, &mut WriterAdapter(&mut self.transport))
        {
            log::warn!("Could not send final neutral frame: {}", e);
        } else {
            let _ = self.transport.flush();
        }
    }
}

/// Bridges `LinkTransport` to `std::io::Write` for the frame buffer.
struct WriterAdapter<'a, T: LinkTransport>(&'a mut T);

impl<T: LinkTransport> std::io::Write for WriterAdapter<'_, T> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .write(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .flush()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
