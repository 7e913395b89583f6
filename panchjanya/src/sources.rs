//! Daemon-side feature sources
//!
//! The real deployment runs the camera extractor as a separate process
//! streaming wire-encoded frames over TCP; [`TcpFeatureSource`] is the
//! client end of that, with automatic reconnection. [`PacedSource`] slows
//! a synthetic source down to camera rate for `--mock` runs.

use drishti_core::source::FeatureSource;
use drishti_core::types::FrameFeatures;
use drishti_core::wire::read_frame;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Delay between reconnection attempts to the extractor
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// TCP client for the feature extractor
pub struct TcpFeatureSource {
    addr: String,
    connect_timeout: Duration,
    shutdown: Arc<AtomicBool>,
    stream: Option<TcpStream>,
}

impl TcpFeatureSource {
    /// Create a source that will connect to `addr` on first use.
    pub fn new(addr: String, connect_timeout: Duration, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            addr,
            connect_timeout,
            shutdown,
            stream: None,
        }
    }

    fn connect(&mut self) -> bool {
        let addrs: Vec<_> = match std::net::ToSocketAddrs::to_socket_addrs(&self.addr) {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                log::error!("Bad extractor address {}: {}", self.addr, e);
                return false;
            }
        };
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    log::info!("Connected to extractor at {}", addr);
                    self.stream = Some(stream);
                    return true;
                }
                Err(e) => {
                    log::debug!("Extractor connect to {} failed: {}", addr, e);
                }
            }
        }
        false
    }
}

impl FeatureSource for TcpFeatureSource {
    /// Read the next frame, reconnecting on stream loss. Returns `None`
    /// only once shutdown is signaled.
    fn next_frame(&mut self) -> drishti_core::Result<Option<FrameFeatures>> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(None);
            }

            let Some(stream) = self.stream.as_mut() else {
                if !self.connect() {
                    std::thread::sleep(RECONNECT_BACKOFF);
                }
                continue;
            };

            match read_frame(stream) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {
                    log::warn!("Extractor closed the connection, reconnecting");
                    self.stream = None;
                }
                Err(e) => {
                    log::warn!("Extractor stream error: {}, reconnecting", e);
                    self.stream = None;
                }
            }
        }
    }
}

/// Rate-limits an inner source to a fixed frame interval
pub struct PacedSource<S> {
    inner: S,
    interval: Duration,
    last: Option<Instant>,
}

impl<S: FeatureSource> PacedSource<S> {
    /// Wrap a source, serving at most one frame per `interval`.
    pub fn new(inner: S, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last: None,
        }
    }
}

impl<S: FeatureSource> FeatureSource for PacedSource<S> {
    fn next_frame(&mut self) -> drishti_core::Result<Option<FrameFeatures>> {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
        self.inner.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drishti_core::sim::{SceneConfig, SyntheticScene};
    use drishti_core::source::SyntheticSource;
    use drishti_core::wire::write_frame;
    use std::io::Write;
    use std::net::TcpListener;

    #[test]
    fn paced_source_spaces_frames() {
        let scene = SyntheticScene::generate(&SceneConfig::default(), 1);
        let source = SyntheticSource::new(scene).empty(3);
        let mut paced = PacedSource::new(source, Duration::from_millis(20));

        let start = Instant::now();
        while paced.next_frame().unwrap().is_some() {}
        // 3 frames, 2 enforced gaps
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn tcp_source_reads_streamed_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let frame = FrameFeatures::new(640, 360);
            write_frame(&mut conn, &frame).unwrap();
            write_frame(&mut conn, &frame).unwrap();
            conn.flush().unwrap();
        });

        let mut source = TcpFeatureSource::new(
            addr.to_string(),
            Duration::from_secs(1),
            Arc::clone(&shutdown),
        );
        let a = source.next_frame().unwrap().unwrap();
        assert_eq!(a.width, 640);
        let b = source.next_frame().unwrap().unwrap();
        assert_eq!(b.height, 360);
        server.join().unwrap();

        // Server is gone; asking again must end cleanly once shutdown is set
        shutdown.store(true, Ordering::Relaxed);
        assert!(source.next_frame().unwrap().is_none());
    }
}
