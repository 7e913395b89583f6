//! Byte transports for the drive-frame link
//!
//! The relay only needs a thin read/write surface, so hardware access goes
//! through [`LinkTransport`]; tests and mock runs substitute
//! [`MockTransport`] and capture the exact bytes that would hit the wire.

use crate::error::{Error, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport trait for link communication
pub trait LinkTransport: Send {
    /// Read available data into buffer, returns number of bytes read.
    /// A read timeout is reported as 0 bytes, not an error.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Bytes waiting to be read, if the transport can tell
    fn available(&mut self) -> Result<usize> {
        Ok(0)
    }
}

impl<T: LinkTransport + ?Sized> LinkTransport for Box<T> {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        (**self).read(buffer)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }
}

/// Serial transport for the MCU link
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Delay for the MCU's auto-reset after the host opens the port.
    /// Frames written before the bootloader hands over are lost.
    pub const RESET_SETTLE: Duration = Duration::from_secs(2);

    /// Open a serial port at 8N1 and wait out the MCU reset.
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g. "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (115200 for the drive link)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(10))
            .open()?;

        log::info!("Opened serial port {} at {} baud", path, baud_rate);
        log::debug!("Waiting {:?} for MCU reset", Self::RESET_SETTLE);
        std::thread::sleep(Self::RESET_SETTLE);

        Ok(Self { port })
    }
}

impl LinkTransport for SerialLink {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.port.write(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }
}

/// List serial port paths present on the system.
pub fn list_ports() -> Result<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// Pick the serial port to use: the configured one if given, otherwise
/// auto-select when exactly one port exists.
///
/// With several candidates and no configuration this refuses to guess --
/// sending drive frames at the wrong device is worse than not starting.
pub fn resolve_port(configured: Option<&str>) -> Result<String> {
    if let Some(path) = configured {
        return Ok(path.to_string());
    }
    let ports = list_ports()?;
    match ports.len() {
        0 => Err(Error::NoPortFound),
        1 => {
            log::info!("Auto-selected serial port {}", ports[0]);
            Ok(ports[0].clone())
        }
        _ => Err(Error::InvalidParameter(format!(
            "multiple serial ports present ({}), set link.port explicitly",
            ports.join(", ")
        ))),
    }
}

/// Mock transport for unit testing
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    read_buffer: Vec<u8>,
    write_buffer: Vec<u8>,
    fail_writes: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend_from_slice(data);
    }

    /// Get all written data
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().write_buffer.clone()
    }

    /// Clear captured writes
    pub fn clear_written(&self) {
        self.inner.lock().unwrap().write_buffer.clear();
    }

    /// Make subsequent writes fail, simulating a dropped link
    pub fn fail_writes(&self) {
        self.inner.lock().unwrap().fail_writes = true;
    }
}

impl LinkTransport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let n = inner.read_buffer.len().min(buffer.len());
        buffer[..n].copy_from_slice(&inner.read_buffer[..n]);
        inner.read_buffer.drain(..n);
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        inner.write_buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.inner.lock().unwrap().read_buffer.len())
    }
}
