//! Tap a serial port and print every drive frame seen on it, plus framing
//! errors. Useful for checking what a relay is actually sending:
//!
//! ```text
//! cargo run --example link_dump -- /dev/ttyUSB0
//! ```

use shankha_link::frame::FrameParser;
use shankha_link::transport::{LinkTransport, SerialLink};

fn main() -> shankha_link::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let mut link = SerialLink::open(&path, 115_200)?;
    let mut parser = FrameParser::new();
    let mut frames = Vec::new();
    let mut buf = [0u8; 256];
    let mut count: u64 = 0;

    println!("Listening on {} at 115200 baud, Ctrl-C to quit", path);
    loop {
        let n = link.read(&mut buf)?;
        if n == 0 {
            continue;
        }
        parser.push_bytes(&buf[..n], &mut frames);
        for frame in frames.drain(..) {
            count += 1;
            match frame.actuators {
                Some(act) => println!(
                    "#{count:<8} lx={:+4} ly={:+4} rx={:+4} l1={} r1={} (errors: {})",
                    frame.lx,
                    frame.ly,
                    frame.rx,
                    act.left as u8,
                    act.right as u8,
                    parser.error_count()
                ),
                None => println!(
                    "#{count:<8} lx={:+4} ly={:+4} rx={:+4} (errors: {})",
                    frame.lx,
                    frame.ly,
                    frame.rx,
                    parser.error_count()
                ),
            }
        }
    }
}
