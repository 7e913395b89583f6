//! Print decoded joystick events to find axis/button numbers for a new
//! controller. Run with the device path as the only argument:
//!
//! ```text
//! cargo run --example joy_dump -- /dev/input/js0
//! ```

use shankha_link::joystick::{JoydevSource, JoystickSource};

fn main() -> shankha_link::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/input/js0".to_string());
    let mut source = JoydevSource::open(&path)?;

    println!("Reading {} - move sticks and press buttons, Ctrl-C to quit", path);
    while let Some(ev) = source.poll()? {
        let kind = match ev.kind {
            shankha_link::joystick::JoyEventKind::Axis => "axis",
            shankha_link::joystick::JoyEventKind::Button => "button",
        };
        let init = if ev.init { " (init)" } else { "" };
        println!(
            "[{:>10} ms] {} {:>2} = {:>6}{}",
            ev.time_ms, kind, ev.number, ev.value, init
        );
    }
    Ok(())
}
