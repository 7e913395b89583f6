//! Panchjanya - integrated control daemon for the team's robots
//!
//! Glues the teleop relay (shankha-link) to the symbol-detection pipeline
//! (drishti-core): gamepad input streams to the drive MCU at 50 Hz, and a
//! detected symbol or a drowsy operator freezes the drive until the scene
//! clears or the operator presses resume. `simulate` replays a practice
//! mission against the field model (kshetra-map) instead of driving
//! hardware.

mod app;
mod config;
mod mission;
mod shared;
mod sources;
mod supervisor;
mod threads;

use app::PanchjanyaApp;
use clap::{Parser, Subcommand};
use config::PanchjanyaConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "panchjanya", version, about = "Robot control daemon")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "panchjanya.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control daemon (default)
    Run {
        /// Serial port override
        #[arg(long)]
        port: Option<String>,

        /// Use synthetic devices instead of hardware
        #[arg(long)]
        mock: bool,
    },
    /// Replay a practice mission against the field model
    Simulate {
        /// Mission file (TOML)
        mission: PathBuf,
    },
    /// List serial ports and exit
    ListPorts,
}

fn main() {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        match PanchjanyaConfig::load(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Cannot load {}: {}", cli.config.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        PanchjanyaConfig::default()
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();
    log::info!("Panchjanya v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command.unwrap_or(Command::Run {
        port: None,
        mock: false,
    }) {
        Command::Run { port, mock } => run_daemon(config, port, mock),
        Command::Simulate { mission } => run_simulation(&mission),
        Command::ListPorts => list_ports(),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run_daemon(
    mut config: PanchjanyaConfig,
    port: Option<String>,
    mock: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.link.port = Some(port);
    }

    let app = if mock {
        PanchjanyaApp::new_mock(config)?
    } else {
        PanchjanyaApp::new(config)?
    };

    let shared = app.shared();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shared.signal_shutdown();
    })?;

    app.run()
}

fn run_simulation(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mission = mission::Mission::load(path)?;
    let report = mission::simulate(&mission)?;
    log::info!(
        "Report: {} waypoints, {} markers, {:.2}s",
        report.waypoints,
        report.collected,
        report.elapsed
    );
    Ok(())
}

fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = shankha_link::transport::list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    } else {
        for port in ports {
            println!("{port}");
        }
    }
    Ok(())
}
