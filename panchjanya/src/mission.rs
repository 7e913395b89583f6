//! Mission files and the route simulator
//!
//! A mission file describes a practice run: where the robot starts, the
//! waypoints to visit and the KFS markers on the field. `simulate` replays
//! it against the field model at a fixed timestep and prints the same kind
//! of run log the drive team reads during practice.

use kshetra_map::field::FieldLayout;
use kshetra_map::geometry::MmPoint;
use kshetra_map::markers::KfsRegistry;
use kshetra_map::motion::{MotionConfig, Pose, RouteRun, StepEvent};
use kshetra_map::route::Route;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulation timestep, matching the 50 Hz control loop
const SIM_DT: f32 = 0.02;

/// Hard cap on simulated time so a broken mission cannot spin forever
const MAX_SIM_SECS: f32 = 3600.0;

/// A practice mission
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Mission {
    /// Custom field layout file; the standard field when omitted
    #[serde(default)]
    pub field: Option<String>,

    /// Start position in mm
    pub start: [f32; 2],

    /// Waypoints in visit order, mm
    pub waypoints: Vec<[f32; 2]>,

    /// KFS marker positions, mm
    #[serde(default)]
    pub kfs: Vec<[f32; 2]>,

    /// Motion parameters
    #[serde(default)]
    pub motion: MotionConfig,
}

impl Mission {
    /// Load a mission from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> kshetra_map::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents).map_err(kshetra_map::Error::from)?)
    }
}

/// Outcome of a simulated run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MissionReport {
    /// Waypoints visited
    pub waypoints: usize,
    /// Markers collected
    pub collected: usize,
    /// Simulated run time in seconds
    pub elapsed: f32,
}

/// Run a mission to completion, logging progress.
pub fn simulate(mission: &Mission) -> kshetra_map::Result<MissionReport> {
    let layout = match &mission.field {
        Some(path) => FieldLayout::from_file(path)?,
        None => FieldLayout::standard(),
    };

    let points: Vec<MmPoint> = mission
        .waypoints
        .iter()
        .map(|[x, y]| MmPoint::new(*x, *y))
        .collect();
    let route = Route::from_points(&layout, &points)?;

    let mut kfs = KfsRegistry::new();
    for [x, y] in &mission.kfs {
        kfs.place(&layout, MmPoint::new(*x, *y))?;
    }

    log::info!(
        "Mission: {} waypoints, {} markers, start ({:.0}, {:.0})",
        route.len(),
        kfs.len(),
        mission.start[0],
        mission.start[1]
    );

    let start = layout.snap_to_grid(MmPoint::new(mission.start[0], mission.start[1]))?;
    let mut run = RouteRun::new(mission.motion, route, Pose::at(start));

    let max_steps = (MAX_SIM_SECS / SIM_DT) as usize;
    let mut waypoints = 0usize;
    for _ in 0..max_steps {
        match run.step(SIM_DT, &mut kfs) {
            StepEvent::WaypointReached(i) => {
                waypoints += 1;
                log::info!("[{:7.2}s] -> WP{}", run.elapsed(), i + 1);
            }
            StepEvent::KfsCollected(m) => {
                waypoints += 1;
                log::info!(
                    "[{:7.2}s] * KFS at ({:.0}, {:.0}) - collecting",
                    run.elapsed(),
                    m.x,
                    m.y
                );
            }
            StepEvent::Completed => {
                log::info!(
                    "[{:7.2}s] Task completed: {} markers collected",
                    run.elapsed(),
                    run.collected()
                );
                return Ok(MissionReport {
                    waypoints,
                    collected: run.collected(),
                    elapsed: run.elapsed(),
                });
            }
            StepEvent::Turning { .. } | StepEvent::Advancing | StepEvent::Paused => {}
        }
    }

    Err(kshetra_map::Error::Layout(format!(
        "mission did not complete within {MAX_SIM_SECS} simulated seconds"
    )))
}
