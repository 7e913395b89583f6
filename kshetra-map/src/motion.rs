//! Rotate-then-drive motion simulation along a route
//!
//! The simulated robot turns in place until it faces the current waypoint,
//! then drives straight at it. Reaching a waypoint that holds a KFS marker
//! collects the marker and pauses the run for the collection time before
//! moving on. The simulation advances by explicit `dt` steps and never
//! reads the wall clock, so runs are reproducible.

use crate::geometry::MmPoint;
use crate::markers::KfsRegistry;
use crate::route::Route;
use serde::{Deserialize, Serialize};

/// Motion parameters
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Straight-line speed in mm/s
    #[serde(default = "default_linear")]
    pub linear_speed: f32,
    /// In-place turn rate in rad/s
    #[serde(default = "default_angular")]
    pub angular_speed: f32,
    /// Heading error below which the robot drives instead of turning (rad)
    #[serde(default = "default_heading_tol")]
    pub heading_tolerance: f32,
    /// Distance below which a waypoint counts as reached (mm)
    #[serde(default = "default_waypoint_tol")]
    pub waypoint_tolerance: f32,
    /// Pause for collecting a KFS marker (s)
    #[serde(default = "default_kfs_pause")]
    pub kfs_pause: f32,
}

fn default_linear() -> f32 {
    800.0
}
fn default_angular() -> f32 {
    3.0
}
fn default_heading_tol() -> f32 {
    0.12
}
fn default_waypoint_tol() -> f32 {
    50.0
}
fn default_kfs_pause() -> f32 {
    5.0
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            linear_speed: default_linear(),
            angular_speed: default_angular(),
            heading_tolerance: default_heading_tol(),
            waypoint_tolerance: default_waypoint_tol(),
            kfs_pause: default_kfs_pause(),
        }
    }
}

/// Robot pose on the field: position in mm, heading in radians
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: MmPoint,
    pub theta: f32,
}

impl Pose {
    /// Pose at a position, facing along +X
    pub fn at(position: MmPoint) -> Self {
        Self {
            position,
            theta: 0.0,
        }
    }
}

/// What happened during one simulation step
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepEvent {
    /// Turning in place toward the waypoint (positive = CCW)
    Turning { direction: f32 },
    /// Driving straight toward the waypoint
    Advancing,
    /// Arrived at a waypoint (index into the route)
    WaypointReached(usize),
    /// Collected the marker at a waypoint; the run now pauses
    KfsCollected(MmPoint),
    /// Paused for a collection
    Paused,
    /// All waypoints visited
    Completed,
}

/// One run of a robot along a route
pub struct RouteRun {
    config: MotionConfig,
    route: Route,
    pose: Pose,
    target_index: usize,
    pause_remaining: f32,
    elapsed: f32,
    collected: usize,
    done: bool,
}

impl RouteRun {
    /// Start a run from a pose.
    pub fn new(config: MotionConfig, route: Route, start: Pose) -> Self {
        Self {
            config,
            route,
            pose: start,
            target_index: 0,
            pause_remaining: 0.0,
            elapsed: 0.0,
            collected: 0,
            done: false,
        }
    }

    /// Current pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Time simulated so far, in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Markers collected so far
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// True once every waypoint has been visited
    pub fn is_complete(&self) -> bool {
        self.done
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32, kfs: &mut KfsRegistry) -> StepEvent {
        if self.done {
            return StepEvent::Completed;
        }
        self.elapsed += dt;

        if self.pause_remaining > 0.0 {
            self.pause_remaining -= dt;
            return StepEvent::Paused;
        }

        let Some(&target) = self.route.waypoints().get(self.target_index) else {
            self.done = true;
            log::info!(
                "Route complete: {} waypoints, {} markers, {:.1}s",
                self.route.len(),
                self.collected,
                self.elapsed
            );
            return StepEvent::Completed;
        };

        let dx = target.x - self.pose.position.x;
        let dy = target.y - self.pose.position.y;
        let distance = self.pose.position.distance(&target);

        // Arrival check first so a waypoint is not orbited forever
        if distance <= self.config.waypoint_tolerance {
            let index = self.target_index;
            self.target_index += 1;
            if let Some(marker) = kfs.remove_near(target, self.config.waypoint_tolerance) {
                self.collected += 1;
                self.pause_remaining = self.config.kfs_pause;
                return StepEvent::KfsCollected(marker);
            }
            return StepEvent::WaypointReached(index);
        }

        let target_angle = dy.atan2(dx);
        let diff = normalize_angle(target_angle - self.pose.theta);

        if diff.abs() > self.config.heading_tolerance {
            let direction = diff.signum();
            let turn = self.config.angular_speed * dt;
            // Don't overshoot the target heading within one step
            self.pose.theta = normalize_angle(self.pose.theta + direction * turn.min(diff.abs()));
            StepEvent::Turning { direction }
        } else {
            let advance = (self.config.linear_speed * dt).min(distance);
            self.pose.position.x += advance * self.pose.theta.cos();
            self.pose.position.y += advance * self.pose.theta.sin();
            StepEvent::Advancing
        }
    }
}

/// Wrap an angle to [-pi, pi)
fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::PI;
    let mut a = (angle + PI) % (2.0 * PI);
    if a < 0.0 {
        a += 2.0 * PI;
    }
    a - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldLayout;

    const DT: f32 = 0.02; // 50 Hz simulation step

    fn run_until_complete(run: &mut RouteRun, kfs: &mut KfsRegistry, max_steps: usize) -> Vec<StepEvent> {
        let mut events = Vec::new();
        for _ in 0..max_steps {
            let ev = run.step(DT, kfs);
            events.push(ev);
            if ev == StepEvent::Completed {
                return events;
            }
        }
        panic!("run did not complete within {max_steps} steps");
    }

    #[test]
    fn drives_straight_to_a_waypoint_ahead() {
        let layout = FieldLayout::standard();
        let route =
            Route::from_points(&layout, &[MmPoint::new(2050.0, 1050.0)]).unwrap();
        let start = Pose::at(MmPoint::new(1050.0, 1050.0));
        let mut run = RouteRun::new(MotionConfig::default(), route, start);
        let mut kfs = KfsRegistry::new();

        // 1000 mm at 800 mm/s is 1.25 s, i.e. ~63 steps plus arrival
        let events = run_until_complete(&mut run, &mut kfs, 200);
        assert!(events.contains(&StepEvent::Advancing));
        assert!(events.contains(&StepEvent::WaypointReached(0)));
        assert!(run.is_complete());
        assert!(run.pose().position.distance(&MmPoint::new(2050.0, 1050.0)) <= 51.0);
    }

    #[test]
    fn turns_before_driving_when_target_is_behind() {
        let layout = FieldLayout::standard();
        let route =
            Route::from_points(&layout, &[MmPoint::new(1050.0, 1050.0)]).unwrap();
        // Start east of the target, facing east: must turn ~pi first
        let start = Pose::at(MmPoint::new(2050.0, 1050.0));
        let mut run = RouteRun::new(MotionConfig::default(), route, start);
        let mut kfs = KfsRegistry::new();

        let first = run.step(DT, &mut kfs);
        assert!(matches!(first, StepEvent::Turning { .. }));

        let events = run_until_complete(&mut run, &mut kfs, 500);
        let first_advance = events
            .iter()
            .position(|e| *e == StepEvent::Advancing)
            .expect("eventually drives");
        let last_turn = events
            .iter()
            .rposition(|e| matches!(e, StepEvent::Turning { .. }))
            .unwrap();
        assert!(last_turn < first_advance, "turn phase precedes drive phase");
    }

    #[test]
    fn kfs_waypoint_pauses_and_collects() {
        let layout = FieldLayout::standard();
        let target = MmPoint::new(1350.0, 1050.0);
        let route = Route::from_points(&layout, &[target, MmPoint::new(1650.0, 1050.0)]).unwrap();
        let mut kfs = KfsRegistry::new();
        kfs.place(&layout, target).unwrap();

        let start = Pose::at(MmPoint::new(1050.0, 1050.0));
        let mut run = RouteRun::new(MotionConfig::default(), route, start);

        let events = run_until_complete(&mut run, &mut kfs, 2000);
        let collected_at = events
            .iter()
            .position(|e| matches!(e, StepEvent::KfsCollected(_)))
            .expect("marker collected");
        assert!(kfs.is_empty());
        assert_eq!(run.collected(), 1);

        // The 5 s pause at 50 Hz is 250 Paused steps
        let pauses = events[collected_at..]
            .iter()
            .filter(|e| **e == StepEvent::Paused)
            .count();
        assert!((249..=251).contains(&pauses), "pauses = {pauses}");

        // Run continues to the second waypoint afterwards
        assert!(events.contains(&StepEvent::WaypointReached(1)));
        assert!(run.elapsed() > 5.0);
    }

    #[test]
    fn empty_route_completes_immediately() {
        let mut run = RouteRun::new(MotionConfig::default(), Route::new(), Pose::at(MmPoint::new(0.0, 0.0)));
        let mut kfs = KfsRegistry::new();
        assert_eq!(run.step(DT, &mut kfs), StepEvent::Completed);
        assert!(run.is_complete());
        // Stays complete
        assert_eq!(run.step(DT, &mut kfs), StepEvent::Completed);
    }

    #[test]
    fn heading_wraparound_turns_the_short_way() {
        // Target almost due south-west while facing north-east-ish:
        // the normalized difference must stay within [-pi, pi)
        let layout = FieldLayout::standard();
        let route = Route::from_points(&layout, &[MmPoint::new(1050.0, 1050.0)]).unwrap();
        let mut start = Pose::at(MmPoint::new(1950.0, 1950.0));
        start.theta = 3.0; // facing almost due west
        let mut run = RouteRun::new(MotionConfig::default(), route, start);
        let mut kfs = KfsRegistry::new();

        // Desired heading is atan2(-900, -900) = -3pi/4; from +3.0 the short
        // way is to keep increasing past pi (wrapping), i.e. positive turn
        match run.step(DT, &mut kfs) {
            StepEvent::Turning { direction } => assert!(direction > 0.0),
            other => panic!("expected turning, got {other:?}"),
        }
        run_until_complete(&mut run, &mut kfs, 500);
    }
}
