//! KshetraMap - competition field model for the Panchjanya robots
//!
//! Everything on the field is measured in millimetres with the origin at
//! the top-left corner of the field frame, matching the rulebook drawings.
//!
//! - [`geometry`]: mm points/rects and the mm→pixel viewport transform
//! - [`field`]: the zone and forest-block tables plus spatial queries
//! - [`markers`]: the KFS marker registry
//! - [`route`]: waypoint routes over the field grid
//! - [`motion`]: rotate-then-drive motion simulation along a route

pub mod error;
pub mod field;
pub mod geometry;
pub mod markers;
pub mod motion;
pub mod route;

pub use error::{Error, Result};
pub use field::FieldLayout;
pub use geometry::{MmPoint, MmRect, Viewport};
pub use markers::KfsRegistry;
pub use motion::{MotionConfig, RouteRun, StepEvent};
pub use route::Route;
