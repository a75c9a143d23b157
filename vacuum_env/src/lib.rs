//! Vacuum Environment Abstraction Layer
//!
//! This crate is the seam between a navigation algorithm and the world it
//! cleans. Algorithms never see the house grid; they only get three
//! read-only views relative to the robot's current cell:
//!
//! - **Walls**: `is_wall(direction)`, out-of-bounds counts as a wall
//! - **Dirt**: `dirt_level()` of the current cell
//! - **Battery**: `battery_state()` in whole steps
//!
//! All mutation happens in the simulator, in response to the `Step` the
//! algorithm returns.
//!
//! # Example
//!
//! ```ignore
//! use vacuum_env::{Direction, SensorSuite, Step};
//!
//! fn pick(sensors: &SensorSuite) -> Step {
//!     if sensors.dirt.dirt_level() > 0 {
//!         return Step::Stay;
//!     }
//!     Direction::ALL
//!         .into_iter()
//!         .find(|d| !sensors.walls.is_wall(*d))
//!         .map(Step::from)
//!         .unwrap_or(Step::Finish)
//! }
//! ```

mod error;
mod sensor;
mod types;

pub use error::EnvError;
pub use sensor::{BatteryMeter, DirtSensor, SensorSuite, WallSensor};
pub use types::{Direction, Position, Step};
