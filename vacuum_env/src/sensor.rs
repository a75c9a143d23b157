//! Read-only sensor capabilities handed to navigation algorithms.

use crate::types::Direction;
use std::sync::Arc;

/// Reports whether the robot is boxed in on a given side.
///
/// # Implementations
///
/// - **Simulation**: `LiveSensors` in `vacuum_sim`, backed by the engine's grid
/// - **Tests**: fixed or scripted grids
pub trait WallSensor: Send + Sync {
    /// Returns true if the adjacent cell in `direction` is a wall.
    ///
    /// Cells outside the house grid always count as walls.
    fn is_wall(&self, direction: Direction) -> bool;
}

/// Reports how dirty the cell under the robot is.
pub trait DirtSensor: Send + Sync {
    /// Dirt level of the current cell, 0 when clean.
    fn dirt_level(&self) -> u32;
}

/// Reports the remaining charge.
pub trait BatteryMeter: Send + Sync {
    /// Remaining battery in whole steps.
    ///
    /// The simulator may hold fractional charge internally; this is the
    /// floor of that value.
    fn battery_state(&self) -> usize;
}

/// The three sensor capabilities an algorithm is bound to at setup.
///
/// Each capability is an independent view so tests can mock one while
/// keeping the others real.
#[derive(Clone)]
pub struct SensorSuite {
    /// Wall sensing relative to the current cell
    pub walls: Arc<dyn WallSensor>,

    /// Dirt sensing of the current cell
    pub dirt: Arc<dyn DirtSensor>,

    /// Battery level
    pub battery: Arc<dyn BatteryMeter>,
}

impl SensorSuite {
    /// Builds a suite where one object provides every capability.
    pub fn from_shared<S>(sensors: Arc<S>) -> Self
    where
        S: WallSensor + DirtSensor + BatteryMeter + 'static,
    {
        Self {
            walls: sensors.clone(),
            dirt: sensors.clone(),
            battery: sensors,
        }
    }
}

impl std::fmt::Debug for SensorSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSuite")
            .field("dirt_level", &self.dirt.dirt_level())
            .field("battery", &self.battery.battery_state())
            .finish()
    }
}
