//! The contract between the simulator and a navigation algorithm.

use vacuum_env::{SensorSuite, Step};

/// A per-run decision engine.
///
/// The simulator binds the step budget and sensors once, then calls
/// `next_step` repeatedly. One instance drives exactly one run; state is
/// never carried over between houses.
///
/// # Contract
///
/// - `set_max_steps` and `set_sensors` are called before the first
///   `next_step`. The caller enforces this.
/// - `next_step` never panics and always returns an action.
/// - Once `Step::Finish` is returned the run is over.
pub trait NavigationAlgorithm: Send {
    /// Declares the step budget of the run.
    fn set_max_steps(&mut self, max_steps: usize);

    /// Binds the read-only sensor views.
    fn set_sensors(&mut self, sensors: SensorSuite);

    /// Decides the next action.
    fn next_step(&mut self) -> Step;
}

impl<A: NavigationAlgorithm + ?Sized> NavigationAlgorithm for Box<A> {
    fn set_max_steps(&mut self, max_steps: usize) {
        (**self).set_max_steps(max_steps);
    }

    fn set_sensors(&mut self, sensors: SensorSuite) {
        (**self).set_sensors(sensors);
    }

    fn next_step(&mut self) -> Step {
        (**self).next_step()
    }
}
