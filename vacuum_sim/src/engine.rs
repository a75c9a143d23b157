//! Ground-truth simulation of a single (house, algorithm) run.
//!
//! The engine owns the real robot state. The algorithm only sees it
//! through [`LiveSensors`], and only the engine mutates it, in response to
//! the [`Step`] the algorithm returns.

use crate::cancel::CancelToken;
use crate::house::{Cell, House};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};
use vacuum_core::NavigationAlgorithm;
use vacuum_env::{BatteryMeter, Direction, DirtSensor, Position, SensorSuite, Step, WallSensor};

/// Score added per unit of dirt left behind.
pub const DIRT_PENALTY: u64 = 300;

/// Score added when the robot dies, or as part of the timeout penalty.
pub const DEAD_PENALTY: u64 = 2000;

/// Score added when the robot finishes away from the dock.
pub const STRANDED_PENALTY: u64 = 3000;

/// Score added when the budget runs out with the robot away from the dock.
pub const WORKING_PENALTY: u64 = 1000;

/// A `Stay` on the dock recharges `max_battery / CHARGE_DIVISOR`.
pub const CHARGE_DIVISOR: f64 = 20.0;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// The algorithm returned `Finish`
    Finished,

    /// The step budget ran out while the robot was still alive
    Working,

    /// The battery died off the dock or the robot broke the physics
    Dead,

    /// The run was cancelled for exceeding its wall-clock budget
    TimedOut,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Working => "WORKING",
            RunStatus::Dead => "DEAD",
            RunStatus::TimedOut => "TIMED_OUT",
        };
        f.pad(name)
    }
}

/// Computes the score of a run. Lower is better.
///
/// For [`RunStatus::TimedOut`] pass the house's initial dirt as
/// `dirt_left`; the timeout penalty ignores steps and dock state.
pub fn score(
    status: RunStatus,
    max_steps: usize,
    steps_taken: usize,
    dirt_left: u64,
    in_dock: bool,
) -> u64 {
    let max_steps = max_steps as u64;
    let dirt = dirt_left.saturating_mul(DIRT_PENALTY);
    match status {
        RunStatus::TimedOut => 2 * max_steps + dirt + DEAD_PENALTY,
        RunStatus::Dead => max_steps + dirt + DEAD_PENALTY,
        RunStatus::Finished if !in_dock => max_steps + dirt + STRANDED_PENALTY,
        _ if in_dock => steps_taken as u64 + dirt,
        _ => steps_taken as u64 + dirt + WORKING_PENALTY,
    }
}

/// Score substituted for a run that exceeded its wall-clock budget.
pub fn timeout_penalty(house: &House) -> u64 {
    score(RunStatus::TimedOut, house.max_steps, 0, house.total_dirt(), false)
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,

    /// Steps applied, `Finish` excluded
    pub steps_taken: usize,

    pub dirt_left: u64,

    pub in_dock: bool,

    pub score: u64,

    /// One character per action, see [`Step::code`]
    pub trace: String,

    /// Why the run was aborted, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

impl RunOutcome {
    /// An outcome for a run that produced no usable trace, such as one that
    /// panicked or was abandoned after its timeout.
    pub fn abandoned(house: &House, status: RunStatus, reason: impl Into<String>) -> Self {
        let dirt_left = house.total_dirt();
        Self {
            status,
            steps_taken: 0,
            dirt_left,
            in_dock: false,
            score: score(status, house.max_steps, 0, dirt_left, false),
            trace: String::new(),
            violation: Some(reason.into()),
        }
    }
}

/// The mutable ground truth of a run.
#[derive(Debug)]
pub struct World {
    layout: Arc<House>,
    cells: Vec<Cell>,
    position: Position,
    battery: f64,
    max_battery: f64,
    dirt_left: u64,
}

impl World {
    fn new(house: Arc<House>) -> Self {
        Self {
            cells: house.cells().to_vec(),
            position: house.dock(),
            battery: house.max_battery as f64,
            max_battery: house.max_battery as f64,
            dirt_left: house.total_dirt(),
            layout: house,
        }
    }

    /// Current robot position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Remaining charge, possibly fractional.
    pub fn battery(&self) -> f64 {
        self.battery
    }

    pub fn at_dock(&self) -> bool {
        self.position == self.layout.dock()
    }

    /// The running dirt counter.
    pub fn dirt_left(&self) -> u64 {
        self.dirt_left
    }

    /// Dirt summed over the grid; always equal to [`World::dirt_left`].
    pub fn grid_dirt(&self) -> u64 {
        self.cells.iter().map(|cell| u64::from(cell.dirt())).sum()
    }

    /// Cell at `pos`, out of bounds counts as wall.
    pub fn cell(&self, pos: Position) -> Cell {
        self.layout.index(pos).map_or(Cell::Wall, |i| self.cells[i])
    }

    fn is_wall_towards(&self, direction: Direction) -> bool {
        self.cell(self.position.neighbor(direction)) == Cell::Wall
    }

    fn is_dead(&self) -> bool {
        self.battery <= 0.0 && !self.at_dock()
    }

    /// Applies a non-`Finish` step. Moving into a wall is refused.
    fn apply(&mut self, step: Step) -> Result<(), String> {
        match step.direction() {
            Some(direction) => {
                let target = self.position.neighbor(direction);
                if self.cell(target) == Cell::Wall {
                    return Err(format!("moved {} into a wall at {}", direction_name(direction), target));
                }
                self.position = target;
                self.battery -= 1.0;
            }
            None if self.at_dock() => {
                self.battery = (self.battery + self.max_battery / CHARGE_DIVISOR).min(self.max_battery);
            }
            None => {
                self.battery -= 1.0;
                if let Some(index) = self.layout.index(self.position) {
                    if let Cell::Floor(level) = &mut self.cells[index] {
                        if *level > 0 {
                            *level -= 1;
                            self.dirt_left -= 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::North => "north",
        Direction::East => "east",
        Direction::South => "south",
        Direction::West => "west",
    }
}

/// Sensor views over the engine's live world state.
#[derive(Debug, Clone)]
pub struct LiveSensors {
    world: Arc<RwLock<World>>,
}

impl LiveSensors {
    fn read(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WallSensor for LiveSensors {
    fn is_wall(&self, direction: Direction) -> bool {
        self.read().is_wall_towards(direction)
    }
}

impl DirtSensor for LiveSensors {
    fn dirt_level(&self) -> u32 {
        let world = self.read();
        world.cell(world.position).dirt()
    }
}

impl BatteryMeter for LiveSensors {
    fn battery_state(&self) -> usize {
        self.read().battery.max(0.0).floor() as usize
    }
}

/// Drives one algorithm instance through one house.
pub struct SimulationEngine {
    house: Arc<House>,
    world: Arc<RwLock<World>>,
    algorithm: Box<dyn NavigationAlgorithm>,
    trace: String,
    steps_taken: usize,
}

impl SimulationEngine {
    /// Binds a fresh algorithm instance to a house.
    pub fn new(house: Arc<House>, mut algorithm: Box<dyn NavigationAlgorithm>) -> Self {
        let world = Arc::new(RwLock::new(World::new(Arc::clone(&house))));
        algorithm.set_max_steps(house.max_steps);
        algorithm.set_sensors(SensorSuite::from_shared(Arc::new(LiveSensors {
            world: Arc::clone(&world),
        })));

        Self {
            house,
            world,
            algorithm,
            trace: String::new(),
            steps_taken: 0,
        }
    }

    /// Runs until the algorithm finishes, the budget runs out, the robot
    /// dies, or `cancel` fires.
    pub fn run(&mut self, cancel: &CancelToken) -> RunOutcome {
        let max_steps = self.house.max_steps;
        let mut violation = None;

        let status = loop {
            if cancel.is_cancelled() {
                debug!("{}: cancelled after {} steps", self.house.name, self.steps_taken);
                break RunStatus::TimedOut;
            }

            {
                let world = self.read();
                if world.is_dead() {
                    violation = Some(format!(
                        "battery depleted at {} away from the dock after {} steps",
                        world.position, self.steps_taken
                    ));
                    break RunStatus::Dead;
                }
            }

            let step = self.algorithm.next_step();
            if step == Step::Finish {
                self.trace.push(step.code());
                break RunStatus::Finished;
            }
            if self.steps_taken >= max_steps {
                break RunStatus::Working;
            }

            if let Err(reason) = self.write().apply(step) {
                violation = Some(reason);
                break RunStatus::Dead;
            }
            self.trace.push(step.code());
            self.steps_taken += 1;

            debug_assert_eq!(self.dirt_left(), self.world_dirt());
        };

        if let Some(reason) = &violation {
            warn!("{}: {}", self.house.name, reason);
        }
        self.outcome(status, violation)
    }

    /// Steps applied so far.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// The running dirt counter.
    pub fn dirt_left(&self) -> u64 {
        self.read().dirt_left()
    }

    /// Dirt summed over the live grid.
    pub fn world_dirt(&self) -> u64 {
        self.read().grid_dirt()
    }

    /// Current battery charge.
    pub fn battery(&self) -> f64 {
        self.read().battery()
    }

    /// Current robot position.
    pub fn position(&self) -> Position {
        self.read().position()
    }

    fn outcome(&self, status: RunStatus, violation: Option<String>) -> RunOutcome {
        let world = self.read();
        let in_dock = world.at_dock();
        let score = match status {
            RunStatus::TimedOut => timeout_penalty(&self.house),
            _ => score(status, self.house.max_steps, self.steps_taken, world.dirt_left, in_dock),
        };

        RunOutcome {
            status,
            steps_taken: self.steps_taken,
            dirt_left: world.dirt_left,
            in_dock,
            score,
            trace: self.trace.clone(),
            violation,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use vacuum_core::{GraphExplorer, TieBreak};

    /// Plays back a fixed list of steps, then repeats `then`.
    struct Scripted {
        steps: VecDeque<Step>,
        then: Step,
    }

    impl Scripted {
        fn boxed(steps: &[Step], then: Step) -> Box<dyn NavigationAlgorithm> {
            Box::new(Self {
                steps: steps.iter().copied().collect(),
                then,
            })
        }
    }

    impl NavigationAlgorithm for Scripted {
        fn set_max_steps(&mut self, _max_steps: usize) {}
        fn set_sensors(&mut self, _sensors: SensorSuite) {}
        fn next_step(&mut self) -> Step {
            self.steps.pop_front().unwrap_or(self.then)
        }
    }

    fn house(rows: &[&str], max_steps: usize, max_battery: usize) -> Arc<House> {
        Arc::new(House::from_rows("test", max_steps, max_battery, rows).unwrap())
    }

    fn run(house: &Arc<House>, algorithm: Box<dyn NavigationAlgorithm>) -> (SimulationEngine, RunOutcome) {
        let mut engine = SimulationEngine::new(Arc::clone(house), algorithm);
        let outcome = engine.run(&CancelToken::new());
        (engine, outcome)
    }

    #[test]
    fn test_clean_and_return() {
        let house = house(&["D3"], 20, 10);
        let script = [Step::East, Step::Stay, Step::Stay, Step::West];
        let (engine, outcome) = run(&house, Scripted::boxed(&script, Step::Finish));

        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(outcome.trace, "EssWF");
        assert_eq!(outcome.steps_taken, 4);
        assert_eq!(outcome.dirt_left, 1);
        assert!(outcome.in_dock);
        assert_eq!(outcome.score, 4 + 300);
        assert_eq!(engine.battery(), 6.0);
        assert_eq!(engine.world_dirt(), 1);
    }

    #[test]
    fn test_stay_on_clean_floor_costs_battery_only() {
        let house = house(&["D "], 20, 10);
        let (engine, outcome) = run(&house, Scripted::boxed(&[Step::East, Step::Stay], Step::Finish));
        assert_eq!(outcome.dirt_left, 0);
        assert_eq!(engine.battery(), 8.0);
    }

    #[test]
    fn test_charging_is_capped() {
        let house = house(&["D1"], 20, 40);
        let script = [Step::East, Step::West, Step::Stay, Step::Stay];
        let (engine, outcome) = run(&house, Scripted::boxed(&script, Step::Finish));

        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(engine.battery(), 40.0);
    }

    #[test]
    fn test_fractional_charge() {
        let house = house(&["D "], 20, 10);
        let script = [Step::East, Step::West, Step::Stay];
        let (engine, _) = run(&house, Scripted::boxed(&script, Step::Finish));
        assert_eq!(engine.battery(), 8.5);
    }

    #[test]
    fn test_battery_death_off_dock() {
        let house = house(&["D    "], 20, 2);
        let (engine, outcome) = run(&house, Scripted::boxed(&[], Step::East));

        assert_eq!(outcome.status, RunStatus::Dead);
        assert_eq!(outcome.steps_taken, 2);
        assert_eq!(engine.position(), Position::new(0, 2));
        assert!(!outcome.in_dock);
        assert_eq!(outcome.score, 20 + 2000);
        assert!(outcome.violation.is_some());
    }

    #[test]
    fn test_finish_off_dock() {
        let house = house(&["D 2"], 10, 10);
        let (_, outcome) = run(&house, Scripted::boxed(&[Step::East], Step::Finish));

        assert_eq!(outcome.status, RunStatus::Finished);
        assert!(!outcome.in_dock);
        assert_eq!(outcome.score, 10 + 2 * 300 + 3000);
    }

    #[test]
    fn test_budget_exhaustion_is_working() {
        let house = house(&["D    "], 3, 10);
        let (_, outcome) = run(&house, Scripted::boxed(&[], Step::East));

        assert_eq!(outcome.status, RunStatus::Working);
        assert_eq!(outcome.steps_taken, 3);
        assert_eq!(outcome.trace, "EEE");
        assert_eq!(outcome.score, 3 + 1000);
    }

    #[test]
    fn test_budget_exhaustion_in_dock() {
        let house = house(&["D "], 4, 10);
        let (_, outcome) = run(&house, Scripted::boxed(&[], Step::Stay));

        assert_eq!(outcome.status, RunStatus::Working);
        assert!(outcome.in_dock);
        assert_eq!(outcome.score, 4);
    }

    #[test]
    fn test_finish_on_last_call_is_honoured() {
        let house = house(&["D "], 2, 10);
        let script = [Step::East, Step::West];
        let (_, outcome) = run(&house, Scripted::boxed(&script, Step::Finish));

        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(outcome.trace, "EWF");
        assert_eq!(outcome.score, 2);
    }

    #[test]
    fn test_move_into_wall_is_dead() {
        let house = house(&["DW"], 10, 10);
        let (engine, outcome) = run(&house, Scripted::boxed(&[Step::East], Step::Finish));

        assert_eq!(outcome.status, RunStatus::Dead);
        assert_eq!(outcome.steps_taken, 0);
        assert_eq!(engine.position(), house.dock());
        assert!(outcome.violation.unwrap().contains("wall"));
    }

    #[test]
    fn test_cancelled_run_scores_timeout_penalty() {
        let house = house(&["D9", "11"], 30, 10);
        let token = CancelToken::new();
        token.cancel();

        let mut engine = SimulationEngine::new(Arc::clone(&house), Scripted::boxed(&[], Step::Stay));
        let outcome = engine.run(&token);

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert_eq!(outcome.score, 2 * 30 + 11 * 300 + 2000);
        assert_eq!(outcome.score, timeout_penalty(&house));
    }

    #[test]
    fn test_live_sensors() {
        let house = house(&["D2", " W"], 10, 10);
        let world = Arc::new(RwLock::new(World::new(Arc::clone(&house))));
        let sensors = LiveSensors {
            world: Arc::clone(&world),
        };

        assert!(sensors.is_wall(Direction::North));
        assert!(sensors.is_wall(Direction::West));
        assert!(!sensors.is_wall(Direction::East));
        assert!(!sensors.is_wall(Direction::South));
        assert_eq!(sensors.dirt_level(), 0);
        assert_eq!(sensors.battery_state(), 10);

        world.write().unwrap().apply(Step::East).unwrap();
        assert_eq!(sensors.dirt_level(), 2);
        assert!(sensors.is_wall(Direction::South));
        assert!(sensors.is_wall(Direction::East));

        world.write().unwrap().battery = 4.75;
        assert_eq!(sensors.battery_state(), 4);
        world.write().unwrap().battery = -1.0;
        assert_eq!(sensors.battery_state(), 0);
    }

    #[test]
    fn test_score_table() {
        assert_eq!(score(RunStatus::Dead, 100, 40, 2, true), 100 + 600 + 2000);
        assert_eq!(score(RunStatus::Finished, 100, 40, 2, false), 100 + 600 + 3000);
        assert_eq!(score(RunStatus::Finished, 100, 40, 2, true), 40 + 600);
        assert_eq!(score(RunStatus::Working, 100, 100, 2, true), 100 + 600);
        assert_eq!(score(RunStatus::Working, 100, 100, 2, false), 100 + 600 + 1000);
        assert_eq!(score(RunStatus::TimedOut, 100, 0, 2, false), 200 + 600 + 2000);
    }

    fn grid_strategy() -> impl Strategy<Value = Vec<String>> {
        (1usize..5, 1usize..6).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(
                prop::collection::vec(prop::sample::select(vec![' ', ' ', 'W', '1', '3', '9']), cols),
                rows,
            )
            .prop_map(|grid| {
                let mut rows: Vec<String> = grid.into_iter().map(|row| row.into_iter().collect()).collect();
                rows[0].replace_range(0..1, "D");
                rows
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_dirt_accounting_and_score(
            grid in grid_strategy(),
            max_steps in 0usize..120,
            max_battery in 1usize..40,
            shuffled in any::<bool>(),
        ) {
            let refs: Vec<&str> = grid.iter().map(String::as_str).collect();
            let house = Arc::new(House::from_rows("prop", max_steps, max_battery, &refs).unwrap());
            let tie_break = if shuffled { TieBreak::Shuffled { seed: 11 } } else { TieBreak::Ordered };
            let (engine, outcome) = run(&house, Box::new(GraphExplorer::with_tie_break(tie_break)));

            prop_assert_eq!(engine.world_dirt(), outcome.dirt_left);
            prop_assert!(outcome.dirt_left <= house.total_dirt());
            prop_assert!(outcome.steps_taken <= max_steps);
            prop_assert_eq!(
                outcome.score,
                score(outcome.status, max_steps, outcome.steps_taken, outcome.dirt_left, outcome.in_dock)
            );
            prop_assert!(outcome.score >= outcome.steps_taken as u64);

            let moves = outcome.trace.chars().filter(|c| *c != 'F').count();
            prop_assert_eq!(moves, outcome.steps_taken);
            prop_assert_eq!(outcome.trace.ends_with('F'), outcome.status == RunStatus::Finished);
        }
    }
}
