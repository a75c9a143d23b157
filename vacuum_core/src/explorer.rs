//! GraphExplorer - the canonical cleaning algorithm.
//!
//! The robot builds a graph of the house as it moves (see [`crate::graph`])
//! and on every turn picks one of:
//!
//! 1. head home, when battery or step budget only just covers the way back
//! 2. clean, when the current cell is dirty
//! 3. explore, towards the dirtiest (or never seen) neighbor
//!
//! After each recharge it plans a trip to the nearest cell that may still
//! hold dirt, and finishes once nothing reachable is left to clean or the
//! budget cannot cover another round trip.

use crate::algorithm::NavigationAlgorithm;
use crate::graph::{HouseGraph, UNOBSERVED};
use crate::policy::{ScanOrder, TieBreak};
use std::collections::VecDeque;
use vacuum_env::{Direction, Position, SensorSuite, Step};

/// Where the robot is in its mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Cleaning and discovering new cells
    Exploring,

    /// Following parent steps back to the dock
    ReturningToDock,

    /// On the dock, waiting for a full battery
    Charging,

    /// Following a planned path to a cell that may hold dirt
    NavigatingToTarget,

    /// Finish has been returned
    Finished,
}

/// Graph-building explorer with BFS target selection.
pub struct GraphExplorer {
    /// Sensor views bound at setup
    sensors: Option<SensorSuite>,

    /// Declared step budget
    max_steps: usize,

    /// Battery capacity observed on the first call
    max_battery: usize,

    /// Steps emitted so far (Finish excluded)
    total_steps: usize,

    /// False until the first call has recorded capacity
    started: bool,

    /// Discovered house, dock at the origin
    graph: HouseGraph,

    /// Dead-reckoned robot position
    position: Position,

    /// Position of the most recent relax
    last_relaxed: Option<Position>,

    state: NavState,

    /// Set once nothing reachable is left to clean
    mission_complete: bool,

    /// Remaining planned steps while navigating to a target
    target_path: VecDeque<Step>,

    /// Steps since the last departure from the dock
    trip_log: Vec<Step>,

    scan: ScanOrder,
}

impl GraphExplorer {
    /// Creates an explorer with the canonical ordered tie-break.
    pub fn new() -> Self {
        Self::with_tie_break(TieBreak::Ordered)
    }

    /// Creates an explorer with an explicit tie-break policy.
    pub fn with_tie_break(policy: TieBreak) -> Self {
        let dock = Position::new(0, 0);
        Self {
            sensors: None,
            max_steps: 0,
            max_battery: 0,
            total_steps: 0,
            started: false,
            graph: HouseGraph::new(dock),
            position: dock,
            last_relaxed: None,
            state: NavState::Exploring,
            mission_complete: false,
            target_path: VecDeque::new(),
            trip_log: Vec::new(),
            scan: ScanOrder::new(policy),
        }
    }

    /// Current mission state.
    pub fn state(&self) -> NavState {
        self.state
    }

    /// The graph discovered so far.
    pub fn graph(&self) -> &HouseGraph {
        &self.graph
    }

    /// Believed position relative to the dock.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Steps taken since the last departure from the dock.
    pub fn trip_log(&self) -> &[Step] {
        &self.trip_log
    }

    /// Steps emitted so far.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    fn dock(&self) -> Position {
        self.graph.dock()
    }

    fn remaining_steps(&self) -> usize {
        self.max_steps.saturating_sub(self.total_steps)
    }

    fn decide(&mut self, sensors: &SensorSuite) -> Step {
        if self.state == NavState::Finished {
            return Step::Finish;
        }

        if !self.started {
            self.started = true;
            self.max_battery = sensors.battery.battery_state();
            self.relax(sensors);
        }

        if self.total_steps >= self.max_steps {
            return self.finish();
        }

        if matches!(self.state, NavState::ReturningToDock | NavState::Charging) {
            if let Some(step) = self.continue_return(sensors) {
                return step;
            }
        }

        if self.state == NavState::NavigatingToTarget {
            if let Some(step) = self.target_path.pop_front() {
                if self.target_path.is_empty() {
                    self.state = NavState::Exploring;
                }
                self.trip_log.push(step);
                return self.take(step);
            }
            self.state = NavState::Exploring;
        }

        if self.last_relaxed != Some(self.position) {
            self.relax(sensors);
        }

        let distance = self.graph.distance(self.position).unwrap_or(usize::MAX);
        let margin = distance.saturating_add(1);
        if sensors.battery.battery_state() <= margin || self.remaining_steps() <= margin {
            return self.begin_return();
        }

        if sensors.dirt.dirt_level() > 0 {
            self.graph.decrement_dirt(self.position);
            return self.take(Step::Stay);
        }

        self.explore(sensors)
    }

    /// Handles a turn while heading home or charging. Returns `None` when
    /// the robot leaves the dock-bound states and the turn should continue
    /// with the regular decision order.
    fn continue_return(&mut self, sensors: &SensorSuite) -> Option<Step> {
        if self.position != self.dock() {
            if self.last_relaxed != Some(self.position) {
                self.relax(sensors);
            }
            return Some(self.step_home());
        }

        if self.mission_complete {
            return Some(self.finish());
        }

        if sensors.battery.battery_state() < self.max_battery {
            self.state = NavState::Charging;
            return Some(self.take(Step::Stay));
        }

        self.state = NavState::Exploring;
        let Some((_, path)) = self.graph.nearest_unresolved(self.dock()) else {
            self.mission_complete = true;
            return Some(self.finish());
        };

        // There and back plus one tick on arrival, otherwise the return
        // trigger fires before anything is cleaned.
        let round_trip = 2 * path.len() + 2;
        if round_trip > self.remaining_steps() || round_trip > self.max_battery {
            return Some(self.finish());
        }

        self.trip_log.clear();
        self.target_path = path.into();
        self.state = NavState::NavigatingToTarget;
        None
    }

    fn begin_return(&mut self) -> Step {
        if self.position == self.dock() {
            if self.remaining_steps() <= 1 {
                return self.finish();
            }
            self.state = NavState::ReturningToDock;
            self.trip_log.clear();
            return self.take(Step::Stay);
        }

        if self.total_steps == self.max_steps {
            return self.finish();
        }

        self.state = NavState::ReturningToDock;
        self.trip_log.clear();
        self.step_home()
    }

    /// One move along the parent pointer, logging its reverse.
    fn step_home(&mut self) -> Step {
        let step = self.graph.parent_step(self.position).unwrap_or(Step::Stay);
        if step.direction().is_none() {
            // Off the dock without a way home: nothing safe is left to do.
            return self.finish();
        }
        self.trip_log.push(step.reverse());
        self.take(step)
    }

    fn explore(&mut self, sensors: &SensorSuite) -> Step {
        let mut best: Option<(Direction, u32)> = None;
        for direction in self.scan.next_order() {
            if sensors.walls.is_wall(direction) {
                continue;
            }
            let dirt = self
                .graph
                .vertex(self.position.neighbor(direction))
                .map(|v| v.dirt)
                .unwrap_or(UNOBSERVED);
            if best.map_or(true, |(_, best_dirt)| dirt > best_dirt) {
                best = Some((direction, dirt));
            }
        }

        let step = match best {
            Some((direction, dirt)) if dirt > 0 => Step::from(direction),
            _ => match self.graph.nearest_unresolved(self.position) {
                Some((_, path)) if !path.is_empty() => path[0],
                _ => return self.wrap_up(),
            },
        };

        self.trip_log.push(step);
        self.take(step)
    }

    /// Everything discovered is clean: go home and finish there.
    fn wrap_up(&mut self) -> Step {
        self.mission_complete = true;
        if self.position == self.dock() {
            return self.finish();
        }
        self.state = NavState::ReturningToDock;
        self.step_home()
    }

    fn relax(&mut self, sensors: &SensorSuite) {
        let at = self.position;
        let walls = &sensors.walls;
        self.graph
            .relax(at, sensors.dirt.dirt_level(), |direction| walls.is_wall(direction));
        self.last_relaxed = Some(at);
    }

    fn take(&mut self, step: Step) -> Step {
        if let Some(direction) = step.direction() {
            self.position = self.position.neighbor(direction);
        }
        if step != Step::Finish {
            self.total_steps += 1;
        }
        step
    }

    fn finish(&mut self) -> Step {
        self.state = NavState::Finished;
        Step::Finish
    }
}

impl Default for GraphExplorer {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationAlgorithm for GraphExplorer {
    fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }

    fn set_sensors(&mut self, sensors: SensorSuite) {
        self.sensors = Some(sensors);
    }

    fn next_step(&mut self) -> Step {
        match self.sensors.clone() {
            Some(sensors) => self.decide(&sensors),
            None => self.finish(),
        }
    }
}
