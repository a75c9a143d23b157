//! The discovered-house graph.
//!
//! A robot starts with no map. Every time it stands on a cell it can sense
//! which of the four neighbors are open, and the graph grows by that ring.
//! The graph is an arena keyed by position and owned by a single algorithm
//! instance for the life of one run.
//!
//! Distances to the dock are maintained with unit-weight edge relaxation:
//! whenever new edges appear, improvements are pushed outwards through the
//! known vertices, so `distance_to_dock` is always the exact shortest path
//! over the edges discovered so far.

use std::collections::{HashMap, HashSet, VecDeque};
use vacuum_env::{Direction, Position, Step};

/// Dirt level of a vertex that has been discovered but never stood on.
///
/// Larger than any real reading, so unexplored cells are always the most
/// attractive targets.
pub const UNOBSERVED: u32 = u32::MAX;

/// A cell the algorithm knows about.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Cell coordinate relative to the dock
    pub position: Position,

    /// Open neighbors, in discovery order
    pub neighbors: Vec<Position>,

    /// True once the robot has stood on this cell
    pub visited: bool,

    /// Shortest known number of moves to the dock
    pub distance_to_dock: usize,

    /// First move of the shortest known path to the dock (`Stay` on the dock)
    pub parent_step: Step,

    /// Cached dirt level, `UNOBSERVED` until visited
    pub dirt: u32,
}

impl Vertex {
    fn new(position: Position, distance_to_dock: usize, parent_step: Step) -> Self {
        Self {
            position,
            neighbors: Vec::with_capacity(4),
            visited: false,
            distance_to_dock,
            parent_step,
            dirt: UNOBSERVED,
        }
    }

    /// True while the vertex may still hold dirt (including never observed).
    pub fn is_unresolved(&self) -> bool {
        self.dirt > 0
    }

    fn link(&mut self, other: Position) {
        if !self.neighbors.contains(&other) {
            self.neighbors.push(other);
        }
    }
}

/// Arena of discovered vertices.
#[derive(Debug, Clone)]
pub struct HouseGraph {
    dock: Position,
    vertices: HashMap<Position, Vertex>,
}

impl HouseGraph {
    /// Creates a graph holding only the dock vertex.
    pub fn new(dock: Position) -> Self {
        let mut vertices = HashMap::new();
        vertices.insert(dock, Vertex::new(dock, 0, Step::Stay));
        Self { dock, vertices }
    }

    /// The dock position this graph measures distances to.
    pub fn dock(&self) -> Position {
        self.dock
    }

    /// Number of discovered vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false once constructed, the dock vertex is never removed.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns a vertex by position.
    pub fn vertex(&self, position: Position) -> Option<&Vertex> {
        self.vertices.get(&position)
    }

    /// Iterates over all discovered vertices in arbitrary order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Shortest known distance from `position` to the dock.
    pub fn distance(&self, position: Position) -> Option<usize> {
        self.vertices.get(&position).map(|v| v.distance_to_dock)
    }

    /// First move of the shortest known path home from `position`.
    pub fn parent_step(&self, position: Position) -> Option<Step> {
        self.vertices.get(&position).map(|v| v.parent_step)
    }

    /// Lowers the cached dirt of a vertex by one cleaning tick.
    pub fn decrement_dirt(&mut self, position: Position) {
        if let Some(vertex) = self.vertices.get_mut(&position) {
            vertex.dirt = vertex.dirt.saturating_sub(1);
        }
    }

    /// Extends the graph by the ring of cells around `at`.
    ///
    /// Marks `at` visited with the observed `dirt`, links every open
    /// neighbor (creating vertices as needed) and then propagates any
    /// distance improvement the new edges allow.
    pub fn relax<F>(&mut self, at: Position, dirt: u32, mut is_wall: F)
    where
        F: FnMut(Direction) -> bool,
    {
        let current_distance = {
            // The robot only stands on discovered cells, but an unknown cell
            // is still accepted and gets its distance from its neighbors.
            let vertex = self
                .vertices
                .entry(at)
                .or_insert_with(|| Vertex::new(at, usize::MAX, Step::Stay));
            vertex.dirt = dirt;
            vertex.visited = true;
            vertex.distance_to_dock
        };

        let mut touched = vec![at];
        for direction in Direction::ALL {
            if is_wall(direction) {
                continue;
            }
            let next = at.neighbor(direction);
            match self.vertices.get_mut(&next) {
                Some(existing) => existing.link(at),
                None => {
                    let mut created = Vertex::new(
                        next,
                        current_distance.saturating_add(1),
                        Step::from(direction.opposite()),
                    );
                    created.link(at);
                    self.vertices.insert(next, created);
                }
            }
            if let Some(current) = self.vertices.get_mut(&at) {
                current.link(next);
            }
            touched.push(next);
        }

        self.propagate(touched);
    }

    /// Label-correcting pass: relaxes edges outward from `seeds` until no
    /// distance improves.
    fn propagate(&mut self, seeds: Vec<Position>) {
        let mut queue: VecDeque<Position> = seeds.into();
        while let Some(from) = queue.pop_front() {
            let (from_distance, neighbors) = match self.vertices.get(&from) {
                Some(vertex) if vertex.distance_to_dock != usize::MAX => {
                    (vertex.distance_to_dock, vertex.neighbors.clone())
                }
                _ => continue,
            };
            for to in neighbors {
                let Some(direction) = to.direction_to(from) else {
                    continue;
                };
                if let Some(vertex) = self.vertices.get_mut(&to) {
                    if from_distance + 1 < vertex.distance_to_dock {
                        vertex.distance_to_dock = from_distance + 1;
                        vertex.parent_step = Step::from(direction);
                        queue.push_back(to);
                    }
                }
            }
        }
    }

    /// Breadth-first search from `from` for the nearest unresolved vertex.
    ///
    /// Ties at equal hop count go to whichever vertex the BFS reaches first,
    /// which depends only on neighbor discovery order and is therefore
    /// deterministic. Returns the target and the steps leading to it.
    pub fn nearest_unresolved(&self, from: Position) -> Option<(Position, Vec<Step>)> {
        if !self.vertices.contains_key(&from) {
            return None;
        }

        let mut parents: HashMap<Position, Position> = HashMap::new();
        let mut seen: HashSet<Position> = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            let Some(vertex) = self.vertices.get(&current) else {
                continue;
            };
            if vertex.is_unresolved() {
                return Some((current, Self::trace_path(&parents, from, current)));
            }
            for &next in &vertex.neighbors {
                if seen.insert(next) {
                    parents.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn trace_path(
        parents: &HashMap<Position, Position>,
        from: Position,
        target: Position,
    ) -> Vec<Step> {
        let mut path = Vec::new();
        let mut cursor = target;
        while cursor != from {
            let Some(&parent) = parents.get(&cursor) else {
                break;
            };
            if let Some(direction) = parent.direction_to(cursor) {
                path.push(Step::from(direction));
            }
            cursor = parent;
        }
        path.reverse();
        path
    }
}
