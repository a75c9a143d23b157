//! Common types shared by the simulator and the navigation algorithms.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};

/// A cell coordinate in a house grid.
///
/// Rows grow southwards and columns grow eastwards. Positions carry no
/// implicit bound: whether a coordinate is inside the house is decided by
/// whoever owns the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row index (north is smaller)
    pub row: i32,

    /// Column index (west is smaller)
    pub col: i32,
}

impl Position {
    /// Creates a position from a row/column pair.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the adjacent position one cell away in `direction`.
    pub fn neighbor(self, direction: Direction) -> Self {
        let (dr, dc) = direction.offset();
        Self::new(self.row + dr, self.col + dc)
    }

    /// Returns the direction leading from `self` to an orthogonally adjacent
    /// `other`, or `None` if the two cells are not neighbors.
    pub fn direction_to(self, other: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.neighbor(direction) == other)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four compass directions a robot can sense or move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in canonical scan order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Row/column delta of a single move in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    /// Returns the direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// A single action returned by a navigation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    North,
    East,
    South,
    West,

    /// Clean the current cell, or charge when on the dock
    Stay,

    /// End the run
    Finish,
}

impl Step {
    /// Returns the trace character for this step.
    ///
    /// Moves use their compass initial, `Stay` is a lowercase `s` so it can
    /// be told apart from `South`, and `Finish` is `F`.
    pub fn code(self) -> char {
        match self {
            Step::North => 'N',
            Step::East => 'E',
            Step::South => 'S',
            Step::West => 'W',
            Step::Stay => 's',
            Step::Finish => 'F',
        }
    }

    /// Parses a trace character back into a step.
    pub fn from_code(code: char) -> Result<Step, EnvError> {
        match code {
            'N' => Ok(Step::North),
            'E' => Ok(Step::East),
            'S' => Ok(Step::South),
            'W' => Ok(Step::West),
            's' => Ok(Step::Stay),
            'F' => Ok(Step::Finish),
            other => Err(EnvError::UnknownStepCode(other)),
        }
    }

    /// Returns the movement direction, or `None` for `Stay`/`Finish`.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Step::North => Some(Direction::North),
            Step::East => Some(Direction::East),
            Step::South => Some(Direction::South),
            Step::West => Some(Direction::West),
            Step::Stay | Step::Finish => None,
        }
    }

    /// Returns the step that undoes this one. `Stay` and `Finish` map to
    /// `Stay`.
    pub fn reverse(self) -> Step {
        match self.direction() {
            Some(direction) => Step::from(direction.opposite()),
            None => Step::Stay,
        }
    }
}

impl From<Direction> for Step {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::North => Step::North,
            Direction::East => Step::East,
            Direction::South => Step::South,
            Direction::West => Step::West,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::North => "North",
            Step::East => "East",
            Step::South => "South",
            Step::West => "West",
            Step::Stay => "Stay",
            Step::Finish => "Finish",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_and_direction_to_agree() {
        let origin = Position::new(3, 7);
        for direction in Direction::ALL {
            let next = origin.neighbor(direction);
            assert_eq!(origin.direction_to(next), Some(direction));
            assert_eq!(next.neighbor(direction.opposite()), origin);
        }
        assert_eq!(origin.direction_to(Position::new(5, 7)), None);
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn test_step_codes_are_distinct() {
        let steps = [
            Step::North,
            Step::East,
            Step::South,
            Step::West,
            Step::Stay,
            Step::Finish,
        ];
        for step in steps {
            assert_eq!(Step::from_code(step.code()).unwrap(), step);
        }
        assert!(Step::from_code('x').is_err());
    }

    #[test]
    fn test_step_reverse() {
        assert_eq!(Step::North.reverse(), Step::South);
        assert_eq!(Step::West.reverse(), Step::East);
        assert_eq!(Step::Stay.reverse(), Step::Stay);
        assert_eq!(Step::Finish.reverse(), Step::Stay);
    }
}
