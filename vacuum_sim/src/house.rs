//! House definitions: header parsing, grid cells and directory loading.
//!
//! A house file looks like this:
//!
//! ```text
//! Small flat
//! MaxSteps = 50
//! MaxBattery = 20
//! Rows = 3
//! Cols = 3
//! D5
//!  W
//! ```
//!
//! Header keys may come in any order. Grid rows shorter than `Cols` are
//! padded with free cells, longer ones are cut, and missing rows are free.

use crate::error::{Diagnostic, DiagnosticKind, HarnessError, HouseError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use vacuum_env::Position;

/// File extension of house definitions.
pub const HOUSE_EXTENSION: &str = "house";

/// Largest grid, in cells, a house may declare. Keeps every coordinate
/// within `i32`.
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,

    /// Free floor with a dirt level in 0..=9
    Floor(u8),

    /// The docking station, always clean
    Dock,
}

impl Cell {
    /// Maps a grid character to a cell.
    pub fn from_char(c: char) -> Self {
        match c {
            'W' => Cell::Wall,
            'D' => Cell::Dock,
            '1'..='9' => Cell::Floor(c as u8 - b'0'),
            _ => Cell::Floor(0),
        }
    }

    /// Dirt held by this cell.
    pub fn dirt(self) -> u32 {
        match self {
            Cell::Floor(level) => u32::from(level),
            Cell::Wall | Cell::Dock => 0,
        }
    }
}

/// An immutable house definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct House {
    /// Identifier used in results (the file stem when loaded from disk)
    pub name: String,

    /// Free-text title from the first line of the file
    pub title: String,

    /// Step budget of a run
    pub max_steps: usize,

    /// Battery capacity in steps
    pub max_battery: usize,

    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    dock: Position,
}

impl House {
    /// Parses a house definition from text.
    pub fn parse(name: &str, text: &str) -> Result<Self, HouseError> {
        let mut lines = text.lines();
        let title = lines
            .next()
            .ok_or_else(|| HouseError::MissingHeader("house name".to_string()))?
            .trim()
            .to_string();

        let mut max_steps = None;
        let mut max_battery = None;
        let mut rows = None;
        let mut cols = None;

        for index in 0..4 {
            let line = lines
                .next()
                .ok_or_else(|| HouseError::MissingHeader(format!("header line {}", index + 2)))?;
            let Some((key, value)) = line.split_once('=') else {
                return Err(HouseError::invalid(line.trim(), ""));
            };
            let key = key.trim();
            let slot = match key {
                "MaxSteps" => &mut max_steps,
                "MaxBattery" => &mut max_battery,
                "Rows" => &mut rows,
                "Cols" => &mut cols,
                _ => continue,
            };
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| HouseError::invalid(key, value.trim()))?;
            *slot = Some(parsed);
        }

        let max_steps = max_steps.ok_or_else(|| HouseError::MissingHeader("MaxSteps".to_string()))?;
        let max_battery =
            max_battery.ok_or_else(|| HouseError::MissingHeader("MaxBattery".to_string()))?;
        let rows = rows.ok_or_else(|| HouseError::MissingHeader("Rows".to_string()))?;
        let cols = cols.ok_or_else(|| HouseError::MissingHeader("Cols".to_string()))?;

        if rows == 0 || cols == 0 {
            return Err(HouseError::EmptyGrid { rows, cols });
        }

        let area = rows
            .checked_mul(cols)
            .filter(|&area| area <= MAX_GRID_CELLS)
            .ok_or(HouseError::GridTooLarge {
                rows,
                cols,
                limit: MAX_GRID_CELLS,
            })?;

        let mut cells = vec![Cell::Floor(0); area];
        for (r, line) in lines.take(rows).enumerate() {
            for (c, ch) in line.chars().take(cols).enumerate() {
                cells[r * cols + c] = Cell::from_char(ch);
            }
        }

        let docks: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Dock)
            .map(|(i, _)| i)
            .collect();
        let dock = match docks.as_slice() {
            [] => return Err(HouseError::NoDock),
            [single] => Position::new((single / cols) as i32, (single % cols) as i32),
            many => return Err(HouseError::MultipleDocks(many.len())),
        };

        Ok(Self {
            name: name.to_string(),
            title,
            max_steps,
            max_battery,
            rows,
            cols,
            cells,
            dock,
        })
    }

    /// Builds a house straight from grid rows, sized to the widest row.
    pub fn from_rows(
        name: &str,
        max_steps: usize,
        max_battery: usize,
        grid: &[&str],
    ) -> Result<Self, HouseError> {
        let cols = grid.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let text = format!(
            "{name}\nMaxSteps = {max_steps}\nMaxBattery = {max_battery}\nRows = {}\nCols = {cols}\n{}",
            grid.len(),
            grid.join("\n")
        );
        Self::parse(name, &text)
    }

    /// Reads and parses a house file. The file stem becomes the name.
    pub fn load(path: &Path) -> Result<Self, HouseError> {
        let text = std::fs::read_to_string(path).map_err(|source| HouseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&house_name(path), &text)
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Position of the docking station.
    pub fn dock(&self) -> Position {
        self.dock
    }

    /// Cell at `pos`; anything outside the grid is a wall.
    pub fn cell(&self, pos: Position) -> Cell {
        self.index(pos).map_or(Cell::Wall, |i| self.cells[i])
    }

    /// Row-major cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Sum of all dirt levels.
    pub fn total_dirt(&self) -> u64 {
        self.cells.iter().map(|cell| u64::from(cell.dirt())).sum()
    }

    /// Flat index of an in-bounds position.
    pub fn index(&self, pos: Position) -> Option<usize> {
        let in_bounds = pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.rows
            && (pos.col as usize) < self.cols;
        in_bounds.then(|| pos.row as usize * self.cols + pos.col as usize)
    }
}

/// Houses found in a directory, plus the files that were rejected.
#[derive(Debug, Default)]
pub struct LoadedHouses {
    pub houses: Vec<Arc<House>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Loads every `*.house` file in `dir`, sorted by file name.
///
/// Malformed files are reported as diagnostics and skipped. Only a
/// directory that cannot be listed is an error.
pub fn load_houses(dir: &Path) -> Result<LoadedHouses, HarnessError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == HOUSE_EXTENSION))
        .collect();
    paths.sort();

    let mut loaded = LoadedHouses::default();
    for path in paths {
        match House::load(&path) {
            Ok(house) => {
                debug!(
                    "Loaded house {} ({}x{}, steps={}, battery={}, dirt={})",
                    house.name,
                    house.rows,
                    house.cols,
                    house.max_steps,
                    house.max_battery,
                    house.total_dirt()
                );
                loaded.houses.push(Arc::new(house));
            }
            Err(e) => {
                let name = house_name(&path);
                warn!("Skipping house {}: {}", name, e);
                loaded.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedHouseFile,
                    name,
                    e.to_string(),
                ));
            }
        }
    }
    Ok(loaded)
}

fn house_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
