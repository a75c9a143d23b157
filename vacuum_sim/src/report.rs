//! Result matrix and the aggregate score report.

use crate::engine::RunOutcome;
use crate::error::Diagnostic;
use std::collections::HashMap;
use std::time::Duration;

/// Write-once results keyed by (house, algorithm).
///
/// Rows are algorithms and columns are houses, both in the order they
/// were given.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    houses: Vec<String>,
    algorithms: Vec<String>,
    cells: HashMap<(String, String), RunOutcome>,
}

impl ResultTable {
    /// Creates an empty table with fixed axes.
    pub fn new(houses: Vec<String>, algorithms: Vec<String>) -> Self {
        Self {
            houses,
            algorithms,
            cells: HashMap::new(),
        }
    }

    /// Records a result. A second result for the same pair is rejected and
    /// handed back.
    pub fn insert(&mut self, house: &str, algorithm: &str, outcome: RunOutcome) -> Result<(), RunOutcome> {
        let key = (house.to_string(), algorithm.to_string());
        if self.cells.contains_key(&key) {
            return Err(outcome);
        }
        self.cells.insert(key, outcome);
        Ok(())
    }

    pub fn get(&self, house: &str, algorithm: &str) -> Option<&RunOutcome> {
        self.cells.get(&(house.to_string(), algorithm.to_string()))
    }

    /// Score of one pair, if recorded.
    pub fn score(&self, house: &str, algorithm: &str) -> Option<u64> {
        self.get(house, algorithm).map(|outcome| outcome.score)
    }

    pub fn houses(&self) -> &[String] {
        &self.houses
    }

    pub fn algorithms(&self) -> &[String] {
        &self.algorithms
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Recorded results as `(house, algorithm, outcome)`, algorithm-major.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &RunOutcome)> {
        self.algorithms.iter().flat_map(move |algorithm| {
            self.houses.iter().filter_map(move |house| {
                self.get(house, algorithm)
                    .map(|outcome| (house.as_str(), algorithm.as_str(), outcome))
            })
        })
    }

    /// Renders the score matrix as CSV. Missing cells are left empty.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("algorithm");
        for house in &self.houses {
            csv.push(',');
            csv.push_str(house);
        }
        csv.push('\n');

        for algorithm in &self.algorithms {
            csv.push_str(algorithm);
            for house in &self.houses {
                csv.push(',');
                if let Some(score) = self.score(house, algorithm) {
                    csv.push_str(&score.to_string());
                }
            }
            csv.push('\n');
        }
        csv
    }
}

/// Everything a competition produced.
#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    pub table: ResultTable,
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed: Duration,
}
