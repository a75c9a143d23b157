//! Neighbor scan order used when exploring.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vacuum_env::Direction;

/// How ties between equally attractive neighbors are broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TieBreak {
    /// Scan North, East, South, West; the first strictly better neighbor wins
    #[default]
    Ordered,

    /// Shuffle the scan order on every decision with a seeded RNG
    Shuffled { seed: u64 },
}

/// Produces the direction scan order for each explore decision.
#[derive(Debug, Clone)]
pub struct ScanOrder {
    rng: Option<ChaCha8Rng>,
}

impl ScanOrder {
    /// Creates the scan order for a policy.
    pub fn new(policy: TieBreak) -> Self {
        let rng = match policy {
            TieBreak::Ordered => None,
            TieBreak::Shuffled { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
        };
        Self { rng }
    }

    /// Returns the order to scan neighbors in for the next decision.
    pub fn next_order(&mut self) -> [Direction; 4] {
        let mut order = Direction::ALL;
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }
        order
    }
}
