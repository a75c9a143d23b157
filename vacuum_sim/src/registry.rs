//! Algorithm provider: an explicit name → factory registry.

use crate::error::AlgorithmError;
use std::sync::Arc;
use vacuum_core::{GraphExplorer, NavigationAlgorithm, TieBreak};

/// Seed of the built-in shuffled explorer.
pub const SHUFFLED_SEED: u64 = 0x5eed;

/// Produces a fresh algorithm instance per call.
pub type AlgorithmFactory =
    Arc<dyn Fn() -> Result<Box<dyn NavigationAlgorithm>, AlgorithmError> + Send + Sync>;

/// Registered algorithms, in registration order.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    entries: Vec<(String, AlgorithmFactory)>,
}

impl AlgorithmRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the algorithms shipped with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("graph_explorer", || {
            Ok(Box::new(GraphExplorer::new()) as Box<dyn NavigationAlgorithm>)
        });
        registry.register("graph_explorer_shuffled", || {
            Ok(Box::new(GraphExplorer::with_tie_break(TieBreak::Shuffled {
                seed: SHUFFLED_SEED,
            })) as Box<dyn NavigationAlgorithm>)
        });
        registry
    }

    /// Registers a factory under `name`.
    ///
    /// Registering a name twice replaces the earlier factory but keeps its
    /// position.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn NavigationAlgorithm>, AlgorithmError> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: AlgorithmFactory = Arc::new(factory);
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((name, factory)),
        }
        self
    }

    /// Iterates over `(name, factory)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlgorithmFactory)> {
        self.entries.iter().map(|(name, factory)| (name.as_str(), factory))
    }

    /// Registered names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Builds one instance of the named algorithm.
    pub fn create(&self, name: &str) -> Result<Box<dyn NavigationAlgorithm>, AlgorithmError> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .ok_or_else(|| AlgorithmError::factory(format!("unknown algorithm {name}")))
            .and_then(|(_, factory)| factory())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = AlgorithmRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["graph_explorer", "graph_explorer_shuffled"]);
        assert!(registry.create("graph_explorer").is_ok());
        assert!(registry.create("graph_explorer_shuffled").is_ok());
    }

    #[test]
    fn test_unknown_algorithm() {
        let registry = AlgorithmRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(registry.create("nope"), Err(AlgorithmError::Factory(_))));
    }

    #[test]
    fn test_reregister_keeps_order() {
        let mut registry = AlgorithmRegistry::with_builtin();
        registry.register("graph_explorer", || Err(AlgorithmError::factory("disabled")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names()[0], "graph_explorer");
        assert_eq!(
            registry.create("graph_explorer").err(),
            Some(AlgorithmError::factory("disabled"))
        );
    }
}
