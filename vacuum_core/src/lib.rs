//! Vacuum Core - online navigation for cleaning robots
//!
//! A robot dropped on its dock knows nothing about the house. This crate
//! holds the decision engines that turn local sensor readings into one
//! action per turn:
//! 1. **Graph building**: every visited cell adds its open neighbors to an
//!    arena graph with exact shortest distances back to the dock
//! 2. **Budgeting**: battery and step limits decide when to turn home
//! 3. **Target selection**: after charging, BFS picks the nearest cell that
//!    may still hold dirt

pub mod algorithm;
pub mod explorer;
pub mod graph;
pub mod policy;

// Re-export key types for convenience
pub use algorithm::NavigationAlgorithm;
pub use explorer::{GraphExplorer, NavState};
pub use graph::{HouseGraph, Vertex, UNOBSERVED};
pub use policy::{ScanOrder, TieBreak};
