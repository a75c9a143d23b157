//! Vacuum Simulation Harness
//!
//! Runs navigation algorithms against house definitions and scores them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Competition                          │
//! │   load_houses ──► TaskScheduler ──► ResultTable ──► exporter │
//! │                       │                                      │
//! │        ┌──────────────┼──────────────┐                       │
//! │   ┌────▼────┐    ┌────▼────┐    ┌────▼────┐                  │
//! │   │ worker  │    │ worker  │    │ worker  │   TaskQueue      │
//! │   └────┬────┘    └─────────┘    └─────────┘                  │
//! │        │ run thread + CancelToken                            │
//! │   ┌────▼─────────────────────┐                               │
//! │   │ SimulationEngine         │◄── LiveSensors ──► algorithm  │
//! │   └──────────────────────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vacuum_sim::{AlgorithmRegistry, Competition, HarnessConfig};
//!
//! let config = HarnessConfig::default()
//!     .with_house_path("houses")
//!     .with_output_dir("out");
//!
//! let report = Competition::new(config).run(&AlgorithmRegistry::with_builtin())?;
//! println!("{}", report.table.to_csv());
//! ```

mod cancel;
mod config;
pub mod engine;
mod error;
pub mod exporter;
pub mod house;
mod registry;
mod report;
mod runner;
pub mod scheduler;
mod task_queue;

pub use cancel::CancelToken;
pub use config::HarnessConfig;
pub use engine::{LiveSensors, RunOutcome, RunStatus, SimulationEngine, World};
pub use error::{AlgorithmError, Diagnostic, DiagnosticKind, HarnessError, HouseError};
pub use exporter::{ArtifactWriter, ResultArtifact};
pub use house::{load_houses, Cell, House, LoadedHouses};
pub use registry::{AlgorithmFactory, AlgorithmRegistry};
pub use report::{ResultTable, ScheduleReport};
pub use runner::Competition;
pub use scheduler::{Task, TaskScheduler};
pub use task_queue::TaskQueue;
