//! Error and diagnostic types for the simulation harness.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a house definition.
#[derive(Debug, Error)]
pub enum HouseError {
    /// The file could not be read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required header line or key is absent
    #[error("Missing header: {0}")]
    MissingHeader(String),

    /// A header value could not be parsed
    #[error("Invalid header {key}: {value:?}")]
    InvalidHeader { key: String, value: String },

    /// The grid has no docking station
    #[error("House has no docking station")]
    NoDock,

    /// The grid has more than one docking station
    #[error("House has {0} docking stations, expected exactly one")]
    MultipleDocks(usize),

    /// `Rows` or `Cols` is zero
    #[error("House grid is empty ({rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    /// The grid exceeds the supported number of cells
    #[error("House grid is too large ({rows}x{cols}, limit {limit} cells)")]
    GridTooLarge {
        rows: usize,
        cols: usize,
        limit: usize,
    },
}

impl HouseError {
    /// Creates an invalid-header error.
    pub fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidHeader {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Errors raised by an algorithm provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlgorithmError {
    /// The factory could not produce an instance
    #[error("Factory failed: {0}")]
    Factory(String),
}

impl AlgorithmError {
    /// Creates a factory error.
    pub fn factory(msg: impl Into<String>) -> Self {
        Self::Factory(msg.into())
    }
}

/// Harness-level failures that stop a competition before it starts.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A single house file could not be loaded
    #[error("House error: {0}")]
    House(#[from] HouseError),

    /// The configuration is unusable
    #[error("Config error: {0}")]
    Config(String),

    /// Filesystem failure outside house loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No valid house was found
    #[error("No valid house files found in {0}")]
    NoHouses(PathBuf),

    /// Every registered algorithm failed to construct
    #[error("No usable algorithms registered")]
    NoAlgorithms,
}

/// Category of a non-fatal problem recorded during a competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A house file was rejected before scheduling
    MalformedHouseFile,

    /// An algorithm factory failed; the algorithm was excluded
    AlgorithmFactoryFailure,

    /// The robot died or overran its budget
    RuntimeInvariantViolation,

    /// A run exceeded its wall-clock budget and was cancelled
    TaskTimeout,

    /// An algorithm panicked mid-run
    AlgorithmPanic,

    /// A second result arrived for an already recorded pair
    DuplicateResult,

    /// An output file could not be written
    ArtifactWrite,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticKind::MalformedHouseFile => "malformed house file",
            DiagnosticKind::AlgorithmFactoryFailure => "algorithm factory failure",
            DiagnosticKind::RuntimeInvariantViolation => "runtime invariant violation",
            DiagnosticKind::TaskTimeout => "task timeout",
            DiagnosticKind::AlgorithmPanic => "algorithm panic",
            DiagnosticKind::DuplicateResult => "duplicate result",
            DiagnosticKind::ArtifactWrite => "artifact write failure",
        };
        f.write_str(name)
    }
}

/// A recorded per-house, per-algorithm or per-task problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,

    /// House name, algorithm name, or `<house>-<algorithm>` task key
    pub subject: String,

    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}
