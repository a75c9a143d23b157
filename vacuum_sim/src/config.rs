//! Harness configuration.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a competition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory scanned for `*.house` files
    pub house_path: PathBuf,

    /// Directory receiving result files, `.error` files and the summary
    pub output_dir: PathBuf,

    /// Worker threads
    pub num_threads: usize,

    /// Wall-clock budget per simulated step, in milliseconds
    pub timeout_per_step_ms: u64,

    /// Only write the summary, no per-task result files
    pub summary_only: bool,

    /// Write anything to disk at all
    pub write_artifacts: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            house_path: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            num_threads: 10,
            timeout_per_step_ms: 1,
            summary_only: false,
            write_artifacts: true,
        }
    }
}

impl HarnessConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.num_threads == 0 {
            return Err(HarnessError::Config("num_threads must be at least 1".to_string()));
        }
        if self.timeout_per_step_ms == 0 {
            return Err(HarnessError::Config(
                "timeout_per_step_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Wall-clock budget per simulated step.
    pub fn timeout_per_step(&self) -> Duration {
        Duration::from_millis(self.timeout_per_step_ms)
    }

    pub fn with_house_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.house_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_timeout_per_step_ms(mut self, ms: u64) -> Self {
        self.timeout_per_step_ms = ms;
        self
    }

    pub fn with_summary_only(mut self, summary_only: bool) -> Self {
        self.summary_only = summary_only;
        self
    }

    pub fn with_write_artifacts(mut self, write_artifacts: bool) -> Self {
        self.write_artifacts = write_artifacts;
        self
    }
}
