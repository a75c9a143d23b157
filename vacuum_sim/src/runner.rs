//! Competition runner - loads houses, schedules every pair and exports
//! the results.

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::exporter::ArtifactWriter;
use crate::house::load_houses;
use crate::registry::AlgorithmRegistry;
use crate::report::ScheduleReport;
use crate::scheduler::TaskScheduler;
use tracing::{info, warn};

/// Runs one competition as described by a [`HarnessConfig`].
#[derive(Debug, Clone, Default)]
pub struct Competition {
    config: HarnessConfig,
}

impl Competition {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Loads the houses, runs every registered algorithm on each of them
    /// and writes the artifacts.
    ///
    /// Malformed houses and failing algorithms only produce diagnostics.
    /// The run fails when no house or no algorithm is left to schedule.
    pub fn run(&self, registry: &AlgorithmRegistry) -> Result<ScheduleReport, HarnessError> {
        self.config.validate()?;

        let loaded = load_houses(&self.config.house_path)?;
        info!(
            "Loaded {} houses from {} ({} rejected)",
            loaded.houses.len(),
            self.config.house_path.display(),
            loaded.diagnostics.len()
        );
        if loaded.houses.is_empty() {
            return Err(HarnessError::NoHouses(self.config.house_path.clone()));
        }

        let mut report = TaskScheduler::from_config(&self.config).run(&loaded.houses, registry);
        let mut diagnostics = loaded.diagnostics;
        diagnostics.append(&mut report.diagnostics);
        report.diagnostics = diagnostics;

        if report.table.algorithms().is_empty() {
            return Err(HarnessError::NoAlgorithms);
        }

        if self.config.write_artifacts {
            let writer = ArtifactWriter::new(&self.config.output_dir)
                .with_summary_only(self.config.summary_only);
            let failures = writer.export(&report);
            if !failures.is_empty() {
                warn!("{} artifacts could not be written", failures.len());
            }
            report.diagnostics.extend(failures);
        }
        Ok(report)
    }
}
