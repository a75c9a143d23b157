//! Output files: per-task JSON results, `.error` diagnostics and the CSV
//! summary.

use crate::engine::{RunOutcome, RunStatus};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::report::{ResultTable, ScheduleReport};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the aggregate score matrix.
pub const SUMMARY_FILE: &str = "summary.csv";

/// The per-task result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultArtifact {
    pub num_steps: usize,
    pub dirt_left: u64,
    pub status: RunStatus,
    pub in_dock: bool,
    pub score: u64,

    /// Action trace, one character per step
    pub steps: String,
}

impl From<&RunOutcome> for ResultArtifact {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            num_steps: outcome.steps_taken,
            dirt_left: outcome.dirt_left,
            status: outcome.status,
            in_dock: outcome.in_dock,
            score: outcome.score,
            steps: outcome.trace.clone(),
        }
    }
}

/// Writes competition output into one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    summary_only: bool,
}

impl ArtifactWriter {
    /// Creates a writer for `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            summary_only: false,
        }
    }

    /// Skips the per-task result files.
    pub fn with_summary_only(mut self, summary_only: bool) -> Self {
        self.summary_only = summary_only;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the result file for a pair.
    pub fn result_path(&self, house: &str, algorithm: &str) -> PathBuf {
        self.output_dir.join(format!("{house}-{algorithm}.json"))
    }

    /// Writes one task result as pretty JSON.
    pub fn write_result(&self, house: &str, algorithm: &str, outcome: &RunOutcome) -> std::io::Result<PathBuf> {
        let path = self.result_path(house, algorithm);
        let json = serde_json::to_string_pretty(&ResultArtifact::from(outcome))?;
        write_file(&path, &json)?;
        Ok(path)
    }

    /// Writes a diagnostic as `<subject>.error`. Diagnostics sharing a
    /// subject are appended to the same file.
    pub fn write_error(&self, diagnostic: &Diagnostic) -> std::io::Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.error", diagnostic.subject));
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}: {}", diagnostic.kind, diagnostic.message)?;
        Ok(path)
    }

    /// Writes the score matrix.
    pub fn write_summary(&self, table: &ResultTable) -> std::io::Result<PathBuf> {
        let path = self.output_dir.join(SUMMARY_FILE);
        write_file(&path, &table.to_csv())?;
        Ok(path)
    }

    /// Writes every artifact of a report.
    ///
    /// Failures do not stop the export; each one comes back as an
    /// `ArtifactWrite` diagnostic.
    pub fn export(&self, report: &ScheduleReport) -> Vec<Diagnostic> {
        let mut failures = Vec::new();
        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            failures.push(write_failure("output", &self.output_dir, e));
            return failures;
        }

        if !self.summary_only {
            for (house, algorithm, outcome) in report.table.entries() {
                if let Err(e) = self.write_result(house, algorithm, outcome) {
                    failures.push(write_failure(
                        &format!("{house}-{algorithm}"),
                        &self.result_path(house, algorithm),
                        e,
                    ));
                }
            }
        }

        for diagnostic in &report.diagnostics {
            if let Err(e) = self.write_error(diagnostic) {
                let path = self.output_dir.join(format!("{}.error", diagnostic.subject));
                failures.push(write_failure(&diagnostic.subject, &path, e));
            }
        }

        match self.write_summary(&report.table) {
            Ok(path) => debug!("Wrote summary to {}", path.display()),
            Err(e) => failures.push(write_failure("summary", &self.output_dir.join(SUMMARY_FILE), e)),
        }
        failures
    }
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

/// The subject names the artifact, not its path, so it stays usable as an
/// `.error` file name.
fn write_failure(subject: &str, path: &Path, error: std::io::Error) -> Diagnostic {
    warn!("Failed to write {}: {}", path.display(), error);
    Diagnostic::new(
        DiagnosticKind::ArtifactWrite,
        subject,
        format!("{}: {}", path.display(), error),
    )
}
