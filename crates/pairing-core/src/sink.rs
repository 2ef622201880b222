use crate::error::Result;
use crate::io::write_document;
use crate::matching::{RunOutcome, Termination};
use crate::types::{Allocation, Participant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub rounds: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub total_input: usize,
    pub total_processed: usize,
}

/// The persisted result of one run: the `matched` and `unmatched_mentees`
/// collections plus enough context to tell runs apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub termination: Termination,
    pub summary: RunSummary,
    pub matched: Vec<Allocation>,
    pub unmatched_mentees: Vec<Participant>,
}

impl RunReport {
    pub fn from_outcome(run_id: impl Into<String>, outcome: &RunOutcome) -> Self {
        Self {
            run_id: run_id.into(),
            generated_at: Utc::now(),
            termination: outcome.termination,
            summary: RunSummary {
                rounds: outcome.rounds.len(),
                matched: outcome.allocations.len(),
                unmatched: outcome.unmatched.len(),
                total_input: outcome.total_input,
                total_processed: outcome.total_processed,
            },
            matched: outcome.allocations.clone(),
            unmatched_mentees: outcome.unmatched.iter().map(|a| a.to_participant()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ResultSink
// ---------------------------------------------------------------------------

/// Where a finished run is persisted.
pub trait ResultSink {
    fn emit(&mut self, report: &RunReport) -> Result<()>;
}

/// Writes the report to a single JSON or YAML file. The previous file, if
/// any, is replaced atomically; results are never appended.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FileSink {
    fn emit(&mut self, report: &RunReport) -> Result<()> {
        write_document(&self.path, report)?;
        tracing::info!(
            path = %self.path.display(),
            matched = report.matched.len(),
            unmatched = report.unmatched_mentees.len(),
            "results written"
        );
        Ok(())
    }
}
