use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::stage::ResourceHints;

/// Everything a backend needs to run or submit one stage.
#[derive(Debug, Clone)]
pub struct StageJob {
    pub name: String,
    pub script_path: PathBuf,
    pub workdir: PathBuf,
    pub stdout_path: PathBuf,
    /// Names of prerequisite stages the scheduler must hold on.
    pub holds: Vec<String>,
    pub resources: ResourceHints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Ran to completion locally.
    Completed { exit_code: i32, duration_ms: u64 },
    /// Handed to an external scheduler; nothing more is known.
    Submitted { job_id: Option<String> },
    /// Not executed (dry run).
    Skipped,
}

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// A backend that only previews; the runner then leaves sentinels and
    /// parameter files on disk untouched.
    fn is_dry_run(&self) -> bool {
        false
    }

    async fn execute(&self, job: &StageJob) -> Result<JobOutcome, ExecutionError>;
}
