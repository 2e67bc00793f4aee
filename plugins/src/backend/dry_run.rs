use async_trait::async_trait;

use expgrid_core::api::{ExecutionBackend, ExecutionError, JobOutcome, StageJob};

use super::QsubBackend;

/// Logs what would run without running it. Scripts are still written by the
/// runner, so they can be inspected.
pub struct DryRunBackend {
    queue: Option<QsubBackend>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self { queue: None }
    }

    /// Preview the submission command instead of the local one.
    pub fn previewing(queue: QsubBackend) -> Self {
        Self { queue: Some(queue) }
    }
}

impl Default for DryRunBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionBackend for DryRunBackend {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn is_dry_run(&self) -> bool {
        true
    }

    async fn execute(&self, job: &StageJob) -> Result<JobOutcome, ExecutionError> {
        let line = match &self.queue {
            Some(q) => q.command_line(job),
            None => format!("bash {}", job.script_path.display()),
        };
        tracing::info!("[dry run] {}", line);
        Ok(JobOutcome::Skipped)
    }
}
