use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PipelineError, StageError};
use crate::experiment::ScrapeRun;
use crate::stage::script::render_script;
use crate::stage::sentinel::{wait_until, WaitPolicy};
use crate::stage::{ScriptProducing, Stage, StageGraph, StageId, StageKind, DEFAULT_SENTINEL};

use super::backend::{ExecutionBackend, JobOutcome, StageJob};
use super::output::{emit_execution_plan, emit_run_end};
use super::progress::ProgressMonitor;

/// Name of the stage appended for post-processing.
pub const POST_PROCESS_STAGE: &str = "scrape";

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub params_file: String,
    pub stdout_file: String,
    /// Sentinel used by the appended post-processing stage.
    pub sentinel: String,
    /// Appended stage depending on every other stage, if set.
    pub post_process: Option<ScrapeRun>,
    pub progress_bar: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            params_file: "expparams.txt".to_string(),
            stdout_file: "stdout".to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            post_process: None,
            progress_bar: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Already complete; nothing was run.
    Skipped,
    Completed,
    Submitted,
    DryRun,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub top_dir: PathBuf,
    /// Stages in execution order, root excluded.
    pub order: Vec<String>,
    pub skipped: Vec<String>,
    pub completed: Vec<String>,
    pub submitted: Vec<String>,
    pub dry_run: Vec<String>,
}

impl PipelineReport {
    fn record(&mut self, name: String, status: StageStatus) {
        match status {
            StageStatus::Skipped => self.skipped.push(name),
            StageStatus::Completed => self.completed.push(name),
            StageStatus::Submitted => self.submitted.push(name),
            StageStatus::DryRun => self.dry_run.push(name),
        }
    }
}

/// Validates, orders and runs every stage reachable from a root.
pub struct PipelineRunner {
    backend: Arc<dyn ExecutionBackend>,
    opts: RunnerOptions,
}

impl PipelineRunner {
    pub fn new(backend: Arc<dyn ExecutionBackend>, opts: RunnerOptions) -> Self {
        Self { backend, opts }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn run_pipeline(
        &self,
        graph: &mut StageGraph,
        root: StageId,
        top_dir: &Path,
    ) -> Result<PipelineReport, PipelineError> {
        self.append_post_processing(graph, root)?;

        let reachable = graph.reachable_from(root);
        validate_names(graph, &reachable)?;

        let levels = graph.topological_levels(&reachable)?;
        emit_execution_plan(graph, &levels);

        std::fs::create_dir_all(top_dir).map_err(|source| PipelineError::Io {
            path: top_dir.display().to_string(),
            source,
        })?;

        let order: Vec<StageId> = levels
            .into_iter()
            .flatten()
            .filter(|id| graph.get(*id).map(|s| !s.is_root()).unwrap_or(false))
            .collect();

        tracing::info!(
            "running {} stage(s) in {} via {} backend",
            order.len(),
            top_dir.display(),
            self.backend.name()
        );

        let progress = ProgressMonitor::new(order.len(), self.opts.progress_bar);
        let mut report = PipelineReport {
            top_dir: top_dir.to_path_buf(),
            ..Default::default()
        };

        for id in order {
            let name = graph.stage(id)?.name().to_string();
            progress.stage_started(&name);
            let status = self.run_stage(graph, id, top_dir).await?;
            progress.stage_finished();
            report.order.push(name.clone());
            report.record(name, status);
        }

        progress.finish("done");
        emit_run_end(&report);
        Ok(report)
    }

    fn append_post_processing(
        &self,
        graph: &mut StageGraph,
        root: StageId,
    ) -> Result<(), PipelineError> {
        let Some(scrape) = &self.opts.post_process else {
            return Ok(());
        };
        let others: Vec<StageId> = graph
            .reachable_from(root)
            .into_iter()
            .filter(|id| graph.get(*id).map(|s| !s.is_root()).unwrap_or(false))
            .collect();
        if others.is_empty() {
            return Ok(());
        }

        let post = graph.add_stage(
            Stage::new(POST_PROCESS_STAGE, StageKind::Scrape(scrape.clone()))
                .with_sentinel(self.opts.sentinel.clone()),
        );
        for id in others {
            graph.add_prerequisite(post, id)?;
        }
        Ok(())
    }

    /// Create and assign the stage's working directory under `top_dir`, then
    /// run it unless it is already complete.
    pub async fn run_stage(
        &self,
        graph: &mut StageGraph,
        id: StageId,
        top_dir: &Path,
    ) -> Result<StageStatus, PipelineError> {
        let workdir = top_dir.join(graph.stage(id)?.name());
        std::fs::create_dir_all(&workdir).map_err(|source| PipelineError::Io {
            path: workdir.display().to_string(),
            source,
        })?;
        graph.stage_mut(id)?.set_workdir(&workdir);
        self.run_assigned(graph, id, top_dir).await
    }

    /// Run a stage whose working directory is already assigned.
    pub async fn run_assigned(
        &self,
        graph: &StageGraph,
        id: StageId,
        top_dir: &Path,
    ) -> Result<StageStatus, PipelineError> {
        let stage = graph.stage(id)?;
        if graph.is_completed(id) {
            tracing::info!("stage {} already complete, skipping", stage.name());
            return Ok(StageStatus::Skipped);
        }

        let workdir = stage
            .workdir()
            .ok_or_else(|| StageError::NoWorkdir {
                stage: stage.name().to_string(),
            })?
            .to_path_buf();

        let dry_run = self.backend.is_dry_run();
        if let Some(params) = stage.params().filter(|_| !dry_run) {
            params.save(&workdir.join(&self.opts.params_file))?;
        }

        let ctx = graph.script_context(id, top_dir)?;
        let body = stage.kind().script_body(&ctx)?;
        let sentinel = workdir.join(stage.sentinel());
        let script = render_script(stage.name(), &workdir, &body, &sentinel);
        let script_path = workdir.join(format!("{}.sh", stage.name()));
        write_file(&script_path, &script)?;

        // a stale sentinel would mark a re-running stage complete too early
        if !dry_run && sentinel.exists() {
            std::fs::remove_file(&sentinel).map_err(|source| PipelineError::Io {
                path: sentinel.display().to_string(),
                source,
            })?;
        }

        let job = StageJob {
            name: stage.name().to_string(),
            script_path,
            stdout_path: workdir.join(&self.opts.stdout_file),
            workdir,
            holds: graph.prerequisite_names(id),
            resources: stage.resources(),
        };
        tracing::debug!(
            "stage {} ({}) -> {} holds=[{}]",
            job.name,
            stage.kind().label(),
            job.script_path.display(),
            job.holds.join(",")
        );

        let status = match self.backend.execute(&job).await? {
            JobOutcome::Completed {
                exit_code,
                duration_ms,
            } => {
                tracing::info!(
                    "stage {} finished (exit={}, {}ms)",
                    job.name,
                    exit_code,
                    duration_ms
                );
                StageStatus::Completed
            }
            JobOutcome::Submitted { job_id } => {
                tracing::info!(
                    "stage {} submitted{}",
                    job.name,
                    job_id.map(|j| format!(" as job {j}")).unwrap_or_default()
                );
                StageStatus::Submitted
            }
            JobOutcome::Skipped => StageStatus::DryRun,
        };
        Ok(status)
    }
}

/// Rename stages whose name does not start with a letter, then reject
/// duplicate names among the given stages.
pub fn validate_names(graph: &mut StageGraph, ids: &[StageId]) -> Result<(), PipelineError> {
    for id in ids {
        let stage = graph.stage_mut(*id)?;
        if stage.is_root() {
            continue;
        }
        if !stage.name().starts_with(|c: char| c.is_ascii_alphabetic()) {
            let renamed = format!("s{}", stage.name());
            tracing::warn!(
                "stage name '{}' must start with a letter, renaming to '{}'",
                stage.name(),
                renamed
            );
            stage.set_name(renamed);
        }
    }

    let mut seen = HashSet::new();
    for id in ids {
        let stage = graph.stage(*id)?;
        if stage.is_root() {
            continue;
        }
        if !seen.insert(stage.name()) {
            return Err(PipelineError::DuplicateStage(stage.name().to_string()));
        }
    }
    Ok(())
}

/// Block until `id` and all of its prerequisites are complete.
pub async fn wait_for_stage(
    graph: &StageGraph,
    id: StageId,
    policy: &WaitPolicy,
) -> Result<(), PipelineError> {
    let name = graph.stage(id)?.name().to_string();
    wait_until(&name, policy, || graph.is_completed(id)).await?;
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), PipelineError> {
    std::fs::write(path, contents).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })
}
