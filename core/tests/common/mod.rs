use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use expgrid_core::api::{
    ExecutionBackend, ExecutionError, JobOutcome, JvmCommand, ParameterSet, PipelineRunner,
    RunnerOptions, Stage, StageJob, StageKind, TrainingRun,
};

/// Records every job it is handed; optionally touches the sentinel as a
/// finished script would.
#[derive(Default)]
pub struct SpyBackend {
    pub jobs: Mutex<Vec<StageJob>>,
    pub touch_sentinel: bool,
}

impl SpyBackend {
    pub fn completing() -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(Vec::new()),
            touch_sentinel: true,
        })
    }

    pub fn recording() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn names(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.name.clone())
            .collect()
    }

    pub fn job(&self, name: &str) -> Option<StageJob> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.name == name)
            .cloned()
    }
}

#[async_trait]
impl ExecutionBackend for SpyBackend {
    fn name(&self) -> &str {
        "spy"
    }

    async fn execute(&self, job: &StageJob) -> Result<JobOutcome, ExecutionError> {
        self.jobs.lock().unwrap().push(job.clone());
        if self.touch_sentinel {
            std::fs::write(job.workdir.join("DONE"), b"").unwrap();
            return Ok(JobOutcome::Completed {
                exit_code: 0,
                duration_ms: 0,
            });
        }
        Ok(JobOutcome::Submitted { job_id: None })
    }
}

pub fn runner(backend: Arc<SpyBackend>) -> PipelineRunner {
    PipelineRunner::new(backend, RunnerOptions::default())
}

pub fn jvm() -> JvmCommand {
    JvmCommand {
        java_bin: "java".to_string(),
        classpath: "tool.jar".to_string(),
        extra_args: vec!["-ea".to_string()],
        hprof: None,
    }
}

pub fn training(name: &str, params: ParameterSet) -> Stage {
    Stage::new(
        name,
        StageKind::Training(TrainingRun::new(params, jvm(), "edu.example.Trainer")),
    )
}
